//! The `stats` command — memory store overview.

use prospector_config::AppConfig;
use prospector_memory::ResearchMemory;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let memory = ResearchMemory::new(config.memory_path());
    let stats = memory.stats();

    println!("memory: {}", config.memory_path().display());
    println!("sessions: {}", stats.sessions);
    println!("known services: {}", stats.services);
    match stats.last_research {
        Some(ts) => println!("last research: {}", ts.format("%Y-%m-%d %H:%M UTC")),
        None => println!("last research: never"),
    }

    Ok(())
}
