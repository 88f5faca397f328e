//! The `research` command — wires the collaborators together and runs one
//! session.

use anyhow::{Context, bail};
use prospector_agent::{CancelHandle, HistoryCompressor, ResearchRunner, RunnerSettings};
use prospector_config::AppConfig;
use prospector_core::collab::{
    DiscoveryProvider, ExportSink, PageExtractor, PageReader, SearchProvider, Summarizer,
};
use prospector_core::criteria::{CriteriaOrigin, CriteriaSet};
use prospector_core::engine::ReasoningEngine;
use prospector_engines::{AnthropicEngine, EngineSummarizer};
use prospector_memory::ResearchMemory;
use prospector_telemetry::{ModelPricing, PricingTable};
use prospector_tools::{
    BraveDiscovery, FileExporter, HttpPageReader, PageDistiller, SerpApiSearch, ToolGateway,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(
    task: String,
    criteria_file: Option<PathBuf>,
    max_iterations: Option<u32>,
    no_export: bool,
) -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    let Some(api_key) = config.engine.api_key.clone() else {
        bail!(
            "no reasoning engine API key configured — set ANTHROPIC_API_KEY or add it to {}",
            AppConfig::config_dir().join("config.toml").display()
        );
    };

    let mut engine = AnthropicEngine::new(api_key);
    if let Some(base_url) = &config.engine.base_url {
        engine = engine.with_base_url(base_url);
    }
    let engine: Arc<dyn ReasoningEngine> = Arc::new(engine);

    // ── Criteria: explicit file wins, otherwise a single-shot parse ──
    let (criteria, origin) = match &criteria_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read criteria file {}", path.display()))?;
            let set: CriteriaSet =
                serde_json::from_str(&content).context("criteria file is not valid JSON")?;
            set.validate()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            (set, CriteriaOrigin::Parsed)
        }
        None => {
            prospector_agent::parse_criteria(engine.as_ref(), &config.engine.model, &task).await
        }
    };
    if origin == CriteriaOrigin::Fallback {
        warn!("criteria could not be parsed from the task; using generic fallback criteria");
        println!(
            "Note: criteria were not parsed from the task — researching against generic \
             placeholder criteria."
        );
    }

    // ── Collaborators ──
    let summarizer: Arc<dyn Summarizer> = Arc::new(EngineSummarizer::new(
        engine.clone(),
        config.engine.model.clone(),
    ));
    let reader: Arc<dyn PageReader> = Arc::new(HttpPageReader::new(
        config.search.page_timeout_secs,
        config.search.page_cap,
    ));
    let extractor: Arc<dyn PageExtractor> =
        Arc::new(PageDistiller::new(reader.clone(), summarizer.clone()));
    let search: Option<Arc<dyn SearchProvider>> = config
        .search
        .serpapi_key
        .clone()
        .map(|key| Arc::new(SerpApiSearch::new(key)) as Arc<dyn SearchProvider>);
    let discovery: Option<Arc<dyn DiscoveryProvider>> = config
        .search
        .brave_key
        .clone()
        .map(|key| Arc::new(BraveDiscovery::new(key)) as Arc<dyn DiscoveryProvider>);
    if search.is_none() {
        warn!("SERPAPI_API_KEY not set; precise_search will report itself unavailable");
    }
    if discovery.is_none() {
        warn!("BRAVE_API_KEY not set; broad_discover will report itself unavailable");
    }

    let gateway = ToolGateway::new(search, discovery, Some(extractor), Some(reader));
    let memory = ResearchMemory::new(config.memory_path());
    let compressor =
        HistoryCompressor::new(summarizer, config.runner.keep_last_exchanges);

    let mut pricing = PricingTable::with_defaults();
    for (model, p) in &config.pricing {
        pricing.set(model.clone(), ModelPricing::new(p.input_per_m, p.output_per_m));
    }

    let settings = RunnerSettings {
        model: config.engine.model.clone(),
        max_iterations: max_iterations.unwrap_or(config.runner.max_iterations),
        compress_every: config.runner.compress_every,
        max_retries: config.runner.max_retries,
        retry_backoff_secs: config.runner.retry_backoff_secs,
        retry_backoff_cap_secs: config.runner.retry_backoff_cap_secs,
        tool_output_cap: config.runner.tool_output_cap,
        conclusion_cap: config.runner.conclusion_cap,
        max_tokens: config.engine.max_tokens,
        temperature: config.engine.temperature,
        context_sessions: config.memory.context_sessions,
    };

    let mut runner = ResearchRunner::new(engine, gateway, memory, compressor, settings)
        .with_pricing(pricing);
    if config.export.enabled && !no_export {
        let sink: Arc<dyn ExportSink> = Arc::new(FileExporter::new(config.export_dir()));
        runner = runner.with_export(sink);
    }

    // Ctrl-C stops the loop at the next iteration boundary
    let cancel: CancelHandle = runner.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stop requested; finishing the current iteration");
            cancel.cancel();
        }
    });

    let report = runner.run(&task, criteria).await?;

    println!("\n{}\n", report.answer);
    println!(
        "iterations: {}  tool calls: {}  candidates evaluated: {}",
        report.iterations, report.tool_calls, report.candidates_evaluated
    );
    if let Some(cost) = &report.cost {
        println!(
            "tokens: {} in / {} out  estimated cost: ${:.4}",
            cost.input_tokens, cost.output_tokens, cost.usd
        );
    }
    if let Some(reference) = &report.export_ref {
        println!("report: {reference}");
    }

    Ok(())
}
