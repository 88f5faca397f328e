//! Text bounding helpers shared by the loop and the gateway.

/// Cap `text` to `max_chars`, appending a truncation notice when exceeded.
///
/// Every tool result fed back into the conversation passes through this so
/// one oversized page cannot blow up the context window.
pub fn truncate_with_notice(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}\n[... output truncated at {max_chars} characters]")
}

/// Cap `text` without a notice, for places where the bound is cosmetic
/// (argument previews in transcripts, conclusions in memory renders).
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}…")
}
