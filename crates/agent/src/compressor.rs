//! History compression — bounds conversation growth mid-session.
//!
//! Every few iterations the loop hands the conversation here. The middle of
//! the transcript (everything between the original task and the last few raw
//! exchanges) is flattened to text, summarized by the collaborator, and
//! spliced back as a single context turn:
//!
//! `[original task, synthetic acknowledgement, summary turn, ...last-K raw]`
//!
//! Compression is a cost optimization, never a correctness requirement: any
//! failure returns the input unchanged.

use prospector_core::collab::Summarizer;
use prospector_core::message::{Message, Role};
use prospector_core::text::truncate;
use std::sync::Arc;
use tracing::{debug, warn};

/// Below this many turns, compression is never worth the summarization call.
const DEFAULT_MIN_TURNS: usize = 8;

/// Middle sections smaller than this stay uncompressed.
const MIN_MIDDLE_TURNS: usize = 4;

/// Per-piece caps when flattening turns into the transcript.
const REASONING_CAP: usize = 500;
const ARGS_CAP: usize = 200;
const RESULT_CAP: usize = 700;

const SUMMARY_INSTRUCTION: &str = "You are compressing an agent's research transcript. \
     Preserve every concrete data point: candidate names, verdicts, rejection reasons, \
     prices, URLs, and criteria outcomes. Omit verbose raw page output and repeated \
     search listings. Respond with the summary only, under 300 words.";

const ACKNOWLEDGEMENT: &str =
    "Understood. I will continue the research using the summary below as context.";

pub struct HistoryCompressor {
    summarizer: Arc<dyn Summarizer>,
    min_turns: usize,
    keep_last_exchanges: usize,
}

impl HistoryCompressor {
    pub fn new(summarizer: Arc<dyn Summarizer>, keep_last_exchanges: usize) -> Self {
        Self {
            summarizer,
            min_turns: DEFAULT_MIN_TURNS,
            keep_last_exchanges,
        }
    }

    /// Lower the no-op threshold (tests, aggressive budgets).
    pub fn with_min_turns(mut self, min_turns: usize) -> Self {
        self.min_turns = min_turns;
        self
    }

    /// Compress `turns`, or return them unchanged when compression is not
    /// worthwhile or the summarizer fails.
    pub async fn compress(&self, turns: &[Message]) -> Vec<Message> {
        if turns.len() < self.min_turns {
            return turns.to_vec();
        }

        let tail_start = self.tail_start(turns);
        // index 0 is the original task turn
        let middle = &turns[1..tail_start];
        if middle.len() < MIN_MIDDLE_TURNS {
            return turns.to_vec();
        }

        let transcript = flatten(middle);
        match self
            .summarizer
            .summarize(SUMMARY_INSTRUCTION, &transcript)
            .await
        {
            Ok(summary) => {
                debug!(
                    before = turns.len(),
                    middle = middle.len(),
                    "Compressed conversation history"
                );
                let mut out = Vec::with_capacity(3 + turns.len() - tail_start);
                out.push(turns[0].clone());
                out.push(Message::assistant(ACKNOWLEDGEMENT));
                out.push(Message::user(format!(
                    "Summary of the research so far:\n{summary}"
                )));
                out.extend(turns[tail_start..].iter().cloned());
                out
            }
            Err(e) => {
                warn!(error = %e, "History compression failed, keeping full history");
                turns.to_vec()
            }
        }
    }

    /// Index where the last `keep_last_exchanges` raw exchanges begin.
    /// An exchange starts at an assistant turn and spans its tool results.
    fn tail_start(&self, turns: &[Message]) -> usize {
        let mut assistants_seen = 0;
        for (idx, msg) in turns.iter().enumerate().rev() {
            if msg.role == Role::Assistant {
                assistants_seen += 1;
                if assistants_seen >= self.keep_last_exchanges {
                    return idx;
                }
            }
        }
        // fewer exchanges than requested — keep everything after the task
        1
    }
}

/// Flatten turns into a plain transcript the summarizer can read.
fn flatten(turns: &[Message]) -> String {
    let mut out = String::new();
    for msg in turns {
        match msg.role {
            Role::User => {
                out.push_str(&format!("User: {}\n", truncate(&msg.content, REASONING_CAP)));
            }
            Role::Assistant => {
                if !msg.content.is_empty() {
                    out.push_str(&format!(
                        "Assistant: {}\n",
                        truncate(&msg.content, REASONING_CAP)
                    ));
                }
                for call in &msg.tool_calls {
                    let args = call.arguments.to_string();
                    out.push_str(&format!(
                        "  → {}({})\n",
                        call.name,
                        truncate(&args, ARGS_CAP)
                    ));
                }
            }
            Role::Tool => {
                out.push_str(&format!(
                    "  Result: {}\n",
                    truncate(&msg.content, RESULT_CAP)
                ));
            }
        }
    }
    out
}
