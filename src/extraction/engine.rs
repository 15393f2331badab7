//! Line-oriented answer extraction
//!
//! The scan runs in three phases: skip leading log noise, take the text that
//! follows a response marker, and, when no marker was printed at all, take
//! everything up to the first end marker.

use super::markers::{
    contains_end_marker, find_response_marker, is_log_line, METRIC_PREFIXES, NO_RESPONSE,
};
use super::metrics::InferenceMetrics;
use serde::Serialize;

/// Answer isolated from one captured output channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<InferenceMetrics>,
}

impl ExtractionResult {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            metrics: None,
        }
    }

    /// Attach metrics, dropping them when nothing was measured
    pub fn with_metrics(mut self, metrics: InferenceMetrics) -> Self {
        self.metrics = (!metrics.is_empty()).then_some(metrics);
        self
    }

    /// True when extraction fell through to the sentinel
    pub fn is_empty(&self) -> bool {
        self.answer == NO_RESPONSE
    }
}

#[derive(Debug, Default)]
struct ExtractionState {
    found_marker: bool,
    in_response: bool,
    buffer: String,
}

impl ExtractionState {
    /// A bare marker keeps whatever the buffer already holds
    fn start_response(&mut self, suffix: &str) {
        self.found_marker = true;
        self.in_response = true;
        if !suffix.is_empty() {
            self.buffer = suffix.to_string();
        }
    }

    fn push_line(&mut self, line: &str) {
        if self.buffer.is_empty() {
            if !line.trim().is_empty() {
                self.buffer.push_str(line);
            }
        } else {
            self.buffer.push('\n');
            self.buffer.push_str(line);
        }
    }
}

/// Extract the generated answer from one blob of process output.
///
/// Never fails: returns [`NO_RESPONSE`] when nothing could be isolated.
/// Metrics are not attached here; see [`super::extract_metrics`].
pub fn extract(text: &str) -> ExtractionResult {
    let lines: Vec<&str> = text.lines().collect();
    let start = body_start(&lines);

    let mut state = ExtractionState::default();
    for line in &lines[start..] {
        if state.in_response && contains_end_marker(line) {
            break;
        }

        if let Some((_, offset)) = find_response_marker(line) {
            state.start_response(line[offset..].trim());
            continue;
        }

        if state.in_response {
            state.push_line(line);
        }
    }

    let raw = if state.found_marker {
        state.buffer
    } else {
        fallback_scan(&lines[start..])
    };

    let answer = strip_metric_tail(raw.trim());
    if answer.is_empty() {
        ExtractionResult::new(NO_RESPONSE)
    } else {
        ExtractionResult::new(answer)
    }
}

/// Index of the first non-blank line without a log prefix, or `lines.len()`.
fn body_start(lines: &[&str]) -> usize {
    lines
        .iter()
        .position(|line| !line.trim().is_empty() && !is_log_line(line))
        .unwrap_or(lines.len())
}

fn fallback_scan(lines: &[&str]) -> String {
    let mut collected: Vec<&str> = Vec::new();
    for line in lines {
        if contains_end_marker(line) {
            break;
        }
        if collected.is_empty() && line.trim().is_empty() {
            continue;
        }
        collected.push(line);
    }
    collected.join("\n")
}

fn strip_metric_tail(answer: &str) -> String {
    let mut answer = answer.to_string();
    for prefix in METRIC_PREFIXES {
        if let Some(idx) = answer.find(prefix) {
            answer.truncate(idx);
        }
    }
    answer.trim().to_string()
}
