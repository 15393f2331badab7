//! Performance figures printed by benchmark-enabled inference runs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// The number must start on a digit boundary so `1,024.5` is read whole
const NUMBER: &str = r"(?:[^\n]*?[^\d.,\n])?(\d[\d,]*(?:\.\d+)?)";

static PREFILL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)prefill\b{NUMBER}\s*tokens?/s(?:ec)?"))
        .expect("Invalid regex pattern")
});
static DECODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)decode\b{NUMBER}\s*tokens?/s(?:ec)?"))
        .expect("Invalid regex pattern")
});
static PEAK_MEMORY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)peak\s+memory{NUMBER}\s*MB")).expect("Invalid regex pattern")
});

/// Throughput and memory figures; a field is `None` when its line was absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill_tokens_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_tokens_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_memory_mb: Option<f64>,
}

impl InferenceMetrics {
    pub fn is_empty(&self) -> bool {
        self.prefill_tokens_per_sec.is_none()
            && self.decode_tokens_per_sec.is_none()
            && self.peak_memory_mb.is_none()
    }

    /// Fill categories missing here from `other`
    pub fn or(self, other: InferenceMetrics) -> Self {
        Self {
            prefill_tokens_per_sec: self.prefill_tokens_per_sec.or(other.prefill_tokens_per_sec),
            decode_tokens_per_sec: self.decode_tokens_per_sec.or(other.decode_tokens_per_sec),
            peak_memory_mb: self.peak_memory_mb.or(other.peak_memory_mb),
        }
    }
}

/// Scan raw process output for metric lines. First match per category wins.
pub fn extract_metrics(text: &str) -> InferenceMetrics {
    InferenceMetrics {
        prefill_tokens_per_sec: first_number(&PREFILL_PATTERN, text),
        decode_tokens_per_sec: first_number(&DECODE_PATTERN, text),
        peak_memory_mb: first_number(&PEAK_MEMORY_PATTERN, text),
    }
}

fn first_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}
