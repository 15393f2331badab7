//! Marker catalog for inference process output
//!
//! Inference backends differ in which literal they print before the generated
//! text (some print none at all), and every backend interleaves glog-style
//! diagnostic lines with the payload. The tables below are the only knowledge
//! the extraction engine has about a particular binary; extending coverage for
//! a new backend means adding literals here.

use once_cell::sync::Lazy;
use regex::Regex;

/// Literals that announce the start of the generated text.
///
/// Order matters: the first literal contained in a line wins.
pub const RESPONSE_MARKERS: &[&str] = &[
    "Response:",
    "Generated text:",
    "Generated response:",
    "Model output:",
    "Output:",
    "Answer:",
];

/// Literals that announce the end of the generated text, usually because
/// benchmark or teardown output has started.
pub const END_MARKERS: &[&str] = &[
    "BenchmarkInfo",
    "Benchmark",
    "Prefill:",
    "Decode:",
    "Peak memory",
    "Tokens/sec",
    "Time to first token",
    "Init phases",
];

/// Prefixes of performance lines stripped from the tail of an answer.
pub const METRIC_PREFIXES: &[&str] = &["Prefill:", "Decode:", "Peak memory", "Tokens/sec"];

/// Substrings identifying an unrecoverable internal failure of the binary.
pub const FATAL_SIGNATURES: &[&str] = &["Check failure", "Check failed"];

/// Sentinel returned when nothing could be isolated.
pub const NO_RESPONSE: &str = "No response generated";

/// Diagnostic log prefixes: glog severity letter plus MMDD, or a textual
/// level prefix as printed by TFLite and Python wrappers.
pub static LOG_LINE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\s*[IWEF]\d{4}\b").expect("Invalid regex pattern"),
        Regex::new(r"^\s*(?:INFO|WARNING|ERROR|VERBOSE):").expect("Invalid regex pattern"),
    ]
});

static FATAL_LOG_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*F\d{4}\b").expect("Invalid regex pattern"));

/// True when the line carries a diagnostic log prefix.
pub fn is_log_line(line: &str) -> bool {
    LOG_LINE_PATTERNS.iter().any(|pattern| pattern.is_match(line))
}

/// Locate the first response marker contained in `line`.
///
/// Returns the marker and the byte offset just past it.
pub fn find_response_marker(line: &str) -> Option<(&'static str, usize)> {
    RESPONSE_MARKERS
        .iter()
        .find_map(|marker| line.find(marker).map(|idx| (*marker, idx + marker.len())))
}

pub fn contains_end_marker(line: &str) -> bool {
    END_MARKERS.iter().any(|marker| line.contains(marker))
}

/// True when the line is a fatal glog line or a failed `CHECK`.
pub fn is_fatal_line(line: &str) -> bool {
    FATAL_LOG_PREFIX.is_match(line) || FATAL_SIGNATURES.iter().any(|sig| line.contains(sig))
}
