//! Output extraction
//!
//! Turns the unstructured, log-interleaved output of an inference binary into
//! a clean answer string plus optional throughput metrics.
//!
//! - `markers` - Static marker catalog and single-line predicates
//! - `engine` - Three-phase answer extraction state machine
//! - `metrics` - Prefill/decode throughput and peak memory parsing

pub mod engine;
pub mod markers;
pub mod metrics;


pub use engine::{extract, ExtractionResult};
pub use markers::{
    contains_end_marker, find_response_marker, is_fatal_line, is_log_line, NO_RESPONSE,
};
pub use metrics::{extract_metrics, InferenceMetrics};
