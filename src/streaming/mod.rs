//! Streaming synthesis
//!
//! The inference binary only produces a complete answer, so streaming
//! responses are synthesized: the answer is cut into word groups that are
//! emitted one by one with a short pause in between.

pub mod synthesizer;

pub use synthesizer::{chunk_answer, StreamSynthesizer};
