//! Process invocation
//!
//! One inference process per request: build the argument vector, run it under
//! a concurrency limit and a hard timeout, classify the exit, and extract the
//! answer (stdout first, stderr second, fixed greeting last).

pub mod client;
pub mod error;
pub mod outcome;

#[cfg(test)]
mod tests;

pub use client::{InferenceClient, SelfTestReport, SELF_TEST_PROMPT};
pub use error::InferenceError;
pub use outcome::{resolve_answer, InvocationOutcome, RawCapture, FALLBACK_GREETING};
