//! # inferbridge
//!
//! OpenAI-compatible chat completions on top of a local LLM inference binary.
//!
//! The binary is run once per request with the prompt on its command line. Its
//! log-interleaved output is reduced to a clean answer, and streaming requests
//! receive that answer as paced SSE chunks.
//!
//! ## Modules
//!
//! - `extraction` - Answer and metric extraction from raw process output
//! - `inference` - Process invocation, outcome classification and fallbacks
//! - `streaming` - Word-group chunking and paced chunk streams
//! - `server` - axum router for `/v1/chat/completions`, `/v1/models`, `/health`
//! - `subprocess` - Process runner abstraction with a mock for tests
//! - `config` - Layered TOML/environment configuration
//! - `error` - Crate-wide error type and error codes
//! - `app` - Logging, startup and fatal error handling for the binary
pub mod app;
pub mod config;
pub mod error;
pub mod extraction;
pub mod inference;
pub mod server;
pub mod streaming;
pub mod subprocess;
