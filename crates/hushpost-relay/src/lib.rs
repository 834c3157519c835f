//! Streaming suggestion relay.
//!
//! Forwards a single prompt to an OpenAI-compatible chat completion endpoint
//! in streaming mode and re-emits each text delta as soon as it is decoded.
//! Nothing is kept between calls.

pub mod client;
pub mod prompt;
pub mod sse;

pub use client::{RelayConfig, RelayError, SuggestionRelay, SuggestionStream};
