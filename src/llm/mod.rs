pub mod client;

pub use client::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Cannot reach the generation service at {0}")]
    Connection(String),

    #[error("Generation service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed generation response: {0}")]
    ResponseParsing(String),

    #[error("Generation failed after {0} attempts")]
    Exhausted(usize),
}
