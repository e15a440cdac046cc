pub mod client;

pub use client::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Cannot reach the taxonomy service at {0}")]
    Connection(String),

    #[error("Taxonomy service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed taxonomy response: {0}")]
    ResponseParsing(String),
}
