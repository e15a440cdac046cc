pub mod csv;
pub mod json;

pub use csv::*;
pub use json::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
