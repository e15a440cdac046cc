pub mod builder;
pub mod convert;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod reconcile;

pub use builder::*;
pub use convert::*;
pub use orchestrator::*;
pub use parser::*;
pub use prompts::*;
pub use reconcile::*;

use thiserror::Error;

use crate::export::ExportError;
use crate::llm::GenerationError;

/// Stage-level failure of one document's pipeline run. Absorbed by the
/// batch driver: the document is dropped, the batch continues.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Response unusable: {0}")]
    Parse(#[from] ParseError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
