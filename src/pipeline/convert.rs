use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Converter produced no output for {0}")]
    EmptyOutput(PathBuf),

    #[error("Converter backend failed: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document-to-markdown conversion abstraction. PDF extraction backends plug
/// in behind this trait; the core treats conversion as an external capability.
pub trait DocumentConverter {
    fn convert(&self, source: &Path) -> Result<String, ConvertError>;
}

/// Built-in backend: reads `.md` sources verbatim.
pub struct MarkdownReader;

impl DocumentConverter for MarkdownReader {
    fn convert(&self, source: &Path) -> Result<String, ConvertError> {
        let is_markdown = source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        if !is_markdown {
            return Err(ConvertError::UnsupportedFormat(source.to_path_buf()));
        }
        let text = fs::read_to_string(source)?;
        if text.trim().is_empty() {
            return Err(ConvertError::EmptyOutput(source.to_path_buf()));
        }
        Ok(text)
    }
}

/// Path of the conversion cache file for a source document.
pub fn cache_path(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{stem}.md"))
}

/// Convert a source document to markdown, reusing the filename-keyed cache.
///
/// A cache hit must not re-invoke the converter and yields byte-identical
/// downstream text. On a miss the converter output is written to the cache
/// before use; a failed cache write is logged but does not fail conversion.
pub fn cached_convert(
    source: &Path,
    output_dir: &Path,
    converter: &dyn DocumentConverter,
) -> Result<String, ConvertError> {
    let cached = cache_path(source, output_dir);
    if cached.is_file() {
        tracing::info!(path = %cached.display(), "Using existing converted markdown");
        return Ok(fs::read_to_string(&cached)?);
    }

    let text = converter.convert(source)?;
    if let Err(e) = fs::write(&cached, &text) {
        tracing::warn!(path = %cached.display(), error = %e, "Could not write conversion cache");
    } else {
        tracing::info!(path = %cached.display(), "Converted markdown written");
    }
    Ok(text)
}
