use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Berufeanalyzer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// OpenAI-compatible chat completions endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// ESCO taxonomy API root.
pub const DEFAULT_ESCO_URL: &str = "https://ec.europa.eu/esco/api";

/// Models offered by the CLI, cheapest first.
pub const SUPPORTED_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o"];

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Taxonomy lookup language. Labels missing in this language fall back to "en".
pub const DEFAULT_LANGUAGE: &str = "de";

/// HTTP timeout for gateway calls (seconds).
pub const GATEWAY_TIMEOUT_SECS: u64 = 120;

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Source documents folder.
pub fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Converted markdown cache + export output folder.
pub fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}
