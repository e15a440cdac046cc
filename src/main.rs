use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use berufeanalyzer::config;
use berufeanalyzer::llm::OpenAiClient;
use berufeanalyzer::pipeline::{LogSink, MarkdownReader, Pipeline};
use berufeanalyzer::taxonomy::EscoClient;

/// Extracts Lernfelder, time allocations and learning objectives from
/// vocational curricula and enriches them with ESCO data.
#[derive(Parser, Debug)]
#[command(name = config::APP_NAME, version = config::APP_VERSION, about)]
struct Args {
    /// Folder containing the source documents (.pdf, .md; recursive).
    #[arg(long, default_value_os_t = config::default_data_dir())]
    data: PathBuf,

    /// Folder for converted markdown and the JSON/CSV exports.
    #[arg(long, default_value_os_t = config::default_output_dir())]
    output: PathBuf,

    /// Generation model.
    #[arg(
        long,
        default_value = config::DEFAULT_MODEL,
        value_parser = clap::builder::PossibleValuesParser::new(config::SUPPORTED_MODELS.iter().copied())
    )]
    model: String,

    /// Preferred taxonomy label language.
    #[arg(long, default_value = config::DEFAULT_LANGUAGE)]
    language: String,

    /// ESCO API root URL.
    #[arg(long, default_value = config::DEFAULT_ESCO_URL)]
    esco_url: String,

    /// OpenAI-compatible API root URL.
    #[arg(long, default_value = config::DEFAULT_OPENAI_URL)]
    openai_url: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        tracing::error!(error = %e, "Run aborted");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| "OPENAI_API_KEY is not set")?;

    let generator = OpenAiClient::new(&args.openai_url, &api_key, config::GATEWAY_TIMEOUT_SECS);
    let taxonomy = EscoClient::new(&args.esco_url, &args.language, config::GATEWAY_TIMEOUT_SECS);
    let pipeline = Pipeline::new(
        &generator,
        &taxonomy,
        &MarkdownReader,
        &LogSink,
        args.output.clone(),
        args.model.clone(),
    );

    let summary = pipeline.run_batch(&args.data)?;
    for outcome in &summary.outcomes {
        println!(
            "{}: {} Lernziele -> {}",
            outcome.source.display(),
            outcome.objectives,
            outcome.json_path.display()
        );
    }
    println!(
        "{} verarbeitet, {} fehlgeschlagen",
        summary.processed(),
        summary.failed
    );
    if summary.failed > 0 && summary.processed() == 0 {
        return Err("no document could be processed".into());
    }
    Ok(())
}
