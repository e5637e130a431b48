use anyhow::Context;
use clap::Parser;
use perguntas_api::config::{ApiConfig, LoggingConfig};
use perguntas_api::{logging, startup};
use perguntas_core::refresh;
use std::path::PathBuf;

/// Rebuilds the schema index from `information_schema`
#[derive(Parser)]
#[command(name = "refresh-schema")]
#[command(about = "Re-embed every table and column into the schema index", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file, read instead of the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database schema to introspect (overrides schema_index.schema)
    #[arg(short, long)]
    schema: Option<String>,

    /// Documents per embedding request (overrides schema_index.batch_size)
    #[arg(short, long)]
    batch_size: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ApiConfig::load_from(&[path.clone()], None, |name| std::env::var(name).ok()),
        None => ApiConfig::load(),
    }
    .context("Failed to load configuration")?;

    let log_config = if cli.verbose {
        LoggingConfig {
            level: "debug".to_string(),
            ..config.logging.clone()
        }
    } else {
        config.logging.clone()
    };
    let _log_guards = logging::init(&log_config);

    if let Some(schema) = cli.schema {
        config.schema_index.schema = schema;
    }
    if let Some(batch_size) = cli.batch_size {
        config.schema_index.batch_size = batch_size;
    }
    config
        .schema_index
        .validate()
        .context("Invalid schema index settings")?;

    let embedder = startup::build_openai_client(&config.openai)?;
    let index = startup::connect_schema_index(&config.database).await?;

    let summary = refresh::refresh_schema(
        &index,
        &embedder,
        &config.schema_index,
        config.pipeline.embedding_dimension,
    )
    .await
    .context("Schema refresh failed")?;

    tracing::info!(
        schema = %config.schema_index.schema,
        tables = summary.tables,
        columns = summary.columns,
        entries = summary.entries,
        duration_ms = summary.duration_ms,
        "Schema index refreshed"
    );

    Ok(())
}
