use anyhow::Context;
use perguntas_core::executor::postgres::PgConnectionSource;
use perguntas_core::refresh;
use perguntas_core::schema_index::PgSchemaIndex;
use perguntas_core::Pipeline;
use perguntas_llm_sdk::openai::OpenAIClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{ApiConfig, DatabaseConfig, OpenAIConfig};

pub fn build_openai_client(config: &OpenAIConfig) -> anyhow::Result<OpenAIClient> {
    let mut client = OpenAIClient::new(config.api_key.clone())
        .context("Failed to create OpenAI client")?
        .with_timeout(Duration::from_secs(config.request_timeout_seconds))
        .context("Failed to configure OpenAI HTTP client")?
        .with_chat_model(config.chat_model.clone())
        .with_embedding_model(config.embedding_model.clone());

    if let Some(base_url) = &config.base_url {
        client = client.with_base_url(base_url.clone());
    }
    Ok(client)
}

pub async fn connect_schema_index(config: &DatabaseConfig) -> anyhow::Result<PgSchemaIndex> {
    PgSchemaIndex::connect(
        &config.url,
        config.max_connections,
        Duration::from_secs(config.acquire_timeout_seconds),
    )
    .await
    .context("Failed to connect to the schema index database")
}

/// Connects both pools, prepares the schema index, and assembles the
/// pipeline. With `schema_index.refresh_on_startup`, an empty index is
/// filled before the server accepts requests.
pub async fn build_pipeline(config: &ApiConfig) -> anyhow::Result<Pipeline> {
    let openai = Arc::new(build_openai_client(&config.openai)?);

    let index = connect_schema_index(&config.database).await?;
    let dimension = config.pipeline.embedding_dimension;

    if config.schema_index.refresh_on_startup {
        match refresh::refresh_if_empty(&index, openai.as_ref(), &config.schema_index, dimension)
            .await
            .context("Failed to populate the schema index")?
        {
            Some(summary) => info!(
                tables = summary.tables,
                columns = summary.columns,
                entries = summary.entries,
                duration_ms = summary.duration_ms,
                "Schema index populated"
            ),
            None => info!("Schema index already populated"),
        }
    } else {
        index
            .ensure_table(dimension)
            .await
            .context("Failed to prepare the schema index table")?;
    }

    let connections = PgConnectionSource::connect(
        &config.database.readonly_url,
        config.database.max_connections,
        Duration::from_secs(config.database.acquire_timeout_seconds),
    )
    .await
    .context("Failed to connect with the read-only credentials")?;

    Ok(Pipeline::new(
        &config.pipeline,
        openai.clone(),
        openai,
        Arc::new(index),
        Arc::new(connections),
    ))
}
