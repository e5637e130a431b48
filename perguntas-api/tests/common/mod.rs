#![allow(dead_code)]

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use async_trait::async_trait;
use perguntas_core::config::PipelineConfig;
use perguntas_core::error::PipelineError;
use perguntas_core::executor::{ConnectionSource, ReadOnlyConnection};
use perguntas_core::schema_index::InMemorySchemaIndex;
use perguntas_core::types::{ItemType, ResultRow, ResultSet, SchemaIndexEntry};
use perguntas_core::Pipeline;
use perguntas_llm_sdk::client::{EmbeddingClient, LlmClient};
use perguntas_llm_sdk::error::LlmError;
use perguntas_llm_sdk::types::{
    CompletionRequest, CompletionResponse, ContentBlock, EmbeddingRequest, EmbeddingResponse,
    Role, Usage,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Every text embeds to the same unit vector, so retrieval returns the
/// index in insertion order
pub struct ConstantEmbedder;

#[async_trait]
impl EmbeddingClient for ConstantEmbedder {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, LlmError> {
        Ok(EmbeddingResponse {
            model: request.model,
            embeddings: request.input.iter().map(|_| vec![1.0, 0.0]).collect(),
            usage: Usage::default(),
        })
    }

    fn provider_name(&self) -> &str {
        "test"
    }

    fn model_name(&self) -> &str {
        "constant"
    }
}

/// Returns the same completion on every call, or a 503 when unavailable
pub struct MockLlmClient {
    response: Option<String>,
}

impl MockLlmClient {
    pub fn answering(text: &str) -> Self {
        Self {
            response: Some(text.to_string()),
        }
    }

    pub fn unavailable() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let text = self
            .response
            .clone()
            .ok_or_else(|| LlmError::api_error(503, "model unavailable".to_string()))?;
        Ok(CompletionResponse {
            content: vec![ContentBlock::Text { text }],
            role: Role::Assistant,
            usage: Usage::default(),
            stop_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "test"
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Hands out connections that answer every statement with the same rows,
/// recording what ran
#[derive(Clone, Default)]
pub struct StaticConnections {
    rows: ResultSet,
    pub executed: Arc<Mutex<Vec<String>>>,
}

impl StaticConnections {
    pub fn new(rows: ResultSet) -> Self {
        Self {
            rows,
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionSource for StaticConnections {
    async fn acquire(&self) -> Result<Box<dyn ReadOnlyConnection>, PipelineError> {
        Ok(Box::new(StaticConnection {
            rows: self.rows.clone(),
            executed: self.executed.clone(),
        }))
    }
}

struct StaticConnection {
    rows: ResultSet,
    executed: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ReadOnlyConnection for StaticConnection {
    async fn fetch_rows(
        &mut self,
        sql: &str,
        _timeout: Duration,
    ) -> Result<ResultSet, PipelineError> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(self.rows.clone())
    }

    fn release(self: Box<Self>) {}

    fn discard(self: Box<Self>) {}
}

pub fn row(pairs: &[(&str, Value)]) -> ResultRow {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

fn sales_index() -> Arc<InMemorySchemaIndex> {
    let index = InMemorySchemaIndex::new(2);
    index
        .replace_all(vec![
            SchemaIndexEntry {
                item_type: ItemType::Table,
                table_name: "vendas".to_string(),
                column_name: None,
                embedding: vec![1.0, 0.0],
            },
            SchemaIndexEntry {
                item_type: ItemType::Column,
                table_name: "vendas".to_string(),
                column_name: Some("produto".to_string()),
                embedding: vec![1.0, 0.0],
            },
        ])
        .unwrap();
    Arc::new(index)
}

pub fn pipeline_with(
    llm: MockLlmClient,
    connections: StaticConnections,
    config: PipelineConfig,
) -> Arc<Pipeline> {
    Arc::new(Pipeline::new(
        &config,
        Arc::new(llm),
        Arc::new(ConstantEmbedder),
        sales_index(),
        Arc::new(connections),
    ))
}

pub async fn setup_test_app(
    pipeline: Arc<Pipeline>,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pipeline))
            .configure(perguntas_api::routes),
    )
    .await
}
