#![allow(dead_code)]

use async_trait::async_trait;
use perguntas_core::error::PipelineError;
use perguntas_core::executor::{ConnectionSource, ReadOnlyConnection};
use perguntas_core::schema_index::InMemorySchemaIndex;
use perguntas_core::types::{ItemType, ResultRow, ResultSet, SchemaIndexEntry};
use perguntas_llm_sdk::client::{EmbeddingClient, LlmClient};
use perguntas_llm_sdk::error::LlmError;
use perguntas_llm_sdk::types::{
    CompletionRequest, CompletionResponse, ContentBlock, EmbeddingRequest, EmbeddingResponse,
    Role, Usage,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const VOCABULARY: &[&str] = &[
    "venda", "produto", "quantidade", "valor", "data", "cliente", "nome", "estoque",
];

/// Bag-of-words embedding over [`VOCABULARY`]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|word| if lower.contains(word) { 1.0 } else { 0.0 })
            .collect()
    }
}

#[async_trait]
impl EmbeddingClient for KeywordEmbedder {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EmbeddingResponse {
            model: request.model,
            embeddings: request.input.iter().map(|t| Self::vector(t)).collect(),
            usage: Usage::default(),
        })
    }

    fn provider_name(&self) -> &str {
        "test"
    }

    fn model_name(&self) -> &str {
        "keywords"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingClient for FailingEmbedder {
    async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, LlmError> {
        Err(LlmError::api_error(503, "embedding service unavailable".to_string()))
    }

    fn provider_name(&self) -> &str {
        "test"
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Language model answering from a script, recording every prompt
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    pub prompts: Mutex<Vec<String>>,
    pub temperatures: Mutex<Vec<Option<f32>>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(sql: &str) -> Self {
        Self::new(vec![Ok(sql.to_string())])
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.messages.iter().map(|m| m.text_content()).collect());
        self.temperatures.lock().unwrap().push(request.temperature);

        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::internal("script exhausted")))?;

        Ok(CompletionResponse {
            content: vec![ContentBlock::Text { text: next }],
            role: Role::Assistant,
            usage: Usage::default(),
            stop_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "test"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// What the next statement run on a fake connection does
pub enum Script {
    Rows(ResultSet),
    Fail(String),
    ServerCancel,
    Hang,
}

#[derive(Default)]
pub struct ConnectionLog {
    pub opened: usize,
    pub idle: Vec<usize>,
    pub released: Vec<usize>,
    pub discarded: Vec<usize>,
    pub executed: Vec<(usize, String)>,
}

/// Connection pool fake: released connections are reused, discarded ones are
/// never handed out again
#[derive(Clone, Default)]
pub struct FakeConnections {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    pub log: Arc<Mutex<ConnectionLog>>,
}

impl FakeConnections {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            log: Arc::new(Mutex::new(ConnectionLog::default())),
        }
    }

    pub fn push(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn executed(&self) -> Vec<(usize, String)> {
        self.log.lock().unwrap().executed.clone()
    }
}

#[async_trait]
impl ConnectionSource for FakeConnections {
    async fn acquire(&self) -> Result<Box<dyn ReadOnlyConnection>, PipelineError> {
        let mut log = self.log.lock().unwrap();
        let id = match log.idle.pop() {
            Some(id) => id,
            None => {
                log.opened += 1;
                log.opened - 1
            }
        };
        Ok(Box::new(FakeConnection {
            id,
            scripts: self.scripts.clone(),
            log: self.log.clone(),
        }))
    }
}

struct FakeConnection {
    id: usize,
    scripts: Arc<Mutex<VecDeque<Script>>>,
    log: Arc<Mutex<ConnectionLog>>,
}

#[async_trait]
impl ReadOnlyConnection for FakeConnection {
    async fn fetch_rows(
        &mut self,
        sql: &str,
        timeout: Duration,
    ) -> Result<ResultSet, PipelineError> {
        self.log
            .lock()
            .unwrap()
            .executed
            .push((self.id, sql.to_string()));
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Rows(Vec::new()));

        match script {
            Script::Rows(rows) => Ok(rows),
            Script::Fail(message) => Err(PipelineError::query_execution(message)),
            Script::ServerCancel => Err(PipelineError::query_timeout(timeout.as_secs())),
            Script::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    fn release(self: Box<Self>) {
        let mut log = self.log.lock().unwrap();
        log.released.push(self.id);
        log.idle.push(self.id);
    }

    fn discard(self: Box<Self>) {
        self.log.lock().unwrap().discarded.push(self.id);
    }
}

pub fn row(pairs: &[(&str, Value)]) -> ResultRow {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

fn entry(table: &str, column: Option<&str>, text: &str) -> SchemaIndexEntry {
    SchemaIndexEntry {
        item_type: if column.is_some() {
            ItemType::Column
        } else {
            ItemType::Table
        },
        table_name: table.to_string(),
        column_name: column.map(str::to_string),
        embedding: KeywordEmbedder::vector(text),
    }
}

/// Index over a small sales schema, embedded with [`KeywordEmbedder`]
pub fn sales_index() -> Arc<InMemorySchemaIndex> {
    let index = InMemorySchemaIndex::new(VOCABULARY.len());
    index
        .replace_all(vec![
            entry("vendas", None, "vendas: id, produto, quantidade, valor_total, data"),
            entry("vendas", Some("produto"), "vendas.produto (text)"),
            entry("vendas", Some("quantidade"), "vendas.quantidade (integer)"),
            entry("vendas", Some("valor_total"), "vendas.valor_total (numeric)"),
            entry("vendas", Some("data"), "vendas.data (date)"),
            entry("clientes", None, "clientes: id, nome"),
            entry("clientes", Some("nome"), "clientes.nome (text)"),
            entry("estoque", None, "estoque: produto, quantidade"),
        ])
        .unwrap();
    Arc::new(index)
}
