use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Kind of schema object an index entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Table,
    Column,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Table => "TABLE",
            ItemType::Column => "COLUMN",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TABLE" => Ok(ItemType::Table),
            "COLUMN" => Ok(ItemType::Column),
            other => Err(format!("unknown item type '{}'", other)),
        }
    }
}

/// One row of the schema index: a table, or a (table, column) pair, with its
/// embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIndexEntry {
    pub item_type: ItemType,
    pub table_name: String,
    pub column_name: Option<String>,
    pub embedding: Vec<f32>,
}

/// A nearest-neighbour result returned by a [`crate::schema_index::SchemaIndex`]
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaHit {
    pub item_type: ItemType,
    pub table_name: String,
    pub column_name: Option<String>,
    /// Cosine distance to the query vector
    pub distance: f64,
}

/// A user question, trimmed and known to be non-empty.
///
/// It is only ever used as an opaque retrieval and generation key and is
/// never interpolated into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    pub fn new(text: impl AsRef<str>) -> Result<Self, PipelineError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PipelineError::invalid_question("a pergunta não pode ser vazia"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short textual summary of the retrieved schema, e.g. `"vendas(produto, valor); clientes"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaContext(String);

impl SchemaContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single-line SQL extracted from a completion, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql(String);

impl GeneratedSql {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneratedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered column-name → value mapping for one result row.
///
/// Column order is the order the database returned them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow(Map<String, Value>);

impl ResultRow {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ResultRow {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Rows in the order the database returned them
pub type ResultSet = Vec<ResultRow>;

/// Response of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub sql: String,
    pub resultado: ResultSet,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resposta: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_is_trimmed_and_non_empty() {
        assert_eq!(Question::new("  Quantas vendas?  ").unwrap().as_str(), "Quantas vendas?");
        assert!(matches!(
            Question::new("   "),
            Err(PipelineError::InvalidQuestion { .. })
        ));
    }

    #[test]
    fn result_row_keeps_column_order() {
        let row: ResultRow = vec![
            ("zeta", json!(1)),
            ("alfa", json!("a")),
            ("meio", Value::Null),
        ]
        .into_iter()
        .collect();

        let serialized = serde_json::to_string(&row).unwrap();
        assert_eq!(serialized, r#"{"zeta":1,"alfa":"a","meio":null}"#);
    }

    #[test]
    fn answer_response_omits_missing_resposta() {
        let response = AnswerResponse {
            sql: "SELECT 1 LIMIT 100".to_string(),
            resultado: vec![],
            resposta: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"sql": "SELECT 1 LIMIT 100", "resultado": []}));
    }

    #[test]
    fn item_type_parses_case_insensitively() {
        assert_eq!("column".parse::<ItemType>().unwrap(), ItemType::Column);
        assert_eq!(ItemType::Table.to_string(), "TABLE");
        assert!("VIEW".parse::<ItemType>().is_err());
    }
}
