//! # Perguntas Core
//!
//! Answers Portuguese questions about a Postgres database with read-only SQL.
//!
//! A question goes through five stages, each usable on its own:
//!
//! 1. [`retriever::SchemaRetriever`] embeds the question and summarises the
//!    closest tables and columns from a [`schema_index::SchemaIndex`].
//! 2. [`synthesizer::SqlSynthesizer`] asks a language model for one SELECT.
//! 3. [`validator::SafetyValidator`] rejects anything that is not a single,
//!    non-mutating SELECT and bounds its row count.
//! 4. [`executor::QueryExecutor`] runs it on a read-only connection under a
//!    deadline.
//! 5. [`formatter::AnswerFormatter`] optionally renders the rows as a sentence.
//!
//! [`pipeline::Pipeline`] wires them together. [`refresh`] rebuilds the
//! schema index from `information_schema`.

pub mod config;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod pipeline;
pub mod refresh;
pub mod retriever;
pub mod schema_index;
pub mod synthesizer;
pub mod types;
pub mod validator;

pub use config::{PipelineConfig, SchemaIndexConfig};
pub use error::{PipelineError, SchemaIndexError};
pub use pipeline::Pipeline;
pub use types::{AnswerResponse, ResultRow, ResultSet};
