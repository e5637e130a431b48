use actix_web::{post, web, HttpResponse};
use perguntas_core::Pipeline;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::models::QuestionRequest;

/// Answers one question. 200 with `{sql, resultado, resposta?}`, otherwise
/// the error message as plain text.
#[post("/perguntar")]
pub async fn perguntar(
    pipeline: web::Data<Arc<Pipeline>>,
    req: web::Json<QuestionRequest>,
) -> Result<HttpResponse, ApiError> {
    info!(chars = req.pergunta.chars().count(), "Received question");

    let response = pipeline.ask(&req.pergunta).await?;
    Ok(HttpResponse::Ok().json(response))
}
