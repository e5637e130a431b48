use actix_web::{web, App, HttpServer};
use anyhow::Context;
use perguntas_api::config::ApiConfig;
use perguntas_api::{logging, routes, startup};
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load().context("Failed to load configuration")?;
    let _log_guards = logging::init(&config.logging);

    let pipeline = Arc::new(startup::build_pipeline(&config).await?);

    let bind_addr = config.bind_address();
    info!("Starting perguntas-api server at http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pipeline.clone()))
            .configure(routes)
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
