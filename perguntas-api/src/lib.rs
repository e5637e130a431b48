use actix_web::web;

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod startup;

/// Registers every route. The caller supplies the pipeline as
/// `web::Data<Arc<Pipeline>>`.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .service(handlers::perguntar::perguntar)
        .service(handlers::health::health);
}
