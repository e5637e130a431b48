pub mod health;
pub mod perguntar;

use actix_web::{error, web, HttpRequest};

use crate::error::ApiError;

/// Malformed or missing JSON bodies get the same plain-text 400 as
/// pipeline rejections
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
        ApiError::BadRequest(err.to_string()).into()
    })
}
