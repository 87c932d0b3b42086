// Route exports
pub mod history;
pub mod search;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;

use crate::config::SearchSettings;
use crate::core::AreaCatalog;
use crate::models::ErrorResponse;
use crate::services::{SessionRegistry, VenueStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VenueStore>,
    pub areas: Arc<AreaCatalog>,
    pub sessions: Arc<SessionRegistry>,
    pub search: SearchSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(search::configure)
            .configure(history::configure),
    );
}

pub(crate) fn error_response(
    status: StatusCode,
    error: &str,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}
