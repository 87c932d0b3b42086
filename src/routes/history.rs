use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

use super::{error_response, AppState};
use crate::models::{HistoryItem, HistoryQuery, HistoryResponse};
use crate::services::StoreError;

/// Configure search history routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/history", web::get().to(list_history))
        .route("/history/{id}", web::delete().to(delete_history));
}

/// GET /api/v1/history?limit={n}
///
/// Most recent searches first, each with a relative time label.
async fn list_history(
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let limit = query.limit.unwrap_or(state.search.history_limit);

    match state.store.recent_searches(limit).await {
        Ok(entries) => {
            let now = Utc::now();
            let history = entries
                .into_iter()
                .map(|entry| HistoryItem {
                    relative_time: entry.relative_label(now),
                    entry,
                })
                .collect();

            HttpResponse::Ok().json(HistoryResponse { history })
        }
        Err(e) => {
            tracing::error!("Failed to fetch search history: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to fetch search history", e.to_string())
        }
    }
}

/// DELETE /api/v1/history/{id}
async fn delete_history(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    match state.store.delete_search(&id).await {
        Ok(()) => {
            tracing::debug!("Deleted history entry {}", id);
            HttpResponse::NoContent().finish()
        }
        Err(StoreError::NotFound(message)) => {
            error_response(StatusCode::NOT_FOUND, "History entry not found", message)
        }
        Err(e) => {
            tracing::error!("Failed to delete history entry {}: {}", id, e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to delete history entry", e.to_string())
        }
    }
}
