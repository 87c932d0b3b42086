use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

use super::{error_response, AppState};
use crate::core::{
    resolve_location, RankingOptions, SearchError, SearchSession, SearchTicket, SessionState,
};
use crate::models::{
    AreasResponse, HealthResponse, NamedLocation, NewHistoryEntry, RankedRestaurant, Restaurant,
    SearchRequest, SearchResponse, SessionResponse,
};
use crate::services::SessionRegistry;

/// Configure search-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/areas", web::get().to(list_areas))
        .route("/search", web::post().to(search))
        .route("/sessions/{id}", web::get().to(get_session))
        .route("/sessions/{id}", web::delete().to(reset_session));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// GET /api/v1/areas
async fn list_areas(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(AreasResponse {
        areas: state.areas.areas().to_vec(),
    })
}

/// Where the state of one search lives while the request runs
enum Tracker<'a> {
    Shared { registry: &'a SessionRegistry, id: String },
    Local(SearchSession<Restaurant>),
}

impl Tracker<'_> {
    fn begin(&mut self) -> SearchTicket {
        match self {
            Tracker::Shared { registry, id } => registry.begin(id),
            Tracker::Local(session) => session.begin(),
        }
    }

    fn resolved(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<NamedLocation, SearchError>,
    ) -> bool {
        match self {
            Tracker::Shared { registry, id } => registry.resolved(id, ticket, outcome),
            Tracker::Local(session) => session.resolved(ticket, outcome),
        }
    }

    fn complete(
        &mut self,
        ticket: SearchTicket,
        fetched: Result<Vec<Restaurant>, SearchError>,
        options: RankingOptions,
    ) -> Option<SessionState<Restaurant>> {
        match self {
            Tracker::Shared { registry, id } => registry.complete(id, ticket, fetched, options),
            Tracker::Local(session) => session
                .complete(ticket, fetched, options)
                .then(|| session.state().clone()),
        }
    }

    fn session_id(&self) -> Option<String> {
        match self {
            Tracker::Shared { id, .. } => Some(id.clone()),
            Tracker::Local(_) => None,
        }
    }
}

/// Search endpoint
///
/// POST /api/v1/search
///
/// Request body:
/// ```json
/// {
///   "location": { "type": "query", "query": "新宿" },
///   "radiusKm": 5.0,
///   "sessionId": "string"
/// }
/// ```
async fn search(state: web::Data<AppState>, req: web::Json<SearchRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let req = req.into_inner();

    let mut tracker = match req.session_id.clone() {
        Some(id) => Tracker::Shared { registry: state.sessions.as_ref(), id },
        None => Tracker::Local(SearchSession::new()),
    };

    let ticket = tracker.begin();
    let resolution = resolve_location(&req.location, &state.areas);
    let location = resolution.clone();
    tracker.resolved(ticket, resolution);

    let location = match location {
        Ok(location) => location,
        Err(e) => {
            tracing::info!("Could not resolve search location: {}", e);
            return search_error_response(&e);
        }
    };

    tracing::info!(
        "Searching around {} ({}, {})",
        location.name,
        location.latitude,
        location.longitude
    );

    // History is best-effort; the search continues without it
    let entry = NewHistoryEntry::for_location(&location, Utc::now());
    if let Err(e) = state.store.record_search(&entry).await {
        tracing::warn!("Failed to record search history for {}: {}", location.name, e);
    }

    let fetched = state.store.fetch_restaurants().await.map_err(|e| {
        tracing::error!("Failed to fetch restaurants: {}", e);
        SearchError::FetchFailed(e.to_string())
    });

    let radius_km = req
        .radius_km
        .or_else(|| req.within_radius.then_some(state.search.default_radius_km));
    let options = RankingOptions {
        radius_km,
        limit: state.search.result_limit,
    };

    let outcome = match tracker.complete(ticket, fetched, options) {
        Some(outcome) => outcome,
        None => {
            tracing::info!(
                "Search for {} superseded in session {:?}",
                location.name,
                tracker.session_id()
            );
            return error_response(
                StatusCode::CONFLICT,
                "Search superseded",
                "A newer search was started in this session",
            );
        }
    };

    match outcome {
        SessionState::Ranked { location, venues } => {
            let restaurants: Vec<RankedRestaurant> =
                venues.into_iter().map(RankedRestaurant::from).collect();

            tracing::info!("Returning {} restaurants near {}", restaurants.len(), location.name);

            HttpResponse::Ok().json(SearchResponse {
                session_id: tracker.session_id(),
                total_results: restaurants.len(),
                location,
                restaurants,
            })
        }
        SessionState::Failed { error } => search_error_response(&error),
        other => {
            tracing::error!("Search ended in unexpected state {}", other.name());
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Search failed",
                "Search ended in an unexpected state",
            )
        }
    }
}

fn search_error_response(error: &SearchError) -> HttpResponse {
    match error {
        SearchError::NoMatch(_) => {
            error_response(StatusCode::NOT_FOUND, "Area not found", error.to_string())
        }
        SearchError::LocationUnavailable(_) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Location unavailable",
            error.to_string(),
        ),
        SearchError::FetchFailed(_) => error_response(
            StatusCode::BAD_GATEWAY,
            "Failed to fetch restaurants",
            error.to_string(),
        ),
    }
}

/// GET /api/v1/sessions/{id}
async fn get_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    match state.sessions.snapshot(&id) {
        Some((generation, session_state)) => {
            HttpResponse::Ok().json(SessionResponse::from_state(id, generation, &session_state))
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            "Session not found",
            format!("No search has been made in session {}", id),
        ),
    }
}

/// DELETE /api/v1/sessions/{id}
///
/// Returns the session to idle; searches still in flight are discarded.
async fn reset_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    if state.sessions.reset(&id) {
        HttpResponse::NoContent().finish()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            "Session not found",
            format!("No search has been made in session {}", id),
        )
    }
}
