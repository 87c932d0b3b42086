use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use family_dining::config::{LoggingSettings, Settings};
use family_dining::routes::{self, AppState};
use family_dining::services::{SessionRegistry, SupabaseClient, SupabaseTables, VenueStore};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// LOG_LEVEL / LOG_FORMAT take precedence over the configured values
fn init_logging(logging: Option<&LoggingSettings>) {
    let log_level = std::env::var("LOG_LEVEL")
        .ok()
        .or_else(|| logging.map(|l| l.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .or_else(|| logging.map(|l| l.format.clone()))
        .unwrap_or_else(|| "compact".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    match log_format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.compact().init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    init_logging(settings.as_ref().ok().map(|s| &s.logging));

    info!("Starting family dining search service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    info!("Configuration loaded successfully");

    let tables = SupabaseTables {
        restaurants: settings.store.restaurants_table.clone(),
        search_history: settings.store.history_table.clone(),
    };

    let store: Arc<dyn VenueStore> = Arc::new(
        SupabaseClient::new(
            settings.store.url.clone(),
            settings.store.api_key.clone(),
            tables,
            settings.request_timeout(),
        )
        .map_err(|e| {
            error!("Failed to create store client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e)
        })?,
    );

    match store.health_check().await {
        Ok(true) => info!("Connected to restaurant store at {}", settings.store.url),
        Ok(false) => error!(
            "Restaurant store at {} rejected the connection check",
            settings.store.url
        ),
        Err(e) => error!("Restaurant store at {} is unreachable: {}", settings.store.url, e),
    }

    let areas = Arc::new(settings.area_catalog());

    info!("Loaded {} popular areas", areas.len());

    let app_state = AppState {
        store,
        areas,
        sessions: Arc::new(SessionRegistry::with_limits(
            settings.search.max_sessions,
            settings.search.session_ttl(),
        )),
        search: settings.search.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
