use serde::{Deserialize, Serialize};

use crate::core::format_distance;
use crate::core::{Ranked, SessionState};
use crate::models::domain::{HistoryEntry, NamedLocation, Restaurant};

/// Restaurant as shown in a result list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRestaurant {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub distance: f64,
    #[serde(rename = "distanceLabel")]
    pub distance_label: String,
    #[serde(rename = "mapsUrl")]
    pub maps_url: String,
}

impl From<Ranked<Restaurant>> for RankedRestaurant {
    fn from(ranked: Ranked<Restaurant>) -> Self {
        let maps_url = ranked.venue.maps_url();
        Self {
            distance_label: format_distance(ranked.distance),
            distance: ranked.distance,
            maps_url,
            restaurant: ranked.venue,
        }
    }
}

/// Response for the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    pub location: NamedLocation,
    pub restaurants: Vec<RankedRestaurant>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
}

/// Visible state of a client session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub state: String,
    pub generation: u64,
    pub location: Option<NamedLocation>,
    pub restaurants: Vec<RankedRestaurant>,
    pub error: Option<String>,
}

impl SessionResponse {
    pub fn from_state(
        session_id: String,
        generation: u64,
        state: &SessionState<Restaurant>,
    ) -> Self {
        let mut response = Self {
            session_id,
            state: state.name().to_string(),
            generation,
            location: None,
            restaurants: Vec::new(),
            error: None,
        };

        match state {
            SessionState::Querying { location } => response.location = Some(location.clone()),
            SessionState::Ranked { location, venues } => {
                response.location = Some(location.clone());
                response.restaurants = venues.iter().cloned().map(RankedRestaurant::from).collect();
            }
            SessionState::NotFound { query } => {
                response.error = Some(format!("no known area matches \"{}\"", query));
            }
            SessionState::Failed { error } => response.error = Some(error.to_string()),
            SessionState::Idle | SessionState::Resolving => {}
        }

        response
    }
}

/// Popular areas offered as shortcuts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreasResponse {
    pub areas: Vec<NamedLocation>,
}

/// History entry with a display label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    #[serde(rename = "relativeTime")]
    pub relative_time: String,
}

/// Response for the history listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryItem>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
