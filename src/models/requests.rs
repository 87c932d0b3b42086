use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::LocationRequest;

/// Request to search restaurants around a location
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    pub location: LocationRequest,
    /// Only keep restaurants within this many kilometers
    #[validate(range(min = 0.0))]
    #[serde(default, rename = "radiusKm")]
    pub radius_km: Option<f64>,
    /// Apply the configured default radius when no explicit radius is given
    #[serde(default, rename = "withinRadius")]
    pub within_radius: bool,
    /// Client session; a newer search in the same session supersedes older ones
    #[validate(length(min = 1, max = 128))]
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Query string for the history listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}
