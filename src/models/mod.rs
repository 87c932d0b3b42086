// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    relative_label, Coordinate, HistoryEntry, KidsMenu, Locatable, NamedLocation,
    NewHistoryEntry, PriceRange, Restaurant, RestaurantFacilities, CURRENT_LOCATION_LABEL,
};
pub use requests::{HistoryQuery, SearchRequest};
pub use responses::{
    AreasResponse, ErrorResponse, HealthResponse, HistoryItem, HistoryResponse,
    RankedRestaurant, SearchResponse, SessionResponse,
};
