// Core algorithm exports
pub mod areas;
pub mod distance;
pub mod locate;
pub mod session;

pub use areas::AreaCatalog;
pub use distance::{
    distance_km, filter_within_radius, format_distance, rank_by_distance, Ranked,
    DEFAULT_RADIUS_KM,
};
pub use locate::{
    resolve_location, DeviceLocator, GeolocationError, GeolocationProvider, LocationRequest,
    PositionFix, PositionOptions,
};
pub use session::{
    RankingOptions, SearchError, SearchSession, SearchTicket, SessionState, DEFAULT_RESULT_LIMIT,
};
