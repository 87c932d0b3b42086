//! Family Dining - nearest family-friendly restaurant search
//!
//! This library provides the distance engine, area resolution and search
//! session handling behind the family dining service. Restaurant data and
//! search history live in a hosted database reached through [`services`].

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance_km, filter_within_radius, format_distance, rank_by_distance, AreaCatalog, Ranked,
    SearchError, SearchSession,
};
pub use crate::models::{Coordinate, Locatable, NamedLocation, Restaurant};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let catalog = AreaCatalog::default();
        let origin = catalog.match_query("新宿").unwrap().coordinate();
        assert_eq!(distance_km(origin, origin), 0.0);
    }
}
