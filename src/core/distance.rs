use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, Locatable};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius used when a caller asks for radius filtering without a value
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// Out of range or non-finite inputs are not rejected; they simply produce
/// whatever the formula yields, NaN included.
#[inline]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Render a distance for display
///
/// Below one kilometer the value is shown in whole meters ("450m"),
/// otherwise in kilometers with one decimal ("12.3km"). Halves round up.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round())
    } else {
        format!("{:.1}km", (km * 10.0).round() / 10.0)
    }
}

/// A venue annotated with its distance from the search origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked<V> {
    #[serde(flatten)]
    pub venue: V,
    pub distance: f64,
}

/// Annotate every venue with its distance from `origin` and sort nearest first
///
/// The sort is stable, so venues at equal distance keep their input order.
/// NaN distances (malformed coordinates) go to the end instead of failing
/// the batch. Nothing is truncated here.
pub fn rank_by_distance<V, I>(venues: I, origin: Coordinate) -> Vec<Ranked<V>>
where
    V: Locatable,
    I: IntoIterator<Item = V>,
{
    let mut ranked: Vec<Ranked<V>> = venues
        .into_iter()
        .map(|venue| {
            let distance = distance_km(origin, venue.coordinate());
            Ranked { venue, distance }
        })
        .collect();

    ranked.sort_by(|a, b| compare_distance(a.distance, b.distance));

    ranked
}

/// Keep the venues whose distance from `origin` is at most `radius_km`
///
/// The boundary is inclusive and the input order is preserved.
pub fn filter_within_radius<V, I>(venues: I, origin: Coordinate, radius_km: f64) -> Vec<V>
where
    V: Locatable,
    I: IntoIterator<Item = V>,
{
    venues
        .into_iter()
        .filter(|venue| distance_km(origin, venue.coordinate()) <= radius_km)
        .collect()
}

#[inline]
fn compare_distance(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Spot {
        id: &'static str,
        at: Coordinate,
    }

    impl Locatable for Spot {
        fn coordinate(&self) -> Coordinate {
            self.at
        }
    }

    fn spot(id: &'static str, latitude: f64, longitude: f64) -> Spot {
        Spot { id, at: Coordinate::new(latitude, longitude) }
    }

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let london = Coordinate::new(51.5074, -0.1278);
        let paris = Coordinate::new(48.8566, 2.3522);

        let distance = distance_km(london, paris);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_antimeridian_and_antipodes() {
        let west = Coordinate::new(0.0, 179.5);
        let east = Coordinate::new(0.0, -179.5);
        assert!((distance_km(west, east) - 111.19).abs() < 0.5);

        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        let antipode = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((antipode - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.45), "450m");
        assert_eq!(format_distance(0.0), "0m");
        assert_eq!(format_distance(1.0), "1.0km");
        assert_eq!(format_distance(12.34), "12.3km");
        assert_eq!(format_distance(2.25), "2.3km");
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let origin = Coordinate::new(35.0, 139.0);
        let venues = vec![
            spot("far", 35.1, 139.0),
            spot("tie-a", 35.01, 139.0),
            spot("tie-b", 35.01, 139.0),
            spot("here", 35.0, 139.0),
        ];

        let ranked = rank_by_distance(venues, origin);
        let ids: Vec<_> = ranked.iter().map(|r| r.venue.id).collect();

        assert_eq!(ids, vec!["here", "tie-a", "tie-b", "far"]);
        assert_eq!(ranked[0].distance, 0.0);
    }

    #[test]
    fn test_rank_sends_nan_last() {
        let origin = Coordinate::new(35.0, 139.0);
        let venues = vec![spot("bad", f64::NAN, 139.0), spot("ok", 35.2, 139.0)];

        let ranked = rank_by_distance(venues, origin);

        assert_eq!(ranked[0].venue.id, "ok");
        assert!(ranked[1].distance.is_nan());
    }

    #[test]
    fn test_rank_empty() {
        let ranked: Vec<Ranked<Spot>> = rank_by_distance(Vec::new(), Coordinate::new(0.0, 0.0));
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_filter_preserves_order() {
        let origin = Coordinate::new(35.0, 139.0);
        let venues = vec![
            spot("mid", 35.05, 139.0),
            spot("out", 36.0, 139.0),
            spot("near", 35.01, 139.0),
        ];

        let kept = filter_within_radius(venues, origin, DEFAULT_RADIUS_KM);
        let ids: Vec<_> = kept.iter().map(|s| s.id).collect();

        assert_eq!(ids, vec!["mid", "near"]);
    }
}
