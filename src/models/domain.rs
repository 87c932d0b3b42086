use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Label used for locations that come from the device's own position fix
pub const CURRENT_LOCATION_LABEL: &str = "現在地";

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Whether both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Anything the distance engine can measure against an origin
pub trait Locatable {
    fn coordinate(&self) -> Coordinate;
}

impl Locatable for Coordinate {
    fn coordinate(&self) -> Coordinate {
        *self
    }
}

/// A coordinate with a human readable label, used as the search origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NamedLocation {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }

    /// Location built from a raw device fix
    pub fn current(coordinate: Coordinate) -> Self {
        Self::new(CURRENT_LOCATION_LABEL, coordinate)
    }
}

impl Locatable for NamedLocation {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Price tier as stored by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "安い")]
    Cheap,
    #[serde(rename = "普通")]
    Moderate,
    #[serde(rename = "高い")]
    Expensive,
}

/// Restaurant record owned by the hosted catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub kids_menus: Vec<KidsMenu>,
    #[serde(default, deserialize_with = "one_or_first")]
    pub restaurant_facilities: Option<RestaurantFacilities>,
}

impl Restaurant {
    /// Coordinate link that opens the venue in Google Maps
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}&hl=ja&gl=jp&z=17",
            self.latitude, self.longitude
        )
    }
}

impl Locatable for Restaurant {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Child menu entry embedded in a restaurant row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidsMenu {
    pub menu_name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub age_range: Option<String>,
}

/// Amenity flags embedded in a restaurant row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantFacilities {
    #[serde(default)]
    pub has_kids_space: bool,
    #[serde(default)]
    pub has_baby_changing: bool,
    #[serde(default)]
    pub has_high_chair: bool,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Embedded one-to-one relations come back as an object or as an array
// depending on how the foreign key is declared.
fn one_or_first<'de, D>(deserializer: D) -> Result<Option<RestaurantFacilities>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<RestaurantFacilities>),
        One(RestaurantFacilities),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(facilities)) => Some(facilities),
        Some(OneOrMany::Many(list)) => list.into_iter().next(),
        None => None,
    })
}

/// Persisted record of a past search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub search_query: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_name: String,
    pub search_timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// The location this entry replays
    pub fn location(&self) -> NamedLocation {
        NamedLocation::new(
            self.area_name.clone(),
            Coordinate::new(self.latitude, self.longitude),
        )
    }

    /// Short age label relative to `now`
    pub fn relative_label(&self, now: DateTime<Utc>) -> String {
        relative_label(self.search_timestamp, now)
    }
}

/// Row appended to the history table for every resolved search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub search_query: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_name: String,
    pub search_timestamp: DateTime<Utc>,
}

impl NewHistoryEntry {
    pub fn for_location(location: &NamedLocation, at: DateTime<Utc>) -> Self {
        Self {
            search_query: location.name.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            area_name: location.name.clone(),
            search_timestamp: at,
        }
    }
}

/// Format how long ago `timestamp` was.
///
/// Under an hour reads as "now", under a day as hours, under a week as days,
/// anything older as a month/day date.
pub fn relative_label(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - timestamp).num_hours();

    if hours < 1 {
        "今すぐ".to_string()
    } else if hours < 24 {
        format!("{}時間前", hours)
    } else if hours / 24 < 7 {
        format!("{}日前", hours / 24)
    } else {
        format!("{}月{}日", timestamp.month(), timestamp.day())
    }
}
