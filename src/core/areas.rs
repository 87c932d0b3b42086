use crate::models::{Coordinate, NamedLocation};

/// Suffixes removed from an area name before checking whether a query mentions it
const AREA_SUFFIXES: [&str; 2] = ["駅周辺", "周辺"];

/// Popular search areas across Tokyo, in display order
const POPULAR_AREAS: [(&str, f64, f64); 12] = [
    ("新宿駅周辺", 35.6917, 139.7007),
    ("渋谷駅周辺", 35.6598, 139.7036),
    ("池袋駅周辺", 35.7295, 139.7109),
    ("銀座周辺", 35.6722, 139.7648),
    ("吉祥寺駅周辺", 35.7022, 139.5797),
    ("自由が丘駅周辺", 35.6081, 139.6675),
    ("八王子駅周辺", 35.6559, 139.3378),
    ("立川駅周辺", 35.6977, 139.4135),
    ("日野駅周辺", 35.6716, 139.3896),
    ("町田駅周辺", 35.5497, 139.4467),
    ("府中駅周辺", 35.6697, 139.4785),
    ("調布駅周辺", 35.6517, 139.5414),
];

/// Read-only table of named search areas
///
/// Built once at startup and shared; order matters because free-text
/// matching returns the first hit.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaCatalog {
    areas: Vec<NamedLocation>,
}

impl AreaCatalog {
    pub fn new(areas: Vec<NamedLocation>) -> Self {
        Self { areas }
    }

    /// The built-in Tokyo catalog
    pub fn tokyo() -> Self {
        Self::new(
            POPULAR_AREAS
                .iter()
                .map(|&(name, lat, lon)| NamedLocation::new(name, Coordinate::new(lat, lon)))
                .collect(),
        )
    }

    pub fn areas(&self) -> &[NamedLocation] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Exact lookup by display name
    pub fn find_by_name(&self, name: &str) -> Option<&NamedLocation> {
        self.areas.iter().find(|area| area.name == name)
    }

    /// Resolve a free-text query against the table
    ///
    /// An area matches when its name contains the trimmed query, or when the
    /// query contains the area name with its vicinity suffix stripped. The
    /// first match in table order wins; a blank query never matches.
    pub fn match_query(&self, query: &str) -> Option<&NamedLocation> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        self.areas
            .iter()
            .find(|area| area.name.contains(query) || query.contains(&strip_suffixes(&area.name)))
    }
}

impl Default for AreaCatalog {
    fn default() -> Self {
        Self::tokyo()
    }
}

fn strip_suffixes(name: &str) -> String {
    AREA_SUFFIXES
        .iter()
        .fold(name.to_string(), |stripped, suffix| stripped.replacen(suffix, "", 1))
}
