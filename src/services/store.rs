use async_trait::async_trait;

use crate::models::{HistoryEntry, NewHistoryEntry, Restaurant};
use crate::services::supabase::StoreError;

/// Hosted catalog and search history
///
/// Everything behind this trait is owned by the external database; the
/// service only reads restaurants and appends or deletes history rows.
#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Every restaurant with its embedded kids menus and facilities
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, StoreError>;

    /// Append one history row and return it as stored
    async fn record_search(&self, entry: &NewHistoryEntry) -> Result<HistoryEntry, StoreError>;

    /// Most recent history rows first
    async fn recent_searches(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;

    async fn delete_search(&self, id: &str) -> Result<(), StoreError>;

    /// Cheap connectivity probe
    async fn health_check(&self) -> Result<bool, StoreError>;
}
