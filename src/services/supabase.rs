use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use thiserror::Error;

use crate::models::{HistoryEntry, NewHistoryEntry, Restaurant};
use crate::services::store::VenueStore;

/// Columns pulled in with every restaurant row
const RESTAURANT_SELECT: &str = "*,kids_menus(menu_name,price,age_range),restaurant_facilities(has_kids_space,has_baby_changing,has_high_chair)";

/// Errors that can occur when talking to the hosted database
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the hosted database
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub restaurants: String,
    pub search_history: String,
}

impl Default for SupabaseTables {
    fn default() -> Self {
        Self {
            restaurants: "restaurants".to_string(),
            search_history: "search_history".to_string(),
        }
    }
}

/// REST client for the hosted restaurant database
///
/// Speaks the PostgREST dialect:
/// - reading the restaurant catalog with embedded menus and facilities
/// - appending, listing and deleting search history rows
/// - a lightweight connectivity probe
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: SupabaseTables,
}

impl SupabaseClient {
    /// Create a new client
    pub fn new(
        base_url: String,
        api_key: String,
        tables: SupabaseTables,
        request_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            tables,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn ensure_success(response: Response, action: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Failed to {}: {} - {}", action, status, body);

        Err(StoreError::ApiError(format!("Failed to {}: {}", action, status)))
    }
}

#[async_trait]
impl VenueStore for SupabaseClient {
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, StoreError> {
        let url = format!(
            "{}?select={}",
            self.table_url(&self.tables.restaurants),
            urlencoding::encode(RESTAURANT_SELECT)
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::ensure_success(response, "fetch restaurants").await?;

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("Expected an array of rows: {}", e)))?;
        let total = rows.len();

        let restaurants: Vec<Restaurant> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(restaurant) => Some(restaurant),
                Err(e) => {
                    tracing::debug!("Skipping undecodable restaurant row: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Fetched {} restaurants ({} rows)", restaurants.len(), total);

        Ok(restaurants)
    }

    async fn record_search(&self, entry: &NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        let url = self.table_url(&self.tables.search_history);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(entry)
            .send()
            .await?;
        let response = Self::ensure_success(response, "record search history").await?;

        let mut rows: Vec<HistoryEntry> = response
            .json()
            .await
            .map_err(|e| {
                StoreError::InvalidResponse(format!("Failed to parse history row: {}", e))
            })?;

        if rows.is_empty() {
            return Err(StoreError::InvalidResponse("Insert returned no rows".into()));
        }

        let stored = rows.swap_remove(0);
        tracing::debug!("Recorded search history {} ({})", stored.id, stored.area_name);

        Ok(stored)
    }

    async fn recent_searches(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let url = format!(
            "{}?select=*&order=search_timestamp.desc&limit={}",
            self.table_url(&self.tables.search_history),
            limit
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::ensure_success(response, "list search history").await?;

        let entries: Vec<HistoryEntry> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse history: {}", e)))?;

        Ok(entries)
    }

    async fn delete_search(&self, id: &str) -> Result<(), StoreError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(&self.tables.search_history),
            urlencoding::encode(id)
        );

        let response = self
            .authorized(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let response = Self::ensure_success(response, "delete search history").await?;

        let deleted: Vec<Value> = response.json().await.unwrap_or_default();
        if deleted.is_empty() {
            return Err(StoreError::NotFound(format!("History entry {} not found", id)));
        }

        tracing::debug!("Deleted search history {}", id);

        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!(
            "{}?select=count&limit=1",
            self.table_url(&self.tables.restaurants)
        );

        let response = self.authorized(self.client.get(&url)).send().await?;

        Ok(response.status().is_success())
    }
}
