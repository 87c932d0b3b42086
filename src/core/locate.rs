use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::areas::AreaCatalog;
use crate::core::session::SearchError;
use crate::models::{Coordinate, NamedLocation};

/// Why the device could not report a position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("geolocation is not supported on this device")]
    Unsupported,

    #[error("permission to read the location was denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("timed out after {0:?} waiting for a position")]
    Timeout(Duration),
}

/// Knobs passed to the platform for a single position read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// A cached fix younger than this is reused instead of asking again
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(300),
        }
    }
}

/// One position reported by the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
    pub taken_at: DateTime<Utc>,
}

impl PositionFix {
    pub fn is_fresh(&self, maximum_age: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(maximum_age) {
            Ok(max_age) => now - self.taken_at < max_age,
            Err(_) => true,
        }
    }
}

/// Platform capability that reads the current position once
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<PositionFix, GeolocationError>;
}

/// One-shot device location reads with a bounded wait and a short-lived cache
///
/// Failures are reported once and never retried; callers decide whether to
/// ask again.
pub struct DeviceLocator<P> {
    provider: P,
    options: PositionOptions,
    last_fix: Mutex<Option<PositionFix>>,
}

impl<P: GeolocationProvider> DeviceLocator<P> {
    pub fn new(provider: P, options: PositionOptions) -> Self {
        Self {
            provider,
            options,
            last_fix: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Resolve the device position into a "current location"
    pub async fn locate(&self) -> Result<NamedLocation, SearchError> {
        let fix = self.read_fix().await?;
        Ok(NamedLocation::current(fix.coordinate))
    }

    async fn read_fix(&self) -> Result<PositionFix, GeolocationError> {
        if let Some(fix) = self.cached_fix(Utc::now()) {
            tracing::debug!("Reusing cached position fix from {}", fix.taken_at);
            return Ok(fix);
        }

        let fix = tokio::time::timeout(
            self.options.timeout,
            self.provider.current_position(&self.options),
        )
        .await
        .map_err(|_| GeolocationError::Timeout(self.options.timeout))??;

        if let Ok(mut last) = self.last_fix.lock() {
            *last = Some(fix);
        }

        Ok(fix)
    }

    fn cached_fix(&self, now: DateTime<Utc>) -> Option<PositionFix> {
        let last = *self.last_fix.lock().ok()?;
        last.filter(|fix| fix.is_fresh(self.options.maximum_age, now))
    }
}

/// How the user picked the search origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocationRequest {
    /// Free text typed into the search box
    Query { query: String },
    /// One of the popular area buttons
    Area { name: String },
    /// A fix reported by the client's device
    Device { latitude: f64, longitude: f64 },
    /// Replay of a history entry
    History { name: String, latitude: f64, longitude: f64 },
}

/// Turn a location request into a search origin
pub fn resolve_location(
    request: &LocationRequest,
    catalog: &AreaCatalog,
) -> Result<NamedLocation, SearchError> {
    match request {
        LocationRequest::Query { query } => catalog
            .match_query(query)
            .cloned()
            .ok_or_else(|| SearchError::NoMatch(query.trim().to_string())),
        LocationRequest::Area { name } => catalog
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| SearchError::NoMatch(name.clone())),
        LocationRequest::Device { latitude, longitude } => {
            let coordinate = Coordinate::new(*latitude, *longitude);
            if !coordinate.is_valid() {
                return Err(SearchError::LocationUnavailable(
                    GeolocationError::PositionUnavailable(format!(
                        "invalid coordinate ({}, {})",
                        latitude, longitude
                    )),
                ));
            }
            Ok(NamedLocation::current(coordinate))
        }
        LocationRequest::History { name, latitude, longitude } => Ok(NamedLocation::new(
            name.clone(),
            Coordinate::new(*latitude, *longitude),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CURRENT_LOCATION_LABEL;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedProvider {
        fix: Result<PositionFix, GeolocationError>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl GeolocationProvider for FixedProvider {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<PositionFix, GeolocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.fix.clone()
        }
    }

    fn fix_at(taken_at: DateTime<Utc>) -> PositionFix {
        PositionFix {
            coordinate: Coordinate::new(35.6812, 139.7671),
            accuracy_m: Some(12.0),
            taken_at,
        }
    }

    fn provider(
        fix: Result<PositionFix, GeolocationError>,
        delay: Duration,
    ) -> (FixedProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (FixedProvider { fix, delay, calls: calls.clone() }, calls)
    }

    #[test]
    fn test_default_options() {
        let options = PositionOptions::default();

        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::from_secs(300));
    }

    #[test]
    fn test_fix_freshness() {
        let now = Utc::now();
        let max_age = Duration::from_secs(300);

        assert!(fix_at(now - chrono::Duration::minutes(4)).is_fresh(max_age, now));
        assert!(!fix_at(now - chrono::Duration::minutes(6)).is_fresh(max_age, now));
    }

    #[tokio::test]
    async fn test_locate_labels_current_location() {
        let (provider, calls) = provider(Ok(fix_at(Utc::now())), Duration::ZERO);
        let locator = DeviceLocator::new(provider, PositionOptions::default());

        let location = locator.locate().await.unwrap();

        assert_eq!(location.name, CURRENT_LOCATION_LABEL);
        assert_eq!(location.latitude, 35.6812);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recent_fix_is_reused() {
        let (provider, calls) = provider(Ok(fix_at(Utc::now())), Duration::ZERO);
        let locator = DeviceLocator::new(provider, PositionOptions::default());

        locator.locate().await.unwrap();
        locator.locate().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_fix_triggers_new_read() {
        let stale = fix_at(Utc::now() - chrono::Duration::minutes(10));
        let (provider, calls) = provider(Ok(stale), Duration::ZERO);
        let locator = DeviceLocator::new(provider, PositionOptions::default());

        locator.locate().await.unwrap();
        locator.locate().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_reports_unavailable() {
        let (provider, _) = provider(Ok(fix_at(Utc::now())), Duration::from_millis(500));
        let options = PositionOptions {
            timeout: Duration::from_millis(20),
            ..PositionOptions::default()
        };
        let locator = DeviceLocator::new(provider, options);

        let err = locator.locate().await.unwrap_err();

        assert!(matches!(
            err,
            SearchError::LocationUnavailable(GeolocationError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_denied_is_not_retried() {
        let (provider, calls) = provider(Err(GeolocationError::PermissionDenied), Duration::ZERO);
        let locator = DeviceLocator::new(provider, PositionOptions::default());

        let err = locator.locate().await.unwrap_err();

        assert_eq!(err, SearchError::LocationUnavailable(GeolocationError::PermissionDenied));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolve_each_request_kind() {
        let catalog = AreaCatalog::tokyo();

        let by_query = resolve_location(&LocationRequest::Query { query: "渋谷".into() }, &catalog).unwrap();
        assert_eq!(by_query.name, "渋谷駅周辺");

        let by_area = resolve_location(&LocationRequest::Area { name: "町田駅周辺".into() }, &catalog).unwrap();
        assert_eq!(by_area.latitude, 35.5497);

        let by_device = resolve_location(
            &LocationRequest::Device { latitude: 35.0, longitude: 139.0 },
            &catalog,
        )
        .unwrap();
        assert_eq!(by_device.name, CURRENT_LOCATION_LABEL);

        let by_history = resolve_location(
            &LocationRequest::History { name: "自宅".into(), latitude: 35.1, longitude: 139.1 },
            &catalog,
        )
        .unwrap();
        assert_eq!(by_history.name, "自宅");
    }

    #[test]
    fn test_resolve_errors() {
        let catalog = AreaCatalog::tokyo();

        let err = resolve_location(&LocationRequest::Query { query: " 存在しない地名 ".into() }, &catalog)
            .unwrap_err();
        assert_eq!(err, SearchError::NoMatch("存在しない地名".into()));

        let err = resolve_location(
            &LocationRequest::Device { latitude: 123.0, longitude: 0.0 },
            &catalog,
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::LocationUnavailable(_)));
    }

    #[test]
    fn test_location_request_json_shape() {
        let request: LocationRequest =
            serde_json::from_str(r#"{"type": "query", "query": "池袋"}"#).unwrap();
        assert_eq!(request, LocationRequest::Query { query: "池袋".into() });
    }
}
