use thiserror::Error;

use crate::core::distance::{filter_within_radius, rank_by_distance, Ranked};
use crate::core::locate::GeolocationError;
use crate::models::{Locatable, NamedLocation};

/// Number of restaurants shown for a search
pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Ways a search can end without a ranked list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("location unavailable: {0}")]
    LocationUnavailable(#[from] GeolocationError),

    #[error("no known area matches \"{0}\"")]
    NoMatch(String),

    #[error("failed to fetch restaurants: {0}")]
    FetchFailed(String),
}

/// Proof that a caller started a particular search
///
/// Completions carrying an older generation than the session's current one
/// are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// How a fetched catalog is turned into the visible list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingOptions {
    pub radius_km: Option<f64>,
    pub limit: usize,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            radius_km: None,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState<V> {
    Idle,
    Resolving,
    Querying {
        location: NamedLocation,
    },
    Ranked {
        location: NamedLocation,
        venues: Vec<Ranked<V>>,
    },
    NotFound {
        query: String,
    },
    Failed {
        error: SearchError,
    },
}

impl<V> SessionState<V> {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Ranked { .. }
                | SessionState::NotFound { .. }
                | SessionState::Failed { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Resolving => "resolving",
            SessionState::Querying { .. } => "querying",
            SessionState::Ranked { .. } => "ranked",
            SessionState::NotFound { .. } => "not_found",
            SessionState::Failed { .. } => "failed",
        }
    }
}

/// One user's search flow
///
/// ```text
/// Idle -> Resolving -> Querying -> Ranked | NotFound | Failed
/// ```
///
/// Every `begin` supersedes whatever was in flight. Nothing is retried.
#[derive(Debug, Clone)]
pub struct SearchSession<V> {
    generation: u64,
    state: SessionState<V>,
}

impl<V: Locatable> SearchSession<V> {
    pub fn new() -> Self {
        Self {
            generation: 0,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState<V> {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Start a new search, invalidating any earlier ticket
    pub fn begin(&mut self) -> SearchTicket {
        self.generation += 1;
        self.state = SessionState::Resolving;
        SearchTicket {
            generation: self.generation,
        }
    }

    /// Record the outcome of location resolution
    ///
    /// Returns `false` when the ticket is stale and nothing changed.
    pub fn resolved(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<NamedLocation, SearchError>,
    ) -> bool {
        if !self.is_current(ticket) || !matches!(self.state, SessionState::Resolving) {
            return false;
        }

        self.state = match outcome {
            Ok(location) => SessionState::Querying { location },
            Err(SearchError::NoMatch(query)) => SessionState::NotFound { query },
            Err(error) => SessionState::Failed { error },
        };
        true
    }

    /// Record the catalog fetch for the location being queried
    ///
    /// Distances are computed against the location stored for this ticket,
    /// never against a newer one. Returns `false` for stale tickets.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        fetched: Result<Vec<V>, SearchError>,
        options: RankingOptions,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                "Discarding results for generation {} (current is {})",
                ticket.generation,
                self.generation
            );
            return false;
        }

        let location = match &self.state {
            SessionState::Querying { location } => location.clone(),
            _ => return false,
        };

        self.state = match fetched {
            Ok(venues) => {
                let origin = location.coordinate();
                let candidates = match options.radius_km {
                    Some(radius_km) => filter_within_radius(venues, origin, radius_km),
                    None => venues,
                };
                let mut ranked = rank_by_distance(candidates, origin);
                ranked.truncate(options.limit);
                SessionState::Ranked { location, venues: ranked }
            }
            Err(error) => SessionState::Failed { error },
        };
        true
    }

    /// Go back to idle; outstanding tickets become stale
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = SessionState::Idle;
    }
}

impl<V: Locatable> Default for SearchSession<V> {
    fn default() -> Self {
        Self::new()
    }
}
