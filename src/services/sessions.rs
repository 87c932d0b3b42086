use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::core::{RankingOptions, SearchError, SearchSession, SearchTicket, SessionState};
use crate::models::{NamedLocation, Restaurant};

/// Sessions kept before the least recently used one is dropped
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Sessions untouched for this long are dropped
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry {
    session: SearchSession<Restaurant>,
    touched: Instant,
}

/// Search sessions keyed by client session id
///
/// Each client sees only the result of its latest search: completions of
/// superseded searches are dropped. Only `begin` creates sessions, and the
/// map is bounded by a size cap and an idle TTL. The lock is never held
/// across an await.
pub struct SessionRegistry {
    sessions: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_sessions: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Entry>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run `f` against an existing session; `None` when `id` is unknown
    fn with_existing<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut SearchSession<Restaurant>) -> T,
    ) -> Option<T> {
        let mut sessions = self.lock();
        sessions.get_mut(id).map(|entry| {
            entry.touched = Instant::now();
            f(&mut entry.session)
        })
    }

    /// Start a search in session `id`, superseding any search in flight there
    pub fn begin(&self, id: &str) -> SearchTicket {
        self.begin_at(id, Instant::now())
    }

    fn begin_at(&self, id: &str, now: Instant) -> SearchTicket {
        let mut sessions = self.lock();

        if !sessions.contains(id) {
            self.expire(&mut sessions, now);
            let entry = Entry {
                session: SearchSession::new(),
                touched: now,
            };
            if let Some((evicted, _)) = sessions.push(id.to_string(), entry) {
                tracing::debug!("Session registry full, dropped session {}", evicted);
            }
        }

        match sessions.get_mut(id) {
            Some(entry) => {
                entry.touched = now;
                entry.session.begin()
            }
            // Capacity is at least one, so the entry pushed above is present
            None => SearchSession::<Restaurant>::new().begin(),
        }
    }

    // Least recently touched sessions sit at the LRU end, so expired ones
    // are popped from there until a live one shows up.
    fn expire(&self, sessions: &mut LruCache<String, Entry>, now: Instant) {
        let mut expired = 0;
        while let Some((_, entry)) = sessions.peek_lru() {
            if now.saturating_duration_since(entry.touched) < self.ttl {
                break;
            }
            sessions.pop_lru();
            expired += 1;
        }
        if expired > 0 {
            tracing::debug!("Expired {} idle search sessions", expired);
        }
    }

    /// Returns `false` for unknown sessions and stale tickets
    pub fn resolved(
        &self,
        id: &str,
        ticket: SearchTicket,
        outcome: Result<NamedLocation, SearchError>,
    ) -> bool {
        self.with_existing(id, |session| session.resolved(ticket, outcome))
            .unwrap_or(false)
    }

    /// Apply the fetch and hand back the state it produced
    ///
    /// `None` when the ticket was superseded or the session is gone.
    pub fn complete(
        &self,
        id: &str,
        ticket: SearchTicket,
        fetched: Result<Vec<Restaurant>, SearchError>,
        options: RankingOptions,
    ) -> Option<SessionState<Restaurant>> {
        self.with_existing(id, |session| {
            session
                .complete(ticket, fetched, options)
                .then(|| session.state().clone())
        })
        .flatten()
    }

    /// Current generation and a copy of the visible state
    pub fn snapshot(&self, id: &str) -> Option<(u64, SessionState<Restaurant>)> {
        self.lock()
            .peek(id)
            .map(|entry| (entry.session.generation(), entry.session.state().clone()))
    }

    /// Returns `false` when no search was ever made in session `id`
    pub fn reset(&self, id: &str) -> bool {
        self.with_existing(id, |session| session.reset()).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
