//! Browser session state and credential issuance
//!
//! Each browser session carries at most one credential pair: a public
//! `client_id` (surfaced as a readable cookie) and a `client_secret`
//! that gets compiled into the session's JS bundle and presented back on
//! extraction calls. The pair is issued once on first contact and never
//! rotated while the session lives; a session either holds both halves
//! or neither.
//!
//! Sessions are memory-resident only and expire after the configured
//! cookie max-age.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;
use uuid::Uuid;

/// Per-session credential pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Non-secret client tag, also set as a readable cookie
    pub client_id: String,

    /// Secret embedded into the session's compiled bundle
    pub client_secret: String,
}

impl Credentials {
    /// Issue a fresh pair: two independent 122-bit random identifiers.
    pub fn issue() -> Self {
        Self {
            client_id: Uuid::new_v4().simple().to_string(),
            client_secret: Uuid::new_v4().simple().to_string(),
        }
    }
}

/// A browser session record
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session identifier, carried by the session cookie
    pub id: String,

    /// Credential pair, present once the root route has been visited
    pub credentials: Option<Credentials>,

    /// When the session was created
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            credentials: None,
            created_at: Utc::now(),
        }
    }

    fn is_expired(&self, max_age: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.created_at);
        age.to_std().map(|age| age >= max_age).unwrap_or(true)
    }
}

/// Upper bound on tracked sessions. Clients that never return a cookie
/// (crawlers, curl) mint a session per request, so the store must not
/// grow with raw request volume.
const DEFAULT_CAPACITY: usize = 10_000;

/// In-memory session store
///
/// Keyed by the opaque session id from the session cookie. Expired
/// sessions are dropped lazily on access; inserting at capacity first
/// sweeps everything expired, then evicts the oldest survivor.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    max_age: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(max_age: Duration) -> Self {
        Self::with_capacity(max_age, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_age: Duration, capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_age,
            capacity,
        }
    }

    /// Look up a live session by id, sweeping it if expired.
    pub fn get(&self, id: &str) -> Option<Session> {
        let expired = match self.sessions.get(id) {
            None => return None,
            Some(session) => session.is_expired(self.max_age),
        };
        if expired {
            self.sessions.remove(id);
            return None;
        }
        self.sessions.get(id).map(|s| s.value().clone())
    }

    /// Return the session for `id` if still live, or create a fresh one.
    pub fn get_or_create(&self, id: Option<&str>) -> Session {
        if let Some(session) = id.and_then(|id| self.get(id)) {
            return session;
        }
        if self.sessions.len() >= self.capacity {
            self.sessions
                .retain(|_, session| !session.is_expired(self.max_age));
        }
        while self.sessions.len() >= self.capacity {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().created_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(id) => self.sessions.remove(&id),
                None => break,
            };
        }
        let session = Session::new();
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Credentials for a live session, if issued.
    pub fn credentials(&self, id: &str) -> Option<Credentials> {
        self.get(id).and_then(|s| s.credentials)
    }

    /// Return the session's credentials, issuing and persisting a pair on
    /// first call. Later calls return the same pair for the session's
    /// whole lifetime.
    pub fn ensure_credentials(&self, id: &str) -> Option<Credentials> {
        let mut session = self.sessions.get_mut(id)?;
        if session.is_expired(self.max_age) {
            drop(session);
            self.sessions.remove(id);
            return None;
        }
        if session.credentials.is_none() {
            session.credentials = Some(Credentials::issue());
        }
        session.credentials.clone()
    }

    /// Number of tracked sessions (expired-but-unswept included).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(60))
    }

    #[test]
    fn issued_pairs_are_distinct_and_nonempty() {
        let a = Credentials::issue();
        let b = Credentials::issue();
        assert!(!a.client_id.is_empty());
        assert!(!a.client_secret.is_empty());
        assert_ne!(a.client_id, a.client_secret);
        assert_ne!(a.client_secret, b.client_secret);
    }

    #[test]
    fn fresh_session_has_no_credentials() {
        let store = store();
        let session = store.get_or_create(None);
        assert!(session.credentials.is_none());
        assert!(store.credentials(&session.id).is_none());
    }

    #[test]
    fn ensure_credentials_issues_exactly_once() {
        let store = store();
        let session = store.get_or_create(None);

        let first = store.ensure_credentials(&session.id).unwrap();
        let second = store.ensure_credentials(&session.id).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.credentials(&session.id), Some(first));
    }

    #[test]
    fn get_or_create_reuses_live_session() {
        let store = store();
        let session = store.get_or_create(None);
        let again = store.get_or_create(Some(&session.id));
        assert_eq!(session.id, again.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_id_creates_new_session() {
        let store = store();
        let session = store.get_or_create(Some("no-such-session"));
        assert_ne!(session.id, "no-such-session");
    }

    #[test]
    fn expired_session_is_swept_and_replaced() {
        let store = SessionStore::new(Duration::from_millis(20));
        let session = store.get_or_create(None);
        store.ensure_credentials(&session.id).unwrap();

        sleep(Duration::from_millis(40));
        assert!(store.get(&session.id).is_none());
        assert!(store.ensure_credentials(&session.id).is_none());

        let fresh = store.get_or_create(Some(&session.id));
        assert_ne!(fresh.id, session.id);
        assert!(fresh.credentials.is_none());
    }

    #[test]
    fn cookie_less_clients_cannot_grow_store_past_capacity() {
        let store = SessionStore::with_capacity(Duration::from_secs(60), 8);
        for _ in 0..100 {
            store.get_or_create(None);
        }
        assert!(store.len() <= 8);
    }

    #[test]
    fn insert_at_capacity_sweeps_expired_sessions() {
        let store = SessionStore::with_capacity(Duration::from_millis(10), 8);
        for _ in 0..8 {
            store.get_or_create(None);
        }
        assert_eq!(store.len(), 8);

        sleep(Duration::from_millis(30));
        let fresh = store.get_or_create(None);
        assert_eq!(store.len(), 1);
        assert!(store.get(&fresh.id).is_some());
    }

    #[test]
    fn eviction_at_capacity_drops_the_oldest_session() {
        let store = SessionStore::with_capacity(Duration::from_secs(60), 2);
        let first = store.get_or_create(None);
        sleep(Duration::from_millis(5));
        let second = store.get_or_create(None);
        sleep(Duration::from_millis(5));
        let third = store.get_or_create(None);

        assert!(store.get(&first.id).is_none());
        assert!(store.get(&second.id).is_some());
        assert!(store.get(&third.id).is_some());
    }
}
