use crate::lookup::GeolocationResult;

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Sessions kept at most, the least recently used one is dropped to make room
pub const MAX_SESSIONS: usize = 1024;

/// Sessions not used for this long are forgotten
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Identifies a submission, newer submissions get larger tickets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// State of the lookup page between requests.
#[derive(Debug, Default)]
pub struct Session {
    results: Option<Vec<GeolocationResult>>,
    error: Option<String>,
    loading: bool,
    expanded: Option<usize>,
    last_ticket: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Option<&[GeolocationResult]> {
        self.results.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded == Some(index)
    }

    /// Forget everything about the previous submission and start a new one
    pub fn begin_submission(&mut self) -> Ticket {
        self.results = None;
        self.error = None;
        self.expanded = None;
        self.loading = true;
        self.last_ticket += 1;
        Ticket(self.last_ticket)
    }

    /// Store the outcome of a submission.
    ///
    /// Outcomes of superseded submissions are discarded, `false` is returned for them.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<GeolocationResult>, String>,
    ) -> bool {
        if ticket.0 != self.last_ticket {
            log::debug!(
                "Discarding outcome of submission #{}, #{} is the latest",
                ticket.0,
                self.last_ticket
            );
            return false;
        }
        match outcome {
            Ok(results) => self.results = Some(results),
            Err(message) => self.error = Some(message),
        }
        self.loading = false;
        true
    }

    /// Expand the card, or collapse it if it is already expanded
    pub fn toggle_expand(&mut self, index: usize) {
        let count = self.results.as_ref().map_or(0, Vec::len);
        if index >= count {
            return;
        }
        self.expanded = if self.expanded == Some(index) {
            None
        } else {
            Some(index)
        };
    }
}

/// Random id of a browser session, 32 lowercase hex digits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    /// Accept only ids looking like generated ones
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == 32 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Some(Self(s.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct SessionEntry {
    session: Session,
    last_used: Instant,
    // Logical clock for LRU eviction, Instant values may coincide
    last_used_seq: u64,
}

/// Bounded collection of per-browser sessions
pub struct SessionStore {
    sessions: HashMap<SessionId, SessionEntry>,
    capacity: usize,
    idle_timeout: Duration,
    seq: u64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(MAX_SESSIONS, SESSION_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            capacity: capacity.max(1),
            idle_timeout,
            seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.duration_since(entry.last_used) >= self.idle_timeout
    }

    fn make_room(&mut self, now: Instant) {
        let idle_timeout = self.idle_timeout;
        self.sessions
            .retain(|_, entry| now.duration_since(entry.last_used) < idle_timeout);
        while self.sessions.len() >= self.capacity {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used_seq)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    log::debug!("Evicting session {}", id.as_str());
                    self.sessions.remove(&id);
                }
                None => break,
            }
        }
    }

    /// Session of the browser, unknown and expired ids get a fresh one
    pub fn session_mut(&mut self, id: &SessionId) -> &mut Session {
        let now = Instant::now();
        let expired = self
            .sessions
            .get(id)
            .map(|entry| self.is_expired(entry, now));
        match expired {
            Some(false) => {}
            Some(true) => {
                self.sessions.remove(id);
                self.make_room(now);
            }
            None => self.make_room(now),
        }
        self.seq += 1;
        let seq = self.seq;
        let entry = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| SessionEntry {
                session: Session::new(),
                last_used: now,
                last_used_seq: seq,
            });
        entry.last_used = now;
        entry.last_used_seq = seq;
        &mut entry.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::GeolocationRecord;

    fn result(ip: &str) -> GeolocationResult {
        GeolocationRecord::try_from(serde_json::json!({ "ip": ip }))
            .unwrap()
            .into()
    }

    #[test]
    fn submission_lifecycle() {
        let mut session = Session::new();
        assert!(!session.is_loading());
        assert_eq!(session.results(), None);

        let ticket = session.begin_submission();
        assert!(session.is_loading());

        assert!(session.complete(ticket, Ok(vec![result("8.8.8.8"), result("1.1.1.1")])));
        assert!(!session.is_loading());
        assert_eq!(session.results().map(<[_]>::len), Some(2));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn new_submission_resets_state() {
        let mut session = Session::new();
        let ticket = session.begin_submission();
        session.complete(ticket, Ok(vec![result("8.8.8.8")]));
        session.toggle_expand(0);

        let ticket = session.begin_submission();
        assert_eq!(session.results(), None);
        assert_eq!(session.expanded(), None);

        session.complete(ticket, Err("invalid_access_key".into()));
        assert_eq!(session.error(), Some("invalid_access_key"));
        assert_eq!(session.results(), None);

        session.begin_submission();
        assert_eq!(session.error(), None);
    }

    #[test]
    fn stale_outcome_is_ignored() {
        let mut session = Session::new();
        let first = session.begin_submission();
        let second = session.begin_submission();

        assert!(session.complete(second, Ok(vec![result("1.1.1.1")])));
        assert!(!session.complete(first, Err("too late".into())));

        assert_eq!(session.error(), None);
        assert_eq!(session.results().unwrap()[0].ip, "1.1.1.1");
        assert!(!session.is_loading());
    }

    #[test]
    fn stale_outcome_keeps_loading() {
        let mut session = Session::new();
        let first = session.begin_submission();
        let _second = session.begin_submission();

        assert!(!session.complete(first, Ok(vec![result("8.8.8.8")])));
        assert!(session.is_loading());
        assert_eq!(session.results(), None);
    }

    #[test]
    fn only_one_card_is_expanded() {
        let mut session = Session::new();
        let ticket = session.begin_submission();
        session.complete(ticket, Ok(vec![result("8.8.8.8"), result("1.1.1.1")]));

        session.toggle_expand(0);
        assert!(session.is_expanded(0));
        session.toggle_expand(1);
        assert!(!session.is_expanded(0));
        assert!(session.is_expanded(1));
        session.toggle_expand(1);
        assert_eq!(session.expanded(), None);
    }

    #[test]
    fn out_of_range_toggle_is_ignored() {
        let mut session = Session::new();
        session.toggle_expand(0);
        assert_eq!(session.expanded(), None);

        let ticket = session.begin_submission();
        session.complete(ticket, Ok(vec![result("8.8.8.8")]));
        session.toggle_expand(0);
        session.toggle_expand(5);
        assert_eq!(session.expanded(), Some(0));
    }

    #[test]
    fn session_ids() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert_eq!(SessionId::parse(id.as_str()), Some(id.clone()));
        assert_ne!(SessionId::generate(), id);
        for bad in ["", "abc", "0123456789ABCDEF0123456789abcdef", "../../../../../../../etc/passwd"] {
            assert_eq!(SessionId::parse(bad), None);
        }
    }

    #[test]
    fn store_keeps_browsers_apart() {
        let mut store = SessionStore::new();
        let alice = SessionId::generate();
        let bob = SessionId::generate();

        let alice_ticket = store.session_mut(&alice).begin_submission();
        let bob_ticket = store.session_mut(&bob).begin_submission();

        assert!(store
            .session_mut(&bob)
            .complete(bob_ticket, Ok(vec![result("20.0.0.2")])));
        assert!(store
            .session_mut(&alice)
            .complete(alice_ticket, Ok(vec![result("10.0.0.1")])));

        assert_eq!(store.session_mut(&alice).results().unwrap()[0].ip, "10.0.0.1");
        assert_eq!(store.session_mut(&bob).results().unwrap()[0].ip, "20.0.0.2");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn store_evicts_least_recently_used() {
        let mut store = SessionStore::with_limits(2, SESSION_IDLE_TIMEOUT);
        let ids: Vec<_> = (0..3).map(|_| SessionId::generate()).collect();

        store.session_mut(&ids[0]).begin_submission();
        store.session_mut(&ids[1]).begin_submission();
        store.session_mut(&ids[0]);
        store.session_mut(&ids[2]);

        assert_eq!(store.len(), 2);
        assert!(store.session_mut(&ids[0]).is_loading());
        // Dropped one comes back empty
        assert!(!store.session_mut(&ids[1]).is_loading());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn store_forgets_idle_sessions() {
        let mut store = SessionStore::with_limits(MAX_SESSIONS, Duration::ZERO);
        let id = SessionId::generate();

        store.session_mut(&id).begin_submission();
        assert!(!store.session_mut(&id).is_loading());
        assert_eq!(store.len(), 1);
    }
}
