//! [`SessionTable`] definitions.

use std::time::Duration;

use dashmap::{mapref::entry::Entry, DashMap};
use tracing as log;

use crate::domain::user::{
    self,
    session::{self, EntropyError, ExpirationDateTime},
    Session,
};

/// Process-wide table of live [`Session`]s, addressed by their
/// [`session::Token`]s.
///
/// Sharded, so concurrent requests only contend on the shard of the token
/// they touch. No lock is ever held across an `.await`.
#[derive(Debug)]
pub struct SessionTable {
    /// Lifetime of every newly created [`Session`].
    ttl: Duration,

    /// Stored [`Session`]s.
    sessions: DashMap<session::Token, Session>,
}

impl SessionTable {
    /// Creates a new empty [`SessionTable`] issuing [`Session`]s that live
    /// for the provided `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: DashMap::new(),
        }
    }

    /// Creates a new [`Session`] for the provided [`user::Name`], starting
    /// now.
    ///
    /// # Errors
    ///
    /// If no [`session::Token`] could be generated.
    pub fn create(&self, user: user::Name) -> Result<Session, EntropyError> {
        self.create_at(user, ExpirationDateTime::now())
    }

    /// Creates a new [`Session`] for the provided [`user::Name`], starting
    /// at the provided moment.
    ///
    /// # Errors
    ///
    /// If no [`session::Token`] could be generated.
    pub fn create_at(
        &self,
        user: user::Name,
        now: ExpirationDateTime,
    ) -> Result<Session, EntropyError> {
        let expires_at = now + self.ttl;
        loop {
            let token = session::Token::generate()?;
            if let Entry::Vacant(entry) = self.sessions.entry(token.clone()) {
                let session = Session {
                    token,
                    user,
                    expires_at,
                };
                drop(entry.insert(session.clone()));
                log::debug!(user = %session.user, "session created");
                return Ok(session);
            }
        }
    }

    /// Looks up a valid [`Session`] by its [`session::Token`].
    #[must_use]
    pub fn lookup(&self, token: &session::Token) -> Option<Session> {
        self.lookup_at(token, ExpirationDateTime::now())
    }

    /// Looks up a [`Session`] by its [`session::Token`] being valid at the
    /// provided moment.
    ///
    /// A found but expired [`Session`] is evicted.
    #[must_use]
    pub fn lookup_at(
        &self,
        token: &session::Token,
        now: ExpirationDateTime,
    ) -> Option<Session> {
        let session = self.sessions.get(token).map(|s| s.value().clone())?;
        if session.is_valid_at(now) {
            return Some(session);
        }

        if self
            .sessions
            .remove_if(token, |_, s| !s.is_valid_at(now))
            .is_some()
        {
            log::debug!(user = %session.user, "expired session evicted");
        }
        None
    }

    /// Removes the [`Session`] with the provided [`session::Token`], if any.
    ///
    /// Returns whether a [`Session`] has been removed.
    pub fn invalidate(&self, token: &session::Token) -> bool {
        let removed = self.sessions.remove(token);
        if let Some((_, session)) = &removed {
            log::debug!(user = %session.user, "session invalidated");
        }
        removed.is_some()
    }

    /// Removes every [`Session`] expired at the provided moment.
    ///
    /// Returns the number of removed [`Session`]s.
    pub fn purge_expired(&self, now: ExpirationDateTime) -> usize {
        let mut purged = 0;
        self.sessions.retain(|_, s| {
            let valid = s.is_valid_at(now);
            if !valid {
                purged += 1;
            }
            valid
        });
        if purged > 0 {
            log::debug!(
                remaining = self.len(),
                "{purged} expired sessions purged",
            );
        }
        purged
    }

    /// Returns the number of stored [`Session`]s, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Indicates whether this [`SessionTable`] stores no [`Session`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod spec {
    use std::{collections::HashSet, sync::Arc, time::Duration};

    use super::SessionTable;
    use crate::domain::user::{
        self,
        session::{ExpirationDateTime, Token},
    };

    const TTL: Duration = Duration::from_secs(3600);

    fn alice() -> user::Name {
        user::Name::new("alice").unwrap()
    }

    fn epoch() -> ExpirationDateTime {
        ExpirationDateTime::from_unix_timestamp(1_000_000).unwrap()
    }

    #[test]
    fn unknown_token_is_not_found() {
        let table = SessionTable::new(TTL);
        drop(table.create(alice()).unwrap());

        assert!(table.lookup(&Token::from("unknown")).is_none());
    }

    #[test]
    fn valid_strictly_before_expiry() {
        let table = SessionTable::new(TTL);
        let created = epoch();
        let session = table.create_at(alice(), created).unwrap();

        assert_eq!(session.expires_at, created + TTL);
        for offset in [0, 1, TTL.as_secs() - 1] {
            let at = created + Duration::from_secs(offset);
            let found = table.lookup_at(&session.token, at).unwrap();
            assert_eq!(found.user, alice());
        }
        assert!(table
            .lookup_at(&session.token, created + TTL - Duration::from_micros(1))
            .is_some());
        assert!(table.lookup_at(&session.token, created + TTL).is_none());
    }

    #[test]
    fn evicts_expired_on_lookup() {
        let table = SessionTable::new(TTL);
        let session = table.create_at(alice(), epoch()).unwrap();

        assert!(table.lookup_at(&session.token, epoch() + TTL).is_none());
        assert!(table.is_empty());
        assert!(table.lookup_at(&session.token, epoch()).is_none());
    }

    #[test]
    fn invalidate_is_idempotent() {
        let table = SessionTable::new(TTL);
        let session = table.create(alice()).unwrap();
        let other = table.create(alice()).unwrap();

        assert!(table.invalidate(&session.token));
        let once = table.len();
        assert!(!table.invalidate(&session.token));

        assert_eq!(table.len(), once);
        assert!(table.lookup(&session.token).is_none());
        assert!(table.lookup(&other.token).is_some());
    }

    #[test]
    fn purges_only_expired() {
        let table = SessionTable::new(TTL);
        let old = table.create_at(alice(), epoch()).unwrap();
        let fresh = table.create_at(alice(), epoch() + TTL).unwrap();

        assert_eq!(table.purge_expired(epoch() + TTL), 1);
        assert_eq!(table.len(), 1);
        assert!(table.lookup_at(&old.token, epoch()).is_none());
        assert!(table.lookup_at(&fresh.token, epoch() + TTL).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_creates_yield_distinct_retrievable_tokens() {
        let table = Arc::new(SessionTable::new(TTL));

        let handles = (0..100)
            .map(|i| {
                let table = Arc::clone(&table);
                tokio::spawn(async move {
                    let name = user::Name::new(format!("user{i}")).unwrap();
                    table.create(name).unwrap()
                })
            })
            .collect::<Vec<_>>();
        let mut sessions = Vec::with_capacity(handles.len());
        for h in handles {
            sessions.push(h.await.unwrap());
        }

        let tokens = sessions
            .iter()
            .map(|s| s.token.clone())
            .collect::<HashSet<_>>();
        assert_eq!(tokens.len(), 100);
        for s in &sessions {
            assert_eq!(table.lookup(&s.token).unwrap().user, s.user);
        }
    }
}
