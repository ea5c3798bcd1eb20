//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From};

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Authenticated [`User`] session.
///
/// Identifies its [`User`] by value through the [`user::Name`] only.
#[derive(Clone, Debug)]
pub struct Session {
    /// [`Token`] this [`Session`] is addressed by.
    pub token: Token,

    /// [`user::Name`] of the [`User`] this [`Session`] belongs to.
    pub user: user::Name,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Checks whether this [`Session`] is still valid at the provided
    /// [`DateTime`].
    ///
    /// The expiration moment itself is already invalid.
    #[must_use]
    pub fn is_valid_at(&self, now: ExpirationDateTime) -> bool {
        now < self.expires_at
    }

    /// Returns the [`Identity`] this [`Session`] stands for.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            name: self.user.clone(),
        }
    }
}

/// Opaque access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, PartialEq)]
#[as_ref(str)]
#[from(&str, String)]
pub struct Token(String);

impl Token {
    /// Generates a new random [`Token`] carrying 128 bits of entropy.
    ///
    /// # Errors
    ///
    /// If the system entropy source is unavailable.
    pub fn generate() -> Result<Self, EntropyError> {
        let mut bytes = [0; 16];
        getrandom::getrandom(&mut bytes).map_err(EntropyError)?;
        Ok(Self(
            uuid::Builder::from_random_bytes(bytes)
                .into_uuid()
                .hyphenated()
                .to_string(),
        ))
    }
}

/// Error of generating a new [`Token`].
#[derive(Debug, Display, Error)]
#[display("entropy source failed: {_0}")]
pub struct EntropyError(getrandom::Error);

/// Identity of a request, resolved from its [`Session`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Identity {
    /// [`user::Name`] of the authenticated [`User`].
    pub name: user::Name,
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::{collections::HashSet, time::Duration};

    use super::{ExpirationDateTime, Session, Token};
    use crate::domain::user;

    #[test]
    fn generates_distinct_uuid_tokens() {
        let tokens = (0..100)
            .map(|_| Token::generate().unwrap())
            .collect::<HashSet<_>>();

        assert_eq!(tokens.len(), 100);
        for t in &tokens {
            let uuid = uuid::Uuid::parse_str(t.as_ref()).unwrap();
            assert_eq!(uuid.get_version_num(), 4);
        }
    }

    #[test]
    fn expires_exactly_at_deadline() {
        let expires_at = ExpirationDateTime::from_unix_timestamp(100).unwrap();
        let session = Session {
            token: Token::from("t"),
            user: user::Name::new("alice").unwrap(),
            expires_at,
        };

        assert!(session.is_valid_at(expires_at - Duration::from_secs(1)));
        assert!(!session.is_valid_at(expires_at));
        assert!(!session.is_valid_at(expires_at + Duration::from_secs(1)));
    }
}
