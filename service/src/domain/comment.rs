//! [`Comment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

use crate::domain::{post, user};
#[cfg(doc)]
use crate::domain::{Post, User};

/// Comment left by a [`User`] under a [`Post`].
///
/// Immutable once created.
#[derive(Clone, Debug)]
pub struct Comment {
    /// [`user::Name`] of the [`User`] who wrote this [`Comment`].
    pub author: user::Name,

    /// [`Body`] of this [`Comment`].
    pub body: Body,

    /// [`DateTime`] when this [`Comment`] was created.
    pub created_at: CreationDateTime,
}

/// Text of a [`Comment`], exactly as submitted.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Body(String);

impl Body {
    /// Creates a new [`Body`] unless the given `body` is blank.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Option<Self> {
        let body = body.into();
        (!body.trim().is_empty()).then_some(Self(body))
    }
}

/// Not yet stored [`Comment`].
#[derive(Clone, Debug)]
pub struct Draft {
    /// [`post::Id`] of the [`Post`] being commented.
    pub post: post::Id,

    /// [`user::Name`] of the [`User`] writing the [`Comment`].
    pub author: user::Name,

    /// [`Body`] of the [`Comment`].
    pub body: Body,
}

/// [`DateTime`] when a [`Comment`] was created.
pub type CreationDateTime = DateTimeOf<(Comment, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::Body;

    #[test]
    fn rejects_blank_body() {
        assert!(Body::new("").is_none());
        assert!(Body::new(" \n\t").is_none());
    }

    #[test]
    fn keeps_body_verbatim() {
        let body = Body::new("  hi ").unwrap();

        assert_eq!(AsRef::<str>::as_ref(&body), "  hi ");
    }
}
