//! [`Post`] definitions.

use std::{str::FromStr, sync::LazyLock};

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::{Comment, User};

/// Published post.
///
/// [`Comment`]s are not part of a [`Post`] and are fetched separately.
#[derive(Clone, Debug)]
pub struct Post {
    /// ID of this [`Post`].
    pub id: Id,

    /// [`Link`] this [`Post`] is addressed by.
    pub link: Link,

    /// Title of this [`Post`].
    pub title: Title,

    /// Summary of this [`Post`].
    pub summary: Summary,

    /// [`user::Name`] of the [`User`] who wrote this [`Post`].
    pub author: user::Name,

    /// [`Content`] of this [`Post`].
    pub content: Content,

    /// [`DateTime`] when this [`Post`] was last modified.
    pub updated_at: ModificationDateTime,
}

/// Internal ID of a [`Post`].
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(i32);

/// URL-safe external identifier of a [`Post`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Link(String);

impl Link {
    /// Creates a new [`Link`] if the given `link` is valid.
    #[must_use]
    pub fn new(link: impl Into<String>) -> Option<Self> {
        let link = link.into();
        Self::check(&link).then_some(Self(link))
    }

    /// Checks whether the given `link` is a valid [`Link`].
    fn check(link: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Link`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Za-z0-9_-]{1,255}$").expect("valid regex")
        });

        REGEX.is_match(link.as_ref())
    }
}

impl FromStr for Link {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Link`")
    }
}

/// Title of a [`Post`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

/// Summary of a [`Post`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Summary(String);

/// Content of a [`Post`].
///
/// Trusted markup written by the site owner, rendered as is.
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Content(String);

/// [`DateTime`] when a [`Post`] was created.
pub type CreationDateTime = DateTimeOf<(Post, unit::Creation)>;

/// [`DateTime`] when a [`Post`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Post, unit::Modification)>;
