//! [`Thumbnail`] definitions.

#[cfg(doc)]
use common::DateTime;

use crate::domain::post;
#[cfg(doc)]
use crate::domain::Post;

/// Read-only projection of a [`Post`] used by listings.
#[derive(Clone, Debug)]
pub struct Thumbnail {
    /// [`post::Link`] of the [`Post`].
    pub link: post::Link,

    /// [`post::Title`] of the [`Post`].
    pub title: post::Title,

    /// [`post::Summary`] of the [`Post`].
    pub summary: post::Summary,

    /// [`DateTime`] when the [`Post`] was last modified.
    pub updated_at: post::ModificationDateTime,
}

/// Limit of a [`Thumbnail`]s listing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Limit {
    /// At most this many most recently updated [`Post`]s.
    At(u32),

    /// Every [`Post`], newest first by creation.
    None,
}

impl From<u32> for Limit {
    /// Zero means no limit.
    fn from(n: u32) -> Self {
        if n == 0 {
            Self::None
        } else {
            Self::At(n)
        }
    }
}
