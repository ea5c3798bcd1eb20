//! [`Query`] collection related to multiple [`Comment`]s.

use common::operations::By;

#[cfg(doc)]
use crate::domain::Post;
use crate::domain::{post, Comment};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries all [`Comment`]s of a [`Post`], oldest first.
pub type OfPost = DatabaseQuery<By<Vec<Comment>, post::Id>>;
