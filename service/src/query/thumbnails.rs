//! [`Query`] collection related to multiple [`Thumbnail`]s.

use common::operations::By;

use crate::domain::{thumbnail, Thumbnail};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries [`Thumbnail`]s of the latest [`Post`]s within a
/// [`thumbnail::Limit`].
///
/// [`Post`]: crate::domain::Post
pub type Latest = DatabaseQuery<By<Vec<Thumbnail>, thumbnail::Limit>>;
