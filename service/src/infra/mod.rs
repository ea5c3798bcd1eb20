//! Infrastructure layer.

pub mod database;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub use self::database::Memory;
pub use self::{database::Database, session::SessionTable};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
