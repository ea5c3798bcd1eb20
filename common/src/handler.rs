//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler.
///
/// The single abstraction behind commands, queries, database operations and
/// background tasks: the `Args` type names the operation, the implementor
/// decides how to carry it out.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
