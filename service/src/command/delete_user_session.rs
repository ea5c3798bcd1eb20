//! [`Command`] for deleting a [`Session`].

use std::convert::Infallible;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Session`] by its [`session::Token`].
///
/// Resolves to whether a [`Session`] has been deleted. Deleting an unknown
/// [`Session`] is a no-op.
#[derive(Clone, Debug)]
pub struct DeleteUserSession {
    /// [`session::Token`] of the [`Session`] to delete.
    pub token: session::Token,
}

impl<Db> Command<DeleteUserSession> for Service<Db> {
    type Ok = bool;
    type Err = Infallible;

    async fn execute(
        &self,
        cmd: DeleteUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.sessions().invalidate(&cmd.token))
    }
}
