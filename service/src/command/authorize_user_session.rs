//! [`Command`] for authorizing a [`Session`].

use std::convert::Infallible;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`] by its [`session::Token`].
///
/// Resolves to [`None`] if the [`Session`] is unknown or expired, which is a
/// regular anonymous request rather than a failure.
#[derive(Clone, Debug)]
pub struct AuthorizeUserSession {
    /// [`session::Token`] to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db> {
    type Ok = Option<Session>;
    type Err = Infallible;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.sessions().lookup(&cmd.token))
    }
}
