//! [`Command`] for creating a [`Session`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tokio::task;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::Password;
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`] by [`User`] credentials.
#[derive(Debug)]
pub struct CreateUserSession {
    /// [`user::Name`] of a [`User`].
    pub name: user::Name,

    /// [`Password`] of a [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Name>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUserSession { name, password } = cmd;

        let user = self
            .database()
            .execute(Select(By::new(name)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::WrongCredentials)
            .map_err(tracerr::wrap!())?;

        let User {
            name,
            password_hash,
            ..
        } = user;
        let verified = task::spawn_blocking(move || {
            password_hash.verify(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;
        if !verified {
            log::debug!(user = %name, "wrong password");
            return Err(tracerr::new!(E::WrongCredentials));
        }

        self.sessions()
            .create(name)
            .map_err(tracerr::from_and_wrap!(=> E))
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Stored [`user::PasswordHash`] cannot be verified.
    #[display("Failed to verify `PasswordHash`: {_0}")]
    #[from]
    PasswordHash(argon2::password_hash::Error),

    /// Blocking verification task panicked or was cancelled.
    #[display("Password verification task failed: {_0}")]
    #[from]
    Join(task::JoinError),

    /// [`session::Token`] cannot be generated.
    #[display("Failed to generate `session::Token`: {_0}")]
    #[from]
    Entropy(session::EntropyError),

    /// [`CreateUserSession`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}
