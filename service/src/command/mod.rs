//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_comment;
pub mod create_user_session;
pub mod delete_user_session;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    create_comment::CreateComment, create_user_session::CreateUserSession,
    delete_user_session::DeleteUserSession,
};
