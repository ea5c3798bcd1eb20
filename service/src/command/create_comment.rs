//! [`Command`] for creating a [`Comment`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{comment, post, user, Comment, Post, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Comment`] under a [`Post`].
#[derive(Clone, Debug)]
pub struct CreateComment {
    /// Submitted [`post::Link`] of the [`Post`] to comment, possibly
    /// malformed.
    pub post: String,

    /// [`user::Name`] of the commenting [`User`].
    pub author: user::Name,

    /// Submitted text of the [`Comment`], possibly blank.
    pub body: String,
}

impl<Db> Command<CreateComment> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Name>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Post>, post::Link>>,
            Ok = Option<Post>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<comment::Draft>,
            Ok = Comment,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Comment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateComment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateComment { post, author, body } = cmd;

        let author = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(author.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map(|u| u.name)
            .ok_or(E::AuthorNotExists(author))
            .map_err(tracerr::wrap!())?;

        let body = comment::Body::new(body)
            .ok_or(E::EmptyBody)
            .map_err(tracerr::wrap!())?;

        let link = post::Link::new(post.as_str())
            .ok_or_else(|| E::PostNotExists(post.clone()))
            .map_err(tracerr::wrap!())?;
        let post = self
            .database()
            .execute(Select(By::<Option<Post>, _>::new(link)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PostNotExists(post))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Insert(comment::Draft {
                post: post.id,
                author,
                body,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`CreateComment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] with the provided [`user::Name`] does not exist.
    #[display("`User(name: {_0})` does not exist")]
    AuthorNotExists(#[error(not(source))] user::Name),

    /// Submitted text of the [`Comment`] is blank.
    #[display("`Comment` body is empty")]
    EmptyBody,

    /// [`Post`] with the provided link does not exist.
    #[display("`Post(link: {_0})` does not exist")]
    PostNotExists(#[error(not(source))] String),
}
