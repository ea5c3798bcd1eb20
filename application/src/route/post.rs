//! Single [`Post`] and its [`Comment`]s.

use std::convert::Infallible;

use serde::Deserialize;
use service::{
    command::{create_comment, AuthorizeUserSession, Command, CreateComment},
    domain::{post, user::Session, Comment, Post},
    infra::database,
    query, Query,
};
use tracerr::Traced;

use crate::{
    error::{AuthError, InputError, NotFoundError},
    AsError, Context, Error,
};

use super::{Pages, Reply};

/// Form submitting a new [`Comment`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    /// Text of the [`Comment`].
    pub comment: String,
}

/// Renders the page of the [`Post`] addressed by the provided `link`, along
/// with its [`Comment`]s.
///
/// Responds with the not found page if there is no such [`Post`].
///
/// # Errors
///
/// If the storage fails or the page fails to render.
pub async fn view<S>(
    ctx: &Context<S>,
    pages: &Pages,
    link: &str,
) -> Result<Reply, Error>
where
    S: Command<AuthorizeUserSession, Ok = Option<Session>, Err = Infallible>
        + Query<
            query::post::ByLink,
            Ok = Option<Post>,
            Err = Traced<database::Error>,
        > + Query<
            query::comments::OfPost,
            Ok = Vec<Comment>,
            Err = Traced<database::Error>,
        >,
{
    let identity = ctx.identity().await;

    let post = match post::Link::new(link) {
        Some(link) => ctx
            .service()
            .execute(query::post::ByLink::by(link))
            .await
            .map_err(AsError::into_error)?,
        None => None,
    };
    let Some(post) = post else {
        return pages.not_found(identity, &format!("/posts/{link}"));
    };

    let comments = ctx
        .service()
        .execute(query::comments::OfPost::by(post.id))
        .await
        .map_err(AsError::into_error)?;

    let view = pages
        .view(identity)
        .title(post.title.as_ref(), pages.site())
        .post(&post)
        .comments(&comments);
    pages.page("post", view)
}

/// Appends a [`Comment`] to the [`Post`] addressed by the provided `link`.
///
/// Responds with the new [`Comment`] appended out-of-band to the list, and a
/// fresh comment form replacing the submitted one.
///
/// # Errors
///
/// - [`AuthError::Unauthenticated`] if the request has no live session, or
///   its user no longer exists.
/// - [`InputError::EmptyComment`] if the `body` is blank.
/// - [`NotFoundError::Post`] if there is no such [`Post`].
/// - Internal [`Error`] if the storage fails or a fragment fails to render.
pub async fn comment<S>(
    ctx: &Context<S>,
    pages: &Pages,
    link: &str,
    body: String,
) -> Result<Reply, Error>
where
    S: Command<AuthorizeUserSession, Ok = Option<Session>, Err = Infallible>
        + Command<
            CreateComment,
            Ok = Comment,
            Err = Traced<create_comment::ExecutionError>,
        >,
{
    let identity = ctx.identity().await.ok_or(AuthError::Unauthenticated)?;

    let comment = ctx
        .service()
        .execute(CreateComment {
            post: link.to_owned(),
            author: identity.name.clone(),
            body,
        })
        .await
        .map_err(AsError::into_error)?;
    let link = post::Link::new(link).ok_or(NotFoundError::Post)?;

    let form = pages.view(Some(identity)).link(&link);
    Ok(Reply::fragments(vec![
        pages.fragment("post", "new-comment", form.clone().comment(&comment))?,
        pages.fragment("post", "comment-form", form)?,
    ]))
}

impl AsError for create_comment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::AuthorNotExists(_) => Some(AuthError::Unauthenticated.into()),
            Self::EmptyBody => Some(InputError::EmptyComment.into()),
            Self::PostNotExists(_) => Some(NotFoundError::Post.into()),
        }
    }
}
