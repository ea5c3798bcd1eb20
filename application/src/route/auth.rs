//! Login and logout.

use std::convert::Infallible;

use axum_extra::extract::cookie::{Cookie, Expiration, SameSite};
use common::DateTime;
use derive_more::Debug;
use http::{header, HeaderMap};
use secrecy::SecretBox;
use serde::Deserialize;
use service::{
    command::{
        create_user_session, Command, CreateUserSession, DeleteUserSession,
    },
    domain::{post, user, user::Session},
};
use tracerr::Traced;
use tracing as log;

use crate::{
    context::SESSION_COOKIE, error::AuthError, AsError, Context, Error,
};

use super::{Pages, Reply};

/// Credentials submitted by the login form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Name of the user.
    pub username: String,

    /// Password of the user.
    #[debug(skip)]
    pub password: String,
}

/// Creates a new [`Session`] out of the provided [`Credentials`].
///
/// Responds with the login form collapsed and the identity shown, both
/// out-of-band, and sets the session cookie. Wrong [`Credentials`] re-render
/// the login form with an error and `401 Unauthorized`, setting no cookie.
///
/// # Errors
///
/// If the storage or the password verification fails, or a fragment fails to
/// render.
pub async fn login<S>(
    ctx: &Context<S>,
    pages: &Pages,
    credentials: Credentials,
) -> Result<Reply, Error>
where
    S: Command<
        CreateUserSession,
        Ok = Session,
        Err = Traced<create_user_session::ExecutionError>,
    >,
{
    use create_user_session::ExecutionError as E;

    let Credentials { username, password } = credentials;

    let session = match user::Name::new(username) {
        Some(name) => {
            ctx.service()
                .execute(CreateUserSession {
                    name,
                    password: SecretBox::new(Box::new(password.into())),
                })
                .await
        }
        None => Err(tracerr::new!(E::WrongCredentials)),
    };
    let session = match session {
        Ok(s) => s,
        Err(e) if matches!(AsRef::<E>::as_ref(&e), E::WrongCredentials) => {
            let err = e.as_error();
            let form = pages.view(None).error(&err.message);
            let reply = Reply::fragments(vec![pages.fragment(
                "auth",
                "login-form",
                form,
            )?]);
            return Ok(reply.with_status(err.status_code));
        }
        Err(e) => return Err(e.into_error()),
    };
    log::debug!(user = %session.user, "logged in");

    let view = pages.view(Some(&session.identity()));
    Ok(Reply::fragments(vec![
        pages.fragment("auth", "login-collapsed", view.clone())?,
        pages.fragment("auth", "identity", view.oob(true))?,
    ])
    .with_cookie(session_cookie(&session)))
}

/// Invalidates the [`Session`] of the request and clears its cookie.
///
/// Responds with the anonymous identity, along with the anonymous comment form
/// swapped out-of-band if the request `headers` name a post page as the
/// `Referer`.
///
/// # Errors
///
/// - [`AuthError::Unauthenticated`] if the request has no session cookie.
/// - Internal [`Error`] if a fragment fails to render.
pub async fn logout<S>(
    ctx: &Context<S>,
    pages: &Pages,
    headers: &HeaderMap,
) -> Result<Reply, Error>
where
    S: Command<DeleteUserSession, Ok = bool, Err = Infallible>,
{
    let token = ctx.token().cloned().ok_or(AuthError::Unauthenticated)?;

    let removed = ctx
        .service()
        .execute(DeleteUserSession { token })
        .await
        .unwrap_or_else(|e| match e {});
    log::debug!(removed, "logged out");

    let view = pages.view(None);
    let mut fragments =
        vec![pages.fragment("auth", "identity", view.clone())?];
    let referer = headers.get(header::REFERER).and_then(|h| h.to_str().ok());
    if let Some(link) = referer.and_then(referred_post) {
        fragments.push(pages.fragment(
            "post",
            "comment-form",
            view.link(&link).oob(true),
        )?);
    }
    Ok(Reply::fragments(fragments).with_cookie(cleared_cookie()))
}

impl AsError for create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::WrongCredentials => Some(AuthError::WrongCredentials.into()),
            Self::PasswordHash(_) | Self::Join(_) | Self::Entropy(_) => None,
        }
    }
}

/// Builds the cookie carrying the provided [`Session`] until it expires.
fn session_cookie(session: &Session) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .expires(Expiration::DateTime(session.expires_at.into()))
        .build()
}

/// Builds the cookie overwriting the session one with an already elapsed one.
fn cleared_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .expires(Expiration::DateTime(DateTime::UNIX_EPOCH.into()))
        .build()
}

/// Extracts the [`post::Link`] of the post page the provided `referer` URL
/// points to, if any.
fn referred_post(referer: &str) -> Option<post::Link> {
    let uri = referer.parse::<http::Uri>().ok()?;
    let link = uri.path().strip_prefix("/posts/")?.trim_end_matches('/');
    post::Link::new(link)
}

#[cfg(test)]
mod spec {
    use axum_extra::extract::cookie::SameSite;
    use common::DateTime;
    use http::{header, HeaderMap, HeaderValue};
    use service::domain::user::session;

    use crate::route::{fixture, Body, Reply};

    use super::{referred_post, Credentials};

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    fn referred_by(url: Option<&'static str>) -> HeaderMap {
        url.map(|u| (header::REFERER, HeaderValue::from_static(u)))
            .into_iter()
            .collect()
    }

    fn html(reply: &Reply) -> Vec<&str> {
        let Body::Fragments(fragments) = &reply.body else {
            panic!("not fragments");
        };
        fragments.iter().map(|f| f.html.as_str()).collect()
    }

    #[tokio::test]
    async fn login_sets_cookie_and_swaps_identity() {
        let (service, pages) = fixture::setup();
        _ = fixture::add_user(&service, "alice", "secret");

        let reply = super::login(
            &fixture::anonymous(&service),
            &pages,
            credentials("alice", "secret"),
        )
        .await
        .unwrap();

        assert_eq!(reply.status.as_u16(), 200);
        assert_eq!(reply.fragment_names(), ["login-collapsed", "identity"]);
        let fragments = html(&reply);
        assert!(fragments[0].contains("hidden"), "{}", fragments[0]);
        assert!(fragments[1].contains("hx-swap-oob"), "{}", fragments[1]);
        assert!(fragments[1].contains("Logout, alice"), "{}", fragments[1]);

        let cookie = reply.cookie.unwrap();
        assert_eq!(cookie.name(), "session_token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));

        let token = session::Token::from(cookie.value());
        let session = service.sessions().lookup(&token).unwrap();
        assert_eq!(session.user.to_string(), "alice");
        assert_eq!(
            cookie.expires_datetime(),
            Some(session.expires_at.into()),
        );
    }

    #[tokio::test]
    async fn wrong_credentials_rerender_login_form() {
        let (service, pages) = fixture::setup();
        _ = fixture::add_user(&service, "alice", "secret");

        for (name, password) in
            [("alice", "wrong"), ("bob", "secret"), ("", "secret")]
        {
            let reply = super::login(
                &fixture::anonymous(&service),
                &pages,
                credentials(name, password),
            )
            .await
            .unwrap();

            assert_eq!(reply.status.as_u16(), 401);
            assert_eq!(reply.fragment_names(), ["login-form"]);
            assert!(
                html(&reply)[0].contains("Invalid username or password"),
                "{}",
                html(&reply)[0],
            );
            assert!(reply.cookie.is_none());
        }
        assert!(service.sessions().is_empty());
        assert_eq!(service.database().calls().select_user, 2);
    }

    #[tokio::test]
    async fn storage_failure_on_login_is_internal_error() {
        let (service, pages) = fixture::setup();
        service.database().set_unavailable(true);

        let err = super::login(
            &fixture::anonymous(&service),
            &pages,
            credentials("alice", "secret"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code.as_u16(), 500);
    }

    #[tokio::test]
    async fn logout_without_cookie_is_unauthenticated() {
        let (service, pages) = fixture::setup();
        let (_, session) = fixture::signed_in(&service, "alice");

        let err = super::logout(
            &fixture::anonymous(&service),
            &pages,
            &referred_by(None),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code.as_u16(), 401);
        assert_eq!(service.sessions().len(), 1);
        assert!(service.sessions().lookup(&session.token).is_some());
    }

    #[tokio::test]
    async fn logout_invalidates_session_and_clears_cookie() {
        let (service, pages) = fixture::setup();
        let (ctx, session) = fixture::signed_in(&service, "alice");

        let reply = super::logout(&ctx, &pages, &referred_by(None))
            .await
            .unwrap();

        assert_eq!(reply.fragment_names(), ["identity"]);
        assert!(html(&reply)[0].contains(r#"id="login""#));
        assert!(service.sessions().lookup(&session.token).is_none());

        let cookie = reply.cookie.unwrap();
        assert_eq!(cookie.name(), "session_token");
        assert_eq!(cookie.value(), "");
        assert_eq!(
            cookie.expires_datetime(),
            Some(DateTime::UNIX_EPOCH.into()),
        );
    }

    #[tokio::test]
    async fn logout_from_post_page_resets_comment_form() {
        let (service, pages) = fixture::setup();
        let (ctx, _) = fixture::signed_in(&service, "alice");

        let reply = super::logout(
            &ctx,
            &pages,
            &referred_by(Some("http://localhost:8080/posts/hello")),
        )
        .await
        .unwrap();

        assert_eq!(reply.fragment_names(), ["identity", "comment-form"]);
        let form = html(&reply)[1];
        assert!(form.contains("hx-swap-oob"), "{form}");
        assert!(form.contains("Log in to comment."), "{form}");
    }

    #[tokio::test]
    async fn logout_from_other_page_keeps_comment_form() {
        let (service, pages) = fixture::setup();
        let (ctx, _) = fixture::signed_in(&service, "alice");

        let reply = super::logout(
            &ctx,
            &pages,
            &referred_by(Some("http://localhost:8080/posts")),
        )
        .await
        .unwrap();

        assert_eq!(reply.fragment_names(), ["identity"]);
    }

    #[test]
    fn extracts_referred_post() {
        assert_eq!(
            referred_post("https://example.com/posts/hello")
                .map(|l| l.to_string()),
            Some("hello".into()),
        );
        assert_eq!(
            referred_post("/posts/hello/").map(|l| l.to_string()),
            Some("hello".into()),
        );
        assert!(referred_post("https://example.com/").is_none());
        assert!(referred_post("https://example.com/posts").is_none());
    }
}
