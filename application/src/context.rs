//! [`Context`]-related definitions.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::extract::CookieJar;
use service::{
    command::{AuthorizeUserSession, Command},
    domain::user::{
        session::{self, Identity},
        Session,
    },
};
use tokio::sync::OnceCell;

use crate::Error;

/// Name of the cookie carrying a [`session::Token`].
pub const SESSION_COOKIE: &str = "session_token";

/// Request context, resolving its [`Identity`] at most once.
#[derive(Debug)]
pub struct Context<S> {
    /// Service instance.
    service: S,

    /// [`session::Token`] presented by the client, if any.
    token: Option<session::Token>,

    /// Lazily resolved [`Identity`].
    identity: OnceCell<Option<Identity>>,
}

impl<S> Context<S> {
    /// Creates a new [`Context`] of a request presenting the provided
    /// [`session::Token`].
    #[must_use]
    pub fn new(service: S, token: Option<session::Token>) -> Self {
        Self {
            service,
            token,
            identity: OnceCell::new(),
        }
    }

    /// Returns the service of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Returns the [`session::Token`] presented by the client, if any.
    #[must_use]
    pub fn token(&self) -> Option<&session::Token> {
        self.token.as_ref()
    }

    /// Resolves the [`Identity`] of this [`Context`].
    ///
    /// [`None`] means an anonymous request.
    pub async fn identity(&self) -> Option<&Identity>
    where
        S: Command<
            AuthorizeUserSession,
            Ok = Option<Session>,
            Err = Infallible,
        >,
    {
        self.identity
            .get_or_init(|| {
                resolve(&self.service, self.token.as_ref().map(AsRef::as_ref))
            })
            .await
            .as_ref()
    }
}

/// Resolves an [`Identity`] out of the provided session cookie value.
///
/// A missing cookie and an unknown or expired [`Session`] both resolve into an
/// anonymous request.
pub async fn resolve<S>(service: &S, cookie: Option<&str>) -> Option<Identity>
where
    S: Command<AuthorizeUserSession, Ok = Option<Session>, Err = Infallible>,
{
    let token = cookie.filter(|c| !c.is_empty())?;
    service
        .execute(AuthorizeUserSession {
            token: token.into(),
        })
        .await
        .unwrap_or_else(|e| match e {})
        .as_ref()
        .map(Session::identity)
}

#[async_trait]
impl<S, St> FromRequestParts<St> for Context<S>
where
    S: Clone + Send + Sync + 'static,
    St: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &St,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<S>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing service extension"))?;
        let token = CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty())
            .map(session::Token::from);

        Ok(Self::new(service, token))
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use axum::extract::FromRequestParts as _;
    use http::{header, Request};
    use service::{domain::user, infra::Memory, Config, Service};

    use super::{resolve, Context, SESSION_COOKIE};

    fn service() -> Service<Memory> {
        let config = Config {
            session_ttl: Duration::from_secs(60),
            ..Config::default()
        };
        Service::new(config, Memory::default()).0
    }

    fn request(
        service: Option<&Service<Memory>>,
        cookie: Option<&str>,
    ) -> Request<()> {
        let mut req = Request::builder().uri("/");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        if let Some(service) = service {
            req = req.extension(service.clone());
        }
        req.body(()).unwrap()
    }

    async fn extract(
        req: Request<()>,
    ) -> Result<Context<Service<Memory>>, crate::Error> {
        let (mut parts, ()) = req.into_parts();
        Context::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn absent_or_unknown_cookie_is_anonymous() {
        let service = service();

        assert_eq!(resolve(&service, None).await, None);
        assert_eq!(resolve(&service, Some("")).await, None);
        assert_eq!(resolve(&service, Some("unknown")).await, None);
    }

    #[tokio::test]
    async fn resolves_live_session() {
        let service = service();
        let name = user::Name::new("alice").unwrap();
        let session = service.sessions().create(name.clone()).unwrap();

        let identity = resolve(&service, Some(session.token.as_ref()))
            .await
            .unwrap();
        assert_eq!(identity.name, name);

        let ctx = Context::new(service.clone(), Some(session.token.clone()));
        assert_eq!(ctx.identity().await.map(|i| &i.name), Some(&name));

        _ = service.sessions().invalidate(&session.token);
        assert_eq!(
            ctx.identity().await.map(|i| &i.name),
            Some(&name),
            "resolved once per request",
        );
        assert_eq!(resolve(&service, Some(session.token.as_ref())).await, None);
    }

    #[tokio::test]
    async fn extracts_session_cookie_from_request() {
        let service = service();
        let name = user::Name::new("alice").unwrap();
        let session = service.sessions().create(name.clone()).unwrap();

        let cookie = format!("theme=dark; {SESSION_COOKIE}={}", session.token);
        let ctx = extract(request(Some(&service), Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(ctx.token(), Some(&session.token));
        assert_eq!(ctx.identity().await.map(|i| &i.name), Some(&name));
    }

    #[tokio::test]
    async fn empty_or_absent_cookie_extracts_anonymous() {
        let service = service();
        _ = service
            .sessions()
            .create(user::Name::new("alice").unwrap())
            .unwrap();

        for cookie in [None, Some("session_token="), Some("theme=dark")] {
            let ctx = extract(request(Some(&service), cookie)).await.unwrap();

            assert_eq!(ctx.token(), None, "{cookie:?}");
            assert_eq!(ctx.identity().await, None, "{cookie:?}");
        }
    }

    #[tokio::test]
    async fn missing_service_is_internal_error() {
        let err = extract(request(None, Some("session_token=t")))
            .await
            .unwrap_err();

        assert_eq!(err.status_code.as_u16(), 500);
    }
}
