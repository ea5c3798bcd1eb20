//! HTTP routes dispatching requests into pages and fragments.

pub mod auth;
#[cfg(test)]
mod fixture;
pub mod listing;
pub mod post;

use std::sync::Arc;

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post as post_method},
    Extension, Form, Router,
};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use service::domain::user::session::Identity;
use tower_http::services::ServeDir;
use tracing as log;

use crate::{
    config,
    template::{view::Site, Registry, View},
    AsError, Context, Error, Service,
};

/// Content type of HTML responses.
pub const HTML: &str = "text/html; charset=utf-8";

/// Content type of XML responses.
pub const XML: &str = "application/xml";

/// Name of the page telling nothing lives at the requested path.
const NOT_FOUND: &str = "not-found";

/// Builds the [`Router`] serving the site out of the provided [`Service`].
pub fn router(
    service: Service,
    pages: Pages,
    assets: &config::Assets,
) -> Router {
    Router::new()
        .route("/", get(handler::index))
        .route("/posts", get(handler::posts))
        .route("/posts/:link", get(handler::post))
        .route("/posts/:link/comment", post_method(handler::comment))
        .route("/login", post_method(handler::login))
        .route("/logout", get(handler::logout))
        .route("/rss.xml", get(handler::rss))
        .nest_service(&assets.prefix, ServeDir::new(&assets.directory))
        .fallback(handler::not_found)
        .layer(Extension(pages))
        .layer(Extension(service))
}

/// [`Registry`] along with the [`Site`] its pages describe.
#[derive(Clone, Debug)]
pub struct Pages {
    /// Composed templates.
    registry: Arc<Registry>,

    /// Site-wide values.
    site: Arc<Site>,

    /// Number of posts listed on the index page.
    index_limit: u32,
}

impl Pages {
    /// Creates new [`Pages`].
    #[must_use]
    pub fn new(registry: Registry, site: Site, index_limit: u32) -> Self {
        Self {
            registry: Arc::new(registry),
            site: Arc::new(site),
            index_limit,
        }
    }

    /// Returns the [`Site`] of these [`Pages`].
    #[must_use]
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Returns the number of posts listed on the index page.
    #[must_use]
    pub fn index_limit(&self) -> u32 {
        self.index_limit
    }

    /// Creates a new [`View`] seen by the provided [`Identity`].
    #[must_use]
    pub fn view(&self, identity: Option<&Identity>) -> View {
        View::new(&self.site, identity)
    }

    /// Renders the whole page `name`d so.
    ///
    /// An unknown page is rendered as the not-found one, with
    /// `404 Not Found`.
    ///
    /// # Errors
    ///
    /// If the page fails to render, or neither it nor the not-found page
    /// exists.
    pub fn page(&self, name: &str, view: View) -> Result<Reply, Error> {
        if name != NOT_FOUND && !self.registry.contains(name) {
            log::warn!("no `{name}` page template, rendering `{NOT_FOUND}`");
            let view = view.title("Not found", &self.site);
            return Ok(self
                .page(NOT_FOUND, view)?
                .with_status(StatusCode::NOT_FOUND));
        }
        self.registry
            .render_page(name, view)
            .map(Reply::page)
            .map_err(AsError::into_error)
    }

    /// Renders the `fragment` of the page `name`d so.
    ///
    /// # Errors
    ///
    /// If the page or fragment is unknown or fails to render.
    pub fn fragment(
        &self,
        name: &str,
        fragment: &str,
        view: View,
    ) -> Result<Fragment, Error> {
        self.registry
            .render_fragment(name, fragment, view)
            .map(|html| Fragment {
                name: fragment.to_owned(),
                html,
            })
            .map_err(AsError::into_error)
    }

    /// Renders the page telling nothing lives at the provided `path`.
    ///
    /// # Errors
    ///
    /// If the page fails to render.
    pub fn not_found(
        &self,
        identity: Option<&Identity>,
        path: &str,
    ) -> Result<Reply, Error> {
        let view =
            self.view(identity).title("Not found", &self.site).path(path);
        Ok(self.page(NOT_FOUND, view)?.with_status(StatusCode::NOT_FOUND))
    }
}

/// Response of a route, inspectable before being sent.
#[derive(Debug)]
pub struct Reply {
    /// [`StatusCode`] of this [`Reply`].
    pub status: StatusCode,

    /// Content type of the [`Reply::body`].
    pub content_type: &'static str,

    /// Body of this [`Reply`].
    pub body: Body,

    /// [`Cookie`] to set on the client.
    pub cookie: Option<Cookie<'static>>,
}

/// Body of a [`Reply`].
#[derive(Debug)]
pub enum Body {
    /// Whole page.
    Page(String),

    /// Fragments, in the order the client applies them.
    Fragments(Vec<Fragment>),
}

/// Rendered fragment of a page.
#[derive(Clone, Debug)]
pub struct Fragment {
    /// Name of the rendered template.
    pub name: String,

    /// Rendered HTML.
    pub html: String,
}

impl Reply {
    /// Creates a new [`Reply`] with a whole page.
    #[must_use]
    pub fn page(html: String) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: HTML,
            body: Body::Page(html),
            cookie: None,
        }
    }

    /// Creates a new [`Reply`] with the provided [`Fragment`]s.
    #[must_use]
    pub fn fragments(fragments: Vec<Fragment>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: HTML,
            body: Body::Fragments(fragments),
            cookie: None,
        }
    }

    /// Replaces the [`StatusCode`] of this [`Reply`].
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Replaces the content type of this [`Reply`].
    #[must_use]
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the provided [`Cookie`] on the client.
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookie = Some(cookie);
        self
    }

    /// Returns names of the [`Fragment`]s of this [`Reply`], in order.
    #[must_use]
    pub fn fragment_names(&self) -> Vec<&str> {
        match &self.body {
            Body::Page(_) => vec![],
            Body::Fragments(f) => f.iter().map(|f| f.name.as_str()).collect(),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let Self {
            status,
            content_type,
            body,
            cookie,
        } = self;

        let body = match body {
            Body::Page(html) => html,
            Body::Fragments(fragments) => fragments
                .into_iter()
                .map(|f| f.html)
                .collect::<Vec<_>>()
                .join("\n"),
        };
        let jar = cookie
            .into_iter()
            .fold(CookieJar::new(), |jar, c| jar.add(c));

        (status, jar, [(header::CONTENT_TYPE, content_type)], body)
            .into_response()
    }
}

/// Thin [`axum`] handlers running routes over the [`Service`].
mod handler {
    use super::{
        auth, listing, post, Context, Error, Extension, Form, HeaderMap,
        Pages, Path, Reply, Service, Uri,
    };

    pub(super) async fn index(
        ctx: Context<Service>,
        Extension(pages): Extension<Pages>,
    ) -> Result<Reply, Error> {
        listing::index(&ctx, &pages).await
    }

    pub(super) async fn posts(
        ctx: Context<Service>,
        Extension(pages): Extension<Pages>,
    ) -> Result<Reply, Error> {
        listing::posts(&ctx, &pages).await
    }

    pub(super) async fn rss(
        Extension(service): Extension<Service>,
        Extension(pages): Extension<Pages>,
    ) -> Result<Reply, Error> {
        listing::rss(&service, &pages).await
    }

    pub(super) async fn post(
        ctx: Context<Service>,
        Extension(pages): Extension<Pages>,
        Path(link): Path<String>,
    ) -> Result<Reply, Error> {
        post::view(&ctx, &pages, &link).await
    }

    pub(super) async fn comment(
        ctx: Context<Service>,
        Extension(pages): Extension<Pages>,
        Path(link): Path<String>,
        Form(form): Form<post::CommentForm>,
    ) -> Result<Reply, Error> {
        post::comment(&ctx, &pages, &link, form.comment).await
    }

    pub(super) async fn login(
        ctx: Context<Service>,
        Extension(pages): Extension<Pages>,
        Form(credentials): Form<auth::Credentials>,
    ) -> Result<Reply, Error> {
        auth::login(&ctx, &pages, credentials).await
    }

    pub(super) async fn logout(
        ctx: Context<Service>,
        Extension(pages): Extension<Pages>,
        headers: HeaderMap,
    ) -> Result<Reply, Error> {
        auth::logout(&ctx, &pages, &headers).await
    }

    pub(super) async fn not_found(
        ctx: Context<Service>,
        Extension(pages): Extension<Pages>,
        uri: Uri,
    ) -> Result<Reply, Error> {
        pages.not_found(ctx.identity().await, uri.path())
    }
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use axum_extra::extract::cookie::Cookie;

    use crate::template::{Registry, Sources};

    use super::{fixture, Body, Fragment, Pages, Reply};

    #[tokio::test]
    async fn missing_page_template_renders_not_found_page() {
        let (_, pages) = fixture::setup();

        let reply = pages.page("missing", pages.view(None)).unwrap();

        assert_eq!(reply.status.as_u16(), 404);
        let Body::Page(html) = reply.body else {
            panic!("not a page");
        };
        assert!(html.contains("Not found"), "{html}");
    }

    #[tokio::test]
    async fn missing_fragment_template_is_not_found() {
        let (_, pages) = fixture::setup();

        let err = pages
            .fragment("post", "missing", pages.view(None))
            .unwrap_err();

        assert_eq!(err.status_code.as_u16(), 404);
    }

    #[tokio::test]
    async fn missing_not_found_template_is_bare_not_found() {
        let (_, pages) = fixture::setup();
        let registry = Registry::new(&Sources {
            layout: r#"{{template "body" .}}"#.into(),
            pages: vec![("x".into(), r#"{{define "body"}}x{{end}}"#.into())],
            ..Sources::default()
        })
        .unwrap();
        let pages = Pages::new(registry, pages.site().clone(), 5);

        let err = pages.page("missing", pages.view(None)).unwrap_err();

        assert_eq!(err.status_code.as_u16(), 404);
    }

    #[tokio::test]
    async fn joins_fragments_in_order() {
        let reply = Reply::fragments(vec![
            Fragment {
                name: "a".into(),
                html: "<p>a</p>".into(),
            },
            Fragment {
                name: "b".into(),
                html: "<p>b</p>".into(),
            },
        ])
        .with_cookie(Cookie::new("session_token", "t"));

        let resp = reply.into_response();

        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(
            resp.headers()[http::header::CONTENT_TYPE],
            "text/html; charset=utf-8",
        );
        assert_eq!(
            resp.headers()[http::header::SET_COOKIE],
            "session_token=t",
        );
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<p>a</p>\n<p>b</p>");
    }
}
