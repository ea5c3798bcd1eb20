//! Listings of [`Thumbnail`]s.

use std::convert::Infallible;

use service::{
    command::{AuthorizeUserSession, Command},
    domain::{thumbnail, user::Session, Thumbnail},
    infra::database,
    query, Query,
};
use tracerr::Traced;

use crate::{AsError, Context, Error};

use super::{Pages, Reply, XML};

/// Renders the index page with the latest [`Thumbnail`]s.
///
/// # Errors
///
/// If the [`Thumbnail`]s cannot be fetched or the page fails to render.
pub async fn index<S>(ctx: &Context<S>, pages: &Pages) -> Result<Reply, Error>
where
    S: Command<AuthorizeUserSession, Ok = Option<Session>, Err = Infallible>
        + Query<
            query::thumbnails::Latest,
            Ok = Vec<Thumbnail>,
            Err = Traced<database::Error>,
        >,
{
    let identity = ctx.identity().await;
    let thumbnails = latest(ctx.service(), pages.index_limit().into()).await?;

    let view = pages.view(identity).thumbnails(&thumbnails, pages.site());
    pages.page("index", view)
}

/// Renders the page listing every [`Thumbnail`].
///
/// # Errors
///
/// If the [`Thumbnail`]s cannot be fetched or the page fails to render.
pub async fn posts<S>(ctx: &Context<S>, pages: &Pages) -> Result<Reply, Error>
where
    S: Command<AuthorizeUserSession, Ok = Option<Session>, Err = Infallible>
        + Query<
            query::thumbnails::Latest,
            Ok = Vec<Thumbnail>,
            Err = Traced<database::Error>,
        >,
{
    let identity = ctx.identity().await;
    let thumbnails = latest(ctx.service(), thumbnail::Limit::None).await?;

    let view = pages
        .view(identity)
        .title("Posts", pages.site())
        .thumbnails(&thumbnails, pages.site());
    pages.page("posts", view)
}

/// Renders the RSS feed of every [`Thumbnail`].
///
/// # Errors
///
/// If the [`Thumbnail`]s cannot be fetched or the feed fails to render.
pub async fn rss<S>(service: &S, pages: &Pages) -> Result<Reply, Error>
where
    S: Query<
        query::thumbnails::Latest,
        Ok = Vec<Thumbnail>,
        Err = Traced<database::Error>,
    >,
{
    let thumbnails = latest(service, thumbnail::Limit::None).await?;

    let view = pages.view(None).thumbnails(&thumbnails, pages.site());
    Ok(pages.page("rss", view)?.with_content_type(XML))
}

/// Fetches [`Thumbnail`]s within the provided [`thumbnail::Limit`].
async fn latest<S>(
    service: &S,
    limit: thumbnail::Limit,
) -> Result<Vec<Thumbnail>, Error>
where
    S: Query<
        query::thumbnails::Latest,
        Ok = Vec<Thumbnail>,
        Err = Traced<database::Error>,
    >,
{
    service
        .execute(query::thumbnails::Latest::by(limit))
        .await
        .map_err(AsError::into_error)
}

#[cfg(test)]
mod spec {
    use crate::route::{fixture, Body, Pages};

    #[tokio::test]
    async fn index_lists_latest_posts_within_limit() {
        let (service, pages) = fixture::setup();
        for link in ["first", "second", "third"] {
            _ = fixture::add_post(&service, link);
        }
        let pages = Pages::new(fixture::registry(), pages.site().clone(), 2);

        let reply = super::index(&fixture::anonymous(&service), &pages)
            .await
            .unwrap();

        assert_eq!(reply.status.as_u16(), 200);
        let Body::Page(html) = reply.body else {
            panic!("not a page");
        };
        assert!(html.contains(r#"href="/posts/third""#), "{html}");
        assert!(html.contains(r#"href="/posts/second""#), "{html}");
        assert!(!html.contains(r#"href="/posts/first""#), "{html}");
        assert!(html.contains(r#"id="login""#), "anonymous sees login form");
    }

    #[tokio::test]
    async fn posts_lists_everything() {
        let (service, pages) = fixture::setup();
        for link in ["first", "second"] {
            _ = fixture::add_post(&service, link);
        }

        let reply = super::posts(&fixture::anonymous(&service), &pages)
            .await
            .unwrap();

        let Body::Page(html) = reply.body else {
            panic!("not a page");
        };
        assert!(html.contains(r#"href="/posts/first""#), "{html}");
        assert!(html.contains(r#"href="/posts/second""#), "{html}");
    }

    #[tokio::test]
    async fn rss_is_xml() {
        let (service, pages) = fixture::setup();
        _ = fixture::add_post(&service, "first");

        let reply = super::rss(&service, &pages).await.unwrap();

        assert_eq!(reply.content_type, "application/xml");
        let Body::Page(xml) = reply.body else {
            panic!("not a page");
        };
        assert!(xml.starts_with("<?xml"), "{xml}");
        assert!(
            xml.contains("<link>http://localhost:8080/posts/first</link>"),
            "{xml}",
        );
        assert!(xml.contains("<pubDate>"), "{xml}");
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error() {
        let (service, pages) = fixture::setup();
        service.database().set_unavailable(true);

        let err = super::index(&fixture::anonymous(&service), &pages)
            .await
            .unwrap_err();

        assert_eq!(err.status_code.as_u16(), 500);
        assert_eq!(service.database().calls().select_thumbnails, 1);
    }
}
