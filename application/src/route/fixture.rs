//! Shared setup of route tests.

use std::{
    sync::atomic::{AtomicI64, Ordering},
    time::Duration,
};

use common::DateTime;
use service::{
    domain::{
        post,
        user::{self, Session},
        Post, User,
    },
    infra::Memory,
    Config,
};

use crate::{
    template::{view::Site, Registry},
    Context,
};

use super::Pages;

/// Service backed by a [`Memory`] database.
pub(crate) type Service = service::Service<Memory>;

/// Loads the site templates.
pub(crate) fn registry() -> Registry {
    Registry::load(concat!(env!("CARGO_MANIFEST_DIR"), "/../templates"))
        .unwrap()
}

/// Creates a fresh [`Service`] along with the [`Pages`] of the site.
pub(crate) fn setup() -> (Service, Pages) {
    let config = Config {
        session_ttl: Duration::from_secs(60 * 60),
        ..Config::default()
    };
    let (service, _) = Service::new(config, Memory::default());
    let site = Site {
        title: "Notebook".into(),
        url: "http://localhost:8080".into(),
        author: "Alice".into(),
        assets: "/s".into(),
    };
    (service, Pages::new(registry(), site, 5))
}

/// Creates a [`Context`] of a request without a session cookie.
pub(crate) fn anonymous(service: &Service) -> Context<Service> {
    Context::new(service.clone(), None)
}

/// Stores a [`User`] with the provided credentials.
pub(crate) fn add_user(
    service: &Service,
    name: &str,
    password: &str,
) -> user::Name {
    let name = user::Name::new(name).unwrap();
    service.database().add_user(User {
        name: name.clone(),
        password_hash: user::PasswordHash::new(&password.into()).unwrap(),
        created_at: DateTime::now().coerce(),
    });
    name
}

/// Stores a [`User`] and creates a [`Session`] for it, returning the
/// [`Context`] of a request presenting that [`Session`].
pub(crate) fn signed_in(
    service: &Service,
    name: &str,
) -> (Context<Service>, Session) {
    let name = add_user(service, name, "secret");
    let session = service.sessions().create(name).unwrap();
    let ctx = Context::new(service.clone(), Some(session.token.clone()));
    (ctx, session)
}

/// Stores a [`Post`] with the provided `link`, each one updated later than
/// the previous.
pub(crate) fn add_post(service: &Service, link: &str) -> post::Id {
    static CLOCK: AtomicI64 = AtomicI64::new(1_700_000_000);

    let at = CLOCK.fetch_add(60, Ordering::SeqCst);
    service.database().add_post(Post {
        id: 0.into(),
        link: post::Link::new(link).unwrap(),
        title: format!("Title of {link}").into(),
        summary: format!("Summary of {link}").into(),
        author: user::Name::new("alice").unwrap(),
        content: format!("<p>Content of {link}</p>").into(),
        updated_at: DateTime::from_unix_timestamp(at).unwrap().coerce(),
    })
}
