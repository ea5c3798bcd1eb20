//! Flat per-request views consumed by templates.

use std::collections::HashMap;

use gtmpl::Value;
use service::domain::{
    post, user::session::Identity, Comment, Post, Thumbnail,
};

/// Site-wide values available to every template.
#[derive(Clone, Debug)]
pub struct Site {
    /// Title of the site.
    pub title: String,

    /// Public base URL of the site, without a trailing slash.
    pub url: String,

    /// Author of the site.
    pub author: String,

    /// Path prefix static assets are served under.
    pub assets: String,
}

impl From<&Site> for Value {
    fn from(site: &Site) -> Self {
        object([
            ("Title", escaped(&site.title)),
            ("Url", escaped(site.url.trim_end_matches('/'))),
            ("Author", escaped(&site.author)),
            ("Assets", escaped(site.assets.trim_end_matches('/'))),
        ])
    }
}

/// View of a single request.
///
/// Every key templates may refer to is always present, so a template never
/// fails on a missing one.
#[derive(Clone, Debug)]
pub struct View(HashMap<String, Value>);

impl View {
    /// Creates a new [`View`] of the provided [`Site`] seen by the provided
    /// [`Identity`].
    #[must_use]
    pub fn new(site: &Site, identity: Option<&Identity>) -> Self {
        let user = identity.map(|i| i.name.to_string()).unwrap_or_default();
        Self(HashMap::from(
            [
                ("Title", escaped(&site.title)),
                ("Site", site.into()),
                ("Anonymous", Value::Bool(identity.is_none())),
                ("User", escaped(&user)),
                ("Oob", Value::Bool(false)),
                ("Error", Value::String(String::new())),
                ("Path", Value::String(String::new())),
                ("Link", Value::String(String::new())),
                ("Post", Value::Nil),
                ("Comments", Value::Array(vec![])),
                ("Comment", Value::Nil),
                ("Thumbnails", Value::Array(vec![])),
            ]
            .map(|(k, v)| (k.to_owned(), v)),
        ))
    }

    /// Sets the page title, prefixed with the site one.
    #[must_use]
    pub fn title(self, title: &str, site: &Site) -> Self {
        self.with("Title", escaped(&format!("{title} | {}", site.title)))
    }

    /// Marks fragments rendered from this [`View`] as out-of-band swaps.
    #[must_use]
    pub fn oob(self, oob: bool) -> Self {
        self.with("Oob", Value::Bool(oob))
    }

    /// Sets the error message shown by a form.
    #[must_use]
    pub fn error(self, message: &str) -> Self {
        self.with("Error", escaped(message))
    }

    /// Sets the requested path.
    #[must_use]
    pub fn path(self, path: &str) -> Self {
        self.with("Path", escaped(path))
    }

    /// Sets the [`post::Link`] forms of this [`View`] are submitted to.
    #[must_use]
    pub fn link(self, link: &post::Link) -> Self {
        self.with("Link", escaped(link.as_ref()))
    }

    /// Sets the shown [`Post`], along with its [`post::Link`].
    #[must_use]
    pub fn post(self, post: &Post) -> Self {
        let value = object([
            ("Link", escaped(post.link.as_ref())),
            ("Title", escaped(post.title.as_ref())),
            ("Summary", escaped(post.summary.as_ref())),
            ("Author", escaped(post.author.as_ref())),
            ("Content", Value::String(post.content.to_string())),
            ("Date", Value::String(post.updated_at.to_date_string())),
        ]);
        self.link(&post.link).with("Post", value)
    }

    /// Sets the shown [`Comment`]s, preserving their order.
    #[must_use]
    pub fn comments(self, comments: &[Comment]) -> Self {
        self.with(
            "Comments",
            Value::Array(comments.iter().map(comment).collect()),
        )
    }

    /// Sets the single [`Comment`] rendered by a fragment.
    #[must_use]
    pub fn comment(self, c: &Comment) -> Self {
        self.with("Comment", comment(c))
    }

    /// Sets the listed [`Thumbnail`]s, preserving their order.
    #[must_use]
    pub fn thumbnails(self, thumbnails: &[Thumbnail], site: &Site) -> Self {
        let base = site.url.trim_end_matches('/');
        let items = thumbnails
            .iter()
            .map(|t| {
                object([
                    ("Link", escaped(t.link.as_ref())),
                    ("Title", escaped(t.title.as_ref())),
                    ("Summary", escaped(t.summary.as_ref())),
                    ("Date", Value::String(t.updated_at.to_date_string())),
                    (
                        "PubDate",
                        Value::String(
                            t.updated_at.to_rfc2822().unwrap_or_default(),
                        ),
                    ),
                    ("Url", escaped(&format!("{base}/posts/{}", t.link))),
                ])
            })
            .collect();
        self.with("Thumbnails", Value::Array(items))
    }

    /// Replaces the value under the provided `key`.
    fn with(mut self, key: &str, value: Value) -> Self {
        drop(self.0.insert(key.to_owned(), value));
        self
    }
}

impl From<View> for Value {
    fn from(view: View) -> Self {
        Self::Object(view.0)
    }
}

/// Converts the provided [`Comment`] into a [`Value`].
fn comment(c: &Comment) -> Value {
    object([
        ("Author", escaped(c.author.as_ref())),
        ("Body", escaped(c.body.as_ref())),
        ("Date", Value::String(c.created_at.to_date_string())),
    ])
}

/// Builds an object [`Value`] out of the provided entries.
fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect(),
    )
}

/// HTML-escapes the provided user-supplied text.
fn escaped(text: &str) -> Value {
    Value::String(html_escape::encode_quoted_attribute(text).into_owned())
}
