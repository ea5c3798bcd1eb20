//! [`Registry`] of templates composed at startup.

pub mod view;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use derive_more::{Display, Error as StdError};
use gtmpl::{Template, Value};
use regex::Regex;
use tracing as log;

use crate::{error::NotFoundError, AsError};

pub use self::view::View;

/// Name of the top-level layout source wrapping every page.
pub const LAYOUT: &str = "layout.html";

/// Define-only sources shared by every page.
pub const PARTIALS: &[&str] = &["auth.html", "thumbnail.html"];

/// Pages composed with the [`LAYOUT`], each loaded from `{name}.html`.
pub const PAGES: &[&str] = &["index", "posts", "post", "not-found"];

/// Pages rendered without the [`LAYOUT`], along with their sources.
///
/// A source used only for its fragments holds nothing but `define` actions.
pub const STANDALONE: &[(&str, &str)] =
    &[("auth", "auth.html"), ("rss", "rss.xml")];

/// Template sources a [`Registry`] is composed of.
#[derive(Clone, Debug, Default)]
pub struct Sources {
    /// Top-level skeleton, referencing templates defined by pages.
    pub layout: String,

    /// Define-only sources available to every page.
    pub partials: Vec<String>,

    /// Names and define-only sources of pages wrapped into the layout.
    pub pages: Vec<(String, String)>,

    /// Names and sources of pages rendered as is.
    pub standalone: Vec<(String, String)>,
}

impl Sources {
    /// Reads [`Sources`] from the provided `dir`ectory.
    ///
    /// # Errors
    ///
    /// If any of the files cannot be read.
    pub fn read(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let read = |file: &str| {
            let path = dir.join(file);
            fs::read_to_string(&path).map_err(|e| Error::Io(path, e))
        };

        Ok(Self {
            layout: read(LAYOUT)?,
            partials: PARTIALS
                .iter()
                .map(|f| read(f))
                .collect::<Result<_, _>>()?,
            pages: PAGES
                .iter()
                .map(|p| Ok(((*p).to_owned(), read(&format!("{p}.html"))?)))
                .collect::<Result<_, Error>>()?,
            standalone: STANDALONE
                .iter()
                .map(|(p, f)| Ok(((*p).to_owned(), read(f)?)))
                .collect::<Result<_, Error>>()?,
        })
    }
}

/// Immutable set of renderable pages, each exposing its named fragments.
///
/// Safe to share between any number of concurrent requests.
pub struct Registry {
    /// Composed pages by their names.
    pages: BTreeMap<String, Entry>,
}

/// Single page of a [`Registry`].
struct Entry {
    /// Whole page, as rendered on a full navigation.
    page: Template,

    /// Independently renderable fragments by their names.
    fragments: BTreeMap<String, Template>,
}

impl Registry {
    /// Loads and composes a [`Registry`] from the sources found in the
    /// provided `dir`ectory.
    ///
    /// # Errors
    ///
    /// If any source cannot be read or parsed.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(&Sources::read(dir)?)
    }

    /// Composes a new [`Registry`] out of the provided [`Sources`].
    ///
    /// # Errors
    ///
    /// If any source cannot be parsed.
    pub fn new(sources: &Sources) -> Result<Self, Error> {
        let partials = sources.partials.concat();

        let mut pages = BTreeMap::new();
        for (name, page) in &sources.pages {
            let body = format!("{partials}{page}");
            let entry = Entry {
                page: parse(name, &format!("{}{body}", sources.layout))?,
                fragments: fragments(name, &body)?,
            };
            drop(pages.insert(name.clone(), entry));
        }
        for (name, source) in &sources.standalone {
            let entry = Entry {
                page: parse(name, source)?,
                fragments: fragments(name, source)?,
            };
            drop(pages.insert(name.clone(), entry));
        }

        log::debug!("composed {} templates", pages.len());
        Ok(Self { pages })
    }

    /// Renders the whole page with the provided `name`.
    ///
    /// # Errors
    ///
    /// If no such page exists or it fails to render.
    pub fn render_page(
        &self,
        name: &str,
        data: impl Into<Value>,
    ) -> Result<String, Error> {
        render(&self.entry(name)?.page, data.into())
    }

    /// Renders the `fragment` of the page with the provided `name`, without
    /// the surrounding layout.
    ///
    /// # Errors
    ///
    /// If no such page or fragment exists, or it fails to render.
    pub fn render_fragment(
        &self,
        name: &str,
        fragment: &str,
        data: impl Into<Value>,
    ) -> Result<String, Error> {
        let template =
            self.entry(name)?.fragments.get(fragment).ok_or_else(|| {
                Error::FragmentNotFound {
                    page: name.to_owned(),
                    fragment: fragment.to_owned(),
                }
            })?;
        render(template, data.into())
            .map(|out| out.trim().to_owned())
    }

    /// Indicates whether a page with the provided `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    /// Returns names of the fragments exposed by the page with the provided
    /// `name`.
    ///
    /// # Errors
    ///
    /// If no such page exists.
    pub fn fragments(
        &self,
        name: &str,
    ) -> Result<impl Iterator<Item = &str>, Error> {
        Ok(self.entry(name)?.fragments.keys().map(String::as_str))
    }

    /// Returns the [`Entry`] of the page with the provided `name`.
    fn entry(&self, name: &str) -> Result<&Entry, Error> {
        self.pages
            .get(name)
            .ok_or_else(|| Error::PageNotFound(name.to_owned()))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.pages.iter().map(|(name, e)| {
                (name, e.fragments.keys().collect::<Vec<_>>())
            }))
            .finish()
    }
}

/// Parses the provided `source` of the template `name`d so.
fn parse(name: &str, source: &str) -> Result<Template, Error> {
    let mut template = Template::default();
    template.parse(source).map_err(|e| Error::Parse {
        name: name.to_owned(),
        reason: e.to_string(),
    })?;
    Ok(template)
}

/// Composes every fragment defined in the provided `source` of the page
/// `name`d so.
fn fragments(
    name: &str,
    source: &str,
) -> Result<BTreeMap<String, Template>, Error> {
    /// Regular expression capturing names of the `{{define "name"}}` actions.
    static DEFINE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"\{\{-?\s*define\s+"([^"]+)""#).expect("valid regex")
    });

    DEFINE
        .captures_iter(source)
        .map(|c| c[1].to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|fragment| {
            let template = parse(
                &format!("{name}/{fragment}"),
                &format!("{source}{{{{template \"{fragment}\" .}}}}"),
            )?;
            Ok((fragment, template))
        })
        .collect()
}

/// Renders the provided `template` with the provided `data`.
fn render(template: &Template, data: Value) -> Result<String, Error> {
    let context = gtmpl::Context::from(data)
        .map_err(|e| Error::Render(e.to_string()))?;
    let mut out = Vec::new();
    template
        .execute(&mut out, &context)
        .map_err(|e| Error::Render(e.to_string()))?;
    String::from_utf8(out).map_err(|e| Error::Render(e.to_string()))
}

/// [`Registry`] error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// Template source cannot be read.
    #[display("Failed to read `{}`: {_1}", _0.display())]
    Io(#[error(not(source))] PathBuf, io::Error),

    /// Template source is malformed.
    #[display("Failed to parse `{name}` template: {reason}")]
    Parse {
        /// Name of the malformed template.
        name: String,

        /// Reason of the failure.
        reason: String,
    },

    /// No page with such name.
    #[display("No `{_0}` page")]
    PageNotFound(#[error(not(source))] String),

    /// No fragment with such name in the page.
    #[display("No `{fragment}` fragment in `{page}` page")]
    FragmentNotFound {
        /// Name of the page.
        page: String,

        /// Name of the missing fragment.
        fragment: String,
    },

    /// Template failed to render.
    #[display("Failed to render template: {_0}")]
    Render(#[error(not(source))] String),
}

impl AsError for Error {
    fn try_as_error(&self) -> Option<crate::Error> {
        match self {
            Self::PageNotFound(_) | Self::FragmentNotFound { .. } => {
                Some(NotFoundError::Template.into())
            }
            Self::Io(..) | Self::Parse { .. } | Self::Render(_) => None,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use gtmpl::Value;

    use super::{Error, Registry, Sources};

    fn title(title: &str) -> Value {
        Value::Object(HashMap::from([(
            "Title".to_owned(),
            Value::String(title.to_owned()),
        )]))
    }

    fn registry() -> Registry {
        Registry::new(&Sources {
            layout: r#"<html>{{template "body" .}}</html>"#.into(),
            partials: vec![r#"{{define "greeting"}}Hello{{end}}"#.into()],
            pages: vec![(
                "x".into(),
                r#"{{define "body"}}<h1>{{.Title}}</h1>{{end}}"#.into(),
            )],
            standalone: vec![
                ("bare".into(), "<p>{{.Title}}</p>".into()),
                (
                    "snippets".into(),
                    r#"{{define "status"}}<b>{{.Title}}</b>{{end}}"#.into(),
                ),
            ],
        })
        .unwrap()
    }

    #[test]
    fn composes_layout_with_page() {
        assert_eq!(
            registry().render_page("x", title("Hi")).unwrap(),
            "<html><h1>Hi</h1></html>",
        );
    }

    #[test]
    fn renders_fragments_without_layout() {
        let registry = registry();

        assert_eq!(
            registry.render_fragment("x", "body", title("Hi")).unwrap(),
            "<h1>Hi</h1>",
        );
        assert_eq!(
            registry.render_fragment("x", "greeting", title("Hi")).unwrap(),
            "Hello",
        );
        assert_eq!(
            registry.fragments("x").unwrap().collect::<Vec<_>>(),
            ["body", "greeting"],
        );
    }

    #[test]
    fn renders_standalone_pages() {
        let registry = registry();

        assert_eq!(
            registry.render_page("bare", title("Hi")).unwrap(),
            "<p>Hi</p>",
        );
        assert_eq!(
            registry
                .render_fragment("snippets", "status", title("Hi"))
                .unwrap(),
            "<b>Hi</b>",
        );
    }

    #[test]
    fn renders_shared_registry_concurrently() {
        fn shared<T: Send + Sync>(value: T) -> T {
            value
        }

        let registry = shared(registry());

        std::thread::scope(|s| {
            let handles = ["a", "b", "c", "d"].map(|t| {
                let registry = &registry;
                s.spawn(move || registry.render_page("x", title(t)).unwrap())
            });
            let out = handles.map(|h| h.join().unwrap());

            let expected = ["a", "b", "c", "d"]
                .map(|t| format!("<html><h1>{t}</h1></html>"));
            assert_eq!(out, expected);
        });
    }

    #[test]
    fn unknown_names_are_recoverable() {
        let registry = registry();

        assert!(!registry.contains("missing"));
        assert!(matches!(
            registry.render_page("missing", title("Hi")),
            Err(Error::PageNotFound(_)),
        ));
        assert!(matches!(
            registry.render_fragment("x", "missing", title("Hi")),
            Err(Error::FragmentNotFound { .. }),
        ));
    }

    #[test]
    fn malformed_source_fails_composition() {
        let err = Registry::new(&Sources {
            layout: "{{if .Title}}".into(),
            pages: vec![("x".into(), String::new())],
            ..Sources::default()
        })
        .unwrap_err();

        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn loads_site_templates() {
        let registry =
            Registry::load(concat!(env!("CARGO_MANIFEST_DIR"), "/../templates"))
                .unwrap();

        let post = registry.fragments("post").unwrap().collect::<Vec<_>>();
        for name in ["body", "comment", "comment-form", "new-comment"] {
            assert!(post.contains(&name), "{name}");
        }
        let auth = registry.fragments("auth").unwrap().collect::<Vec<_>>();
        for name in ["identity", "login-collapsed", "login-form"] {
            assert!(auth.contains(&name), "{name}");
        }
    }
}
