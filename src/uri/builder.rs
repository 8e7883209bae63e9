//! URI builder
//!
//! Builds canonical test identifiers from paths relative to a fixed base.

use thiserror::Error;
use url::{form_urlencoded, Url};

/// Errors for malformed base URIs
#[derive(Error, Debug)]
pub enum UriError {
    #[error("invalid base URI {base:?}: {source}")]
    Parse {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URI {0:?} must not contain a query")]
    Query(String),

    #[error("base URI {0:?} must not contain a fragment")]
    Fragment(String),
}

/// A builder of URIs relative to a base absolute URI
///
/// URN bases join segments with `:`, every other scheme with `/`. Built URLs
/// always end in `/` so an identifier names the directory of the tests it
/// groups; built URNs carry no trailing `:`. Path segments are
/// percent-encoded the same way the base was, and `.` or `..` segments are
/// dropped.
#[derive(Clone, Debug)]
pub struct UriBuilder {
    base: Url,
    separator: char,
    query: Option<String>,
}

impl UriBuilder {
    /// Create a builder for `base`
    #[cfg(test)]
    pub fn new(base: &str) -> Result<Self, UriError> {
        Self::with_query(base, std::iter::empty::<(&str, &str)>())
    }

    /// Create a builder for `base` which appends `pairs` as a query to
    /// every URI it builds
    pub fn with_query<I, K, V>(base: &str, pairs: I) -> Result<Self, UriError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = Url::parse(base).map_err(|source| UriError::Parse {
            base: base.to_string(),
            source,
        })?;
        if url.query().is_some() {
            return Err(UriError::Query(base.to_string()));
        }
        if url.fragment().is_some() {
            return Err(UriError::Fragment(base.to_string()));
        }

        let separator = if url.scheme() == "urn" { ':' } else { '/' };

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        for (key, value) in pairs {
            serializer.append_pair(key.as_ref(), value.as_ref());
            has_query = true;
        }
        let query = has_query.then(|| serializer.finish());

        Ok(Self {
            base: url,
            separator,
            query,
        })
    }

    /// Build a URI from `path` relative to this builder's base
    ///
    /// A leading `/` and a single trailing `/` on `path` are ignored.
    pub fn build(&self, path: &str) -> String {
        let mut tail: Vec<&str> = path.split('/').collect();
        if tail.first() == Some(&"") {
            tail.remove(0);
        }
        if tail.last() == Some(&"") {
            tail.pop();
        }

        let mut url = self.base.clone();
        if url.cannot_be_a_base() {
            url.set_path(&self.opaque_path(tail));
        } else if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(tail).push("");
        }
        url.set_query(self.query.as_deref());
        url.into()
    }

    /// Path of an opaque base such as a URN with `tail` appended
    fn opaque_path(&self, tail: Vec<&str>) -> String {
        let mut segments: Vec<&str> = self.base.path().split(self.separator).collect();
        if segments.last() == Some(&"") {
            segments.pop();
        }
        segments.extend(tail);
        if self.separator == '/' {
            segments.push("");
        }
        segments.join(self.separator.to_string().as_str())
    }
}
