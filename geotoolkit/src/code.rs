//! Authority codes and primary keys.

use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;

/// Key of a definition inside a [`DefinitionsStore`](crate::store::DefinitionsStore).
///
/// Several authority codes may resolve to the same primary key, and a primary key does not
/// have to be equal to any of the codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimaryKey {
    /// Integer key, e.g. the `srid` of a `spatial_ref_sys` table.
    Integer(i64),
    /// Text key, e.g. the key of a properties file.
    Text(String),
}

impl PrimaryKey {
    /// Integer value of the key. Text keys holding an integer are converted.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PrimaryKey::Integer(value) => Some(*value),
            PrimaryKey::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl Display for PrimaryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryKey::Integer(value) => write!(f, "{value}"),
            PrimaryKey::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Splits `AUTHORITY:CODE` into the authority token and the rest. Bare codes have no token.
pub fn split_code(code: &str) -> (Option<&str>, &str) {
    match code.split_once(':') {
        Some((authority, rest)) => (Some(authority.trim()), rest.trim()),
        None => (None, code.trim()),
    }
}

static URN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^urn:(?:x-)?ogc:def:[a-z-]+:([a-z0-9._-]+):(?:[0-9.]*:)?([^:]+)$")
        .expect("valid regex")
});

static HTTP_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://www\.opengis\.net/def/[a-z-]+/([a-z0-9._-]+)/[^/]+/([^/]+)$")
        .expect("valid regex")
});

static HTTP_SRS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://www\.opengis\.net/gml/srs/([a-z0-9_-]+)(?:\.xml)?#(.+)$")
        .expect("valid regex")
});

/// Converts URN and URL forms of a code to the `AUTHORITY:CODE` form.
///
/// Recognized forms:
/// * `urn:ogc:def:crs:EPSG::4326`, `urn:ogc:def:crs:EPSG:6.6:4326`, `urn:x-ogc:def:crs:EPSG:4326`
/// * `http://www.opengis.net/def/crs/EPSG/0/4326`
/// * `http://www.opengis.net/gml/srs/epsg.xml#4326`, `http://www.opengis.net/gml/srs/CRS#84`
///
/// Any other code is returned trimmed.
pub fn normalize_code(code: &str) -> String {
    let code = code.trim();
    for pattern in [&*URN, &*HTTP_DEF, &*HTTP_SRS] {
        if let Some(captures) = pattern.captures(code) {
            return format!("{}:{}", captures[1].to_ascii_uppercase(), &captures[2]);
        }
    }

    code.to_string()
}
