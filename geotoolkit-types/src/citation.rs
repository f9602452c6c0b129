use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Organization responsible for maintaining a namespace of codes (for example EPSG).
///
/// A citation has a human-readable title and a list of short identifiers. Authority tokens in
/// codes like `EPSG:4326` are matched against both (see [`Citation::identifies`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    title: String,
    identifiers: Vec<String>,
}

impl Citation {
    /// Creates a citation without identifiers.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            identifiers: vec![],
        }
    }

    /// Adds a short identifier for the authority. Identifiers that the citation already has
    /// (ignoring case) are skipped. The title is not an identifier, so an identifier equal to
    /// the title is kept and becomes the code space.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let known = self
            .identifiers
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(identifier.trim()));
        if !known && !identifier.trim().is_empty() {
            self.identifiers.push(identifier);
        }

        self
    }

    /// EPSG geodetic parameter dataset.
    pub fn epsg() -> Self {
        Self::new("European Petroleum Survey Group").with_identifier("EPSG")
    }

    /// Open Geospatial Consortium.
    pub fn ogc() -> Self {
        Self::new("Open Geospatial Consortium").with_identifier("OGC")
    }

    /// Title of the authority.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Short identifiers of the authority.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Name used as the code space of the [`Identifier`]s issued by this authority: the first
    /// identifier or, if there is none, the title.
    pub fn code_space(&self) -> &str {
        self.identifiers
            .first()
            .map(String::as_str)
            .unwrap_or(&self.title)
    }

    /// Returns true if the `token` is the title or one of the identifiers of this citation. The
    /// comparison ignores case and surrounding whitespace.
    pub fn identifies(&self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }

        self.title.eq_ignore_ascii_case(token)
            || self
                .identifiers
                .iter()
                .any(|identifier| identifier.eq_ignore_ascii_case(token))
    }

    /// Merges several citations into one composite citation.
    ///
    /// The title is taken from the first citation. Identifiers are the code spaces and
    /// identifiers of all citations in the given order, without duplicates. Returns `None` for
    /// an empty input.
    pub fn merge<'a>(citations: impl IntoIterator<Item = &'a Citation>) -> Option<Citation> {
        let mut iter = citations.into_iter();
        let first = iter.next()?;

        let mut merged = Citation::new(first.title.clone());
        for citation in std::iter::once(first).chain(iter) {
            merged = merged.with_identifier(citation.code_space());
            for identifier in &citation.identifiers {
                merged = merged.with_identifier(identifier.clone());
            }
        }

        Some(merged)
    }
}

impl Display for Citation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_space())
    }
}

/// Code assigned to an object by an authority, displayed as `AUTHORITY:CODE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    authority: String,
    code: String,
}

impl Identifier {
    /// Creates a new identifier.
    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            code: code.into(),
        }
    }

    /// Creates an identifier in the code space of the given citation.
    pub fn from_citation(citation: &Citation, code: impl Into<String>) -> Self {
        Self::new(citation.code_space(), code)
    }

    /// Code space of the identifier.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Code value.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns true if the identifier was issued by the given authority.
    pub fn is_issued_by(&self, citation: &Citation) -> bool {
        citation.identifies(&self.authority)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_ignores_case() {
        let epsg = Citation::epsg();
        assert!(epsg.identifies("EPSG"));
        assert!(epsg.identifies("epsg"));
        assert!(epsg.identifies(" Epsg "));
        assert!(epsg.identifies("european petroleum survey group"));
        assert!(!epsg.identifies("OGC"));
        assert!(!epsg.identifies(""));
    }

    #[test]
    fn code_space_falls_back_to_title() {
        assert_eq!(Citation::epsg().code_space(), "EPSG");
        assert_eq!(Citation::new("IGNF").code_space(), "IGNF");
    }

    #[test]
    fn with_identifier_skips_duplicates() {
        let citation = Citation::new("EPSG")
            .with_identifier("OGP")
            .with_identifier("ogp")
            .with_identifier("EPSG");
        assert_eq!(citation.identifiers(), &["OGP", "EPSG"]);
    }

    #[test]
    fn identifier_equal_to_title_is_kept() {
        let citation = Citation::new("Local").with_identifier("LOCAL");
        assert_eq!(citation.identifiers(), &["LOCAL"]);
        assert_eq!(citation.code_space(), "LOCAL");
    }

    #[test]
    fn merge_collects_identifiers_of_all_citations() {
        let merged = Citation::merge(&[Citation::epsg(), Citation::new("ESRI"), Citation::ogc()])
            .expect("empty merge");

        assert_eq!(merged.title(), "European Petroleum Survey Group");
        assert_eq!(merged.identifiers(), &["EPSG", "ESRI", "OGC"]);
        assert!(merged.identifies("esri"));
    }

    #[test]
    fn merge_keeps_authorities_named_by_title_only() {
        let merged =
            Citation::merge(&[Citation::new("EPSG"), Citation::new("ESRI")]).expect("empty merge");

        assert_eq!(merged.title(), "EPSG");
        assert_eq!(merged.identifiers(), &["EPSG", "ESRI"]);
        assert_eq!(merged.code_space(), "EPSG");
    }

    #[test]
    fn merge_of_nothing() {
        assert_eq!(Citation::merge(std::iter::empty()), None);
    }

    #[test]
    fn identifier_display() {
        let id = Identifier::from_citation(&Citation::epsg(), "4326");
        assert_eq!(id.to_string(), "EPSG:4326");
        assert!(id.is_issued_by(&Citation::epsg()));
        assert!(!id.is_issued_by(&Citation::ogc()));
    }
}
