//! Reader of coordinate reference system definitions in Well-Known Text (WKT 1) format.
//!
//! ```
//! use geotoolkit_types::referencing::Identified;
//! use geotoolkit_types::ObjectType;
//! use geotoolkit_wkt::WktParser;
//!
//! let wkt = r#"GEOGCS["WGS 84",
//!     DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]],
//!     PRIMEM["Greenwich", 0],
//!     UNIT["degree", 0.0174532925199433],
//!     AUTHORITY["EPSG", "4326"]]"#;
//!
//! let object = WktParser::new().parse(wkt).unwrap();
//! assert_eq!(object.name(), "WGS 84");
//! assert_eq!(object.object_type(), ObjectType::GeographicCrs);
//! assert_eq!(object.identifiers()[0].to_string(), "EPSG:4326");
//! ```
//!
//! Supported elements: `GEOGCS`, `PROJCS`, `GEOCCS`, `VERT_CS`, `COMPD_CS`, `LOCAL_CS`, `DATUM`,
//! `VERT_DATUM`, `LOCAL_DATUM`, `SPHEROID`, `PRIMEM`, `PROJECTION`, `PARAMETER`, `UNIT`, `AXIS`,
//! `AUTHORITY` and `TOWGS84`. Other elements (`EXTENSION`, ...) are skipped.
//!
//! A [`PropertiesHook`] lets the caller complete the name and identifiers of the outermost
//! object before it is built. Authority factories use it to attach the code an object was
//! requested with.

use geotoolkit_types::referencing::{IdentifiedObject, ObjectProperties};
use geotoolkit_types::ObjectType;

mod element;
pub use element::{leading_keyword, Element, Value, MAX_DEPTH};

pub mod error;
pub use error::WktError;

mod objects;
use objects::ObjectBuilder;

/// Callback completing the properties of the outermost object of a definition.
pub trait PropertiesHook {
    /// Called once per parse with the keyword of the outermost element and the name and
    /// identifiers read from it.
    fn complete(&self, keyword: &str, properties: &mut ObjectProperties);
}

/// WKT reader.
///
/// The parser holds no per-call state, so one instance can be shared between threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WktParser {
    ignore_axes: bool,
}

impl WktParser {
    /// Creates a parser that honours `AXIS` declarations.
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, `AXIS` elements are discarded and WKT 1 default axes are used instead
    /// (longitude before latitude, easting before northing).
    pub fn with_ignore_axes(mut self, ignore_axes: bool) -> Self {
        self.ignore_axes = ignore_axes;
        self
    }

    /// Returns true if the parser discards `AXIS` elements.
    pub fn ignore_axes(&self) -> bool {
        self.ignore_axes
    }

    /// Parses a definition.
    pub fn parse(&self, text: &str) -> Result<IdentifiedObject, WktError> {
        self.build(text, None)
    }

    /// Parses a definition, letting `hook` complete the properties of the outermost object.
    pub fn parse_with(
        &self,
        text: &str,
        hook: &dyn PropertiesHook,
    ) -> Result<IdentifiedObject, WktError> {
        self.build(text, Some(hook))
    }

    fn build(
        &self,
        text: &str,
        hook: Option<&dyn PropertiesHook>,
    ) -> Result<IdentifiedObject, WktError> {
        let root = Element::parse(text)?;
        ObjectBuilder {
            ignore_axes: self.ignore_axes,
            hook,
        }
        .build(&root)
    }
}

/// Type of the object defined by the text, judged from its leading keyword only.
pub fn classify(text: &str) -> Option<ObjectType> {
    leading_keyword(text).and_then(ObjectType::from_wkt_keyword)
}

/// Name of the outermost element, read without building the object.
pub fn element_name(text: &str) -> Result<String, WktError> {
    let root = Element::parse(text)?;
    root.text(0).map(str::to_string)
}

/// Returns true if the text contains an `AXIS` element anywhere. Keywords are matched
/// ignoring case, as [`Element::parse`] does.
pub fn declares_axes(text: &str) -> bool {
    let text = text.to_ascii_uppercase();
    text.match_indices("AXIS").any(|(index, _)| {
        let preceded_by_word = text[..index]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        let rest = text[index + 4..].trim_start();
        !preceded_by_word && (rest.starts_with('[') || rest.starts_with('('))
    })
}
