use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeotoolkitTypesError;

/// Kind of object an authority factory can create.
///
/// Types form a hierarchy: every type except [`ObjectType::IdentifiedObject`] has a parent, and
/// a request for a type is satisfied by any of its descendants
/// (see [`ObjectType::is_assignable_from`]).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    /// Root of the hierarchy.
    IdentifiedObject,
    /// Any coordinate reference system.
    CoordinateReferenceSystem,
    /// Geographic (latitude/longitude) CRS.
    GeographicCrs,
    /// Projected CRS.
    ProjectedCrs,
    /// Earth-centered cartesian CRS.
    GeocentricCrs,
    /// Height or depth CRS.
    VerticalCrs,
    /// Combination of several CRS.
    CompoundCrs,
    /// Local (engineering) CRS.
    EngineeringCrs,
    /// Any datum.
    Datum,
    /// Horizontal geodetic datum.
    GeodeticDatum,
    /// Vertical datum.
    VerticalDatum,
    /// Engineering (local) datum.
    EngineeringDatum,
    /// Ellipsoid.
    Ellipsoid,
    /// Prime meridian.
    PrimeMeridian,
}

impl ObjectType {
    /// All object types, parents before children.
    pub const ALL: [ObjectType; 14] = [
        ObjectType::IdentifiedObject,
        ObjectType::CoordinateReferenceSystem,
        ObjectType::GeographicCrs,
        ObjectType::ProjectedCrs,
        ObjectType::GeocentricCrs,
        ObjectType::VerticalCrs,
        ObjectType::CompoundCrs,
        ObjectType::EngineeringCrs,
        ObjectType::Datum,
        ObjectType::GeodeticDatum,
        ObjectType::VerticalDatum,
        ObjectType::EngineeringDatum,
        ObjectType::Ellipsoid,
        ObjectType::PrimeMeridian,
    ];

    /// Direct parent of the type.
    pub fn parent(&self) -> Option<ObjectType> {
        use ObjectType::*;
        match self {
            IdentifiedObject => None,
            CoordinateReferenceSystem | Datum | Ellipsoid | PrimeMeridian => Some(IdentifiedObject),
            GeographicCrs | ProjectedCrs | GeocentricCrs | VerticalCrs | CompoundCrs
            | EngineeringCrs => Some(CoordinateReferenceSystem),
            GeodeticDatum | VerticalDatum | EngineeringDatum => Some(Datum),
        }
    }

    /// Returns true if objects of `other` type satisfy a request for `self` type.
    pub fn is_assignable_from(&self, other: ObjectType) -> bool {
        let mut current = Some(other);
        while let Some(object_type) = current {
            if object_type == *self {
                return true;
            }

            current = object_type.parent();
        }

        false
    }

    /// WKT keyword of the element that defines an object of exactly this type. Abstract types
    /// have no keyword.
    pub fn wkt_keyword(&self) -> Option<&'static str> {
        use ObjectType::*;
        match self {
            GeographicCrs => Some("GEOGCS"),
            ProjectedCrs => Some("PROJCS"),
            GeocentricCrs => Some("GEOCCS"),
            VerticalCrs => Some("VERT_CS"),
            CompoundCrs => Some("COMPD_CS"),
            EngineeringCrs => Some("LOCAL_CS"),
            GeodeticDatum => Some("DATUM"),
            VerticalDatum => Some("VERT_DATUM"),
            EngineeringDatum => Some("LOCAL_DATUM"),
            Ellipsoid => Some("SPHEROID"),
            PrimeMeridian => Some("PRIMEM"),
            IdentifiedObject | CoordinateReferenceSystem | Datum => None,
        }
    }

    /// Keywords of all WKT elements that define objects assignable to this type.
    pub fn wkt_keywords(&self) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|object_type| self.is_assignable_from(**object_type))
            .filter_map(|object_type| object_type.wkt_keyword())
            .collect()
    }

    /// Type of the object defined by a WKT element with the given keyword.
    pub fn from_wkt_keyword(keyword: &str) -> Option<ObjectType> {
        let keyword = keyword.trim();
        Self::ALL.into_iter().find(|object_type| {
            object_type
                .wkt_keyword()
                .is_some_and(|kw| kw.eq_ignore_ascii_case(keyword))
        })
    }

    fn as_str(&self) -> &'static str {
        use ObjectType::*;
        match self {
            IdentifiedObject => "IdentifiedObject",
            CoordinateReferenceSystem => "CoordinateReferenceSystem",
            GeographicCrs => "GeographicCRS",
            ProjectedCrs => "ProjectedCRS",
            GeocentricCrs => "GeocentricCRS",
            VerticalCrs => "VerticalCRS",
            CompoundCrs => "CompoundCRS",
            EngineeringCrs => "EngineeringCRS",
            Datum => "Datum",
            GeodeticDatum => "GeodeticDatum",
            VerticalDatum => "VerticalDatum",
            EngineeringDatum => "EngineeringDatum",
            Ellipsoid => "Ellipsoid",
            PrimeMeridian => "PrimeMeridian",
        }
    }
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = GeotoolkitTypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|object_type| object_type.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GeotoolkitTypesError::ObjectType(s.to_string()))
    }
}
