use serde::{Deserialize, Serialize};

use super::{Identified, ObjectProperties};
use crate::ObjectType;

/// Reference ellipsoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Semi-major axis in metres.
    pub semi_major_axis: f64,
    /// Inverse flattening. Zero for a sphere.
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    /// WGS 84 ellipsoid.
    pub fn wgs84() -> Self {
        Self {
            properties: ObjectProperties::new("WGS 84"),
            semi_major_axis: 6_378_137.0,
            inverse_flattening: 298.257223563,
        }
    }

    /// Returns true if the ellipsoid is a sphere.
    pub fn is_sphere(&self) -> bool {
        self.inverse_flattening == 0.0 || self.inverse_flattening.is_infinite()
    }

    /// Flattening of the ellipsoid.
    pub fn flattening(&self) -> f64 {
        if self.is_sphere() {
            0.0
        } else {
            1.0 / self.inverse_flattening
        }
    }

    /// Semi-minor axis in metres.
    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.flattening())
    }
}

impl Identified for Ellipsoid {
    fn properties(&self) -> &ObjectProperties {
        &self.properties
    }
}

/// Meridian defining zero longitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimeMeridian {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Longitude relative to Greenwich, in the angular unit of the enclosing CRS.
    pub longitude: f64,
}

impl PrimeMeridian {
    /// Greenwich meridian.
    pub fn greenwich() -> Self {
        Self {
            properties: ObjectProperties::new("Greenwich"),
            longitude: 0.0,
        }
    }
}

impl Identified for PrimeMeridian {
    fn properties(&self) -> &ObjectProperties {
        &self.properties
    }
}

/// Horizontal datum defined by an ellipsoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeodeticDatum {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Ellipsoid of the datum.
    pub ellipsoid: Ellipsoid,
    /// Bursa-Wolf parameters for conversion to WGS 84 (3 or 7 values), if declared.
    pub to_wgs84: Option<Vec<f64>>,
}

impl GeodeticDatum {
    /// WGS 84 datum.
    pub fn wgs84() -> Self {
        Self {
            properties: ObjectProperties::new("WGS_1984"),
            ellipsoid: Ellipsoid::wgs84(),
            to_wgs84: None,
        }
    }
}

impl Identified for GeodeticDatum {
    fn properties(&self) -> &ObjectProperties {
        &self.properties
    }
}

/// Datum for heights or depths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalDatum {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Datum type code as declared in WKT (2005 for geoidal heights, ...).
    pub datum_type: i32,
}

impl Identified for VerticalDatum {
    fn properties(&self) -> &ObjectProperties {
        &self.properties
    }
}

/// Datum of a local coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringDatum {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Datum type code as declared in WKT.
    pub datum_type: i32,
}

impl Identified for EngineeringDatum {
    fn properties(&self) -> &ObjectProperties {
        &self.properties
    }
}

/// Any datum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Datum {
    /// Horizontal geodetic datum.
    Geodetic(GeodeticDatum),
    /// Vertical datum.
    Vertical(VerticalDatum),
    /// Engineering datum.
    Engineering(EngineeringDatum),
}

impl Datum {
    /// Most specific type of the datum.
    pub fn object_type(&self) -> ObjectType {
        match self {
            Datum::Geodetic(_) => ObjectType::GeodeticDatum,
            Datum::Vertical(_) => ObjectType::VerticalDatum,
            Datum::Engineering(_) => ObjectType::EngineeringDatum,
        }
    }
}

impl Identified for Datum {
    fn properties(&self) -> &ObjectProperties {
        match self {
            Datum::Geodetic(datum) => &datum.properties,
            Datum::Vertical(datum) => &datum.properties,
            Datum::Engineering(datum) => &datum.properties,
        }
    }
}

impl Default for GeodeticDatum {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn wgs84_semi_minor_axis() {
        assert_relative_eq!(
            Ellipsoid::wgs84().semi_minor_axis(),
            6_356_752.314245,
            epsilon = 1e-6
        );
    }

    #[test]
    fn sphere() {
        let sphere = Ellipsoid {
            properties: ObjectProperties::new("Sphere"),
            semi_major_axis: 6_371_000.0,
            inverse_flattening: 0.0,
        };

        assert!(sphere.is_sphere());
        assert_eq!(sphere.flattening(), 0.0);
        assert_eq!(sphere.semi_minor_axis(), 6_371_000.0);
    }
}
