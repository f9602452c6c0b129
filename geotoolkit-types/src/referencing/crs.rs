use serde::{Deserialize, Serialize};

use super::{
    Axis, AxisDirection, EngineeringDatum, GeodeticDatum, Identified, ObjectProperties,
    PrimeMeridian, Unit, VerticalDatum,
};
use crate::ObjectType;

/// Coordinate reference system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoordinateReferenceSystem {
    /// Latitude/longitude on an ellipsoid.
    Geographic(GeographicCrs),
    /// Cartesian coordinates obtained by projecting a geographic CRS.
    Projected(ProjectedCrs),
    /// Earth-centered cartesian coordinates.
    Geocentric(GeocentricCrs),
    /// Heights or depths.
    Vertical(VerticalCrs),
    /// Combination of independent CRS (usually horizontal + vertical).
    Compound(CompoundCrs),
    /// Local coordinates.
    Engineering(EngineeringCrs),
}

impl CoordinateReferenceSystem {
    /// Most specific type of the CRS.
    pub fn object_type(&self) -> ObjectType {
        match self {
            CoordinateReferenceSystem::Geographic(_) => ObjectType::GeographicCrs,
            CoordinateReferenceSystem::Projected(_) => ObjectType::ProjectedCrs,
            CoordinateReferenceSystem::Geocentric(_) => ObjectType::GeocentricCrs,
            CoordinateReferenceSystem::Vertical(_) => ObjectType::VerticalCrs,
            CoordinateReferenceSystem::Compound(_) => ObjectType::CompoundCrs,
            CoordinateReferenceSystem::Engineering(_) => ObjectType::EngineeringCrs,
        }
    }

    /// Axes of the CRS in coordinate order. A compound CRS lists the axes of its components.
    pub fn axes(&self) -> Vec<&Axis> {
        match self {
            CoordinateReferenceSystem::Geographic(crs) => crs.axes.iter().collect(),
            CoordinateReferenceSystem::Projected(crs) => crs.axes.iter().collect(),
            CoordinateReferenceSystem::Geocentric(crs) => crs.axes.iter().collect(),
            CoordinateReferenceSystem::Vertical(crs) => crs.axes.iter().collect(),
            CoordinateReferenceSystem::Engineering(crs) => crs.axes.iter().collect(),
            CoordinateReferenceSystem::Compound(crs) => crs
                .components
                .iter()
                .flat_map(|component| component.axes())
                .collect(),
        }
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.axes().len()
    }

    /// Returns true if the first axis points east or west, i.e. coordinates are given as
    /// (longitude, latitude) or (easting, northing).
    pub fn is_longitude_first(&self) -> bool {
        self.axes()
            .first()
            .is_some_and(|axis| axis.direction.is_east_west())
    }

    /// Geodetic datum of the horizontal part of the CRS, if any.
    pub fn geodetic_datum(&self) -> Option<&GeodeticDatum> {
        match self {
            CoordinateReferenceSystem::Geographic(crs) => Some(&crs.datum),
            CoordinateReferenceSystem::Projected(crs) => Some(&crs.base.datum),
            CoordinateReferenceSystem::Geocentric(crs) => Some(&crs.datum),
            CoordinateReferenceSystem::Compound(crs) => crs
                .components
                .iter()
                .find_map(|component| component.geodetic_datum()),
            CoordinateReferenceSystem::Vertical(_) | CoordinateReferenceSystem::Engineering(_) => {
                None
            }
        }
    }
}

impl Identified for CoordinateReferenceSystem {
    fn properties(&self) -> &ObjectProperties {
        match self {
            CoordinateReferenceSystem::Geographic(crs) => &crs.properties,
            CoordinateReferenceSystem::Projected(crs) => &crs.properties,
            CoordinateReferenceSystem::Geocentric(crs) => &crs.properties,
            CoordinateReferenceSystem::Vertical(crs) => &crs.properties,
            CoordinateReferenceSystem::Compound(crs) => &crs.properties,
            CoordinateReferenceSystem::Engineering(crs) => &crs.properties,
        }
    }
}

/// Geographic CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicCrs {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Datum.
    pub datum: GeodeticDatum,
    /// Prime meridian.
    pub prime_meridian: PrimeMeridian,
    /// Angular unit.
    pub unit: Unit,
    /// Axes (two).
    pub axes: Vec<Axis>,
}

impl GeographicCrs {
    /// Default axes of a geographic CRS: longitude then latitude.
    pub fn default_axes() -> Vec<Axis> {
        vec![
            Axis::new("Lon", AxisDirection::East),
            Axis::new("Lat", AxisDirection::North),
        ]
    }

    /// WGS 84 in longitude/latitude order.
    pub fn wgs84() -> Self {
        Self {
            properties: ObjectProperties::new("WGS 84"),
            datum: GeodeticDatum::wgs84(),
            prime_meridian: PrimeMeridian::greenwich(),
            unit: Unit::degree(),
            axes: Self::default_axes(),
        }
    }
}

/// Projection method with its parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Name of the method and its identifiers.
    pub properties: ObjectProperties,
    /// Parameter values.
    pub parameters: Vec<Parameter>,
}

impl Projection {
    /// Value of the parameter with the given name (case-insensitive).
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name.eq_ignore_ascii_case(name))
            .map(|parameter| parameter.value)
    }
}

impl Identified for Projection {
    fn properties(&self) -> &ObjectProperties {
        &self.properties
    }
}

/// Named parameter value of a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter value.
    pub value: f64,
}

/// Projected CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCrs {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Geographic CRS that is projected.
    pub base: GeographicCrs,
    /// Projection method and parameters.
    pub projection: Projection,
    /// Linear unit.
    pub unit: Unit,
    /// Axes (two).
    pub axes: Vec<Axis>,
}

impl ProjectedCrs {
    /// Default axes of a projected CRS: easting then northing.
    pub fn default_axes() -> Vec<Axis> {
        vec![
            Axis::new("X", AxisDirection::East),
            Axis::new("Y", AxisDirection::North),
        ]
    }
}

/// Geocentric CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocentricCrs {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Datum.
    pub datum: GeodeticDatum,
    /// Prime meridian.
    pub prime_meridian: PrimeMeridian,
    /// Linear unit.
    pub unit: Unit,
    /// Axes (three).
    pub axes: Vec<Axis>,
}

impl GeocentricCrs {
    /// Default axes of a geocentric CRS.
    pub fn default_axes() -> Vec<Axis> {
        vec![
            Axis::new("X", AxisDirection::Other),
            Axis::new("Y", AxisDirection::East),
            Axis::new("Z", AxisDirection::North),
        ]
    }
}

/// Vertical CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalCrs {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Datum.
    pub datum: VerticalDatum,
    /// Linear unit.
    pub unit: Unit,
    /// Axes (one).
    pub axes: Vec<Axis>,
}

impl VerticalCrs {
    /// Default axis of a vertical CRS.
    pub fn default_axes() -> Vec<Axis> {
        vec![Axis::new("H", AxisDirection::Up)]
    }
}

/// Compound CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundCrs {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Components in coordinate order.
    pub components: Vec<CoordinateReferenceSystem>,
}

/// Engineering (local) CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringCrs {
    /// Name and identifiers.
    pub properties: ObjectProperties,
    /// Datum.
    pub datum: EngineeringDatum,
    /// Unit.
    pub unit: Unit,
    /// Axes.
    pub axes: Vec<Axis>,
}

macro_rules! impl_identified {
    ($($crs:ty),*) => {
        $(
            impl Identified for $crs {
                fn properties(&self) -> &ObjectProperties {
                    &self.properties
                }
            }
        )*
    };
}

impl_identified!(
    GeographicCrs,
    ProjectedCrs,
    GeocentricCrs,
    VerticalCrs,
    CompoundCrs,
    EngineeringCrs
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referencing::Ellipsoid;

    fn egm96() -> CoordinateReferenceSystem {
        CoordinateReferenceSystem::Vertical(VerticalCrs {
            properties: ObjectProperties::new("EGM96 height"),
            datum: VerticalDatum {
                properties: ObjectProperties::new("EGM96 geoid"),
                datum_type: 2005,
            },
            unit: Unit::metre(),
            axes: VerticalCrs::default_axes(),
        })
    }

    #[test]
    fn components_are_identified() {
        let geographic = GeographicCrs::wgs84();
        assert_eq!(geographic.name(), "WGS 84");
        assert!(geographic.identifiers().is_empty());

        let CoordinateReferenceSystem::Vertical(vertical) = egm96() else {
            panic!("expected vertical CRS");
        };
        assert_eq!(vertical.name(), "EGM96 height");
    }

    #[test]
    fn compound_axes_are_concatenated() {
        let compound = CoordinateReferenceSystem::Compound(CompoundCrs {
            properties: ObjectProperties::new("WGS 84 + EGM96 height"),
            components: vec![
                CoordinateReferenceSystem::Geographic(GeographicCrs::wgs84()),
                egm96(),
            ],
        });

        assert_eq!(compound.dimension(), 3);
        assert_eq!(compound.axes()[2].direction, AxisDirection::Up);
        assert_eq!(compound.object_type(), ObjectType::CompoundCrs);
        assert_eq!(
            compound.geodetic_datum().map(|datum| datum.ellipsoid.clone()),
            Some(Ellipsoid::wgs84())
        );
    }

    #[test]
    fn axis_order() {
        let mut crs = GeographicCrs::wgs84();
        assert!(CoordinateReferenceSystem::Geographic(crs.clone()).is_longitude_first());

        crs.axes.reverse();
        assert!(!CoordinateReferenceSystem::Geographic(crs).is_longitude_first());
        assert!(!egm96().is_longitude_first());
    }

    #[test]
    fn projection_parameter_lookup() {
        let projection = Projection {
            properties: ObjectProperties::new("Transverse_Mercator"),
            parameters: vec![Parameter {
                name: "central_meridian".into(),
                value: 9.0,
            }],
        };

        assert_eq!(projection.parameter("Central_Meridian"), Some(9.0));
        assert_eq!(projection.parameter("false_easting"), None);
    }
}
