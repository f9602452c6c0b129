//! Objects resolved by authority factories: coordinate reference systems and their components.
//!
//! Every object carries [`ObjectProperties`] (a name and the identifiers assigned by
//! authorities), accessible through the [`Identified`] trait. [`IdentifiedObject`] is the
//! cheap-to-clone handle returned by factories.

mod crs;
mod cs;
mod datum;
mod object;

pub use crs::{
    CompoundCrs, CoordinateReferenceSystem, EngineeringCrs, GeocentricCrs, GeographicCrs,
    Parameter, Projection, ProjectedCrs, VerticalCrs,
};
pub use cs::{Axis, AxisDirection, Unit};
pub use datum::{Datum, Ellipsoid, EngineeringDatum, GeodeticDatum, PrimeMeridian, VerticalDatum};
pub use object::{Identified, IdentifiedObject, ObjectProperties};
