//! Referencing object model shared by the geotoolkit crates.
//!
//! * [`Citation`] and [`Identifier`] describe authorities (EPSG, OGC, ...) and the codes they
//!   assign to objects.
//! * [`ObjectType`] is the hierarchy of object kinds an authority factory can be asked for.
//! * [`referencing`] contains the objects themselves: coordinate reference systems, datums,
//!   ellipsoids, prime meridians and coordinate system axes.

mod citation;
pub use citation::{Citation, Identifier};

pub mod error;

mod object_type;
pub use object_type::ObjectType;

pub mod referencing;
