//! Geotoolkit creates coordinate reference systems and other referencing objects from authority
//! codes such as `EPSG:4326`, using WKT definitions kept in properties files or in an SQL table.
//!
//! # Quick start
//!
//! ```
//! use geotoolkit::builder::AuthorityFactoryBuilder;
//! use geotoolkit::{AuthorityFactory, AxisOrder, Citation, Hints};
//!
//! let definitions = r#"
//! # WGS 84
//! 4326 = GEOGCS["WGS 84", \
//!     DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]], \
//!     PRIMEM["Greenwich", 0], UNIT["degree", 0.0174532925199433], \
//!     AXIS["Lat", NORTH], AXIS["Long", EAST]]
//! "#;
//!
//! let factory = AuthorityFactoryBuilder::from_properties_sources(vec![definitions.to_string()])
//!     .with_authority(Citation::epsg())
//!     .with_hints(Hints::default().with_axis_order(AxisOrder::LongitudeFirst))
//!     .build()
//!     .unwrap();
//!
//! let crs = factory.create_coordinate_reference_system("EPSG:4326").unwrap();
//! assert!(crs.is_longitude_first());
//! ```
//!
//! # Main components
//!
//! * [`store`]: definitions stores, mapping codes to primary keys and primary keys to WKT.
//! * [`factory`]: the WKT parsing [`WktAuthorityFactory`](factory::WktAuthorityFactory) and
//!   the caching and pooling decorators.
//! * [`builder`]: assembles a store, a pool and a cache into a
//!   [`CrsAuthorityFactory`](builder::CrsAuthorityFactory).
//! * [`Hints`]: configuration read when factories are created.
//!
//! Objects are parsed by the [`geotoolkit_wkt`] crate into the model of [`geotoolkit_types`].

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod builder;
pub mod code;
pub mod error;
pub mod factory;
pub mod hints;
pub mod store;

pub use error::{FactoryError, FailureCause};
pub use factory::{AuthorityCodes, AuthorityFactory};
pub use geotoolkit_types::{Citation, Identifier, ObjectType};
pub use hints::{AxisOrder, Hints};

pub use geotoolkit_types;
pub use geotoolkit_wkt;

#[cfg(test)]
pub(crate) mod tests;
