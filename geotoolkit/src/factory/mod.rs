//! Authority factories.
//!
//! [`WktAuthorityFactory`] resolves codes against a [`DefinitionsStore`](crate::store::DefinitionsStore)
//! and parses the definitions. Two decorators wrap any [`AuthorityFactory`]:
//! * [`CachingAuthorityFactory`] keeps the created objects, so repeated requests return the same
//!   instances;
//! * [`ThreadedAuthorityFactory`] runs requests on a bounded pool of backing factories that are
//!   created on demand and disposed after being idle for a while.

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use geotoolkit_types::referencing::{
    CoordinateReferenceSystem, Datum, Ellipsoid, IdentifiedObject, PrimeMeridian,
};
use geotoolkit_types::{Citation, ObjectType};

use crate::code::split_code;
use crate::error::{FactoryError, FailureCause};
use crate::hints::AxisOrder;

mod caching;
pub use caching::CachingAuthorityFactory;

mod parser;
pub use parser::{ParseRequest, ParserAdapter};

mod threaded;
pub use threaded::{PoolStatistics, ThreadedAuthorityFactory};

mod wkt_factory;
pub use wkt_factory::WktAuthorityFactory;

/// Factory creating objects from authority codes.
///
/// Codes are given either as `AUTHORITY:CODE` (`EPSG:4326`) or as a bare code (`4326`).
pub trait AuthorityFactory: Send + Sync {
    /// Authority (or merged authorities) whose codes the factory understands.
    fn authority(&self) -> Result<Citation, FactoryError>;

    /// Axis order used by [`AuthorityFactory::create_object`].
    fn axis_order(&self) -> AxisOrder;

    /// Creates the object with the given code using the given axis order.
    fn create_object_with(
        &self,
        code: &str,
        axis_order: AxisOrder,
    ) -> Result<IdentifiedObject, FactoryError>;

    /// Codes of all objects assignable to the given type.
    fn authority_codes(&self, object_type: ObjectType) -> Result<AuthorityCodes, FactoryError>;

    /// Name of the object with the given code, read without creating the object.
    fn description_text(&self, code: &str) -> Result<String, FactoryError>;

    /// Releases the resources of the factory. Later requests fail.
    fn dispose(&self);

    /// Removes the authority token from the code if it names the factory authority
    /// (`epsg:4326` becomes `4326`). Codes trimmed to the same value designate the same object.
    fn trim_authority(&self, code: &str) -> Result<String, FactoryError> {
        match split_code(code) {
            (Some(token), rest) if self.authority()?.identifies(token) => Ok(rest.to_string()),
            _ => Ok(code.trim().to_string()),
        }
    }

    /// Creates the object with the given code.
    fn create_object(&self, code: &str) -> Result<IdentifiedObject, FactoryError> {
        self.create_object_with(code, self.axis_order())
    }

    /// Creates the coordinate reference system with the given code.
    fn create_coordinate_reference_system(
        &self,
        code: &str,
    ) -> Result<Arc<CoordinateReferenceSystem>, FactoryError> {
        match self.create_object(code)? {
            IdentifiedObject::Crs(crs) => Ok(crs),
            other => Err(unexpected_type(
                ObjectType::CoordinateReferenceSystem,
                code,
                &other,
            )),
        }
    }

    /// Creates the datum with the given code.
    fn create_datum(&self, code: &str) -> Result<Arc<Datum>, FactoryError> {
        match self.create_object(code)? {
            IdentifiedObject::Datum(datum) => Ok(datum),
            other => Err(unexpected_type(ObjectType::Datum, code, &other)),
        }
    }

    /// Creates the ellipsoid with the given code.
    fn create_ellipsoid(&self, code: &str) -> Result<Arc<Ellipsoid>, FactoryError> {
        match self.create_object(code)? {
            IdentifiedObject::Ellipsoid(ellipsoid) => Ok(ellipsoid),
            other => Err(unexpected_type(ObjectType::Ellipsoid, code, &other)),
        }
    }

    /// Creates the prime meridian with the given code.
    fn create_prime_meridian(&self, code: &str) -> Result<Arc<PrimeMeridian>, FactoryError> {
        match self.create_object(code)? {
            IdentifiedObject::PrimeMeridian(prime_meridian) => Ok(prime_meridian),
            other => Err(unexpected_type(ObjectType::PrimeMeridian, code, &other)),
        }
    }
}

fn unexpected_type(expected: ObjectType, code: &str, found: &IdentifiedObject) -> FactoryError {
    FactoryError::failure(
        expected,
        code,
        FailureCause::UnexpectedType {
            expected,
            found: found.object_type(),
        },
    )
}

impl<F: AuthorityFactory + ?Sized> AuthorityFactory for Arc<F> {
    fn authority(&self) -> Result<Citation, FactoryError> {
        (**self).authority()
    }

    fn axis_order(&self) -> AxisOrder {
        (**self).axis_order()
    }

    fn create_object_with(
        &self,
        code: &str,
        axis_order: AxisOrder,
    ) -> Result<IdentifiedObject, FactoryError> {
        (**self).create_object_with(code, axis_order)
    }

    fn authority_codes(&self, object_type: ObjectType) -> Result<AuthorityCodes, FactoryError> {
        (**self).authority_codes(object_type)
    }

    fn description_text(&self, code: &str) -> Result<String, FactoryError> {
        (**self).description_text(code)
    }

    fn dispose(&self) {
        (**self).dispose()
    }

    fn trim_authority(&self, code: &str) -> Result<String, FactoryError> {
        (**self).trim_authority(code)
    }
}

/// Access to raw definitions, used to classify codes lazily.
pub(crate) trait DefinitionLookup: Send + Sync {
    fn definition(&self, code: &str) -> Result<String, FactoryError>;
}

/// Set of codes of the objects of one type.
///
/// When the store cannot select the codes by type itself, the set holds every code of the
/// store and classifies each one by reading the beginning of its definition when it is tested
/// or iterated. Definitions are not parsed.
#[derive(Clone)]
pub struct AuthorityCodes {
    object_type: ObjectType,
    candidates: Arc<BTreeSet<String>>,
    lookup: Option<Arc<dyn DefinitionLookup>>,
}

impl Debug for AuthorityCodes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorityCodes")
            .field("object_type", &self.object_type)
            .field("candidates", &self.candidates.len())
            .field("filtered", &self.lookup.is_some())
            .finish()
    }
}

impl AuthorityCodes {
    /// Set containing exactly the given codes.
    pub fn new(object_type: ObjectType, codes: BTreeSet<String>) -> Self {
        Self {
            object_type,
            candidates: Arc::new(codes),
            lookup: None,
        }
    }

    pub(crate) fn filtered(
        object_type: ObjectType,
        candidates: BTreeSet<String>,
        lookup: Arc<dyn DefinitionLookup>,
    ) -> Self {
        Self {
            object_type,
            candidates: Arc::new(candidates),
            lookup: Some(lookup),
        }
    }

    /// Type of the objects in the set.
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Returns true if the set is filtered lazily.
    pub fn is_lazy(&self) -> bool {
        self.lookup.is_some()
    }

    /// Returns true if the code is in the set.
    pub fn contains(&self, code: &str) -> Result<bool, FactoryError> {
        if !self.candidates.contains(code) {
            return Ok(false);
        }

        self.accepts(code)
    }

    /// Codes in the set, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Result<&str, FactoryError>> + '_ {
        self.candidates
            .iter()
            .filter_map(|code| match self.accepts(code) {
                Ok(true) => Some(Ok(code.as_str())),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            })
    }

    /// Collects the codes of the set.
    pub fn to_set(&self) -> Result<BTreeSet<String>, FactoryError> {
        self.iter()
            .map(|code| code.map(str::to_string))
            .collect()
    }

    fn accepts(&self, code: &str) -> Result<bool, FactoryError> {
        let Some(lookup) = &self.lookup else {
            return Ok(true);
        };

        let definition = lookup.definition(code)?;
        Ok(geotoolkit_wkt::classify(&definition)
            .is_some_and(|object_type| self.object_type.is_assignable_from(object_type)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingLookup {
        calls: AtomicUsize,
    }

    impl DefinitionLookup for CountingLookup {
        fn definition(&self, code: &str) -> Result<String, FactoryError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match code {
                "1" => Ok("GEOGCS[\"a\"]".into()),
                "2" => Ok("PROJCS[\"b\"]".into()),
                "3" => Ok("VERT_CS[\"c\"]".into()),
                _ => Err(FactoryError::not_found(code, None)),
            }
        }
    }

    fn lazy_codes(object_type: ObjectType) -> (AuthorityCodes, Arc<CountingLookup>) {
        let lookup = Arc::new(CountingLookup {
            calls: AtomicUsize::new(0),
        });
        let candidates = ["1", "2", "3"].into_iter().map(String::from).collect();
        (
            AuthorityCodes::filtered(object_type, candidates, lookup.clone()),
            lookup,
        )
    }

    #[test]
    fn classification_is_lazy() {
        let (codes, lookup) = lazy_codes(ObjectType::ProjectedCrs);
        assert_eq!(lookup.calls.load(Ordering::Relaxed), 0);

        assert!(codes.contains("2").unwrap());
        assert!(!codes.contains("1").unwrap());
        assert!(!codes.contains("4").unwrap());
        assert_eq!(lookup.calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn iteration_filters_by_type() {
        let (codes, _) = lazy_codes(ObjectType::CoordinateReferenceSystem);
        assert_eq!(codes.to_set().unwrap().len(), 3);

        let (codes, _) = lazy_codes(ObjectType::VerticalCrs);
        assert_eq!(
            codes.to_set().unwrap().into_iter().collect::<Vec<_>>(),
            ["3"]
        );

        let (codes, _) = lazy_codes(ObjectType::Ellipsoid);
        assert!(codes.to_set().unwrap().is_empty());
    }

    #[test]
    fn eager_set() {
        let codes = AuthorityCodes::new(
            ObjectType::GeographicCrs,
            ["4326".to_string()].into_iter().collect(),
        );

        assert!(!codes.is_lazy());
        assert!(codes.contains("4326").unwrap());
        assert!(!codes.contains("4258").unwrap());
    }
}
