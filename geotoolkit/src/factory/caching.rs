use std::sync::atomic::{AtomicBool, Ordering};

use geotoolkit_types::referencing::IdentifiedObject;
use geotoolkit_types::{Citation, ObjectType};
use quick_cache::sync::{Cache, DefaultLifecycle};
use quick_cache::UnitWeighter;

use crate::error::{FactoryError, FailureCause};
use crate::factory::{AuthorityCodes, AuthorityFactory};
use crate::hints::{AxisOrder, Hints};

type ObjectCache = Cache<
    (AxisOrder, String),
    IdentifiedObject,
    UnitWeighter,
    ahash::RandomState,
    DefaultLifecycle<(AxisOrder, String), IdentifiedObject>,
>;

/// Factory decorator keeping created objects.
///
/// Objects are keyed by the axis order and the code with its authority token removed by
/// [`AuthorityFactory::trim_authority`], so `EPSG:4326` and `4326` return the same instance as
/// long as it was not evicted. Concurrent requests for a code
/// that is not cached yet create the object once. Failures are not cached.
pub struct CachingAuthorityFactory<F> {
    backing: F,
    cache: ObjectCache,
    disposed: AtomicBool,
}

impl<F: AuthorityFactory> CachingAuthorityFactory<F> {
    /// Wraps the factory. The number of kept objects is limited by
    /// [`Hints::cache_capacity`].
    pub fn new(backing: F, hints: &Hints) -> Self {
        let capacity = hints.cache_capacity.max(1);
        Self {
            backing,
            cache: Cache::with(
                capacity,
                capacity as u64,
                UnitWeighter,
                ahash::RandomState::new(),
                DefaultLifecycle::default(),
            ),
            disposed: AtomicBool::new(false),
        }
    }

    /// Wrapped factory.
    pub fn backing(&self) -> &F {
        &self.backing
    }

    /// Number of cached objects.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn check_disposed(&self, code: &str) -> Result<(), FactoryError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(FactoryError::failure(
                ObjectType::IdentifiedObject,
                code,
                FailureCause::Disposed,
            ));
        }

        Ok(())
    }
}

impl<F: AuthorityFactory> AuthorityFactory for CachingAuthorityFactory<F> {
    fn authority(&self) -> Result<Citation, FactoryError> {
        self.check_disposed("")?;
        self.backing.authority()
    }

    fn axis_order(&self) -> AxisOrder {
        self.backing.axis_order()
    }

    fn create_object_with(
        &self,
        code: &str,
        axis_order: AxisOrder,
    ) -> Result<IdentifiedObject, FactoryError> {
        self.check_disposed(code)?;

        let key = (axis_order, self.backing.trim_authority(code)?);
        self.cache.get_or_insert_with(&key, || {
            log::debug!("Object {code} is not cached");
            self.backing.create_object_with(code, axis_order)
        })
    }

    fn authority_codes(&self, object_type: ObjectType) -> Result<AuthorityCodes, FactoryError> {
        self.check_disposed("")?;
        self.backing.authority_codes(object_type)
    }

    fn description_text(&self, code: &str) -> Result<String, FactoryError> {
        self.check_disposed(code)?;
        self.backing.description_text(code)
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.cache.clear();
        self.backing.dispose();
    }

    fn trim_authority(&self, code: &str) -> Result<String, FactoryError> {
        self.check_disposed(code)?;
        self.backing.trim_authority(code)
    }
}
