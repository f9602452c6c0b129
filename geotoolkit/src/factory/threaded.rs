use std::ops::Deref;
use std::sync::{Arc, Weak};

use geotoolkit_types::referencing::IdentifiedObject;
use geotoolkit_types::{Citation, ObjectType};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use web_time::{Duration, Instant};

use crate::error::{FactoryError, FailureCause};
use crate::factory::{AuthorityCodes, AuthorityFactory};
use crate::hints::{AxisOrder, Hints};

const SWEEPER_THREAD_NAME: &str = "geotoolkit-pool-sweeper";

type Constructor<F> = Box<dyn Fn() -> Result<F, FactoryError> + Send + Sync>;

/// Factory decorator running requests on a pool of backing factories.
///
/// Backing factories are created on demand by the constructor, at most
/// [`Hints::max_concurrency`] of them at the same time. A request takes an idle factory (the
/// most recently released one), creates a new one if the limit is not reached, or waits until
/// another request releases its factory. Waiting is bounded by [`Hints::acquire_timeout`] or
/// by the budget given to [`ThreadedAuthorityFactory::create_object_within`].
///
/// A background thread disposes factories that stayed idle for [`Hints::idle_timeout`]. The
/// thread stops when the pool is disposed or dropped.
///
/// Lazy [`AuthorityCodes`] sets keep using the backing factory that created them. They fail
/// once that factory is disposed.
pub struct ThreadedAuthorityFactory<F: AuthorityFactory + 'static> {
    shared: Arc<Shared<F>>,
    axis_order: AxisOrder,
}

/// Counters of a [`ThreadedAuthorityFactory`] pool.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatistics {
    /// Backing factories that exist, idle or in use.
    pub live: usize,
    /// Backing factories waiting for a request.
    pub idle: usize,
    /// Backing factories created since the pool was created.
    pub created: u64,
    /// Backing factories disposed since the pool was created.
    pub disposed: u64,
}

struct Shared<F: AuthorityFactory> {
    constructor: Constructor<F>,
    pool: Mutex<Pool<F>>,
    available: Condvar,
    max_concurrency: usize,
    idle_timeout: Duration,
    acquire_timeout: Option<Duration>,
    sweeper: Arc<SweepSignal>,
}

struct Pool<F> {
    idle: Vec<IdleEntry<F>>,
    live: usize,
    created: u64,
    disposed: u64,
    is_disposed: bool,
}

struct IdleEntry<F> {
    factory: F,
    released_at: Instant,
}

#[derive(Default)]
struct SweepSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl SweepSignal {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

struct Checkout<'a, F: AuthorityFactory> {
    shared: &'a Shared<F>,
    factory: Option<F>,
}

impl<F: AuthorityFactory> Deref for Checkout<'_, F> {
    type Target = F;

    fn deref(&self) -> &F {
        self.factory
            .as_ref()
            .unwrap_or_else(|| unreachable!("factory is only taken on drop"))
    }
}

impl<F: AuthorityFactory> Drop for Checkout<'_, F> {
    fn drop(&mut self) {
        if let Some(factory) = self.factory.take() {
            self.shared.release(factory);
        }
    }
}

impl<F: AuthorityFactory + 'static> ThreadedAuthorityFactory<F> {
    /// Creates a pool building backing factories with `constructor`. No factory is created
    /// until the first request.
    pub fn new(
        constructor: impl Fn() -> Result<F, FactoryError> + Send + Sync + 'static,
        hints: &Hints,
    ) -> Result<Self, FactoryError> {
        let sweeper = Arc::new(SweepSignal::default());
        let shared = Arc::new(Shared {
            constructor: Box::new(constructor),
            pool: Mutex::new(Pool {
                idle: vec![],
                live: 0,
                created: 0,
                disposed: 0,
                is_disposed: false,
            }),
            available: Condvar::new(),
            max_concurrency: hints.max_concurrency.max(1),
            idle_timeout: hints.idle_timeout,
            acquire_timeout: hints.acquire_timeout,
            sweeper: sweeper.clone(),
        });

        spawn_sweeper(Arc::downgrade(&shared), sweeper, hints.sweep_interval())?;

        Ok(Self {
            shared,
            axis_order: hints.axis_order,
        })
    }

    /// Creates the object, waiting at most `budget` for a backing factory.
    pub fn create_object_within(
        &self,
        code: &str,
        budget: Duration,
    ) -> Result<IdentifiedObject, FactoryError> {
        let factory = self.shared.acquire(code, Some(budget))?;
        factory.create_object_with(code, self.axis_order)
    }

    /// Makes sure at least one backing factory exists, creating it if needed.
    pub fn warm_up(&self) -> Result<(), FactoryError> {
        self.shared.acquire("", self.shared.acquire_timeout).map(drop)
    }

    /// Current counters of the pool.
    pub fn statistics(&self) -> PoolStatistics {
        let pool = self.shared.pool.lock();
        PoolStatistics {
            live: pool.live,
            idle: pool.idle.len(),
            created: pool.created,
            disposed: pool.disposed,
        }
    }

    /// Returns true after [`AuthorityFactory::dispose`] was called.
    pub fn is_disposed(&self) -> bool {
        self.shared.pool.lock().is_disposed
    }

    fn run<T>(
        &self,
        code: &str,
        op: impl FnOnce(&F) -> Result<T, FactoryError>,
    ) -> Result<T, FactoryError> {
        let factory = self.shared.acquire(code, self.shared.acquire_timeout)?;
        op(&factory)
    }
}

impl<F: AuthorityFactory + 'static> AuthorityFactory for ThreadedAuthorityFactory<F> {
    fn authority(&self) -> Result<Citation, FactoryError> {
        self.run("", |factory| factory.authority())
    }

    fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    fn create_object_with(
        &self,
        code: &str,
        axis_order: AxisOrder,
    ) -> Result<IdentifiedObject, FactoryError> {
        self.run(code, |factory| factory.create_object_with(code, axis_order))
    }

    fn authority_codes(&self, object_type: ObjectType) -> Result<AuthorityCodes, FactoryError> {
        self.run("", |factory| factory.authority_codes(object_type))
    }

    fn description_text(&self, code: &str) -> Result<String, FactoryError> {
        self.run(code, |factory| factory.description_text(code))
    }

    fn trim_authority(&self, code: &str) -> Result<String, FactoryError> {
        self.run(code, |factory| factory.trim_authority(code))
    }

    fn dispose(&self) {
        let idle = {
            let mut pool = self.shared.pool.lock();
            if pool.is_disposed {
                return;
            }

            pool.is_disposed = true;
            let idle = std::mem::take(&mut pool.idle);
            pool.live -= idle.len();
            pool.disposed += idle.len() as u64;
            idle
        };

        for entry in &idle {
            entry.factory.dispose();
        }

        self.shared.available.notify_all();
        self.shared.sweeper.stop();
        log::info!(
            "Factory pool disposed, {} idle backing factories released",
            idle.len()
        );
    }
}

impl<F: AuthorityFactory> Shared<F> {
    fn acquire(
        &self,
        code: &str,
        budget: Option<Duration>,
    ) -> Result<Checkout<'_, F>, FactoryError> {
        let started = Instant::now();
        let deadline = budget.map(|budget| started + budget);

        let mut pool = self.pool.lock();
        loop {
            if pool.is_disposed {
                return Err(FactoryError::failure(
                    ObjectType::IdentifiedObject,
                    code,
                    FailureCause::Disposed,
                ));
            }

            if let Some(entry) = pool.idle.pop() {
                return Ok(self.checkout(entry.factory));
            }

            if pool.live < self.max_concurrency {
                pool.live += 1;
                drop(pool);
                return self.construct();
            }

            match deadline {
                None => self.available.wait(&mut pool),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        log::debug!("No backing factory available for {code}");
                        return Err(FactoryError::failure(
                            ObjectType::IdentifiedObject,
                            code,
                            FailureCause::PoolExhausted {
                                waited: now - started,
                            },
                        ));
                    }

                    self.available.wait_for(&mut pool, deadline - now);
                }
            }
        }
    }

    // The slot is reserved by the caller.
    fn construct(&self) -> Result<Checkout<'_, F>, FactoryError> {
        match (self.constructor)() {
            Ok(factory) => {
                let created = {
                    let mut pool = self.pool.lock();
                    pool.created += 1;
                    pool.created
                };
                log::debug!("Created backing factory #{created}");
                Ok(self.checkout(factory))
            }
            Err(err) => {
                self.pool.lock().live -= 1;
                self.available.notify_one();
                log::warn!("Failed to create backing factory: {err}");
                Err(err)
            }
        }
    }

    fn checkout(&self, factory: F) -> Checkout<'_, F> {
        Checkout {
            shared: self,
            factory: Some(factory),
        }
    }

    fn release(&self, factory: F) {
        let mut pool = self.pool.lock();
        if pool.is_disposed {
            pool.live -= 1;
            pool.disposed += 1;
            drop(pool);

            factory.dispose();
            log::debug!("Disposed backing factory released after pool disposal");
        } else {
            pool.idle.push(IdleEntry {
                factory,
                released_at: Instant::now(),
            });
            drop(pool);
        }

        self.available.notify_one();
    }

    fn sweep(&self) {
        let now = Instant::now();
        let expired = {
            let mut pool = self.pool.lock();
            let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut pool.idle)
                .into_iter()
                .partition(|entry| now.duration_since(entry.released_at) >= self.idle_timeout);

            pool.idle = kept;
            pool.live -= expired.len();
            pool.disposed += expired.len() as u64;
            expired
        };

        if expired.is_empty() {
            return;
        }

        for entry in &expired {
            entry.factory.dispose();
        }

        self.available.notify_all();
        log::info!("Disposed {} idle backing factories", expired.len());
    }
}

impl<F: AuthorityFactory> Drop for Shared<F> {
    fn drop(&mut self) {
        self.sweeper.stop();
        for entry in self.pool.get_mut().idle.drain(..) {
            entry.factory.dispose();
        }
    }
}

fn spawn_sweeper<F: AuthorityFactory + 'static>(
    shared: Weak<Shared<F>>,
    signal: Arc<SweepSignal>,
    interval: Duration,
) -> Result<(), FactoryError> {
    std::thread::Builder::new()
        .name(SWEEPER_THREAD_NAME.into())
        .spawn(move || {
            loop {
                {
                    let mut stopped = signal.stopped.lock();
                    if !*stopped {
                        signal.wake.wait_for(&mut stopped, interval);
                    }
                    if *stopped {
                        break;
                    }
                }

                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.sweep();
            }

            log::debug!("Pool sweeper stopped");
        })
        .map_err(|err| {
            FactoryError::Configuration(format!("failed to start pool sweeper: {err}"))
        })?;

    Ok(())
}
