//! Configuration of factories.

use serde::{Deserialize, Serialize};
use web_time::Duration;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const DEFAULT_CACHE_CAPACITY: usize = 1000;
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);
const FALLBACK_CONCURRENCY: usize = 4;

/// Axis order of the created coordinate reference systems.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisOrder {
    /// Axes as declared in the definitions (latitude first for most EPSG geographic CRS).
    #[default]
    AsDeclared,
    /// Axis declarations are ignored and WKT defaults are used: longitude before latitude,
    /// easting before northing.
    LongitudeFirst,
}

/// Factory configuration.
///
/// Hints are read once when a factory is constructed. Changing them later has no effect on
/// existing factories.
///
/// ```
/// use std::time::Duration;
/// use geotoolkit::{AxisOrder, Hints};
///
/// let hints = Hints::default()
///     .with_axis_order(AxisOrder::LongitudeFirst)
///     .with_max_concurrency(2)
///     .with_idle_timeout(Duration::from_secs(60));
/// assert_eq!(hints.sweep_interval(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hints {
    /// Axis order of the created objects.
    pub axis_order: AxisOrder,
    /// Time after which an unused backing factory is disposed.
    pub idle_timeout: Duration,
    /// How often idle backing factories are checked. Defaults to half the idle timeout.
    pub sweep_interval: Option<Duration>,
    /// Maximum number of backing factories that exist at the same time.
    pub max_concurrency: usize,
    /// Maximum time a request waits for a backing factory. `None` waits as long as needed.
    pub acquire_timeout: Option<Duration>,
    /// Maximum number of objects kept by the caching factory.
    pub cache_capacity: usize,
}

impl Default for Hints {
    fn default() -> Self {
        Self {
            axis_order: AxisOrder::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sweep_interval: None,
            max_concurrency: std::thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(FALLBACK_CONCURRENCY),
            acquire_timeout: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Hints {
    /// Sets the axis order.
    pub fn with_axis_order(mut self, axis_order: AxisOrder) -> Self {
        self.axis_order = axis_order;
        self
    }

    /// Sets the idle timeout of backing factories.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = Some(sweep_interval);
        self
    }

    /// Sets the maximum number of backing factories.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Sets the maximum waiting time for a backing factory.
    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = Some(acquire_timeout);
        self
    }

    /// Sets the capacity of the object cache.
    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    /// Effective sweep interval: the configured one, or half the idle timeout, but never less
    /// than 10 ms.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
            .unwrap_or(self.idle_timeout / 2)
            .max(MIN_SWEEP_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_partial() {
        let hints: Hints = serde_json::from_str(
            r#"{"axis_order": "LongitudeFirst", "max_concurrency": 3, "acquire_timeout": {"secs": 2, "nanos": 0}}"#,
        )
        .unwrap();

        assert_eq!(hints.axis_order, AxisOrder::LongitudeFirst);
        assert_eq!(hints.max_concurrency, 3);
        assert_eq!(hints.acquire_timeout, Some(Duration::from_secs(2)));
        assert_eq!(hints.idle_timeout, DEFAULT_IDLE_TIMEOUT);
        assert_eq!(hints.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn serialize_round_trip() {
        let hints = Hints::default()
            .with_idle_timeout(Duration::from_millis(500))
            .with_sweep_interval(Duration::from_millis(100));
        let json = serde_json::to_string(&hints).unwrap();

        assert_eq!(serde_json::from_str::<Hints>(&json).unwrap(), hints);
    }

    #[test]
    fn sweep_interval_defaults() {
        let hints = Hints::default().with_idle_timeout(Duration::from_secs(10));
        assert_eq!(hints.sweep_interval(), Duration::from_secs(5));

        let hints = hints.with_idle_timeout(Duration::from_millis(4));
        assert_eq!(hints.sweep_interval(), MIN_SWEEP_INTERVAL);

        let hints = hints.with_sweep_interval(Duration::from_millis(50));
        assert_eq!(hints.sweep_interval(), Duration::from_millis(50));
    }

    #[test]
    fn default_concurrency_is_positive() {
        assert!(Hints::default().max_concurrency > 0);
    }
}
