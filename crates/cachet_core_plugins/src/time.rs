//! Time source plugin and resources.
//!
//! Provides [`TimePlugin`], which registers the [`Clock`] global resource.
//! Cache freshness is computed against this clock, so tests swap in a
//! [`MockClock`] instead of sleeping.
//!
//! # Example
//!
//! ```
//! use cachet_system::server::Server;
//! use cachet_core_plugins::{Clock, TimePlugin};
//!
//! let mut server = Server::new();
//! server.add_plugins(TimePlugin::default());
//! server.finish();
//!
//! let clock = server.get_global::<Clock>().unwrap().clone();
//! let started = clock.now();
//! assert!(clock.now() >= started);
//! ```

use std::sync::Arc;

use cachet_system::plugin::Plugin;
use cachet_system::resource::GlobalResource;
use cachet_system::server::Server;
use chrono::{DateTime, TimeDelta, Utc};

// ─────────────────────────────────────────────────────────────────────────────
// ClockProvider Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for providing the current wall-clock time.
///
/// Implement this for custom time providers (e.g., a frozen clock in tests).
///
/// # Example
///
/// ```
/// use chrono::{DateTime, Utc};
/// use cachet_core_plugins::ClockProvider;
///
/// /// A clock that always returns the same instant.
/// struct FixedClock(DateTime<Utc>);
///
/// impl ClockProvider for FixedClock {
///     fn now(&self) -> DateTime<Utc> {
///         self.0
///     }
/// }
/// ```
pub trait ClockProvider: Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock provider backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
struct SystemClock;

impl ClockProvider for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock Resource
// ─────────────────────────────────────────────────────────────────────────────

/// Time provider resource.
///
/// Cheap to clone; every clone reads the same provider. Uses the system
/// clock by default.
#[derive(Clone)]
pub struct Clock {
    provider: Arc<dyn ClockProvider>,
}

impl GlobalResource for Clock {}

impl core::fmt::Debug for Clock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Clock").field("now", &self.now()).finish()
    }
}

impl Clock {
    /// Creates a clock reading the system time.
    #[must_use]
    pub fn system() -> Self {
        Self {
            provider: Arc::new(SystemClock),
        }
    }

    /// Creates a clock reading from a custom provider.
    #[must_use]
    pub fn with_provider(provider: Arc<dyn ClockProvider>) -> Self {
        Self { provider }
    }

    /// Returns the current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.provider.now()
    }

    /// Returns the time elapsed since `earlier`.
    ///
    /// Negative when `earlier` lies in the future.
    #[must_use]
    pub fn elapsed_since(&self, earlier: DateTime<Utc>) -> TimeDelta {
        self.now() - earlier
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TimePlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Time plugin.
///
/// # Resources Provided
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`Clock`] | Global | Time provider, mockable for testing |
///
/// # Testing with Mock Clock
///
/// ```ignore
/// let mock = Arc::new(MockClock::new(Utc::now()));
///
/// let mut server = Server::new();
/// server.add_plugins(TimePlugin::with_clock(mock.clone()));
/// server.finish();
///
/// // Age every cached entry by a minute without waiting
/// mock.advance(TimeDelta::seconds(60));
/// ```
#[derive(Clone, Default)]
pub struct TimePlugin {
    /// Custom clock provider (for testing).
    clock: Option<Arc<dyn ClockProvider>>,
}

impl TimePlugin {
    /// Creates a new `TimePlugin` with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `TimePlugin` with a custom clock provider.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn ClockProvider>) -> Self {
        Self { clock: Some(clock) }
    }
}

impl Plugin for TimePlugin {
    fn build(&self, server: &mut Server) {
        let clock = match &self.clock {
            Some(provider) => Clock::with_provider(Arc::clone(provider)),
            None => Clock::system(),
        };
        server.insert_global(clock);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MockClock for Testing
// ─────────────────────────────────────────────────────────────────────────────

/// Mock clock with controllable time.
///
/// # Example
///
/// ```ignore
/// use chrono::{TimeDelta, Utc};
/// use cachet_core_plugins::MockClock;
///
/// let mock = MockClock::new(Utc::now());
/// let start = mock.current();
/// mock.advance(TimeDelta::milliseconds(1_001));
/// assert_eq!(mock.current() - start, TimeDelta::milliseconds(1_001));
/// ```
#[cfg(any(test, feature = "test-utils"))]
pub struct MockClock {
    current: parking_lot::RwLock<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockClock {
    /// Creates a mock clock set to the given time.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: parking_lot::RwLock::new(start),
        }
    }

    /// Creates a mock clock set to the given Unix time in milliseconds.
    ///
    /// # Panics
    ///
    /// Panics if `millis` is outside chrono's representable range.
    #[must_use]
    pub fn at_millis(millis: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(millis).expect("timestamp out of range"))
    }

    /// Advances the clock by the given amount.
    pub fn advance(&self, delta: TimeDelta) {
        *self.current.write() += delta;
    }

    /// Sets the clock to a specific time.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.current.write() = now;
    }

    /// Returns the current mocked time.
    #[must_use]
    pub fn current(&self) -> DateTime<Utc> {
        *self.current.read()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ClockProvider for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_default_uses_system_time() {
        let clock = Clock::default();
        let before = Utc::now();
        let clock_now = clock.now();
        let after = Utc::now();

        assert!(clock_now >= before);
        assert!(clock_now <= after);
    }

    #[test]
    fn mock_clock_advance() {
        let mock = MockClock::at_millis(1_700_000_000_000);
        let initial = mock.current();

        mock.advance(TimeDelta::seconds(60));

        assert_eq!(mock.current() - initial, TimeDelta::seconds(60));
    }

    #[test]
    fn mock_clock_set() {
        let mock = MockClock::at_millis(0);
        let target = DateTime::from_timestamp_millis(5_000).unwrap();

        mock.set(target);

        assert_eq!(mock.current(), target);
    }

    #[test]
    fn clock_clones_share_provider() {
        let mock = Arc::new(MockClock::at_millis(10_000));
        let clock = Clock::with_provider(mock.clone());
        let copy = clock.clone();

        mock.advance(TimeDelta::milliseconds(250));

        assert_eq!(copy.now().timestamp_millis(), 10_250);
        assert_eq!(
            clock.elapsed_since(DateTime::from_timestamp_millis(10_000).unwrap()),
            TimeDelta::milliseconds(250)
        );
    }

    #[test]
    fn time_plugin_with_mock_clock() {
        let mock = Arc::new(MockClock::at_millis(42));

        let mut server = Server::new();
        server.add_plugins(TimePlugin::with_clock(mock.clone()));
        server.finish();

        let clock = server.get_global::<Clock>().unwrap().clone();
        assert_eq!(clock.now().timestamp_millis(), 42);

        mock.advance(TimeDelta::milliseconds(8));
        assert_eq!(clock.now().timestamp_millis(), 50);
    }
}
