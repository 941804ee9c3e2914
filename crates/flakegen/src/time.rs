use core::time::Duration;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{Error, Result};

/// Default epoch: Monday, January 1, 2024 00:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_704_067_200_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// A source of wall-clock time in **milliseconds since the Unix epoch**.
///
/// Generators subtract their configured epoch from this reading, so a clock
/// never needs to know which epoch it is serving. Implement this trait to
/// plug in a mocked clock for tests.
///
/// # Example
///
/// ```
/// use flakegen::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_704_067_200_123
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_704_067_200_123);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since 1970-01-01 UTC.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// The operating system wall clock.
///
/// Reads `SystemTime::now()` on every call, so NTP corrections and manual
/// adjustments are visible to the generator and surface as
/// [`Error::ClockRegression`] when they move time backwards.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        unix_millis(SystemTime::now())
    }
}

/// Milliseconds between the Unix epoch and `time`, clamped to `0..=u64::MAX`.
pub(crate) fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Converts a configured epoch into whole milliseconds.
pub(crate) fn epoch_millis(epoch: Duration) -> Result<u64> {
    let epoch_ms = epoch.as_millis();
    u64::try_from(epoch_ms).map_err(|_| Error::InvalidEpoch { epoch_ms })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_default_epoch() {
        let now = SystemClock.current_millis();
        assert!(now > epoch_millis(DEFAULT_EPOCH).unwrap());
    }

    #[test]
    fn shared_clocks_delegate() {
        struct Fixed;
        impl TimeSource for Fixed {
            fn current_millis(&self) -> u64 {
                42
            }
        }

        let shared = Arc::new(Fixed);
        assert_eq!(shared.current_millis(), 42);
        assert_eq!((&Fixed).current_millis(), 42);
    }

    #[test]
    fn epoch_must_fit_in_u64_millis() {
        assert_eq!(epoch_millis(DEFAULT_EPOCH), Ok(1_704_067_200_000));
        assert!(matches!(
            epoch_millis(Duration::MAX),
            Err(Error::InvalidEpoch { .. })
        ));
    }

    #[test]
    fn unix_millis_clamps_pre_epoch_times() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(unix_millis(before), 0);
    }
}
