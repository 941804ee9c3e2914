use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Instant, SystemTime},
};

use crate::{TimeSource, time::unix_millis};

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source anchored to the wall clock at construction.
///
/// The Unix time is sampled once when the clock is created; afterwards a
/// background thread advances a shared counter from `Instant`, so readings
/// never go backward even if the system clock is adjusted. Generators driven
/// by this clock can therefore never observe a clock regression within one
/// process, at the cost of drifting from wall time if the system clock is
/// corrected after startup.
///
/// Cloning is cheap and shares the same ticker. The thread stops once every
/// clone has been dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    anchor: u64, // unix millis at construction
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Starts a new ticker anchored to the current system time.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use flakegen::{MonotonicClock, TimeSource};
    ///
    /// let clock = MonotonicClock::new();
    /// let first = clock.current_millis();
    /// std::thread::sleep(Duration::from_millis(5));
    /// assert!(clock.current_millis() >= first);
    /// ```
    pub fn new() -> Self {
        let start = Instant::now();
        let anchor = unix_millis(SystemTime::now());

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                // Absolute target time of the next tick
                let target = start + Duration::from_millis(tick);

                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                tick = now_ms.saturating_add(1);
            }
        });

        // Freshly created cell, the set cannot fail.
        let _ = inner._handle.set(handle);

        Self { inner, anchor }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.anchor
            .saturating_add(self.inner.current.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemClock;

    #[test]
    fn starts_near_wall_clock_and_never_regresses() {
        let wall = SystemClock.current_millis();
        let clock = MonotonicClock::new();

        let mut last = clock.current_millis();
        assert!(last.abs_diff(wall) < 1_000);

        for _ in 0..1_000 {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn advances_over_time() {
        let clock = MonotonicClock::new();
        let first = clock.current_millis();
        thread::sleep(Duration::from_millis(20));
        assert!(clock.current_millis() > first);
    }
}
