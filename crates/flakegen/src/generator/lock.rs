use core::time::Duration;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{
    advance,
    mutex::{Mutex, MutexGuard},
};
use crate::{
    DEFAULT_EPOCH, IdGenStatus, NodeId, Result, SnowflakeGenerator, SnowflakeId, TimeSource,
    time::epoch_millis,
};

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued ID lives behind a single exclusive lock. Reading the
/// clock, comparing it to the last timestamp, updating the sequence and
/// composing the result all happen while the lock is held, so no two callers
/// can observe the same `(timestamp, sequence)` pair.
///
/// Clones share the same state and therefore never produce duplicates of one
/// another.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Waits out sequence exhaustion inside the critical section
/// - ✅ Fails fast on clock regression
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access across threads is important
/// - Your target doesn't support 64-bit atomics
///
/// ## See Also
/// - [`AtomicSnowflakeGenerator`]
///
/// [`AtomicSnowflakeGenerator`]: crate::AtomicSnowflakeGenerator
pub struct LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<Option<SnowflakeId>>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<Option<SnowflakeId>>>,
    node_id: NodeId,
    epoch: u64,
    time: T,
}

impl<T> LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator for `node_id` using the [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `node_id` is outside `0..=1023`.
    ///
    /// # Example
    /// ```
    /// use flakegen::{LockSnowflakeGenerator, SnowflakeGenerator, SystemClock};
    ///
    /// let generator = LockSnowflakeGenerator::new(0, SystemClock).unwrap();
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.node_id(), 0);
    ///
    /// assert!(LockSnowflakeGenerator::new(1024, SystemClock).is_err());
    /// ```
    ///
    /// [`Error::InvalidNodeId`]: crate::Error::InvalidNodeId
    pub fn new(node_id: i64, time: T) -> Result<Self> {
        Self::with_epoch(node_id, DEFAULT_EPOCH, time)
    }

    /// Creates a generator for `node_id` counting timestamps from `epoch`.
    ///
    /// # Parameters
    ///
    /// - `node_id`: Identifies this instance among all running generators.
    ///   Must be in `0..=1023` and unique across the deployment.
    /// - `epoch`: The origin timestamp, as a [`Duration`] since 1970-01-01
    ///   UTC. The same epoch must be used to decode the IDs.
    /// - `time`: A [`TimeSource`] implementation (e.g. [`SystemClock`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] or [`Error::InvalidEpoch`]. Both are
    /// raised here, never on first use.
    ///
    /// [`SystemClock`]: crate::SystemClock
    /// [`Error::InvalidNodeId`]: crate::Error::InvalidNodeId
    /// [`Error::InvalidEpoch`]: crate::Error::InvalidEpoch
    pub fn with_epoch(node_id: i64, epoch: Duration, time: T) -> Result<Self> {
        let node_id = NodeId::new(node_id)?;
        let epoch = epoch_millis(epoch)?;
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(None))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(None)),
            node_id,
            epoch,
            time,
        })
    }

    /// Generates the next ID, holding the lock while spinning on the clock
    /// if the current millisecond's sequence space is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued ID, including while waiting for the next millisecond.
    /// - [`Error::TimestampOutOfRange`] if the clock is outside the epoch's
    ///   timestamp window.
    /// - [`Error::LockPoisoned`] if the lock has been poisoned.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::TimestampOutOfRange`]: crate::Error::TimestampOutOfRange
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut last = self.lock()?;
        loop {
            let now = self.time.current_millis();
            match advance(*last, now, self.epoch, self.node_id)? {
                IdGenStatus::Ready { id } => {
                    *last = Some(id);
                    return Ok(id);
                }
                IdGenStatus::Pending { .. } => core::hint::spin_loop(),
            }
        }
    }

    /// Attempts to generate the next ID with a single clock reading.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: A new ID is available
    /// - `Ok(IdGenStatus::Pending { yield_until })`: The sequence is
    ///   exhausted until the clock reaches `yield_until`
    /// - `Err(e)`: the clock regressed or left the timestamp window, or the
    ///   lock was poisoned
    ///
    /// # Errors
    /// See [`LockSnowflakeGenerator::next_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let mut last = self.lock()?;
        let now = self.time.current_millis();
        let status = advance(*last, now, self.epoch, self.node_id)?;
        if let IdGenStatus::Ready { id } = status {
            *last = Some(id);
        }
        Ok(status)
    }

    /// Returns the node ID this generator was configured with.
    pub const fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Returns the configured epoch.
    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch)
    }

    #[cfg(feature = "parking-lot")]
    fn lock(&self) -> Result<MutexGuard<'_, Option<SnowflakeId>>> {
        Ok(self.state.lock())
    }

    #[cfg(not(feature = "parking-lot"))]
    fn lock(&self) -> Result<MutexGuard<'_, Option<SnowflakeId>>> {
        Ok(self.state.lock()?)
    }
}

impl<T> Clone for LockSnowflakeGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            node_id: self.node_id,
            epoch: self.epoch,
            time: self.time.clone(),
        }
    }
}

impl<T> core::fmt::Debug for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockSnowflakeGenerator")
            .field("node_id", &self.node_id)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<T> SnowflakeGenerator for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn node_id(&self) -> NodeId {
        self.node_id()
    }

    fn epoch(&self) -> Duration {
        self.epoch()
    }

    fn try_poll_id(&self) -> Result<IdGenStatus> {
        self.try_poll_id()
    }

    fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id()
    }
}
