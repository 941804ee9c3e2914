use core::time::Duration;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::advance;
use crate::{
    DEFAULT_EPOCH, IdGenStatus, NodeId, Result, SnowflakeGenerator, SnowflakeId, TimeSource,
    time::epoch_millis,
};

/// Sentinel for "no ID issued yet". The reserved top bit is never set in a
/// generated ID, so this value cannot collide with real state.
const UNSEEDED: u64 = u64::MAX;

/// A lock-free Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued ID is packed into a single [`AtomicU64`] and advanced with
/// a compare-and-swap. A caller that loses the race gets
/// [`IdGenStatus::Pending`] from [`try_poll_id`] and retries immediately;
/// [`SnowflakeGenerator::next_id`] does that for you. Ordering and
/// uniqueness guarantees are the same as [`LockSnowflakeGenerator`].
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ No lock, no poisoning
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - You want to avoid lock contention
///
/// ## Caveats
/// - Under heavy contention, callers may spin through several failed CAS
///   attempts before succeeding.
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
///
/// [`try_poll_id`]: AtomicSnowflakeGenerator::try_poll_id
/// [`LockSnowflakeGenerator`]: crate::LockSnowflakeGenerator
pub struct AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    node_id: NodeId,
    epoch: u64,
    time: T,
}

impl<T> AtomicSnowflakeGenerator<T>
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
    /// use flakegen::{AtomicSnowflakeGenerator, SnowflakeGenerator, SystemClock};
    ///
    /// let generator = AtomicSnowflakeGenerator::new(3, SystemClock).unwrap();
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(b > a);
    /// ```
    ///
    /// [`Error::InvalidNodeId`]: crate::Error::InvalidNodeId
    pub fn new(node_id: i64, time: T) -> Result<Self> {
        Self::with_epoch(node_id, DEFAULT_EPOCH, time)
    }

    /// Creates a generator for `node_id` counting timestamps from `epoch`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] or [`Error::InvalidEpoch`].
    ///
    /// [`Error::InvalidNodeId`]: crate::Error::InvalidNodeId
    /// [`Error::InvalidEpoch`]: crate::Error::InvalidEpoch
    pub fn with_epoch(node_id: i64, epoch: Duration, time: T) -> Result<Self> {
        let node_id = NodeId::new(node_id)?;
        let epoch = epoch_millis(epoch)?;
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(UNSEEDED)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(UNSEEDED),
            node_id,
            epoch,
            time,
        })
    }

    /// Attempts to generate the next ID with a single clock reading and a
    /// single compare-and-swap.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: A new ID is available
    /// - `Ok(IdGenStatus::Pending { yield_until })`: The sequence is
    ///   exhausted until `yield_until`, or another thread won the race (in
    ///   which case `yield_until` is the current reading and a retry may
    ///   succeed immediately)
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued ID.
    /// - [`Error::TimestampOutOfRange`] if the clock is outside the epoch's
    ///   timestamp window.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::TimestampOutOfRange`]: crate::Error::TimestampOutOfRange
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        // Load before reading the clock: the stored timestamp then comes from
        // a reading that happened before ours, so `now` can only be behind it
        // if the clock really went backwards.
        let current_raw = self.state.load(Ordering::Acquire);
        let now = self.time.current_millis();

        let last = (current_raw != UNSEEDED).then(|| SnowflakeId::from_raw(current_raw));
        match advance(last, now, self.epoch, self.node_id)? {
            IdGenStatus::Ready { id } => {
                if self
                    .state
                    .compare_exchange(current_raw, id.to_raw(), Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    Ok(IdGenStatus::Ready { id })
                } else {
                    // CAS failed - another thread won the race.
                    Ok(IdGenStatus::Pending { yield_until: now })
                }
            }
            pending => Ok(pending),
        }
    }

    /// Returns the node ID this generator was configured with.
    pub const fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Returns the configured epoch.
    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch)
    }
}

impl<T> core::fmt::Debug for AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtomicSnowflakeGenerator")
            .field("node_id", &self.node_id)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<T> SnowflakeGenerator for AtomicSnowflakeGenerator<T>
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
}
