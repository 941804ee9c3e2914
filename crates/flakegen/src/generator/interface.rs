use core::time::Duration;

use crate::{IdGenStatus, NodeId, Result, SnowflakeId};

/// The interface callers depend on to obtain identifiers.
///
/// Construct one generator per process (or shard) and hand it to consumers
/// by reference, `Arc<G>`, or `Arc<dyn SnowflakeGenerator + Send + Sync>`.
/// The trait is object safe.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use flakegen::{LockSnowflakeGenerator, SnowflakeGenerator, SystemClock};
///
/// struct UserService {
///     ids: Arc<dyn SnowflakeGenerator + Send + Sync>,
/// }
///
/// impl UserService {
///     fn register(&self) -> flakegen::Result<u64> {
///         // The key is assigned before the record reaches storage.
///         self.ids.generate()
///     }
/// }
///
/// let service = UserService {
///     ids: Arc::new(LockSnowflakeGenerator::new(1, SystemClock).unwrap()),
/// };
/// assert!(service.register().unwrap() > 0);
/// ```
pub trait SnowflakeGenerator {
    /// The node ID encoded into every generated ID.
    fn node_id(&self) -> NodeId;

    /// The epoch timestamps are measured from, as a duration since
    /// 1970-01-01 UTC.
    fn epoch(&self) -> Duration;

    /// Attempts to generate the next ID without waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued ID.
    /// - [`Error::TimestampOutOfRange`] if the clock reads before the epoch or
    ///   past the 41-bit timestamp window.
    /// - [`Error::LockPoisoned`] if a lock-based implementation was poisoned.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::TimestampOutOfRange`]: crate::Error::TimestampOutOfRange
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    fn try_poll_id(&self) -> Result<IdGenStatus>;

    /// Generates the next ID, busy-waiting for the next millisecond when the
    /// sequence space of the current one is exhausted.
    ///
    /// Never returns an ID this instance has returned before.
    ///
    /// # Errors
    ///
    /// Same as [`SnowflakeGenerator::try_poll_id`]. Sequence exhaustion is
    /// never an error.
    fn next_id(&self) -> Result<SnowflakeId> {
        loop {
            match self.try_poll_id()? {
                IdGenStatus::Ready { id } => break Ok(id),
                IdGenStatus::Pending { .. } => core::hint::spin_loop(),
            }
        }
    }

    /// Generates the next ID as a raw `u64`, ready to be stored as a
    /// pre-assigned primary key.
    ///
    /// # Errors
    ///
    /// Same as [`SnowflakeGenerator::next_id`].
    fn generate(&self) -> Result<u64> {
        self.next_id().map(|id| id.to_raw())
    }
}
