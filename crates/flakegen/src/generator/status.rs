use crate::SnowflakeId;

/// Represents the result of a single, non-blocking generation attempt.
///
/// This type models the outcome of
/// [`SnowflakeGenerator::try_poll_id`](crate::SnowflakeGenerator::try_poll_id):
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the sequence space of the current
///   millisecond is used up (or a concurrent caller won a race) and the clock
///   must reach `yield_until` before another attempt can succeed.
///
/// # Example
///
/// ```
/// use flakegen::{IdGenStatus, LockSnowflakeGenerator, SnowflakeGenerator, SystemClock};
///
/// let generator = LockSnowflakeGenerator::new(0, SystemClock).unwrap();
/// let id = loop {
///     match generator.try_poll_id().unwrap() {
///         IdGenStatus::Ready { id } => break id,
///         IdGenStatus::Pending { .. } => std::thread::yield_now(),
///     }
/// };
/// assert_eq!(id.node_id(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SnowflakeId,
    },
    /// No ID could be generated yet.
    Pending {
        /// The clock reading (ms since the Unix epoch, inclusive) at which
        /// generation may resume.
        yield_until: u64,
    },
}
