/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `flakegen` can emit.
///
/// Configuration errors ([`Error::InvalidNodeId`], [`Error::InvalidEpoch`])
/// are raised at construction and should stop the process from doing any work
/// that depends on identifiers. The remaining variants are raised by ID
/// generation and are never retried internally.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured node ID does not fit the 10-bit node field.
    #[error("invalid node id {node_id}: must be between 0 and {max}")]
    InvalidNodeId {
        /// The rejected value as supplied by the caller.
        node_id: i64,
        /// The largest accepted node ID.
        max: u16,
    },

    /// The configured epoch cannot be expressed in `u64` milliseconds.
    #[error("invalid epoch: {epoch_ms} ms since the Unix epoch does not fit in 64 bits")]
    InvalidEpoch {
        /// The rejected epoch, in milliseconds since the Unix epoch.
        epoch_ms: u128,
    },

    /// The clock reported a time earlier than the last issued ID.
    ///
    /// The generator state is left untouched, so a later call with a clock
    /// that has caught up succeeds normally.
    #[error(
        "clock moved backwards on node {node_id}: observed {observed} ms, last id issued at {last} ms"
    )]
    ClockRegression {
        /// Node ID of the generator that detected the regression.
        node_id: u16,
        /// Clock reading of the failed call, in ms since the Unix epoch.
        observed: u64,
        /// Timestamp of the last issued ID, in ms since the Unix epoch.
        last: u64,
    },

    /// The clock reading lies before the configured epoch or past the end of
    /// the 41-bit timestamp window.
    #[error(
        "clock reading {observed} ms on node {node_id} is outside the timestamp window of epoch {epoch} ms"
    )]
    TimestampOutOfRange {
        /// Node ID of the generator that observed the reading.
        node_id: u16,
        /// Clock reading, in ms since the Unix epoch.
        observed: u64,
        /// Configured epoch, in ms since the Unix epoch.
        epoch: u64,
    },

    /// The generator lock was poisoned by a panicking thread.
    ///
    /// With the `parking-lot` feature mutexes do not poison, so this variant
    /// is never produced.
    #[error("generator lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Returns `true` for errors caused by invalid generator configuration.
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidNodeId { .. } | Self::InvalidEpoch { .. })
    }

    /// Returns `true` for errors caused by the clock source.
    pub const fn is_clock(&self) -> bool {
        matches!(
            self,
            Self::ClockRegression { .. } | Self::TimestampOutOfRange { .. }
        )
    }
}

#[cfg(not(feature = "parking-lot"))]
impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_configuration_errors() {
        let err = Error::InvalidNodeId {
            node_id: 1024,
            max: 1023,
        };
        assert!(err.is_configuration());
        assert!(!err.is_clock());
        assert!(Error::InvalidEpoch { epoch_ms: u128::MAX }.is_configuration());
    }

    #[test]
    fn clock_regression_message_carries_diagnostics() {
        let err = Error::ClockRegression {
            node_id: 3,
            observed: 995,
            last: 1000,
        };
        assert!(err.is_clock());
        let msg = err.to_string();
        assert!(msg.contains("node 3"));
        assert!(msg.contains("995"));
        assert!(msg.contains("1000"));
    }
}
