mod atomic;
mod interface;
mod lock;
mod mutex;
mod status;

use core::cmp::Ordering;

pub use atomic::*;
pub use interface::*;
pub use lock::*;
pub use status::*;

use crate::{Error, NodeId, Result, SnowflakeId};

/// Decides the ID that follows `last` for a clock reading of `now`.
///
/// `now` and `epoch` are in ms since the Unix epoch; `last` is `None` until
/// the first ID is issued. An error leaves the caller's state untouched.
pub(crate) fn advance(
    last: Option<SnowflakeId>,
    now: u64,
    epoch: u64,
    node: NodeId,
) -> Result<IdGenStatus> {
    // Checked before the range so a jump to before the epoch still reports
    // as a regression.
    if let Some(last) = last {
        let last_ms = epoch.saturating_add(last.timestamp());
        if now < last_ms {
            return Err(cold_clock_behind(node, now, last_ms));
        }
    }

    let elapsed = match now.checked_sub(epoch) {
        Some(elapsed) if elapsed <= SnowflakeId::max_timestamp() => elapsed,
        _ => return Err(cold_out_of_range(node, now, epoch)),
    };

    let id = match last {
        None => SnowflakeId::from_components(elapsed, node, 0),
        Some(last) => match elapsed.cmp(&last.timestamp()) {
            Ordering::Equal if last.has_sequence_room() => last.increment_sequence(),
            Ordering::Equal => {
                return Ok(IdGenStatus::Pending {
                    yield_until: now.saturating_add(1),
                });
            }
            _ => last.rollover_to_timestamp(elapsed),
        },
    };

    Ok(IdGenStatus::Ready { id })
}

#[cold]
#[inline(never)]
fn cold_clock_behind(node: NodeId, observed: u64, last: u64) -> Error {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        node_id = node.get(),
        observed,
        last,
        "clock moved backwards, refusing to generate"
    );
    Error::ClockRegression {
        node_id: node.get(),
        observed,
        last,
    }
}

#[cold]
#[inline(never)]
fn cold_out_of_range(node: NodeId, observed: u64, epoch: u64) -> Error {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        node_id = node.get(),
        observed,
        epoch,
        "clock reading outside the timestamp window"
    );
    Error::TimestampOutOfRange {
        node_id: node.get(),
        observed,
        epoch,
    }
}
