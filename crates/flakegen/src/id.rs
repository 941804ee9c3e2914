use core::{fmt, time::Duration};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::NodeId;

/// A 64-bit Snowflake ID.
///
/// - 1 bit reserved (always zero for generated IDs)
/// - 41 bits timestamp (ms since the generator's epoch)
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21          12 11             0
///              +--------------+----------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | node ID (10) | sequence (12) |
///              +--------------+----------------+--------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB ------------>|
/// ```
///
/// Because the reserved bit is clear, every generated ID also fits a
/// non-negative `i64`, which is what most databases use for `BIGINT` keys.
///
/// # Example
///
/// ```
/// use flakegen::SnowflakeId;
///
/// let id = SnowflakeId::from(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.node_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// assert_eq!(id.to_raw(), (1000 << 22) | (2 << 12) | 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Width of the timestamp field.
    pub const TIMESTAMP_BITS: u32 = 41;

    /// Width of the node ID field.
    pub const NODE_ID_BITS: u32 = 10;

    /// Width of the sequence field.
    pub const SEQUENCE_BITS: u32 = 12;

    /// Bitmask for the 41-bit timestamp field. Occupies bits 22 through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Bitmask for the 10-bit node ID field. Occupies bits 12 through 21.
    pub const NODE_ID_MASK: u64 = (1 << Self::NODE_ID_BITS) - 1;

    /// Bitmask for the 12-bit sequence field. Occupies bits 0 through 11.
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u32 = Self::NODE_ID_SHIFT + Self::NODE_ID_BITS;

    /// Number of bits to shift the node ID to its position (bit 12).
    pub const NODE_ID_SHIFT: u32 = Self::SEQUENCE_SHIFT + Self::SEQUENCE_BITS;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u32 = 0;

    /// Packs the three fields into an ID. Each value is truncated to its
    /// field width.
    pub const fn from(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Packs the fields of an ID minted by `node`.
    pub(crate) fn from_components(timestamp: u64, node: NodeId, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, u64::from(node), sequence)
    }

    /// Wraps a raw 64-bit value without validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the raw 64-bit value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Extracts the timestamp (ms since the epoch) from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node ID from the packed ID.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the largest value the timestamp field can hold.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the largest value the sequence field can hold.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns true if the sequence can be incremented within this tick.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID with the sequence incremented.
    pub const fn increment_sequence(&self) -> Self {
        Self::from(self.timestamp(), self.node_id(), self.sequence() + 1)
    }

    /// Returns a new ID for a newer timestamp with the sequence reset to zero.
    pub const fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from(timestamp, self.node_id(), 0)
    }

    /// Decodes this ID against `epoch`. See [`decode`].
    ///
    /// Unlike [`SnowflakeId::timestamp`], the decoded timestamp keeps the
    /// reserved bit: for a raw value with bit 63 set it is 2^41 ms later than
    /// `timestamp() + epoch`. Generated IDs never set that bit, so the two
    /// agree for every ID a generator returns.
    pub fn decode(&self, epoch: Duration) -> SnowflakeParts {
        decode(self.id, epoch)
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("raw", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

/// The fields of a decoded ID.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SnowflakeParts {
    /// The raw ID that was decoded.
    pub id: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Node that minted the ID.
    pub node_id: u16,
    /// Position within the millisecond.
    pub sequence: u16,
}

impl SnowflakeParts {
    /// The wall-clock instant encoded in the ID, or `None` if the timestamp
    /// is not representable as a [`SystemTime`] on this platform.
    pub fn generated_at(&self) -> Option<SystemTime> {
        UNIX_EPOCH.checked_add(Duration::from_millis(self.timestamp))
    }
}

/// Splits a raw ID into its fields.
///
/// Pure and total: any `u64` decodes. The timestamp is returned in
/// milliseconds since the Unix epoch by adding `epoch` back (saturating).
/// `epoch` must be the one the ID was generated with; a mismatched epoch
/// yields a meaningless timestamp and cannot be detected here.
///
/// # Example
///
/// ```
/// use flakegen::{decode, DEFAULT_EPOCH};
///
/// let parts = decode((5 << 22) | (9 << 12) | 3, DEFAULT_EPOCH);
/// assert_eq!(parts.timestamp, 1_704_067_200_005);
/// assert_eq!(parts.node_id, 9);
/// assert_eq!(parts.sequence, 3);
/// ```
pub fn decode(id: u64, epoch: Duration) -> SnowflakeParts {
    let epoch_ms = u64::try_from(epoch.as_millis()).unwrap_or(u64::MAX);
    SnowflakeParts {
        id,
        timestamp: (id >> SnowflakeId::TIMESTAMP_SHIFT).saturating_add(epoch_ms),
        node_id: ((id >> SnowflakeId::NODE_ID_SHIFT) & SnowflakeId::NODE_ID_MASK) as u16,
        sequence: ((id >> SnowflakeId::SEQUENCE_SHIFT) & SnowflakeId::SEQUENCE_MASK) as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_EPOCH;

    #[test]
    fn layout_fills_63_bits() {
        assert_eq!(
            SnowflakeId::TIMESTAMP_BITS + SnowflakeId::NODE_ID_BITS + SnowflakeId::SEQUENCE_BITS,
            63
        );
        assert_eq!(SnowflakeId::TIMESTAMP_SHIFT, 22);
        assert_eq!(SnowflakeId::NODE_ID_SHIFT, 12);
        assert_eq!(SnowflakeId::NODE_ID_MASK, 0x3FF);
        assert_eq!(SnowflakeId::SEQUENCE_MASK, 0xFFF);
    }

    #[test]
    fn max_fields_keep_reserved_bit_clear() {
        let id = SnowflakeId::from(
            SnowflakeId::max_timestamp(),
            SnowflakeId::NODE_ID_MASK,
            SnowflakeId::max_sequence(),
        );
        assert_eq!(id.to_raw(), i64::MAX as u64);
        assert_eq!(id.timestamp(), SnowflakeId::max_timestamp());
        assert_eq!(id.node_id(), 1023);
        assert_eq!(id.sequence(), 4095);
    }

    #[test]
    fn from_truncates_oversized_fields() {
        let id = SnowflakeId::from(0, 1024, 4096);
        assert_eq!(id.node_id(), 0);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn sequence_helpers() {
        let id = SnowflakeId::from(10, 5, 0);
        assert!(id.has_sequence_room());

        let next = id.increment_sequence();
        assert_eq!((next.timestamp(), next.node_id(), next.sequence()), (10, 5, 1));
        assert!(next > id);

        let full = SnowflakeId::from(10, 5, SnowflakeId::max_sequence());
        assert!(!full.has_sequence_room());

        let rolled = full.rollover_to_timestamp(11);
        assert_eq!((rolled.timestamp(), rolled.node_id(), rolled.sequence()), (11, 5, 0));
        assert!(rolled > full);
    }

    #[test]
    fn decode_adds_epoch_back() {
        let id = SnowflakeId::from(1_234, 77, 42);
        let parts = id.decode(DEFAULT_EPOCH);
        assert_eq!(parts.id, id.to_raw());
        assert_eq!(parts.timestamp, 1_704_067_200_000 + 1_234);
        assert_eq!(parts.node_id, 77);
        assert_eq!(parts.sequence, 42);
        assert_eq!(
            parts.generated_at(),
            Some(UNIX_EPOCH + Duration::from_millis(1_704_067_201_234))
        );
    }

    #[test]
    fn decode_is_total() {
        let parts = decode(u64::MAX, DEFAULT_EPOCH);
        assert_eq!(parts.timestamp, (u64::MAX >> 22) + 1_704_067_200_000);
        assert_eq!(parts.node_id, 1023);
        assert_eq!(parts.sequence, 4095);

        let parts = decode(u64::MAX, Duration::MAX);
        assert_eq!(parts.timestamp, u64::MAX);

        assert_eq!(decode(0, Duration::ZERO).timestamp, 0);
    }

    #[test]
    fn decode_keeps_reserved_bit_in_timestamp() {
        let id = SnowflakeId::from(1_234, 77, 42);
        assert_eq!(id.decode(DEFAULT_EPOCH).timestamp, id.timestamp() + 1_704_067_200_000);

        let reserved = SnowflakeId::from_raw(id.to_raw() | (1 << 63));
        assert_eq!(reserved.timestamp(), id.timestamp());
        assert_eq!(
            reserved.decode(DEFAULT_EPOCH).timestamp,
            id.decode(DEFAULT_EPOCH).timestamp + (1 << 41)
        );
        assert_eq!(reserved.decode(DEFAULT_EPOCH).node_id, 77);
    }

    #[test]
    fn padded_string_and_display() {
        let id = SnowflakeId::from_raw(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.to_padded_string(), "00000000000000000042");
        assert!(format!("{id:?}").contains("0x000000000000002a"));
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::DEFAULT_EPOCH;
    use serde_json::json;

    #[test]
    fn id_is_transparent() {
        let id = SnowflakeId::from(1_234, 77, 42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_raw().to_string());

        let back: SnowflakeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn parts_roundtrip() {
        let parts = SnowflakeId::from(5, 9, 3).decode(DEFAULT_EPOCH);
        let value = serde_json::to_value(parts).unwrap();
        assert_eq!(
            value,
            json!({
                "id": (5u64 << 22) | (9 << 12) | 3,
                "timestamp": 1_704_067_200_005u64,
                "node_id": 9,
                "sequence": 3,
            })
        );

        let back: SnowflakeParts = serde_json::from_value(value).unwrap();
        assert_eq!(back, parts);
    }
}
