use core::fmt;

use crate::{Error, Result, SnowflakeId};

/// A validated node identifier in `0..=1023`.
///
/// The node ID distinguishes generator instances from one another. Nothing in
/// this crate can detect two live instances sharing a node ID; assigning
/// disjoint values per process (e.g. one per server via `NODE_ID`) is an
/// operational precondition for cross-node uniqueness.
///
/// # Example
///
/// ```
/// use flakegen::NodeId;
///
/// assert_eq!(NodeId::new(1023).unwrap().get(), 1023);
/// assert!(NodeId::new(1024).is_err());
/// assert!(NodeId::new(-1).is_err());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i64", into = "u16"))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u16);

impl NodeId {
    /// The largest valid node ID.
    pub const MAX: u16 = SnowflakeId::NODE_ID_MASK as u16;

    /// Validates `raw` against the 10-bit node field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `raw` is negative or above
    /// [`NodeId::MAX`].
    pub fn new(raw: i64) -> Result<Self> {
        match u16::try_from(raw) {
            Ok(id) if id <= Self::MAX => Ok(Self(id)),
            _ => Err(Error::InvalidNodeId {
                node_id: raw,
                max: Self::MAX,
            }),
        }
    }

    /// Returns the node ID as a plain integer.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<i64> for NodeId {
    type Error = Error;

    fn try_from(raw: i64) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<NodeId> for u16 {
    fn from(node: NodeId) -> Self {
        node.0
    }
}

impl From<NodeId> for u64 {
    fn from(node: NodeId) -> Self {
        u64::from(node.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundaries() {
        assert_eq!(NodeId::new(0).unwrap().get(), 0);
        assert_eq!(NodeId::new(1023).unwrap().get(), 1023);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            NodeId::new(1024),
            Err(Error::InvalidNodeId {
                node_id: 1024,
                max: 1023
            })
        );
        assert_eq!(
            NodeId::try_from(-1),
            Err(Error::InvalidNodeId {
                node_id: -1,
                max: 1023
            })
        );
        assert!(NodeId::new(i64::from(u16::MAX) + 1).is_err());
    }
}
