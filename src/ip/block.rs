//! The `AddressBlock` value type.
//!
//! A block is just `(network, prefix)`. Broadcast, host range, address count
//! and usable-host count are derived on demand and never stored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::address::{self, MAX_PREFIX};
use crate::error::{PlanError, PlanResult};

/// An aligned IPv4 block. The network address is always a multiple of
/// the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressBlock {
    network: u32,
    prefix: u8,
}

impl AddressBlock {
    /// Build a block from any address inside it. Host bits are cleared.
    pub fn new(ip: u32, prefix: u8) -> PlanResult<Self> {
        if prefix > MAX_PREFIX {
            return Err(PlanError::malformed(format!(
                "prefix /{} outside [0, {}]",
                prefix, MAX_PREFIX
            )));
        }
        Ok(Self {
            network: address::network(ip, prefix),
            prefix,
        })
    }

    pub fn network(&self) -> u32 {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn mask(&self) -> u32 {
        address::mask_bits(self.prefix)
    }

    pub fn broadcast(&self) -> u32 {
        address::broadcast(self.network, self.prefix)
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        address::address_count(self.prefix)
    }

    pub fn usable_hosts(&self) -> u64 {
        address::usable_hosts(self.prefix)
    }

    pub fn host_range(&self) -> (u32, u32) {
        address::host_range(self.network, self.prefix)
    }

    /// One past the last address, widened so a block ending at
    /// 255.255.255.255 is representable.
    pub fn end(&self) -> u64 {
        u64::from(self.network) + self.size()
    }

    pub fn contains_address(&self, ip: u32) -> bool {
        self.network <= ip && ip <= self.broadcast()
    }

    pub fn contains_block(&self, other: &AddressBlock) -> bool {
        other.prefix >= self.prefix && self.contains_address(other.network)
    }

    pub fn overlaps(&self, other: &AddressBlock) -> bool {
        self.contains_block(other) || other.contains_block(self)
    }

    /// Offset of the block from `parent`'s network is a multiple of its size.
    pub fn is_aligned_within(&self, parent: &AddressBlock) -> bool {
        parent.contains_block(self)
            && (u64::from(self.network) - u64::from(parent.network)) % self.size() == 0
    }
}

impl fmt::Display for AddressBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", address::integer_to_address(self.network), self.prefix)
    }
}

impl FromStr for AddressBlock {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        address::parse_cidr(s)
    }
}

impl Serialize for AddressBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AddressBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(s: &str) -> AddressBlock {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_clears_host_bits() {
        let b = AddressBlock::new(0x0A01_0203, 8).unwrap();
        assert_eq!(b.to_string(), "10.0.0.0/8");
        assert!(AddressBlock::new(0, 33).is_err());
    }

    #[test]
    fn test_derived_attributes() {
        let b = block("192.168.4.0/22");
        assert_eq!(b.size(), 1024);
        assert_eq!(b.usable_hosts(), 1022);
        assert_eq!(address::integer_to_address(b.broadcast()), "192.168.7.255");
        assert_eq!(b.end(), u64::from(b.broadcast()) + 1);

        let top = block("255.255.255.0/24");
        assert_eq!(top.end(), 1u64 << 32);
    }

    #[test]
    fn test_containment_and_overlap() {
        let parent = block("10.0.0.0/8");
        let child = block("10.128.0.0/9");
        let other = block("11.0.0.0/8");
        assert!(parent.contains_block(&child));
        assert!(!child.contains_block(&parent));
        assert!(parent.overlaps(&child));
        assert!(!parent.overlaps(&other));
        assert!(child.is_aligned_within(&parent));
    }

    #[test]
    fn test_serde_as_cidr_text() {
        let b = block("172.16.0.0/12");
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "\"172.16.0.0/12\"");
        let back: AddressBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
        assert!(serde_json::from_str::<AddressBlock>("\"172.16.0.0/40\"").is_err());
    }
}
