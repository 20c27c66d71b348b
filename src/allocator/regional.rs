//! Sequential fixed-size regional allocation.
//!
//! Each region asks for an explicit number of host bits and receives
//! `2^bits` addresses. Regions are laid back-to-back in config order with
//! no re-alignment, so a block is contiguous but may not start on its own
//! size boundary. Use the hierarchical allocator when alignment matters.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::types::RegionSpec;
use crate::error::{PlanError, PlanResult};
use crate::ip::{self, AddressBlock, MAX_PREFIX};

/// Input to the regional allocator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalConfig {
    pub root: String,
    pub regions: Vec<RegionSpec>,
}

/// One sequentially placed block. `start` need not be a multiple of `size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalBlock {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub start: u32,
    pub prefix: u8,
    pub size: u64,
    /// True when `start` is a multiple of `size`
    pub aligned: bool,
    pub unallocated: bool,
}

impl RegionalBlock {
    /// Last address of the block.
    pub fn last(&self) -> u32 {
        (u64::from(self.start) + self.size - 1) as u32
    }

    /// `start/prefix`, rendered as-is even when unaligned.
    pub fn cidr(&self) -> String {
        format!("{}/{}", ip::integer_to_address(self.start), self.prefix)
    }

    /// The block as an [`AddressBlock`], only when it is aligned.
    pub fn as_block(&self) -> Option<AddressBlock> {
        if self.aligned {
            AddressBlock::new(self.start, self.prefix).ok()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalPlan {
    pub root: AddressBlock,
    pub blocks: Vec<RegionalBlock>,
    pub allocated_addresses: u64,
    pub unallocated_addresses: u64,
}

#[derive(Debug, Clone)]
struct SizedRegion {
    name: String,
    bits: u8,
    code: Option<String>,
}

/// Back-to-back allocator over explicit bit counts.
#[derive(Debug, Clone)]
pub struct RegionalAllocator {
    root: AddressBlock,
    regions: Vec<SizedRegion>,
}

impl RegionalAllocator {
    /// Validate and build.
    ///
    /// The capacity check sums `2^bits` per region and compares it with
    /// `2^available_bits` of the root, where available bits are the root's
    /// host bits. It ignores alignment entirely.
    pub fn new(config: &RegionalConfig) -> PlanResult<Self> {
        let root = ip::parse_cidr(&config.root)?;
        let available_bits = MAX_PREFIX - root.prefix();

        if config.regions.is_empty() {
            return Err(PlanError::malformed("at least one region is required"));
        }

        let mut regions = Vec::with_capacity(config.regions.len());
        for spec in &config.regions {
            let bits = spec
                .bits
                .ok_or_else(|| PlanError::malformed(format!("region '{}' has no bit count", spec.name)))?;
            if bits > MAX_PREFIX {
                return Err(PlanError::malformed(format!(
                    "region '{}' asks for {} bits, at most {} are possible",
                    spec.name, bits, MAX_PREFIX
                )));
            }
            regions.push(SizedRegion {
                name: spec.name.clone(),
                bits,
                code: spec.code.clone(),
            });
        }

        let requested: u64 = regions.iter().map(|r| 1u64 << r.bits).sum();
        let available = 1u64 << available_bits;
        if requested > available {
            return Err(PlanError::capacity(format!(
                "regions request {} addresses but {} holds {}",
                requested, root, available
            )));
        }

        Ok(Self { root, regions })
    }

    pub fn root(&self) -> AddressBlock {
        self.root
    }

    /// Lay the regions out back-to-back and append one trailing
    /// Unallocated block, the largest power of two fitting the remainder.
    pub fn allocate(&self) -> RegionalPlan {
        info!("Sequentially allocating {} regions in {}", self.regions.len(), self.root);

        let mut cursor = u64::from(self.root.network());
        let mut blocks = Vec::with_capacity(self.regions.len() + 1);

        for region in &self.regions {
            let size = 1u64 << region.bits;
            let block = RegionalBlock {
                name: region.name.clone(),
                code: region.code.clone(),
                start: cursor as u32,
                prefix: MAX_PREFIX - region.bits,
                size,
                aligned: cursor % size == 0,
                unallocated: false,
            };
            debug!("Region '{}' at {} (aligned: {})", block.name, block.cidr(), block.aligned);
            blocks.push(block);
            cursor += size;
        }

        let allocated = cursor - u64::from(self.root.network());
        let remainder = self.root.end() - cursor;
        if remainder > 0 {
            let bits = (u64::BITS - 1 - remainder.leading_zeros()) as u8;
            let size = 1u64 << bits;
            blocks.push(RegionalBlock {
                name: String::from("Unallocated"),
                code: None,
                start: cursor as u32,
                prefix: MAX_PREFIX - bits,
                size,
                aligned: cursor % size == 0,
                unallocated: true,
            });
        }

        RegionalPlan {
            root: self.root,
            blocks,
            allocated_addresses: allocated,
            unallocated_addresses: remainder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &str, bits: &[u8]) -> RegionalConfig {
        RegionalConfig {
            root: root.to_string(),
            regions: bits
                .iter()
                .enumerate()
                .map(|(i, &b)| RegionSpec::with_bits(format!("R{}", i), b))
                .collect(),
        }
    }

    #[test]
    fn test_back_to_back_without_alignment() {
        let plan = RegionalAllocator::new(&config("10.0.0.0/16", &[7, 8])).unwrap().allocate();

        assert_eq!(plan.blocks[0].cidr(), "10.0.0.0/25");
        assert!(plan.blocks[0].aligned);

        // A /24 starting at .128 is contiguous but not self-aligned
        assert_eq!(plan.blocks[1].cidr(), "10.0.0.128/24");
        assert!(!plan.blocks[1].aligned);
        assert_eq!(plan.blocks[1].as_block(), None);
        assert_eq!(ip::integer_to_address(plan.blocks[1].last()), "10.0.1.127");
        assert_eq!(plan.allocated_addresses, 384);
    }

    #[test]
    fn test_trailing_unallocated_block() {
        let plan = RegionalAllocator::new(&config("10.0.0.0/24", &[6])).unwrap().allocate();
        let last = plan.blocks.last().unwrap();
        assert!(last.unallocated);
        // 192 addresses remain, largest power of two is 128
        assert_eq!(last.size, 128);
        assert_eq!(last.cidr(), "10.0.0.64/25");
        assert_eq!(plan.unallocated_addresses, 192);
    }

    #[test]
    fn test_exact_fit_has_no_remainder() {
        let plan = RegionalAllocator::new(&config("10.0.0.0/24", &[7, 7])).unwrap().allocate();
        assert_eq!(plan.blocks.len(), 2);
        assert_eq!(plan.unallocated_addresses, 0);
    }

    #[test]
    fn test_address_count_check() {
        assert!(matches!(
            RegionalAllocator::new(&config("10.0.0.0/24", &[7, 7, 1])),
            Err(PlanError::CapacityExceeded(_))
        ));
        // A single region larger than the root fails the same address count
        assert!(matches!(
            RegionalAllocator::new(&config("10.0.0.0/24", &[9])),
            Err(PlanError::CapacityExceeded(_))
        ));
        assert!(matches!(
            RegionalAllocator::new(&config("0.0.0.0/0", &[32])),
            Ok(_)
        ));
        assert!(matches!(
            RegionalAllocator::new(&config("10.0.0.0/24", &[33])),
            Err(PlanError::MalformedInput(_))
        ));
        let missing = RegionalConfig {
            root: "10.0.0.0/24".to_string(),
            regions: vec![RegionSpec::with_ratio("R0", 1)],
        };
        assert!(matches!(RegionalAllocator::new(&missing), Err(PlanError::MalformedInput(_))));
    }
}
