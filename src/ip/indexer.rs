//! Deterministic subnet indexing.
//!
//! "The Nth subnet of size S within block B" and the subnet-count math every
//! allocator builds on.

use super::address::{self, MAX_PREFIX};
use super::block::AddressBlock;
use crate::error::{PlanError, PlanResult};

/// Number of `/child_prefix` subnets inside a `/parent_prefix` block:
/// `2^(child_prefix - parent_prefix)`.
///
/// # Examples
/// ```
/// use subnet_planner::ip::indexer::subnet_count;
///
/// assert_eq!(subnet_count(16, 24), Ok(256));
/// assert!(subnet_count(24, 16).is_err());
/// ```
pub fn subnet_count(parent_prefix: u8, child_prefix: u8) -> PlanResult<u64> {
    if parent_prefix > MAX_PREFIX || child_prefix > MAX_PREFIX {
        return Err(PlanError::malformed(format!(
            "prefixes /{} and /{} must lie in [0, {}]",
            parent_prefix, child_prefix, MAX_PREFIX
        )));
    }
    if child_prefix < parent_prefix {
        return Err(PlanError::capacity(format!(
            "a /{} subnet does not fit inside a /{} block",
            child_prefix, parent_prefix
        )));
    }
    Ok(1u64 << (child_prefix - parent_prefix))
}

/// The `index`-th `/child_prefix` subnet of the block containing `parent_ip`.
///
/// Fails with `CapacityExceeded` if `index` is not below
/// [`subnet_count`]`(parent_prefix, child_prefix)`.
pub fn nth_subnet(parent_ip: u32, parent_prefix: u8, child_prefix: u8, index: u64) -> PlanResult<AddressBlock> {
    let count = subnet_count(parent_prefix, child_prefix)?;
    if index >= count {
        return Err(PlanError::capacity(format!(
            "subnet index {} out of range: a /{} holds {} /{} subnets",
            index, parent_prefix, count, child_prefix
        )));
    }

    let base = u64::from(address::network(parent_ip, parent_prefix));
    let offset = index * address::address_count(child_prefix);
    let ip = u32::try_from(base + offset)
        .map_err(|_| PlanError::capacity(format!("subnet index {} runs past 255.255.255.255", index)))?;
    AddressBlock::new(ip, child_prefix)
}

/// Convenience wrapper over [`nth_subnet`] for an existing block.
pub fn nth_subnet_of(parent: &AddressBlock, child_prefix: u8, index: u64) -> PlanResult<AddressBlock> {
    nth_subnet(parent.network(), parent.prefix(), child_prefix, index)
}

/// Lazily enumerate every `/child_prefix` subnet of `parent` in address order.
pub fn subnets(parent: AddressBlock, child_prefix: u8) -> PlanResult<impl Iterator<Item = AddressBlock>> {
    let count = subnet_count(parent.prefix(), child_prefix)?;
    Ok((0..count).filter_map(move |i| nth_subnet_of(&parent, child_prefix, i).ok()))
}

/// Decompose the half-open interval `[start, end)` into maximal aligned
/// blocks, in address order.
pub fn range_to_blocks(start: u64, end: u64) -> Vec<AddressBlock> {
    let end = end.min(1u64 << MAX_PREFIX);
    let mut blocks = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let align = if cursor == 0 { MAX_PREFIX as u32 } else { cursor.trailing_zeros().min(MAX_PREFIX as u32) };
        let mut size = 1u64 << align;
        while cursor + size > end {
            size >>= 1;
        }
        let prefix = MAX_PREFIX - size.trailing_zeros() as u8;
        // cursor < 2^32 here, and the block is aligned by construction
        if let Ok(block) = AddressBlock::new(cursor as u32, prefix) {
            blocks.push(block);
        }
        cursor += size;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::address::parse_cidr;

    #[test]
    fn test_subnet_count() {
        assert_eq!(subnet_count(8, 8).unwrap(), 1);
        assert_eq!(subnet_count(8, 9).unwrap(), 2);
        assert_eq!(subnet_count(0, 32).unwrap(), 1u64 << 32);
        assert!(matches!(subnet_count(24, 16), Err(PlanError::CapacityExceeded(_))));
        assert!(matches!(subnet_count(24, 33), Err(PlanError::MalformedInput(_))));
    }

    #[test]
    fn test_nth_subnet_positions() {
        let parent = parse_cidr("10.0.0.0/8").unwrap();
        assert_eq!(nth_subnet_of(&parent, 9, 0).unwrap().to_string(), "10.0.0.0/9");
        assert_eq!(nth_subnet_of(&parent, 9, 1).unwrap().to_string(), "10.128.0.0/9");
        assert_eq!(nth_subnet_of(&parent, 24, 257).unwrap().to_string(), "10.1.1.0/24");
        assert!(matches!(nth_subnet_of(&parent, 9, 2), Err(PlanError::CapacityExceeded(_))));
    }

    #[test]
    fn test_subnets_cover_parent_exactly() {
        let parent = parse_cidr("192.168.0.0/22").unwrap();
        let children: Vec<AddressBlock> = subnets(parent, 24).unwrap().collect();
        assert_eq!(children.len(), 4);

        let mut expected = u64::from(parent.network());
        for child in &children {
            assert_eq!(u64::from(child.network()), expected);
            assert!(parent.contains_block(child));
            expected = child.end();
        }
        assert_eq!(expected, parent.end());

        for (i, a) in children.iter().enumerate() {
            for b in &children[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_last_subnet_of_address_space() {
        let all = parse_cidr("0.0.0.0/0").unwrap();
        let last = nth_subnet_of(&all, 24, (1 << 24) - 1).unwrap();
        assert_eq!(last.to_string(), "255.255.255.0/24");
    }

    #[test]
    fn test_range_to_blocks() {
        // 10.0.0.64 .. 10.0.1.0 => /26 + /25
        let start = u64::from(0x0A00_0040u32);
        let end = u64::from(0x0A00_0100u32);
        let blocks: Vec<String> = range_to_blocks(start, end).iter().map(|b| b.to_string()).collect();
        assert_eq!(blocks, vec!["10.0.0.64/26", "10.0.0.128/25"]);

        assert!(range_to_blocks(5, 5).is_empty());
        assert_eq!(range_to_blocks(0, 1u64 << 32)[0].to_string(), "0.0.0.0/0");
    }
}
