//! IPv4 address arithmetic and subnet indexing.
//!
//! This module holds the fixed-width building blocks every allocator uses:
//! dotted-quad and CIDR parsing, masks and block bounds, and deterministic
//! "Nth subnet" indexing.

pub mod address;
pub mod block;
pub mod indexer;

// Re-export commonly used items
pub use address::{
    address_count, address_to_integer, broadcast, contains, host_range, integer_to_address, network,
    parse_cidr, prefix_to_mask, usable_hosts, MAX_PREFIX,
};
pub use block::AddressBlock;
pub use indexer::{nth_subnet, nth_subnet_of, range_to_blocks, subnet_count, subnets};
