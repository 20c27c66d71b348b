//! Address-space allocation strategies.
//!
//! Two strategies share the same input types:
//!
//! - [`HierarchicalAllocator`]: ratio-weighted, boundary-aligned regions split
//!   into territories, sites and VLANs, with utilization advisories
//! - [`RegionalAllocator`]: explicit bit counts laid back-to-back with no
//!   re-alignment

pub mod types;
pub mod hierarchical;
pub mod regional;

// Re-export commonly used types
pub use types::{
    AllocationConfig, AllocationPlan, HierarchyNode, NodeKind, NodeMetadata, RegionBreakdown, RegionSpec,
};
pub use hierarchical::HierarchicalAllocator;
pub use regional::{RegionalAllocator, RegionalBlock, RegionalConfig, RegionalPlan};
