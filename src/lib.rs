//! # Subnet Planner - hierarchical IPv4 address-space partitioning
//!
//! This library derives non-overlapping address plans from a root block and
//! a weighted set of regions: regions are split into territories, territories
//! are measured in sites, and sites hold a fixed number of VLANs.
//!
//! ## Key Features
//!
//! - **Aligned placement**: every region starts on a multiple of its own size
//! - **Power-of-two budgeting**: region ratios map to integral prefix lengths
//! - **Capacity accounting**: sites supported, utilization and growth projection
//! - **Lazy enumeration**: deep subnet hierarchies are produced on demand
//! - **Pure computation**: no I/O, no shared state, every call is repeatable
//!
//! ## Architecture
//!
//! - `ip`: address arithmetic, the `AddressBlock` type and subnet indexing
//! - `allocator`: hierarchical (ratio-driven) and regional (sequential) strategies
//! - `hierarchy`: N-level subnet trees and the VLAN capacity calculator
//! - `config` / `config_loader`: YAML plan documents
//! - `report`: JSON and text renderings of a plan
//! - `error`: the `PlanError` taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use subnet_planner::allocator::{AllocationConfig, HierarchicalAllocator, RegionSpec};
//!
//! let mut config = AllocationConfig::new(
//!     "10.0.0.0/8",
//!     vec![RegionSpec::with_ratio("East", 1), RegionSpec::with_ratio("West", 1)],
//! );
//! config.vlans_per_site = 1;
//!
//! let plan = HierarchicalAllocator::new(&config)?.allocate()?;
//! assert_eq!(plan.regions[0].block.to_string(), "10.0.0.0/9");
//! assert_eq!(plan.regions[1].block.to_string(), "10.128.0.0/9");
//! # Ok::<(), subnet_planner::PlanError>(())
//! ```
//!
//! ## Error Handling
//!
//! Planning functions return `Result<T, PlanError>`, where `PlanError`
//! distinguishes malformed input, exceeded capacity and invalid configuration.
//! File loading and reporting use `color_eyre` for context-rich errors.

pub mod error;
pub mod ip;
pub mod allocator;
pub mod hierarchy;
pub mod config;
pub mod config_loader;
pub mod report;

pub use error::{PlanError, PlanResult};
pub use ip::AddressBlock;
