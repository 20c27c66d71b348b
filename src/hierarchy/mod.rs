//! Level-driven subnet trees and VLAN capacity calculations.

pub mod levels;
pub mod calculator;

pub use levels::{HierarchyConfig, LevelNode, LevelSpec, LevelSummary, SubnetHierarchy};
pub use calculator::{DynamicSubnetCalculator, SubnetSnapshot};
