//! VLAN capacity calculator over a (root block, VLAN prefix) pair.
//!
//! The calculator is a value: changing the root or the VLAN prefix returns a
//! new calculator, and `snapshot()` always reflects one consistent pair.

use log::debug;
use serde::Serialize;

use crate::allocator::hierarchical::GROWTH_RANGE;
use crate::error::{PlanError, PlanResult};
use crate::ip::{self, AddressBlock, MAX_PREFIX};

/// Figures computed from one (root, VLAN prefix) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetSnapshot {
    pub root: AddressBlock,
    pub vlan_prefix: u8,
    pub vlan_count: u64,
    pub total_addresses: u64,
    pub usable_hosts_per_vlan: u64,
    pub total_usable_hosts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicSubnetCalculator {
    root: AddressBlock,
    vlan_prefix: u8,
}

impl DynamicSubnetCalculator {
    pub fn new(root_cidr: &str, vlan_prefix: u8) -> PlanResult<Self> {
        Self::from_block(ip::parse_cidr(root_cidr)?, vlan_prefix)
    }

    /// Fails with `MalformedInput` past /32 and `CapacityExceeded` when a
    /// VLAN would be larger than the root.
    pub fn from_block(root: AddressBlock, vlan_prefix: u8) -> PlanResult<Self> {
        ip::subnet_count(root.prefix(), vlan_prefix)?;
        Ok(Self { root, vlan_prefix })
    }

    pub fn with_root(&self, root_cidr: &str) -> PlanResult<Self> {
        Self::new(root_cidr, self.vlan_prefix)
    }

    pub fn with_vlan_prefix(&self, vlan_prefix: u8) -> PlanResult<Self> {
        Self::from_block(self.root, vlan_prefix)
    }

    pub fn root(&self) -> AddressBlock {
        self.root
    }

    pub fn vlan_prefix(&self) -> u8 {
        self.vlan_prefix
    }

    pub fn snapshot(&self) -> SubnetSnapshot {
        let vlan_count = 1u64 << (self.vlan_prefix - self.root.prefix());
        let usable_hosts_per_vlan = ip::usable_hosts(self.vlan_prefix);
        SubnetSnapshot {
            root: self.root,
            vlan_prefix: self.vlan_prefix,
            vlan_count,
            total_addresses: self.root.size(),
            usable_hosts_per_vlan,
            total_usable_hosts: vlan_count * usable_hosts_per_vlan,
        }
    }

    /// Smallest root block (largest prefix in `[current prefix, 32]`) that
    /// still holds one VLAN for each of `ceil(sites * growth)` sites.
    ///
    /// Starts from a single VLAN and grows the block one bit at a time.
    /// Fails with `InvalidConfiguration` for a growth factor outside
    /// [1.0, 10.0] and with `CapacityExceeded` when even the current root
    /// is too small.
    pub fn recommend_root_prefix(&self, sites: u64, growth: f64) -> PlanResult<u8> {
        let (min_growth, max_growth) = GROWTH_RANGE;
        if !(min_growth..=max_growth).contains(&growth) {
            return Err(PlanError::invalid_config(format!(
                "growth buffer {} outside [{}, {}]",
                growth, min_growth, max_growth
            )));
        }

        let needed = ((sites as f64 * growth).ceil() as u64).max(1);
        let current = self.root.prefix();

        let mut prefix = self.vlan_prefix.min(MAX_PREFIX);
        loop {
            let capacity = 1u64 << (self.vlan_prefix - prefix);
            debug!("/{} holds {} /{} VLANs, need {}", prefix, capacity, self.vlan_prefix, needed);
            if capacity >= needed {
                return Ok(prefix);
            }
            if prefix == current {
                return Err(PlanError::capacity(format!(
                    "{} holds {} /{} VLANs but {} are projected",
                    self.root, capacity, self.vlan_prefix, needed
                )));
            }
            prefix -= 1;
        }
    }
}
