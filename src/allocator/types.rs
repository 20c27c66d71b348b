//! Allocation input and output types.

use serde::{Deserialize, Serialize};

use crate::ip::AddressBlock;

/// One weighted region of the root block.
///
/// The hierarchical strategy reads `ratio`; the regional strategy reads
/// `bits`. A region may carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,
    /// Relative weight, must be a positive power of two
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<u32>,
    /// Host bits of the region block (region holds `2^bits` addresses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<u8>,
    /// Optional short code, e.g. "NA"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl RegionSpec {
    pub fn with_ratio(name: impl Into<String>, ratio: u32) -> Self {
        Self {
            name: name.into(),
            ratio: Some(ratio),
            bits: None,
            code: None,
        }
    }

    pub fn with_bits(name: impl Into<String>, bits: u8) -> Self {
        Self {
            name: name.into(),
            ratio: None,
            bits: Some(bits),
            code: None,
        }
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

fn default_territories() -> u32 {
    4
}

fn default_vlans_per_site() -> u32 {
    4
}

fn default_vlan_prefix() -> u8 {
    24
}

fn default_growth() -> f64 {
    1.0
}

/// Input to the hierarchical allocator. Validated once at construction and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Root block as CIDR text, e.g. "10.0.0.0/8"
    pub root: String,
    pub regions: Vec<RegionSpec>,
    #[serde(default = "default_territories")]
    pub territories_per_region: u32,
    #[serde(default = "default_vlans_per_site")]
    pub vlans_per_site: u32,
    #[serde(default = "default_vlan_prefix")]
    pub vlan_prefix: u8,
    #[serde(default)]
    pub sites_needed: u64,
    #[serde(default = "default_growth")]
    pub growth_multiplier: f64,
}

impl AllocationConfig {
    /// A config with default territory, site and growth settings.
    pub fn new(root: impl Into<String>, regions: Vec<RegionSpec>) -> Self {
        Self {
            root: root.into(),
            regions,
            territories_per_region: default_territories(),
            vlans_per_site: default_vlans_per_site(),
            vlan_prefix: default_vlan_prefix(),
            sites_needed: 0,
            growth_multiplier: default_growth(),
        }
    }
}

/// Role of a node in the allocation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Region,
    Unallocated,
    Territory,
    Site,
    Vlan,
}

/// Per-node figures carried alongside the address block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_capacity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A node of the allocation tree. Built fresh by each allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Slash-separated path, e.g. "region-0/territory-2"
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub block: AddressBlock,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
    #[serde(default)]
    pub metadata: NodeMetadata,
}

impl HierarchyNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind, block: AddressBlock) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            block,
            children: Vec::new(),
            metadata: NodeMetadata::default(),
        }
    }

    pub fn with_children(mut self, children: Vec<HierarchyNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// All nodes at `depth` below this one (0 is the node itself).
    pub fn nodes_at_depth(&self, depth: usize) -> Vec<&HierarchyNode> {
        let mut level = vec![self];
        for _ in 0..depth {
            level = level.iter().flat_map(|n| n.children.iter()).collect();
        }
        level
    }

    /// Depth-first search by identifier.
    pub fn find(&self, id: &str) -> Option<&HierarchyNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::node_count).sum::<usize>()
    }
}

/// Summary row for one concrete region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBreakdown {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub ratio: u32,
    pub block: AddressBlock,
    pub territory_count: u32,
    pub site_capacity: u64,
    pub percent_of_root: f64,
}

/// Everything one hierarchical allocation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub root: AddressBlock,
    pub tree: HierarchyNode,
    pub site_prefix: u8,
    pub vlan_prefix: u8,
    pub vlans_per_site: u32,
    pub sites_needed: u64,
    pub total_sites_supported: u64,
    pub utilization_percent: f64,
    pub projected_sites: u64,
    pub projected_utilization_percent: f64,
    pub regions: Vec<RegionBreakdown>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}
