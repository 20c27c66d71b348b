//! N-level exhaustive subnet hierarchy.
//!
//! Given a root block and an ordered list of `(name, prefix)` levels, every
//! subnet of level L+1 sits inside exactly one subnet of level L. Nodes are
//! produced lazily in breadth-first order: because nested aligned blocks
//! keep address order, the j-th node of a level is simply the j-th subnet of
//! the root at that level's prefix, and its parent is `j / fan_out`.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::ip::{self, AddressBlock, MAX_PREFIX};

/// One level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub name: String,
    pub prefix: u8,
}

impl LevelSpec {
    pub fn new(name: impl Into<String>, prefix: u8) -> Self {
        Self {
            name: name.into(),
            prefix,
        }
    }
}

/// Input to [`SubnetHierarchy::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub root: String,
    pub levels: Vec<LevelSpec>,
}

/// A node yielded by the hierarchy iterators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelNode<'a> {
    pub level: usize,
    pub level_name: &'a str,
    /// Position within the level, in address order
    pub index: u64,
    /// Position of the parent within the previous level; `None` under the root
    pub parent_index: Option<u64>,
    pub block: AddressBlock,
}

/// Aggregate figures for one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub level: usize,
    pub name: String,
    pub prefix: u8,
    pub subnet_count: u64,
    pub subnets_per_parent: u64,
    pub total_addresses: u64,
    pub mean_usable_hosts: f64,
}

/// An immutable hierarchy definition. Changing levels builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SubnetHierarchy {
    root: AddressBlock,
    levels: Vec<LevelSpec>,
    counts: Vec<u64>,
}

impl SubnetHierarchy {
    /// Validate and build. Level prefixes must lie in `[root prefix, 32]`
    /// and never decrease from one level to the next.
    pub fn new(config: &HierarchyConfig) -> PlanResult<Self> {
        let root = ip::parse_cidr(&config.root)?;
        Self::from_root(root, config.levels.clone())
    }

    pub fn from_root(root: AddressBlock, levels: Vec<LevelSpec>) -> PlanResult<Self> {
        if levels.is_empty() {
            return Err(PlanError::malformed("at least one level is required"));
        }

        let mut previous = root.prefix();
        let mut counts = Vec::with_capacity(levels.len());
        for level in &levels {
            if level.name.trim().is_empty() {
                return Err(PlanError::malformed("level names cannot be empty"));
            }
            if level.prefix > MAX_PREFIX || level.prefix < previous {
                return Err(PlanError::malformed(format!(
                    "level '{}' prefix /{} must lie in [/{}, /{}]",
                    level.name, level.prefix, previous, MAX_PREFIX
                )));
            }
            counts.push(ip::subnet_count(root.prefix(), level.prefix)?);
            previous = level.prefix;
        }

        Ok(Self { root, levels, counts })
    }

    /// Same root, new levels.
    pub fn with_levels(&self, levels: Vec<LevelSpec>) -> PlanResult<Self> {
        Self::from_root(self.root, levels)
    }

    pub fn root(&self) -> AddressBlock {
        self.root
    }

    pub fn levels(&self) -> &[LevelSpec] {
        &self.levels
    }

    /// Total node count across all levels, excluding the root.
    pub fn node_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn parent_prefix(&self, level: usize) -> u8 {
        match level {
            0 => self.root.prefix(),
            l => self.levels[l - 1].prefix,
        }
    }

    fn fan_out(&self, level: usize) -> u64 {
        1u64 << (self.levels[level].prefix - self.parent_prefix(level))
    }

    fn check_level(&self, level: usize) -> PlanResult<()> {
        if level >= self.levels.len() {
            return Err(PlanError::malformed(format!(
                "level {} does not exist; hierarchy has {} levels",
                level,
                self.levels.len()
            )));
        }
        Ok(())
    }

    fn node(&self, level: usize, index: u64) -> Option<LevelNode<'_>> {
        let spec = &self.levels[level];
        let block = ip::nth_subnet_of(&self.root, spec.prefix, index).ok()?;
        let parent_index = match level {
            0 => None,
            _ => Some(index / self.fan_out(level)),
        };
        Some(LevelNode {
            level,
            level_name: &spec.name,
            index,
            parent_index,
            block,
        })
    }

    /// Every node of one level, in address order.
    pub fn level_nodes(&self, level: usize) -> PlanResult<impl Iterator<Item = LevelNode<'_>> + '_> {
        self.check_level(level)?;
        Ok((0..self.counts[level]).filter_map(move |i| self.node(level, i)))
    }

    /// The nodes of level `level + 1` inside node `index` of `level`.
    pub fn children_of(&self, level: usize, index: u64) -> PlanResult<impl Iterator<Item = LevelNode<'_>> + '_> {
        self.check_level(level)?;
        let child = level + 1;
        self.check_level(child)?;
        if index >= self.counts[level] {
            return Err(PlanError::capacity(format!(
                "node index {} out of range for level '{}' ({} nodes)",
                index, self.levels[level].name, self.counts[level]
            )));
        }
        let fan_out = self.fan_out(child);
        let first = index * fan_out;
        Ok((first..first + fan_out).filter_map(move |i| self.node(child, i)))
    }

    /// Breadth-first walk of every node below the root, produced lazily.
    pub fn nodes(&self) -> impl Iterator<Item = LevelNode<'_>> + '_ {
        (0..self.levels.len()).flat_map(move |level| (0..self.counts[level]).filter_map(move |i| self.node(level, i)))
    }

    pub fn level_summaries(&self) -> Vec<LevelSummary> {
        self.levels
            .iter()
            .enumerate()
            .map(|(level, spec)| {
                let subnet_count = self.counts[level];
                LevelSummary {
                    level,
                    name: spec.name.clone(),
                    prefix: spec.prefix,
                    subnet_count,
                    subnets_per_parent: self.fan_out(level),
                    total_addresses: subnet_count * ip::address_count(spec.prefix),
                    // Every subnet of a level has the same size
                    mean_usable_hosts: ip::usable_hosts(spec.prefix) as f64,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy(root: &str, levels: &[(&str, u8)]) -> PlanResult<SubnetHierarchy> {
        SubnetHierarchy::new(&HierarchyConfig {
            root: root.to_string(),
            levels: levels.iter().map(|(n, p)| LevelSpec::new(*n, *p)).collect(),
        })
    }

    #[test]
    fn test_breadth_first_order() {
        let h = hierarchy("10.0.0.0/16", &[("campus", 17), ("building", 18)]).unwrap();
        let nodes: Vec<(usize, String, Option<u64>)> =
            h.nodes().map(|n| (n.level, n.block.to_string(), n.parent_index)).collect();

        assert_eq!(
            nodes,
            vec![
                (0, "10.0.0.0/17".to_string(), None),
                (0, "10.0.128.0/17".to_string(), None),
                (1, "10.0.0.0/18".to_string(), Some(0)),
                (1, "10.0.64.0/18".to_string(), Some(0)),
                (1, "10.0.128.0/18".to_string(), Some(1)),
                (1, "10.0.192.0/18".to_string(), Some(1)),
            ]
        );
        assert_eq!(h.node_count(), 6);
    }

    #[test]
    fn test_children_nest_inside_parent() {
        let h = hierarchy("192.168.0.0/16", &[("zone", 20), ("lan", 24)]).unwrap();
        for parent in h.level_nodes(0).unwrap() {
            let children: Vec<LevelNode<'_>> = h.children_of(0, parent.index).unwrap().collect();
            assert_eq!(children.len(), 16);
            for child in children {
                assert!(parent.block.contains_block(&child.block));
                assert_eq!(child.parent_index, Some(parent.index));
            }
        }
        assert!(h.children_of(1, 0).is_err());
        assert!(matches!(h.children_of(0, 16), Err(PlanError::CapacityExceeded(_))));
    }

    #[test]
    fn test_level_summaries() {
        let h = hierarchy("10.0.0.0/16", &[("site", 20), ("vlan", 26)]).unwrap();
        let summaries = h.level_summaries();
        assert_eq!(summaries[0].subnet_count, 16);
        assert_eq!(summaries[0].total_addresses, 65536);
        assert_eq!(summaries[0].mean_usable_hosts, 4094.0);
        assert_eq!(summaries[1].subnet_count, 1024);
        assert_eq!(summaries[1].subnets_per_parent, 64);
        assert_eq!(summaries[1].mean_usable_hosts, 62.0);
    }

    #[test]
    fn test_invalid_levels() {
        assert!(matches!(
            hierarchy("10.0.0.0/16", &[("a", 20), ("b", 18)]),
            Err(PlanError::MalformedInput(_))
        ));
        assert!(hierarchy("10.0.0.0/16", &[("a", 8)]).is_err());
        assert!(hierarchy("10.0.0.0/16", &[("a", 33)]).is_err());
        assert!(hierarchy("10.0.0.0/16", &[]).is_err());
    }

    #[test]
    fn test_with_levels_rebuilds() {
        let h = hierarchy("10.0.0.0/16", &[("a", 17)]).unwrap();
        let rebuilt = h.with_levels(vec![LevelSpec::new("b", 24)]).unwrap();
        assert_eq!(rebuilt.root(), h.root());
        assert_eq!(rebuilt.node_count(), 256);
        assert_eq!(h.node_count(), 2);
    }

    #[test]
    fn test_deep_hierarchy_is_lazy() {
        // 2^24 leaves; only the first few are ever produced
        let h = hierarchy("10.0.0.0/8", &[("x", 16), ("y", 32)]).unwrap();
        let first: Vec<String> = h.level_nodes(1).unwrap().take(2).map(|n| n.block.to_string()).collect();
        assert_eq!(first, vec!["10.0.0.0/32", "10.0.0.1/32"]);
        assert_eq!(h.node_count(), 256 + (1 << 24));
    }
}
