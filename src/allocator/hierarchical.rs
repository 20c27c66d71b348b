//! Ratio-driven hierarchical allocation.
//!
//! The root block is split into weighted regions, each region into equal
//! territories, and each territory is measured in sites of a fixed number of
//! VLANs. Region sizes come from power-of-two ratios, so every region prefix
//! is integral and every region can be placed on its own size boundary.
//!
//! Algorithm outline:
//!
//! 1. Site prefix = VLAN prefix minus the bits needed for the VLANs per site
//! 2. Region prefix = root prefix + `ceil(log2(sum of ratios))` - `log2(ratio)`
//! 3. Regions are placed in config order, each aligned to its own size
//! 4. Any space left over is reported and its largest aligned block is
//!    marked Unallocated
//! 5. Regions split into territories, territories are measured in sites
//! 6. Utilization against the site target drives advisory recommendations

use log::{debug, info, warn};

use super::types::{
    AllocationConfig, AllocationPlan, HierarchyNode, NodeKind, NodeMetadata, RegionBreakdown,
};
use crate::error::{PlanError, PlanResult};
use crate::ip::{self, AddressBlock, MAX_PREFIX};

/// Smallest permitted site prefix
pub const MIN_SITE_PREFIX: u8 = 16;
/// Permitted VLAN prefix range
pub const VLAN_PREFIX_RANGE: (u8, u8) = (16, 30);
/// Largest territory prefix a split may produce
pub const MAX_TERRITORY_PREFIX: u8 = 30;
pub const MAX_VLANS_PER_SITE: u32 = 256;
pub const MAX_TERRITORIES_PER_REGION: u32 = 256;
/// Permitted growth multiplier range
pub const GROWTH_RANGE: (f64, f64) = (1.0, 10.0);
/// Above this utilization a larger root block is recommended
pub const HIGH_UTILIZATION_PERCENT: f64 = 80.0;
/// Below this utilization a smaller root block is recommended
pub const LOW_UTILIZATION_PERCENT: f64 = 20.0;

/// `ceil(log2(n))`, with 0 for n <= 1.
pub(crate) fn ceil_log2(n: u64) -> u8 {
    if n <= 1 {
        0
    } else {
        (u64::BITS - (n - 1).leading_zeros()) as u8
    }
}

#[derive(Debug, Clone)]
struct WeightedRegion {
    name: String,
    ratio: u32,
    code: Option<String>,
}

impl WeightedRegion {
    fn ratio_bits(&self) -> u8 {
        self.ratio.trailing_zeros() as u8
    }
}

/// A region after placement, before territory derivation.
#[derive(Debug, Clone)]
struct PlacedRegion<'a> {
    index: usize,
    region: &'a WeightedRegion,
    block: AddressBlock,
}

/// Hierarchical allocator over a validated [`AllocationConfig`].
#[derive(Debug, Clone)]
pub struct HierarchicalAllocator {
    root: AddressBlock,
    regions: Vec<WeightedRegion>,
    territories_per_region: u32,
    vlans_per_site: u32,
    vlan_prefix: u8,
    sites_needed: u64,
    growth_multiplier: f64,
}

impl HierarchicalAllocator {
    /// Validate `config` and build an allocator.
    ///
    /// Fails with `MalformedInput` for a bad root CIDR, a missing or
    /// non-power-of-two ratio, a VLAN prefix outside [16, 30], a VLAN count
    /// outside [1, 256] or a territory count that is not a power of two in
    /// [1, 256]. Fails with `InvalidConfiguration` for a growth multiplier
    /// outside [1.0, 10.0].
    pub fn new(config: &AllocationConfig) -> PlanResult<Self> {
        let root = ip::parse_cidr(&config.root)?;

        if config.regions.is_empty() {
            return Err(PlanError::malformed("at least one region is required"));
        }

        let mut regions = Vec::with_capacity(config.regions.len());
        for spec in &config.regions {
            if spec.name.trim().is_empty() {
                return Err(PlanError::malformed("region names cannot be empty"));
            }
            let ratio = spec
                .ratio
                .ok_or_else(|| PlanError::malformed(format!("region '{}' has no ratio", spec.name)))?;
            if !ratio.is_power_of_two() {
                return Err(PlanError::malformed(format!(
                    "region '{}' ratio {} is not a positive power of two",
                    spec.name, ratio
                )));
            }
            regions.push(WeightedRegion {
                name: spec.name.clone(),
                ratio,
                code: spec.code.clone(),
            });
        }

        let (min_vlan, max_vlan) = VLAN_PREFIX_RANGE;
        if config.vlan_prefix < min_vlan || config.vlan_prefix > max_vlan {
            return Err(PlanError::malformed(format!(
                "VLAN prefix /{} outside [{}, {}]",
                config.vlan_prefix, min_vlan, max_vlan
            )));
        }

        if config.vlans_per_site == 0 || config.vlans_per_site > MAX_VLANS_PER_SITE {
            return Err(PlanError::malformed(format!(
                "VLANs per site {} outside [1, {}]",
                config.vlans_per_site, MAX_VLANS_PER_SITE
            )));
        }

        if !config.territories_per_region.is_power_of_two()
            || config.territories_per_region > MAX_TERRITORIES_PER_REGION
        {
            return Err(PlanError::malformed(format!(
                "territories per region {} must be a power of two in [1, {}]",
                config.territories_per_region, MAX_TERRITORIES_PER_REGION
            )));
        }

        let (min_growth, max_growth) = GROWTH_RANGE;
        if !(min_growth..=max_growth).contains(&config.growth_multiplier) {
            return Err(PlanError::invalid_config(format!(
                "growth multiplier {} outside [{}, {}]",
                config.growth_multiplier, min_growth, max_growth
            )));
        }

        Ok(Self {
            root,
            regions,
            territories_per_region: config.territories_per_region,
            vlans_per_site: config.vlans_per_site,
            vlan_prefix: config.vlan_prefix,
            sites_needed: config.sites_needed,
            growth_multiplier: config.growth_multiplier,
        })
    }

    pub fn root(&self) -> AddressBlock {
        self.root
    }

    /// Prefix of a block holding `vlans_per_site` VLANs.
    pub fn site_prefix(&self) -> PlanResult<u8> {
        let vlan_bits = ceil_log2(u64::from(self.vlans_per_site));
        match self.vlan_prefix.checked_sub(vlan_bits) {
            Some(prefix) if prefix >= MIN_SITE_PREFIX => Ok(prefix),
            _ => Err(PlanError::capacity(format!(
                "{} /{} VLANs per site need a site larger than /{}",
                self.vlans_per_site, self.vlan_prefix, MIN_SITE_PREFIX
            ))),
        }
    }

    /// Prefix of each region, in config order.
    fn region_prefixes(&self) -> PlanResult<Vec<u8>> {
        let ratio_sum: u64 = self.regions.iter().map(|r| u64::from(r.ratio)).sum();
        let bits_needed = ceil_log2(ratio_sum);
        debug!("Ratio sum {} needs {} regional bits", ratio_sum, bits_needed);

        self.regions
            .iter()
            .map(|region| {
                let prefix = u16::from(self.root.prefix()) + u16::from(bits_needed) - u16::from(region.ratio_bits());
                if prefix > u16::from(MAX_PREFIX) {
                    return Err(PlanError::capacity(format!(
                        "region '{}' would need a /{} block inside {}",
                        region.name, prefix, self.root
                    )));
                }
                Ok(prefix as u8)
            })
            .collect()
    }

    /// Place regions in config order, each on its own size boundary.
    fn place_regions(&self, prefixes: &[u8]) -> PlanResult<Vec<PlacedRegion<'_>>> {
        let root_end = self.root.end();
        let mut cursor = u64::from(self.root.network());
        let mut placed = Vec::with_capacity(self.regions.len());

        for (index, (region, &prefix)) in self.regions.iter().zip(prefixes).enumerate() {
            let size = ip::address_count(prefix);
            let start = cursor.div_ceil(size) * size;
            if start + size > root_end {
                return Err(PlanError::capacity(format!(
                    "region '{}' (/{}) does not fit in {} after aligning to {}",
                    region.name,
                    prefix,
                    self.root,
                    ip::integer_to_address(start.min(u64::from(u32::MAX)) as u32)
                )));
            }
            let block = AddressBlock::new(start as u32, prefix)?;
            debug!("Placed region '{}' at {}", region.name, block);
            placed.push(PlacedRegion { index, region, block });
            cursor = start + size;
        }
        Ok(placed)
    }

    /// Free intervals left between and after placed regions.
    fn free_intervals(&self, placed: &[PlacedRegion<'_>]) -> Vec<(u64, u64)> {
        let mut gaps = Vec::new();
        let mut cursor = u64::from(self.root.network());
        for p in placed {
            let start = u64::from(p.block.network());
            if start > cursor {
                gaps.push((cursor, start));
            }
            cursor = p.block.end();
        }
        if cursor < self.root.end() {
            gaps.push((cursor, self.root.end()));
        }
        gaps
    }

    /// Compute the full allocation plan.
    ///
    /// Fails with `CapacityExceeded` when the site prefix would pass /16, a
    /// region cannot be placed, a territory split would pass /30, or no
    /// territory can hold a single site. No partial plan is returned.
    pub fn allocate(&self) -> PlanResult<AllocationPlan> {
        info!("Allocating {} across {} regions", self.root, self.regions.len());

        let site_prefix = self.site_prefix()?;
        info!(
            "Site prefix /{} holds {} /{} VLANs",
            site_prefix, self.vlans_per_site, self.vlan_prefix
        );

        let prefixes = self.region_prefixes()?;
        let placed = self.place_regions(&prefixes)?;

        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        let root_size = self.root.size();
        let placed_size: u64 = placed.iter().map(|p| p.block.size()).sum();
        let unallocated = if placed_size < root_size {
            let free = root_size - placed_size;
            let largest = self
                .free_intervals(&placed)
                .into_iter()
                .flat_map(|(start, end)| ip::range_to_blocks(start, end))
                .min_by_key(|b| (b.prefix(), b.network()));
            let percent = free as f64 / root_size as f64 * 100.0;
            let message = match largest {
                Some(block) => format!(
                    "{} addresses ({:.1}% of {}) left unallocated; largest free block is {}",
                    free, percent, self.root, block
                ),
                None => format!("{} addresses ({:.1}% of {}) left unallocated", free, percent, self.root),
            };
            warn!("{}", message);
            warnings.push(message);
            largest
        } else {
            None
        };

        let territory_bits = self.territories_per_region.trailing_zeros() as u8;
        let ratio_sum: u64 = self.regions.iter().map(|r| u64::from(r.ratio)).sum();

        let mut children = Vec::with_capacity(placed.len() + 1);
        let mut breakdown = Vec::with_capacity(placed.len());
        let mut total_sites: u64 = 0;

        for p in &placed {
            let territory_prefix = p.block.prefix() + territory_bits;
            if territory_prefix > MAX_TERRITORY_PREFIX {
                return Err(PlanError::capacity(format!(
                    "splitting region '{}' ({}) into {} territories needs /{}, beyond /{}",
                    p.region.name, p.block, self.territories_per_region, territory_prefix, MAX_TERRITORY_PREFIX
                )));
            }

            let sites_per_territory = if site_prefix >= territory_prefix {
                ip::subnet_count(territory_prefix, site_prefix)?
            } else {
                let message = format!(
                    "territories of region '{}' (/{}) are smaller than a /{} site and hold no sites",
                    p.region.name, territory_prefix, site_prefix
                );
                warn!("{}", message);
                warnings.push(message);
                0
            };

            let region_sites = sites_per_territory * u64::from(self.territories_per_region);
            total_sites += region_sites;

            let region_id = format!("region-{}", p.index);
            let mut territories = Vec::with_capacity(self.territories_per_region as usize);
            for t in 0..self.territories_per_region {
                let block = ip::nth_subnet_of(&p.block, territory_prefix, u64::from(t))?;
                let metadata = NodeMetadata {
                    site_capacity: Some(sites_per_territory),
                    code: p.region.code.as_ref().map(|c| format!("{}-T{:02}", c, t + 1)),
                    ..NodeMetadata::default()
                };
                territories.push(
                    HierarchyNode::new(
                        format!("{}/territory-{}", region_id, t),
                        format!("{} Territory {}", p.region.name, t + 1),
                        NodeKind::Territory,
                        block,
                    )
                    .with_metadata(metadata),
                );
            }

            // Sites needed are shared out by ratio
            let region_demand = self.sites_needed as f64 * f64::from(p.region.ratio) / ratio_sum as f64;
            let region_utilization = if region_sites > 0 {
                Some(region_demand / region_sites as f64 * 100.0)
            } else {
                None
            };

            debug!(
                "Region '{}' {} -> {} territories of /{}, {} sites",
                p.region.name, p.block, self.territories_per_region, territory_prefix, region_sites
            );

            children.push(
                HierarchyNode::new(region_id, p.region.name.clone(), NodeKind::Region, p.block)
                    .with_children(territories)
                    .with_metadata(NodeMetadata {
                        ratio: Some(p.region.ratio),
                        site_capacity: Some(region_sites),
                        utilization: region_utilization,
                        code: p.region.code.clone(),
                    }),
            );

            breakdown.push(RegionBreakdown {
                name: p.region.name.clone(),
                code: p.region.code.clone(),
                ratio: p.region.ratio,
                block: p.block,
                territory_count: self.territories_per_region,
                site_capacity: region_sites,
                percent_of_root: p.block.size() as f64 / root_size as f64 * 100.0,
            });
        }

        if let Some(block) = unallocated {
            children.push(HierarchyNode::new("unallocated", "Unallocated", NodeKind::Unallocated, block));
        }
        children.sort_by_key(|c| c.block.network());

        if total_sites == 0 {
            return Err(PlanError::capacity(format!(
                "no territory in {} can hold a single /{} site",
                self.root, site_prefix
            )));
        }

        let utilization = self.sites_needed as f64 / total_sites as f64 * 100.0;
        let projected_sites = (self.sites_needed as f64 * self.growth_multiplier).ceil() as u64;
        let projected_utilization = projected_sites as f64 / total_sites as f64 * 100.0;

        info!(
            "{} sites supported, {} needed ({:.1}% utilization)",
            total_sites, self.sites_needed, utilization
        );

        if projected_utilization > 100.0 {
            let message = format!(
                "projected demand of {} sites (x{} growth) exceeds the {} sites supported",
                projected_sites, self.growth_multiplier, total_sites
            );
            warn!("{}", message);
            warnings.push(message);
        }

        if utilization > HIGH_UTILIZATION_PERCENT {
            let suggestion = match self.root.prefix() {
                0 => String::from("a larger address plan"),
                p => format!("a /{} root block", p - 1),
            };
            recommendations.push(format!(
                "Utilization is {:.1}%; consider a larger root block such as {}",
                utilization, suggestion
            ));
        } else if utilization < LOW_UTILIZATION_PERCENT {
            let suggestion = match self.root.prefix() {
                p if p >= MAX_PREFIX => String::from("a narrower site design"),
                p => format!("a /{} root block", p + 1),
            };
            recommendations.push(format!(
                "Utilization is {:.1}%; consider a smaller root block such as {}",
                utilization, suggestion
            ));
        }

        let tree = HierarchyNode::new("root", "Root", NodeKind::Root, self.root)
            .with_children(children)
            .with_metadata(NodeMetadata {
                site_capacity: Some(total_sites),
                utilization: Some(utilization),
                ..NodeMetadata::default()
            });

        Ok(AllocationPlan {
            root: self.root,
            tree,
            site_prefix,
            vlan_prefix: self.vlan_prefix,
            vlans_per_site: self.vlans_per_site,
            sites_needed: self.sites_needed,
            total_sites_supported: total_sites,
            utilization_percent: utilization,
            projected_sites,
            projected_utilization_percent: projected_utilization,
            regions: breakdown,
            warnings,
            recommendations,
        })
    }

    /// Derive site `site_index` of a territory together with its VLANs.
    ///
    /// Pure and index-addressable: the same inputs always give the same
    /// site, and no other site is materialized.
    pub fn generate_site_example(&self, territory_cidr: &str, site_index: u64) -> PlanResult<HierarchyNode> {
        let territory = ip::parse_cidr(territory_cidr)?;
        let site_prefix = self.site_prefix()?;
        let site = ip::nth_subnet_of(&territory, site_prefix, site_index)?;

        let site_id = format!("site-{}", site_index);
        let vlans = (0..self.vlans_per_site)
            .map(|v| {
                let block = ip::nth_subnet_of(&site, self.vlan_prefix, u64::from(v))?;
                Ok(HierarchyNode::new(
                    format!("{}/vlan-{}", site_id, v),
                    format!("VLAN {}", v + 1),
                    NodeKind::Vlan,
                    block,
                ))
            })
            .collect::<PlanResult<Vec<_>>>()?;

        Ok(HierarchyNode::new(site_id, format!("Site {}", site_index + 1), NodeKind::Site, site).with_children(vlans))
    }
}
