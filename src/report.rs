//! Report generation for allocation plans.
//!
//! Generates both JSON and human-readable text reports.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use crate::allocator::{AllocationPlan, HierarchyNode, RegionalPlan};
use crate::hierarchy::LevelSummary;
use crate::ip;

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub tool_version: String,
}

impl ReportMetadata {
    pub fn now() -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// JSON envelope around a plan
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport<'a> {
    pub metadata: ReportMetadata,
    pub plan: &'a AllocationPlan,
}

/// Generate JSON report
pub fn generate_json_report(plan: &AllocationPlan, output_path: &Path) -> Result<()> {
    let json = render_json_report(plan)?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Serialize a plan with its metadata
pub fn render_json_report(plan: &AllocationPlan) -> Result<String> {
    let report = PlanReport {
        metadata: ReportMetadata::now(),
        plan,
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize plan to JSON")
}

fn banner(lines: &mut Vec<String>, title: &str) {
    lines.push("=".repeat(80));
    lines.push(format!("{:^80}", title));
    lines.push("=".repeat(80));
    lines.push(String::new());
}

/// Render a human-readable summary of an allocation plan
pub fn render_text_report(plan: &AllocationPlan) -> String {
    let mut lines: Vec<String> = Vec::new();

    banner(&mut lines, "ADDRESS ALLOCATION PLAN");

    let (first, last) = plan.root.host_range();
    lines.push(format!("Root Block:        {}", plan.root));
    lines.push(format!(
        "Address Range:     {} - {}",
        ip::integer_to_address(plan.root.network()),
        ip::integer_to_address(plan.root.broadcast())
    ));
    lines.push(format!(
        "Host Range:        {} - {}",
        ip::integer_to_address(first),
        ip::integer_to_address(last)
    ));
    lines.push(format!("Total Addresses:   {}", plan.root.size()));
    lines.push(String::new());
    lines.push(format!(
        "Site Size:         /{} ({} x /{} VLANs)",
        plan.site_prefix, plan.vlans_per_site, plan.vlan_prefix
    ));
    lines.push(format!("Sites Supported:   {}", plan.total_sites_supported));
    lines.push(format!("Sites Needed:      {}", plan.sites_needed));
    lines.push(format!("Utilization:       {:.1}%", plan.utilization_percent));
    lines.push(format!(
        "Projected:         {} sites ({:.1}%)",
        plan.projected_sites, plan.projected_utilization_percent
    ));
    lines.push(String::new());

    banner(&mut lines, "REGIONS");
    lines.push(format!(
        "{:<24} {:<6} {:>5} {:<20} {:>12} {:>8}",
        "Name", "Code", "Ratio", "Block", "Sites", "% Root"
    ));
    lines.push("-".repeat(80));
    for region in &plan.regions {
        lines.push(format!(
            "{:<24} {:<6} {:>5} {:<20} {:>12} {:>7.2}%",
            region.name,
            region.code.as_deref().unwrap_or("-"),
            region.ratio,
            region.block.to_string(),
            region.site_capacity,
            region.percent_of_root
        ));
    }
    lines.push(String::new());

    banner(&mut lines, "ADDRESS TREE");
    push_tree(&mut lines, &plan.tree, 0);
    lines.push(String::new());

    if !plan.warnings.is_empty() {
        lines.push("Warnings:".to_string());
        for warning in &plan.warnings {
            lines.push(format!("  ! {}", warning));
        }
        lines.push(String::new());
    }

    if !plan.recommendations.is_empty() {
        lines.push("Recommendations:".to_string());
        for rec in &plan.recommendations {
            lines.push(format!("  * {}", rec));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn push_tree(lines: &mut Vec<String>, node: &HierarchyNode, depth: usize) {
    let mut line = format!("{}{:<w$} {}", "  ".repeat(depth), node.block.to_string(), node.name, w = 20);
    if let Some(capacity) = node.metadata.site_capacity {
        line.push_str(&format!("  [{} sites]", capacity));
    }
    if let Some(code) = &node.metadata.code {
        line.push_str(&format!("  ({})", code));
    }
    lines.push(line);
    for child in &node.children {
        push_tree(lines, child, depth + 1);
    }
}

/// Write the text report to a file
pub fn generate_text_report(plan: &AllocationPlan, output_path: &Path) -> Result<()> {
    fs::write(output_path, render_text_report(plan))
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Render a site example (site plus VLANs)
pub fn render_site(site: &HierarchyNode) -> String {
    let mut lines = Vec::new();
    push_tree(&mut lines, site, 0);
    lines.join("\n")
}

/// Render a sequential regional plan
pub fn render_regional_report(plan: &RegionalPlan) -> String {
    let mut lines: Vec<String> = Vec::new();
    banner(&mut lines, "SEQUENTIAL REGIONAL PLAN");

    lines.push(format!("Root Block:   {}", plan.root));
    lines.push(format!("Allocated:    {} addresses", plan.allocated_addresses));
    lines.push(format!("Remaining:    {} addresses", plan.unallocated_addresses));
    lines.push(String::new());

    lines.push(format!("{:<24} {:<20} {:<16} {:>10} {:>8}", "Name", "Block", "Last", "Size", "Aligned"));
    lines.push("-".repeat(80));
    for block in &plan.blocks {
        lines.push(format!(
            "{:<24} {:<20} {:<16} {:>10} {:>8}",
            block.name,
            block.cidr(),
            ip::integer_to_address(block.last()),
            block.size,
            if block.aligned { "yes" } else { "no" }
        ));
    }
    lines.join("\n")
}

/// Render per-level summaries of a subnet hierarchy
pub fn render_level_summaries(summaries: &[LevelSummary]) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "{:<6} {:<20} {:>7} {:>12} {:>12} {:>14}",
        "Level", "Name", "Prefix", "Subnets", "Per Parent", "Usable Hosts"
    ));
    lines.push("-".repeat(80));
    for s in summaries {
        lines.push(format!(
            "{:<6} {:<20} {:>7} {:>12} {:>12} {:>14.0}",
            s.level,
            s.name,
            format!("/{}", s.prefix),
            s.subnet_count,
            s.subnets_per_parent,
            s.mean_usable_hosts
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{AllocationConfig, HierarchicalAllocator, RegionSpec};

    fn sample_plan() -> AllocationPlan {
        let mut config = AllocationConfig::new(
            "10.0.0.0/16",
            vec![
                RegionSpec::with_ratio("East", 1).code("E"),
                RegionSpec::with_ratio("West", 2),
            ],
        );
        config.territories_per_region = 2;
        config.sites_needed = 40;
        HierarchicalAllocator::new(&config).unwrap().allocate().unwrap()
    }

    #[test]
    fn test_text_report_sections() {
        let text = render_text_report(&sample_plan());
        assert!(text.contains("ADDRESS ALLOCATION PLAN"));
        assert!(text.contains("Root Block:        10.0.0.0/16"));
        assert!(text.contains("East"));
        assert!(text.contains("E-T01"));
        assert!(text.contains("Unallocated"));
        assert!(text.contains("Warnings:"));
    }

    #[test]
    fn test_json_report_round_trips_plan() {
        let plan = sample_plan();
        let json = render_json_report(&plan).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["plan"]["root"], "10.0.0.0/16");
        assert_eq!(value["plan"]["site_prefix"], 22);
        assert!(value["metadata"]["generated_at"].is_string());

        let back: AllocationPlan = serde_json::from_value(value["plan"].clone()).unwrap();
        assert_eq!(back.tree.node_count(), plan.tree.node_count());
        assert_eq!(back.regions.len(), 2);
        assert_eq!(back.warnings, plan.warnings);
    }

    #[test]
    fn test_write_reports_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let plan = sample_plan();
        generate_json_report(&plan, &dir.path().join("plan.json")).unwrap();
        generate_text_report(&plan, &dir.path().join("plan.txt")).unwrap();
        assert!(dir.path().join("plan.json").exists());
        assert!(fs::read_to_string(dir.path().join("plan.txt")).unwrap().contains("REGIONS"));
    }
}
