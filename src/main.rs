use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};

use subnet_planner::allocator::{HierarchicalAllocator, RegionalAllocator};
use subnet_planner::config::PlanConfig;
use subnet_planner::hierarchy::{DynamicSubnetCalculator, LevelSpec, SubnetHierarchy};
use subnet_planner::{config_loader, ip, report};

/// Hierarchical IPv4 address-space partition planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the hierarchical allocator on a plan file
    Allocate {
        /// Path to the plan YAML file
        #[arg(short, long)]
        config: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show one site of a territory and its VLANs
    Site {
        /// Path to the plan YAML file
        #[arg(short, long)]
        config: PathBuf,

        /// Territory block, e.g. 10.0.0.0/11
        #[arg(short, long)]
        territory: String,

        /// Zero-based site index within the territory
        #[arg(short, long, default_value = "0")]
        index: u64,
    },

    /// Run the sequential regional allocator on a plan file
    Regional {
        /// Path to the plan YAML file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Summarize an N-level subnet hierarchy
    Hierarchy {
        /// Path to a plan YAML file with a 'hierarchy' section
        #[arg(short, long, conflicts_with_all = ["root", "level"])]
        config: Option<PathBuf>,

        /// Root block, e.g. 10.0.0.0/16
        #[arg(short, long)]
        root: Option<String>,

        /// Level as name=prefix, repeatable, outermost first
        #[arg(short, long)]
        level: Vec<String>,

        /// Print the first N nodes in breadth-first order
        #[arg(long, default_value = "0")]
        limit: usize,
    },

    /// VLAN capacity for a root block and VLAN size
    Calc {
        /// Root block, e.g. 10.0.0.0/16
        #[arg(short, long)]
        root: String,

        /// VLAN prefix length
        #[arg(short, long, default_value = "24")]
        vlan_prefix: u8,

        /// Recommend the smallest root block for this many sites
        #[arg(short, long)]
        sites: Option<u64>,

        /// Growth buffer applied to the site count
        #[arg(short, long, default_value = "1.0")]
        growth: f64,
    },

    /// Check whether an address lies inside a block
    Contains { ip: String, cidr: String },
}

impl Command {
    /// Plan file named on the command line, if any
    fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Allocate { config, .. } | Command::Site { config, .. } | Command::Regional { config } => {
                Some(config.as_path())
            }
            Command::Hierarchy { config, .. } => config.as_deref(),
            Command::Calc { .. } | Command::Contains { .. } => None,
        }
    }
}

/// Default log filter: `--log-level`, then the plan's `general.log_level`, then "info"
fn resolve_log_level(cli: Option<&str>, plan: Option<&PlanConfig>) -> String {
    cli.or_else(|| plan.and_then(PlanConfig::log_level))
        .unwrap_or("info")
        .to_string()
}

fn require_plan(plan: Option<PlanConfig>) -> Result<PlanConfig> {
    plan.ok_or_else(|| eyre!("A plan file is required for this command"))
}

fn parse_level(text: &str) -> Result<LevelSpec> {
    let (name, prefix) = text
        .split_once('=')
        .ok_or_else(|| eyre!("Level '{}' must be written as name=prefix", text))?;
    let prefix: u8 = prefix
        .trim_start_matches('/')
        .parse()
        .wrap_err_with(|| format!("Invalid prefix in level '{}'", text))?;
    Ok(LevelSpec::new(name, prefix))
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    // The plan is read before logging starts so its log level can apply
    let plan_config = args
        .command
        .config_path()
        .map(config_loader::load_config)
        .transpose()?;

    let default_level = resolve_log_level(args.log_level.as_deref(), plan_config.as_ref());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    if let Some(config) = &plan_config {
        config_loader::check_config_warnings(config);
    }

    match args.command {
        Command::Allocate { format, output, .. } => {
            let allocation = require_plan(plan_config)?
                .allocation
                .ok_or_else(|| eyre!("Plan file has no 'allocation' section"))?;

            let plan = HierarchicalAllocator::new(&allocation)?.allocate()?;
            info!("Allocation completed: {} regions", plan.regions.len());

            match (output, format) {
                (Some(path), Format::Text) => report::generate_text_report(&plan, &path)?,
                (Some(path), Format::Json) => report::generate_json_report(&plan, &path)?,
                (None, Format::Text) => println!("{}", report::render_text_report(&plan)),
                (None, Format::Json) => println!("{}", report::render_json_report(&plan)?),
            }
        }

        Command::Site { territory, index, .. } => {
            let plan_config = require_plan(plan_config)?;
            let allocation = plan_config
                .allocation
                .ok_or_else(|| eyre!("Plan file has no 'allocation' section"))?;

            let allocator = HierarchicalAllocator::new(&allocation)?;
            let site = allocator.generate_site_example(&territory, index)?;
            println!("{}", report::render_site(&site));
        }

        Command::Regional { .. } => {
            let regional = require_plan(plan_config)?
                .regional
                .ok_or_else(|| eyre!("Plan file has no 'regional' section"))?;

            let plan = RegionalAllocator::new(&regional)?.allocate();
            println!("{}", report::render_regional_report(&plan));
        }

        Command::Hierarchy { root, level, limit, .. } => {
            let hierarchy = match plan_config {
                Some(plan_config) => {
                    let section = plan_config
                        .hierarchy
                        .ok_or_else(|| eyre!("Plan file has no 'hierarchy' section"))?;
                    SubnetHierarchy::new(&section)?
                }
                None => {
                    let root = root.ok_or_else(|| eyre!("Either --config or --root is required"))?;
                    let levels = level.iter().map(|l| parse_level(l)).collect::<Result<Vec<_>>>()?;
                    SubnetHierarchy::from_root(ip::parse_cidr(&root)?, levels)?
                }
            };

            info!("Hierarchy under {} has {} nodes", hierarchy.root(), hierarchy.node_count());
            println!("{}", report::render_level_summaries(&hierarchy.level_summaries()));

            if limit > 0 {
                println!();
                for node in hierarchy.nodes().take(limit) {
                    println!("{}{:<20} {}", "  ".repeat(node.level), node.block.to_string(), node.level_name);
                }
            }
        }

        Command::Calc { root, vlan_prefix, sites, growth } => {
            let calculator = DynamicSubnetCalculator::new(&root, vlan_prefix)?;
            let snapshot = calculator.snapshot();
            println!("Root Block:        {}", snapshot.root);
            println!("VLAN Size:         /{}", snapshot.vlan_prefix);
            println!("VLANs:             {}", snapshot.vlan_count);
            println!("Total Addresses:   {}", snapshot.total_addresses);
            println!("Hosts per VLAN:    {}", snapshot.usable_hosts_per_vlan);

            if let Some(sites) = sites {
                let prefix = calculator.recommend_root_prefix(sites, growth)?;
                println!("Recommended Root:  /{} for {} sites (x{} growth)", prefix, sites, growth);
            }
        }

        Command::Contains { ip: address, cidr } => {
            let inside = ip::contains(&address, &cidr);
            println!("{}", inside);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["subnet-planner", "allocate", "--config", "plan.yaml"]);

        match args.command {
            Command::Allocate { config, format, output } => {
                assert_eq!(config, PathBuf::from("plan.yaml"));
                assert_eq!(format, Format::Text);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_hierarchy_args() {
        let args = Args::parse_from([
            "subnet-planner",
            "hierarchy",
            "--root",
            "10.0.0.0/16",
            "--level",
            "campus=18",
            "--level",
            "lan=/24",
            "--log-level",
            "debug",
        ]);

        assert_eq!(args.log_level.as_deref(), Some("debug"));
        match args.command {
            Command::Hierarchy { level, .. } => {
                let levels: Vec<LevelSpec> = level.iter().map(|l| parse_level(l).unwrap()).collect();
                assert_eq!(levels, vec![LevelSpec::new("campus", 18), LevelSpec::new("lan", 24)]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_log_level_precedence() {
        let plan = config_loader::parse_config(
            r#"
general:
  log_level: debug
hierarchy:
  root: "10.0.0.0/16"
  levels:
    - { name: "lan", prefix: 24 }
"#,
        )
        .unwrap();

        assert_eq!(resolve_log_level(Some("warn"), Some(&plan)), "warn");
        assert_eq!(resolve_log_level(None, Some(&plan)), "debug");
        assert_eq!(resolve_log_level(None, None), "info");

        let quiet = PlanConfig { general: None, ..plan };
        assert_eq!(resolve_log_level(None, Some(&quiet)), "info");
    }

    #[test]
    fn test_config_path_per_command() {
        let args = Args::parse_from(["subnet-planner", "regional", "-c", "plan.yaml"]);
        assert_eq!(args.command.config_path(), Some(Path::new("plan.yaml")));

        let args = Args::parse_from(["subnet-planner", "hierarchy", "--root", "10.0.0.0/16", "--level", "lan=24"]);
        assert_eq!(args.command.config_path(), None);

        let args = Args::parse_from(["subnet-planner", "contains", "10.0.0.1", "10.0.0.0/8"]);
        assert_eq!(args.command.config_path(), None);
    }

    #[test]
    fn test_parse_level_rejects_garbage() {
        assert!(parse_level("campus").is_err());
        assert!(parse_level("campus=x").is_err());
    }
}
