use crate::config::PlanConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Load and parse a plan document from a YAML file
pub fn load_config(config_path: &Path) -> Result<PlanConfig> {
    info!("Loading plan from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open plan file '{}'", config_path.display()))?;

    let config: PlanConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse plan file '{}'", config_path.display()))?;

    let sections: Vec<&str> = [
        config.allocation.as_ref().map(|_| "allocation"),
        config.regional.as_ref().map(|_| "regional"),
        config.hierarchy.as_ref().map(|_| "hierarchy"),
    ]
    .into_iter()
    .flatten()
    .collect();
    info!("Detected plan sections: {}", sections.join(", "));

    config.validate()?;

    Ok(config)
}

/// Parse a plan document from YAML text
pub fn parse_config(yaml: &str) -> Result<PlanConfig> {
    let config: PlanConfig = serde_yaml::from_str(yaml).wrap_err("Failed to parse plan YAML")?;
    config.validate()?;
    Ok(config)
}

/// Write a plan document back out as YAML
pub fn save_config(config: &PlanConfig, config_path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config).wrap_err("Failed to serialize plan")?;
    std::fs::write(config_path, yaml)
        .wrap_err_with(|| format!("Failed to write plan file '{}'", config_path.display()))?;
    info!("Plan written to {:?}", config_path);
    Ok(())
}

/// Warn about plan settings that are legal but likely unintended
pub fn check_config_warnings(config: &PlanConfig) {
    if let Some(allocation) = &config.allocation {
        if allocation.sites_needed == 0 {
            warn!("allocation.sites_needed is 0; utilization figures will be 0%");
        }
        let ratio_sum: u64 = allocation.regions.iter().filter_map(|r| r.ratio).map(u64::from).sum();
        if ratio_sum > 0 && !ratio_sum.is_power_of_two() {
            warn!(
                "Region ratios sum to {}, not a power of two; part of the root block will stay unallocated",
                ratio_sum
            );
        }
    }

    if let Some(regional) = &config.regional {
        if regional.regions.iter().any(|r| r.ratio.is_some()) {
            warn!("Ratios in the 'regional' section are ignored; regional allocation uses 'bits'");
        }
    }
}
