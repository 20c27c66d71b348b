use serde::{Deserialize, Serialize};

use crate::allocator::{AllocationConfig, RegionalConfig};
use crate::error::PlanError;
use crate::hierarchy::HierarchyConfig;

/// A plan document. Each section feeds one planning strategy; at least one
/// must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regional: Option<RegionalConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<HierarchyConfig>,
}

impl PlanConfig {
    /// Validate the document shape.
    ///
    /// Component-level checks (CIDR syntax, ratios, prefix ranges) run when
    /// each allocator is constructed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.allocation.is_none() && self.regional.is_none() && self.hierarchy.is_none() {
            return Err(ValidationError::MissingSection(
                "one of 'allocation', 'regional' or 'hierarchy' is required".to_string(),
            ));
        }

        if let Some(allocation) = &self.allocation {
            Self::validate_root("allocation", &allocation.root)?;
            if allocation.regions.is_empty() {
                return Err(ValidationError::InvalidSection(
                    "allocation".to_string(),
                    "regions cannot be an empty list".to_string(),
                ));
            }
        }

        if let Some(regional) = &self.regional {
            Self::validate_root("regional", &regional.root)?;
            if regional.regions.is_empty() {
                return Err(ValidationError::InvalidSection(
                    "regional".to_string(),
                    "regions cannot be an empty list".to_string(),
                ));
            }
        }

        if let Some(hierarchy) = &self.hierarchy {
            Self::validate_root("hierarchy", &hierarchy.root)?;
            if hierarchy.levels.is_empty() {
                return Err(ValidationError::InvalidSection(
                    "hierarchy".to_string(),
                    "levels cannot be an empty list".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn validate_root(section: &str, root: &str) -> Result<(), ValidationError> {
        if root.trim().is_empty() {
            return Err(ValidationError::InvalidSection(
                section.to_string(),
                "root cannot be empty".to_string(),
            ));
        }
        crate::ip::parse_cidr(root)?;
        Ok(())
    }

    /// Log level requested by the document, if any
    pub fn log_level(&self) -> Option<&str> {
        self.general.as_ref().and_then(|g| g.log_level.as_deref())
    }
}

/// Settings shared by every section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default log filter, overridden by `--log-level`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing configuration section: {0}")]
    MissingSection(String),
    #[error("Invalid '{0}' section: {1}")]
    InvalidSection(String, String),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let yaml = r#"
general:
  log_level: debug
allocation:
  root: "10.0.0.0/8"
  regions:
    - { name: "North America", ratio: 2, code: "NA" }
    - { name: "Europe", ratio: 1 }
  sites_needed: 500
regional:
  root: "172.16.0.0/12"
  regions:
    - { name: "HQ", bits: 18 }
hierarchy:
  root: "10.0.0.0/16"
  levels:
    - { name: "campus", prefix: 18 }
"#;
        let config: PlanConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level(), Some("debug"));

        let allocation = config.allocation.unwrap();
        assert_eq!(allocation.regions[0].code.as_deref(), Some("NA"));
        // Defaults fill the omitted fields
        assert_eq!(allocation.territories_per_region, 4);
        assert_eq!(allocation.vlans_per_site, 4);
        assert_eq!(allocation.vlan_prefix, 24);
        assert_eq!(allocation.growth_multiplier, 1.0);
        assert_eq!(config.regional.unwrap().regions[0].bits, Some(18));
    }

    #[test]
    fn test_validation_errors() {
        let config: PlanConfig = serde_yaml::from_str("general:\n  log_level: warn\n").unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(ValidationError::MissingSection(_))));
        assert_eq!(config.log_level(), Some("warn"));

        let yaml = r#"
allocation:
  root: "10.0.0.0/8"
  regions: []
"#;
        let config: PlanConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().unwrap_err().to_string().contains("empty list"));

        let yaml = r#"
hierarchy:
  root: "10.0.0.0/99"
  levels:
    - { name: "a", prefix: 20 }
"#;
        let config: PlanConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Plan(PlanError::MalformedInput(_)))
        ));
    }
}
