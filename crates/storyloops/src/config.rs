//! Project configuration file support for storyloops.
//!
//! Loads configuration from `storyloops.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use storyloops_core::PipelineSettings;
use storyloops_teller::AgeRange;

/// Project-level configuration loaded from `storyloops.toml`
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Minimum overall score that ends refinement
    pub threshold: Option<u8>,
    /// Refinement rounds after the first draft
    pub max_rounds: Option<usize>,
    /// Youngest listener age
    pub min_age: Option<u8>,
    /// Oldest listener age
    pub max_age: Option<u8>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "storyloops.toml";

/// Values given on the command line. These win over the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SettingsOverrides {
    pub threshold: Option<u8>,
    pub max_rounds: Option<usize>,
    pub min_age: Option<u8>,
    pub max_age: Option<u8>,
}

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }
}

/// Build pipeline settings.
/// Priority: command line > config file > built-in default
pub fn resolve_settings(
    file: Option<&ProjectConfig>,
    overrides: SettingsOverrides,
) -> Result<PipelineSettings> {
    let defaults = PipelineSettings::default();
    let threshold = overrides
        .threshold
        .or_else(|| file.and_then(|c| c.threshold))
        .unwrap_or(defaults.threshold);
    let max_rounds = overrides
        .max_rounds
        .or_else(|| file.and_then(|c| c.max_rounds))
        .unwrap_or(defaults.max_rounds);
    let min_age = overrides
        .min_age
        .or_else(|| file.and_then(|c| c.min_age))
        .unwrap_or(defaults.default_age_range.min_age());
    let max_age = overrides
        .max_age
        .or_else(|| file.and_then(|c| c.max_age))
        .unwrap_or(defaults.default_age_range.max_age());

    let age_range = AgeRange::new(min_age, max_age).context("Invalid age range")?;
    let settings = defaults
        .with_threshold(threshold)
        .with_max_rounds(max_rounds)
        .with_age_range(age_range);
    settings.validate()?;
    Ok(settings)
}
