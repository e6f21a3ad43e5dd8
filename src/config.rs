//! Scaler configuration module.
//!
//! Handles loading, validating, and merging `pixscale.toml` files. Stock
//! defaults are overridden by whatever the user file sets; everything it
//! leaves out keeps its default.
//!
//! ## Config File Location
//!
//! `pixscale` looks for `pixscale.toml` in the directory being processed, or
//! reads an explicit file passed with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scaling]
//! filter = "lanczos3"       # nearest, box, triangle, quadratic, cubic,
//!                           # lanczos2, lanczos3, mitchell-netravali
//! max_width = 1600          # Batch output must fit inside this box
//! max_height = 1600
//! allow_upscale = false     # Grow images smaller than the box
//!
//! [thumbnails]
//! size = 128                # Square thumbnail edge in pixels, 0 disables
//! filter = "triangle"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! # Only switch the thumbnail filter
//! [thumbnails]
//! filter = "mitchell"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "pixscale.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Scaler configuration loaded from `pixscale.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PixscaleConfig {
    /// Resampling settings for full-size output.
    pub scaling: ScalingConfig,
    /// Square thumbnail settings.
    pub thumbnails: ThumbnailsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PixscaleConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scaling.max_width == 0 || self.scaling.max_height == 0 {
            return Err(ConfigError::Validation(
                "scaling.max_width and scaling.max_height must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingConfig {
    /// Reconstruction filter for full-size output.
    pub filter: Filter,
    /// Width of the box batch output is fitted into.
    pub max_width: u32,
    /// Height of the box batch output is fitted into.
    pub max_height: u32,
    /// Whether images smaller than the box are enlarged to fit it.
    pub allow_upscale: bool,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            filter: Filter::Lanczos3,
            max_width: 1600,
            max_height: 1600,
            allow_upscale: false,
        }
    }
}

/// Square thumbnail settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Edge of the square thumbnail in pixels. `0` disables thumbnails.
    pub size: u32,
    /// Reconstruction filter for thumbnails.
    pub filter: Filter,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            size: 128,
            filter: Filter::Triangle,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PixscaleConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PixscaleConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PixscaleConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `pixscale.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<PixscaleConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Load config from an explicit file path, with the same merging as
/// [`load_config`]. A missing file yields the stock defaults.
pub fn load_config_file(path: &Path) -> Result<PixscaleConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `pixscale.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pixscale configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Full-size scaling
# ---------------------------------------------------------------------------
[scaling]
# Reconstruction filter. One of:
#   nearest, box, triangle, quadratic, cubic,
#   lanczos2, lanczos3, mitchell-netravali
filter = "lanczos3"

# Batch output is fitted inside max_width x max_height, keeping aspect ratio.
max_width = 1600
max_height = 1600

# Enlarge images that are already smaller than the box.
allow_upscale = false

# ---------------------------------------------------------------------------
# Square thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Edge of the square thumbnail in pixels. The shorter side is scaled to this
# size and the centre is cropped. Set to 0 to skip thumbnails.
size = 128

# Reconstruction filter for thumbnails.
filter = "triangle"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
