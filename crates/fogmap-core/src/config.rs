use crate::error::{FogmapError, Result};
use crate::models::{FogConfig, FogStyle, Precision};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for FogMap
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub precision: ConfigValue<Precision>,
    pub storage_key: ConfigValue<String>,
    pub buffer_factor: ConfigValue<f64>,
    pub outer_margin_deg: ConfigValue<f64>,
    pub ancestor_floor: ConfigValue<u8>,
    pub fog_color: ConfigValue<String>,
    pub fog_opacity: ConfigValue<f64>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let fog = FogConfig::default();
        Self {
            precision: ConfigValue::new(Precision::DEFAULT, ConfigSource::Default),
            storage_key: ConfigValue::new("explored_areas".to_string(), ConfigSource::Default),
            buffer_factor: ConfigValue::new(fog.buffer_factor, ConfigSource::Default),
            outer_margin_deg: ConfigValue::new(fog.outer_margin_deg, ConfigSource::Default),
            ancestor_floor: ConfigValue::new(fog.ancestor_floor, ConfigSource::Default),
            fog_color: ConfigValue::new(fog.style.color, ConfigSource::Default),
            fog_opacity: ConfigValue::new(fog.style.opacity, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| FogmapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| FogmapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(precision) = file_config.precision {
            self.precision.update(precision, ConfigSource::File);
        }

        if let Some(storage_key) = file_config.storage_key {
            self.storage_key.update(parse_storage_key(&storage_key)?, ConfigSource::File);
        }

        if let Some(buffer_factor) = file_config.buffer_factor {
            let value = check_non_negative("buffer_factor", buffer_factor)?;
            self.buffer_factor.update(value, ConfigSource::File);
        }

        if let Some(margin) = file_config.outer_margin_deg {
            let value = check_non_negative("outer_margin_deg", margin)?;
            self.outer_margin_deg.update(value, ConfigSource::File);
        }

        if let Some(floor) = file_config.ancestor_floor {
            self.ancestor_floor.update(check_ancestor_floor(floor)?, ConfigSource::File);
        }

        if let Some(color) = file_config.fog_color {
            self.fog_color.update(color, ConfigSource::File);
        }

        if let Some(opacity) = file_config.fog_opacity {
            self.fog_opacity.update(check_opacity(opacity)?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // FOGMAP_PRECISION
        if let Ok(value) = env::var("FOGMAP_PRECISION") {
            match parse_precision(&value) {
                Ok(precision) => self.precision.update(precision, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOGMAP_PRECISION value '{}': expected integer 1-12",
                    value
                ),
            }
        }

        // FOGMAP_STORAGE_KEY
        if let Ok(value) = env::var("FOGMAP_STORAGE_KEY") {
            match parse_storage_key(&value) {
                Ok(key) => self.storage_key.update(key, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOGMAP_STORAGE_KEY value '{}': expected letters, digits, '_' or '-'",
                    value
                ),
            }
        }

        // FOGMAP_BUFFER_FACTOR
        if let Ok(value) = env::var("FOGMAP_BUFFER_FACTOR") {
            match parse_non_negative("buffer_factor", &value) {
                Ok(factor) => self.buffer_factor.update(factor, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOGMAP_BUFFER_FACTOR value '{}': expected non-negative number",
                    value
                ),
            }
        }

        // FOGMAP_OUTER_MARGIN
        if let Ok(value) = env::var("FOGMAP_OUTER_MARGIN") {
            match parse_non_negative("outer_margin_deg", &value) {
                Ok(margin) => self.outer_margin_deg.update(margin, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOGMAP_OUTER_MARGIN value '{}': expected non-negative degrees",
                    value
                ),
            }
        }

        // FOGMAP_ANCESTOR_FLOOR
        if let Ok(value) = env::var("FOGMAP_ANCESTOR_FLOOR") {
            match parse_ancestor_floor(&value) {
                Ok(floor) => self.ancestor_floor.update(floor, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOGMAP_ANCESTOR_FLOOR value '{}': expected integer 1-12",
                    value
                ),
            }
        }

        // FOGMAP_FOG_COLOR
        if let Ok(color) = env::var("FOGMAP_FOG_COLOR") {
            self.fog_color.update(color, ConfigSource::Environment);
        }

        // FOGMAP_FOG_OPACITY
        if let Ok(value) = env::var("FOGMAP_FOG_OPACITY") {
            match parse_opacity(&value) {
                Ok(opacity) => self.fog_opacity.update(opacity, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FOGMAP_FOG_OPACITY value '{}': expected number in 0.0-1.0",
                    value
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(precision) = overrides.precision {
            self.precision.update(precision, ConfigSource::Cli);
        }

        if let Some(buffer_factor) = overrides.buffer_factor {
            self.buffer_factor.update(buffer_factor, ConfigSource::Cli);
        }

        if let Some(margin) = overrides.outer_margin_deg {
            self.outer_margin_deg.update(margin, ConfigSource::Cli);
        }

        if let Some(color) = overrides.fog_color {
            self.fog_color.update(color, ConfigSource::Cli);
        }

        if let Some(opacity) = overrides.fog_opacity {
            self.fog_opacity.update(opacity, ConfigSource::Cli);
        }
    }

    /// Exploration precision used when recording fixes
    pub fn precision(&self) -> Precision {
        self.precision.value
    }

    /// Typed fog generation settings
    pub fn fog_config(&self) -> FogConfig {
        FogConfig {
            buffer_factor: self.buffer_factor.value,
            outer_margin_deg: self.outer_margin_deg.value,
            ancestor_floor: self.ancestor_floor.value,
            style: FogStyle {
                color: self.fog_color.value.clone(),
                opacity: self.fog_opacity.value,
            },
            ..FogConfig::default()
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "precision".to_string(),
            (self.precision.value.to_string(), self.precision.source),
        );

        map.insert(
            "storage_key".to_string(),
            (self.storage_key.value.clone(), self.storage_key.source),
        );

        map.insert(
            "buffer_factor".to_string(),
            (self.buffer_factor.value.to_string(), self.buffer_factor.source),
        );

        map.insert(
            "outer_margin_deg".to_string(),
            (self.outer_margin_deg.value.to_string(), self.outer_margin_deg.source),
        );

        map.insert(
            "ancestor_floor".to_string(),
            (self.ancestor_floor.value.to_string(), self.ancestor_floor.source),
        );

        map.insert("fog_color".to_string(), (self.fog_color.value.clone(), self.fog_color.source));

        map.insert(
            "fog_opacity".to_string(),
            (self.fog_opacity.value.to_string(), self.fog_opacity.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    precision: Option<Precision>,
    storage_key: Option<String>,
    buffer_factor: Option<f64>,
    outer_margin_deg: Option<f64>,
    ancestor_floor: Option<u8>,
    fog_color: Option<String>,
    fog_opacity: Option<f64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub precision: Option<Precision>,
    pub buffer_factor: Option<f64>,
    pub outer_margin_deg: Option<f64>,
    pub fog_color: Option<String>,
    pub fog_opacity: Option<f64>,
}

/// Parse geohash precision from string
pub fn parse_precision(s: &str) -> Result<Precision> {
    let value = s.trim().parse::<u8>().map_err(|_| FogmapError::ConfigInvalid {
        key: "precision".to_string(),
        reason: format!("Invalid precision: {}. Use an integer from 1 to 12", s),
    })?;
    Precision::new(value)
}

/// Parse the shortest ancestor prefix length used by fog dedup
pub fn parse_ancestor_floor(s: &str) -> Result<u8> {
    let value = s.trim().parse::<u8>().map_err(|_| FogmapError::ConfigInvalid {
        key: "ancestor_floor".to_string(),
        reason: format!("Invalid ancestor floor: {}. Use an integer from 1 to 12", s),
    })?;
    check_ancestor_floor(value)
}

/// Parse fog opacity from string
pub fn parse_opacity(s: &str) -> Result<f64> {
    let value = s.trim().parse::<f64>().map_err(|_| FogmapError::ConfigInvalid {
        key: "fog_opacity".to_string(),
        reason: format!("Invalid opacity: {}. Use a number from 0.0 to 1.0", s),
    })?;
    check_opacity(value)
}

fn check_ancestor_floor(value: u8) -> Result<u8> {
    Precision::new(value).map(Precision::get).map_err(|_| FogmapError::ConfigInvalid {
        key: "ancestor_floor".to_string(),
        reason: format!("Invalid ancestor floor: {}. Use an integer from 1 to 12", value),
    })
}

fn check_opacity(value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(FogmapError::ConfigInvalid {
            key: "fog_opacity".to_string(),
            reason: format!("Invalid opacity: {}. Use a number from 0.0 to 1.0", value),
        })
    }
}

/// Parse a blob-store key; restricted so it can double as a file name
pub fn parse_storage_key(s: &str) -> Result<String> {
    let valid = !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(s.to_string())
    } else {
        Err(FogmapError::ConfigInvalid {
            key: "storage_key".to_string(),
            reason: format!("Invalid storage key: '{}'. Use letters, digits, '_' or '-'", s),
        })
    }
}

fn parse_non_negative(key: &str, s: &str) -> Result<f64> {
    let value = s.trim().parse::<f64>().map_err(|_| FogmapError::ConfigInvalid {
        key: key.to_string(),
        reason: format!("Invalid number: {}", s),
    })?;
    check_non_negative(key, value)
}

fn check_non_negative(key: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FogmapError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("Expected a non-negative number, got {}", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.precision.value, Precision::DEFAULT);
        assert_eq!(config.precision.source, ConfigSource::Default);
        assert_eq!(config.storage_key.value, "explored_areas");
        assert_eq!(config.buffer_factor.value, 1.5);
        assert_eq!(config.ancestor_floor.value, 6);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);
        assert_eq!(value.source, ConfigSource::Environment);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
precision = 8
storage_key = "wander_cells"
buffer_factor = 2.0
fog_color = "#101820"
fog_opacity = 0.6
"##
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.precision.value.get(), 8);
        assert_eq!(config.precision.source, ConfigSource::File);
        assert_eq!(config.storage_key.value, "wander_cells");
        assert_eq!(config.buffer_factor.value, 2.0);
        assert_eq!(config.fog_color.value, "#101820");
        assert_eq!(config.fog_opacity.value, 0.6);
        assert_eq!(config.outer_margin_deg.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_rejects_out_of_range_precision() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "precision = 13").unwrap();

        assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        let overrides = CliConfigOverrides {
            precision: Some(Precision::new(9).unwrap()),
            fog_opacity: Some(0.5),
            ..Default::default()
        };

        config.update_from_cli(overrides);

        assert_eq!(config.precision.value.get(), 9);
        assert_eq!(config.precision.source, ConfigSource::Cli);
        assert_eq!(config.fog_opacity.value, 0.5);
        assert_eq!(config.buffer_factor.source, ConfigSource::Default);
    }

    #[test]
    fn test_fog_config_from_layers() {
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides {
            buffer_factor: Some(0.5),
            fog_color: Some("#222222".to_string()),
            ..Default::default()
        });

        let fog = config.fog_config();
        assert_eq!(fog.buffer_factor, 0.5);
        assert_eq!(fog.style.color, "#222222");
        assert_eq!(fog.hole_winding, FogConfig::default().hole_winding);
    }

    #[test]
    fn test_parse_precision() {
        assert_eq!(parse_precision("7").unwrap().get(), 7);
        assert_eq!(parse_precision(" 12 ").unwrap().get(), 12);
        assert!(parse_precision("0").is_err());
        assert!(parse_precision("seven").is_err());
    }

    #[test]
    fn test_parse_opacity() {
        assert_eq!(parse_opacity("0.8").unwrap(), 0.8);
        assert!(parse_opacity("1.5").is_err());
        assert!(parse_opacity("-0.1").is_err());
    }

    #[test]
    fn test_parse_storage_key() {
        assert!(parse_storage_key("explored_areas").is_ok());
        assert!(parse_storage_key("../etc/passwd").is_err());
        assert!(parse_storage_key("").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert!(map.contains_key("precision"));
        assert!(map.contains_key("storage_key"));
        assert!(map.contains_key("fog_opacity"));

        let (precision, source) = &map["precision"];
        assert_eq!(precision, "7");
        assert_eq!(*source, ConfigSource::Default);
    }
}
