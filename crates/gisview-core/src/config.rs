//! Configuration management for the GISView map viewer.
//!
//! This module provides the viewer configuration, which supports:
//! - Loading from YAML files
//! - Environment variable overrides (`GISVIEW__SECTION__KEY`)
//! - Validation of all settings
//! - Map server endpoints, measurement presentation, the layer catalog, and
//!   logging

use crate::error::{ConfigError, Result};
use crate::types::{Category, Layer, LayerKind, LonLat, Panorama, Projection};
use crate::units::{AreaUnit, DistanceUnit, Language};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Highest number of decimals a measurement label may use.
pub const MAX_PRECISION: usize = 10;

/// Main viewer configuration.
///
/// # Examples
///
/// ```no_run
/// use gisview_core::config::ViewerConfig;
///
/// let config = ViewerConfig::from_file("gisview.yaml").unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Map server endpoints
    #[serde(default)]
    pub geoserver: GeoServerConfig,

    /// Measurement toolbox presentation
    #[serde(default)]
    pub measurement: MeasurementOptions,

    /// Initial map view
    #[serde(default)]
    pub map: MapConfig,

    /// Layers and categories offered in the layer switcher
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Panoramas placed on the map at startup
    #[serde(default)]
    pub panoramas: Vec<Panorama>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ViewerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path.display().to_string()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Loads configuration using the `config` crate, layering
    /// `GISVIEW__`-prefixed environment variables over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or merged.
    pub fn from_config_builder<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix("GISVIEW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validates the configuration.
    ///
    /// Checks for:
    /// - An absolute http(s) map server URL and non-zero timeout
    /// - A label precision within bounds
    /// - Unique layer and category ids
    /// - Layers referring only to declared categories
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<()> {
        self.geoserver.validate()?;
        self.measurement.validate()?;
        self.catalog.validate()?;
        self.logging.parse_level()?;
        Ok(())
    }
}

/// Map server (GeoServer) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoServerConfig {
    /// Base URL under which the instances are published
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Instance serving vector layers
    #[serde(default = "default_vector_instance")]
    pub vector_instance: String,

    /// Instance serving raster (ECW) layers
    #[serde(default = "default_raster_instance")]
    pub raster_instance: String,

    /// WMS protocol version used for capabilities and feature queries
    #[serde(default = "default_wms_version")]
    pub wms_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum number of features returned per layer by a point query
    #[serde(default = "default_feature_count")]
    pub feature_count: u32,

    /// REST API user (read-only catalog calls)
    #[serde(default)]
    pub username: Option<String>,

    /// REST API password
    #[serde(default)]
    pub password: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080/geoserver".to_string()
}

fn default_vector_instance() -> String {
    "vector".to_string()
}

fn default_raster_instance() -> String {
    "ecw".to_string()
}

fn default_wms_version() -> String {
    "1.3.0".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_feature_count() -> u32 {
    10
}

impl Default for GeoServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            vector_instance: default_vector_instance(),
            raster_instance: default_raster_instance(),
            wms_version: default_wms_version(),
            request_timeout_secs: default_request_timeout(),
            feature_count: default_feature_count(),
            username: None,
            password: None,
        }
    }
}

impl GeoServerConfig {
    /// Validates the map server configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::invalid_value(
                "geoserver.base_url",
                format!("must be an absolute http(s) URL, got '{}'", self.base_url),
            )
            .into());
        }

        if self.request_timeout_secs == 0 {
            return Err(
                ConfigError::invalid_value("geoserver.request_timeout_secs", "cannot be 0").into(),
            );
        }

        if self.vector_instance.is_empty() || self.raster_instance.is_empty() {
            return Err(ConfigError::invalid_value(
                "geoserver.vector_instance",
                "instance names cannot be empty",
            )
            .into());
        }

        Ok(())
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the base URL without a trailing slash.
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns the instance publishing layers of `kind`.
    pub fn instance_for(&self, kind: LayerKind) -> &str {
        if kind.is_vector() {
            &self.vector_instance
        } else {
            &self.raster_instance
        }
    }
}

/// Presentation of measurement results.
///
/// Every field has a default, so a partial section (or none) is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementOptions {
    /// Unit for distances (default kilometers)
    #[serde(default)]
    pub distance_unit: DistanceUnit,

    /// Unit for areas (default hectares)
    #[serde(default)]
    pub area_unit: AreaUnit,

    /// Digits after the decimal point (default 2)
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Language of labels and hints (default Russian)
    #[serde(default)]
    pub language: Language,
}

fn default_precision() -> usize {
    2
}

impl Default for MeasurementOptions {
    fn default() -> Self {
        Self {
            distance_unit: DistanceUnit::default(),
            area_unit: AreaUnit::default(),
            precision: default_precision(),
            language: Language::default(),
        }
    }
}

impl MeasurementOptions {
    /// Validates the measurement options.
    pub fn validate(&self) -> Result<()> {
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::invalid_value(
                "measurement.precision",
                format!("must be at most {}", MAX_PRECISION),
            )
            .into());
        }
        Ok(())
    }
}

/// Initial view of the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Projection of the map view
    #[serde(default)]
    pub projection: Projection,

    /// Initial center
    #[serde(default = "default_center")]
    pub center: LonLat,

    /// Initial zoom level
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_center() -> LonLat {
    LonLat::new(37.6173, 55.7558)
}

fn default_zoom() -> f64 {
    10.0
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            center: default_center(),
            zoom: default_zoom(),
        }
    }
}

/// Layers and categories offered by the viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub layers: Vec<Layer>,

    #[serde(default)]
    pub categories: Vec<Category>,
}

impl CatalogConfig {
    /// Validates the layer catalog.
    pub fn validate(&self) -> Result<()> {
        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "category".to_string(),
                    id: category.id,
                }
                .into());
            }
        }

        let mut layer_ids = HashSet::new();
        for layer in &self.layers {
            if !layer_ids.insert(layer.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "layer".to_string(),
                    id: layer.id,
                }
                .into());
            }

            if let Some(unknown) = layer
                .categories
                .iter()
                .find(|id| !category_ids.contains(*id))
            {
                return Err(ConfigError::invalid_value(
                    format!("catalog.layers[{}].categories", layer.id),
                    format!("unknown category {}", unknown),
                )
                .into());
            }
        }

        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Whether to include file/line info
    #[serde(default)]
    pub file_line: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
            file_line: false,
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level> {
        self.level.parse().map_err(|_| {
            ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Invalid log level: {}", self.level),
            }
            .into()
        })
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON format for structured logging
    Json,
}
