//! # Configuration Management
//!
//! This module handles loading and validating the dashboard configuration
//! from a JSON document (`dashboard.config.json` by default). The
//! configuration describes everything the run needs: the display variant
//! and rotation, the font table, the line/item layout, and the per-service
//! endpoints with their field extraction rules.
//!
//! Configuration errors are fatal: a run with a broken config aborts before
//! any network or hardware interaction. Everything downstream receives the
//! config as an immutable reference.

use crate::{display, Colour};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default configuration file name, next to the binary's working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.config.json";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Top-level application configuration.
///
/// All sections except `layout` are required; a document missing one of
/// them fails to parse and aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub display: DisplayConfig,
    /// Font table: name to `[file, size]`. The file name is advisory; the
    /// size selects the nearest builtin mono font at render time.
    pub fonts: HashMap<String, FontConfig>,
    #[serde(default)]
    pub layout: LayoutConfig,
    pub services: HashMap<String, ServiceConfig>,
    pub dashboard: DashboardConfig,
    /// Persisted cache location.
    #[serde(rename = "cacheFile", default = "default_cache_file")]
    pub cache_file: String,
}

fn default_cache_file() -> String {
    "dashboard_data.json".to_string()
}

/// Display variant, rotation and colour options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// Panel id, e.g. `epd2in15g`. Must be one of the known variants.
    pub epd_display_type: String,
    /// Clockwise rotation of the finished frame: 0, 90, 180 or 270.
    #[serde(default)]
    pub epd_display_rotation: u16,
    /// Colour used for any field whose value came from cache.
    #[serde(default = "default_stale_colour")]
    pub old_data_colour: String,
    /// Per-name colour overrides, looked up before the literal colour name.
    #[serde(default)]
    pub colours: HashMap<String, String>,
}

fn default_stale_colour() -> String {
    "YELLOW".to_string()
}

/// One font table entry: `[file, size]`, matching the on-disk layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig(pub String, pub u32);

impl FontConfig {
    pub fn size(&self) -> u32 {
        self.1
    }
}

/// Global layout defaults shared by every line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Default vertical advance after each line, in pixels.
    pub line_height: i32,
    /// Default left margin for lines without their own `startX`.
    pub start_x: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            line_height: 22,
            start_x: 5,
        }
    }
}

/// Ordered lines of the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub lines: Vec<LineConfig>,
}

/// One rendered line: vertical placement plus an ordered item list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Absolute vertical start. When absent the line continues from the
    /// previous line's cursor.
    pub start_y: Option<i32>,
    /// Horizontal start; defaults to the global `layout.startX`.
    pub start_x: Option<i32>,
    /// Vertical advance after this line; defaults to `layout.lineHeight`.
    pub after_y: Option<i32>,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

/// One renderable item within a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemConfig {
    /// Item type identifier: `datetime`, `sunrise`, a weather/sensor field
    /// name, or a configured crypto pair.
    #[serde(rename = "type")]
    pub kind: String,
    /// Font table name; defaults to `font18`.
    pub font: Option<String>,
    /// Colour name; overridden by the stale colour for cache-sourced data.
    pub colour: Option<String>,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    /// strftime format for `datetime` / `sunrise` / `sunset` items.
    pub format: Option<String>,
    /// Horizontal displacement from the line's start X, applied before
    /// drawing this item.
    #[serde(default)]
    pub offset_x: i32,
    /// Trailing gap added after the measured text width.
    #[serde(default)]
    pub after_x: i32,
}

/// Expected response body format of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Json,
    Text,
}

/// One network data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub url: String,
    /// Query parameters. Values of the form `env.NAME` or `${NAME}` are
    /// substituted from the environment at fetch time.
    #[serde(default)]
    pub params: HashMap<String, String>,
    /// Body format; sensor services default to `text`, the rest to `json`.
    pub response_type: Option<ResponseType>,
    /// Trading pairs to keep (crypto service only).
    #[serde(default)]
    pub pairs: Vec<String>,
    /// Field name to extraction rule.
    #[serde(default)]
    pub data: HashMap<String, FieldSpec>,
}

/// Semantic type a raw value is coerced to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Float,
}

/// Extraction rule for a single field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Document path (`main.temp`, `weather[0].description`); defaults to
    /// the field name itself.
    pub path: Option<String>,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    /// Decimal places for `float` coercion.
    pub round: Option<u32>,
}

impl Config {
    /// Load and validate configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Load and validate configuration from the given path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        log::info!("configuration loaded from {}", path.as_ref().display());
        Ok(config)
    }

    /// Structural checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if display::native_size(&self.display.epd_display_type).is_none() {
            return Err(ConfigError::Validation(format!(
                "unknown display type: {}",
                self.display.epd_display_type
            )));
        }
        if !matches!(self.display.epd_display_rotation, 0 | 90 | 180 | 270) {
            return Err(ConfigError::Validation(format!(
                "unsupported rotation: {}",
                self.display.epd_display_rotation
            )));
        }
        if self.dashboard.lines.is_empty() {
            return Err(ConfigError::Validation(
                "dashboard.lines must not be empty".to_string(),
            ));
        }
        for service in self.services.values() {
            if service.url.is_empty() {
                return Err(ConfigError::Validation(
                    "service url must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Colour for any field flagged stale, dashboard-wide.
    pub fn stale_colour(&self) -> Colour {
        Colour::from_name(&self.display.old_data_colour)
    }

    /// Resolve a colour name through the per-name override table.
    pub fn display_colour(&self, name: &str) -> Colour {
        match self.display.colours.get(name) {
            Some(mapped) => Colour::from_name(mapped),
            None => Colour::from_name(name),
        }
    }

    /// The crypto ticker service. The historical config key is `kucoin`;
    /// `crypto` is accepted as well.
    pub fn crypto_service(&self) -> Option<&ServiceConfig> {
        self.services
            .get("crypto")
            .or_else(|| self.services.get("kucoin"))
    }

    pub fn weather_service(&self) -> Option<&ServiceConfig> {
        self.services.get("weather")
    }

    /// All sensor services, in stable (sorted) key order. Multiple sensor
    /// endpoints are supported by naming them `sensors`, `sensors2`, ...
    pub fn sensor_services(&self) -> Vec<(&String, &ServiceConfig)> {
        let mut services: Vec<_> = self
            .services
            .iter()
            .filter(|(key, _)| key.starts_with("sensors"))
            .collect();
        services.sort_by_key(|(key, _)| key.as_str());
        services
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"{
        "display": {
            "epdDisplayType": "epd2in15g",
            "epdDisplayRotation": 90,
            "oldDataColour": "YELLOW",
            "colours": { "accent": "RED" }
        },
        "fonts": {
            "font18": ["Font.ttc", 18],
            "font24": ["Font.ttc", 24]
        },
        "layout": { "lineHeight": 22, "startX": 5 },
        "services": {
            "weather": {
                "url": "https://api.openweathermap.org/data/2.5/weather",
                "params": { "q": "Mogilev", "appid": "${OWM_API_KEY}", "units": "metric" },
                "responseType": "json",
                "data": {
                    "temp": { "path": "main.temp", "type": "float", "round": 1 },
                    "humidity": { "path": "main.humidity", "type": "int" },
                    "wind_deg": { "path": "wind.deg", "type": "int" },
                    "description": { "path": "weather[0].description" },
                    "sunrise": { "path": "sys.sunrise", "type": "int" },
                    "sunset": { "path": "sys.sunset", "type": "int" }
                }
            },
            "kucoin": {
                "url": "https://api.kucoin.com/api/v1/market/allTickers",
                "pairs": ["BTC-USDC", "SOL-USDC"],
                "data": { "BTC-USDC": { "type": "float", "round": 0 } }
            },
            "sensors": {
                "url": "http://192.168.0.106/sensors",
                "responseType": "text",
                "data": {
                    "dsw1": { "type": "float", "round": 1 },
                    "bmpp": { "type": "int" }
                }
            }
        },
        "dashboard": {
            "lines": [
                { "startY": 0, "items": [ { "type": "datetime", "font": "font24", "colour": "RED" } ] },
                { "items": [
                    { "type": "sunrise", "prefix": "^ ", "afterX": 12 },
                    { "type": "sunset", "prefix": "v " }
                ] },
                { "items": [ { "type": "temp", "prefix": "Out: ", "suffix": " C" } ] },
                { "items": [ { "type": "BTC-USDC", "font": "font18" } ] }
            ]
        }
    }"#;

    #[test]
    fn sample_config_parses_and_validates() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.display.epd_display_rotation, 90);
        assert_eq!(config.fonts["font24"].size(), 24);
        assert_eq!(config.layout.line_height, 22);
        assert_eq!(config.dashboard.lines.len(), 4);
        let weather = config.weather_service().unwrap();
        assert_eq!(weather.data["temp"].value_type, ValueType::Float);
        assert_eq!(weather.data["temp"].round, Some(1));
    }

    #[test]
    fn missing_section_is_a_parse_error() {
        let result = serde_json::from_str::<Config>(r#"{ "display": {} }"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_display_type_fails_validation() {
        let mut config: Config = serde_json::from_str(SAMPLE).unwrap();
        config.display.epd_display_type = "epd99in9".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn bad_rotation_fails_validation() {
        let mut config: Config = serde_json::from_str(SAMPLE).unwrap();
        config.display.epd_display_rotation = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn colour_override_table_wins() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.display_colour("accent"), Colour::Red);
        assert_eq!(config.display_colour("BLACK"), Colour::Black);
        assert_eq!(config.stale_colour(), Colour::Yellow);
    }

    #[test]
    fn crypto_service_accepts_legacy_key() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        let crypto = config.crypto_service().unwrap();
        assert_eq!(crypto.pairs, vec!["BTC-USDC", "SOL-USDC"]);
    }

    #[test]
    fn sensor_services_are_sorted() {
        let mut config: Config = serde_json::from_str(SAMPLE).unwrap();
        let extra = config.services["sensors"].clone();
        config.services.insert("sensors2".to_string(), extra);
        let keys: Vec<_> = config
            .sensor_services()
            .into_iter()
            .map(|(k, _)| k.clone())
            .collect();
        assert_eq!(keys, vec!["sensors", "sensors2"]);
    }

    #[test]
    fn bundled_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/dashboard.config.json");
        let config = Config::load_from_path(path).unwrap();
        assert!(!config.dashboard.lines.is_empty());
        assert!(config.weather_service().is_some());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = Config::load_from_path("/nonexistent/dashboard.config.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
