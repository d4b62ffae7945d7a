use std::path::Path;

use anyhow::{bail, Context, Result};
use session_tracker_lib::{Coordinate, MapStyle, ViewSettings, FALLBACK_COORDINATE};

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Anchor used when the session starts without a location fix.
    pub fallback: Coordinate,
    pub view: ViewSettings,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            fallback: FALLBACK_COORDINATE,
            view: ViewSettings::default(),
        }
    }
}

impl ReplayConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {:?}", path))?;
        Self::parse(&text)
    }

    /// `key = value` per line, `#` starts a comment line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut latitude = None;
        let mut longitude = None;

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                bail!("Line {}: expected key = value", index + 1);
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "fallback_latitude" => latitude = Some(parse_number(key, value)?),
                "fallback_longitude" => longitude = Some(parse_number(key, value)?),
                "camera_altitude" => config.view.camera_altitude_m = parse_number(key, value)?,
                "map_style" => {
                    config.view.map_style = MapStyle::parse(value).with_context(|| format!("Unknown map style {value}"))?
                }
                _ => tracing::warn!("Unknown config key: {}", key),
            }
        }

        config.fallback = Coordinate::try_new(
            latitude.unwrap_or(config.fallback.latitude),
            longitude.unwrap_or(config.fallback.longitude),
        )?;

        if !(config.view.camera_altitude_m.is_finite() && config.view.camera_altitude_m > 0.0) {
            bail!("camera_altitude must be positive, got {}", config.view.camera_altitude_m);
        }

        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64> {
    value.parse().with_context(|| format!("{key} is not a number: {value}"))
}

#[test]
fn parses_all_keys() {
    let config = ReplayConfig::parse(
        "
        # Copenhagen
        fallback_latitude = 55.6761
        fallback_longitude = 12.5683

        camera_altitude = 400
        map_style = satellite
        ",
    )
    .unwrap();

    assert_eq!(config.fallback, Coordinate::new(55.6761, 12.5683));
    assert_eq!(config.view.camera_altitude_m, 400.0);
    assert_eq!(config.view.map_style, MapStyle::SatelliteFlyover);
}

#[test]
fn empty_config_uses_defaults() {
    assert_eq!(ReplayConfig::parse("").unwrap(), ReplayConfig::default());
    assert_eq!(ReplayConfig::parse("unknown_key = 3").unwrap(), ReplayConfig::default());
}

#[test]
fn rejects_bad_values() {
    assert!(ReplayConfig::parse("fallback_latitude = north").is_err());
    assert!(ReplayConfig::parse("fallback_latitude = 120").is_err());
    assert!(ReplayConfig::parse("map_style = terrain").is_err());
    assert!(ReplayConfig::parse("camera_altitude = -5").is_err());
    assert!(ReplayConfig::parse("no separator here").is_err());
}
