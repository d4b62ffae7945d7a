use serde::{Deserialize, Serialize};

pub const DEFAULT_CAMERA_ALTITUDE_M: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapStyle {
    #[default]
    Standard,
    SatelliteFlyover,
    HybridFlyover,
}

impl MapStyle {
    /// Maps the position of the style selector to a style.
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => MapStyle::SatelliteFlyover,
            2 => MapStyle::HybridFlyover,
            _ => MapStyle::Standard,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(MapStyle::Standard),
            "satellite" | "satellite_flyover" => Some(MapStyle::SatelliteFlyover),
            "hybrid" | "hybrid_flyover" => Some(MapStyle::HybridFlyover),
            _ => None,
        }
    }
}

/// Rendering preferences. The tracker never reads these, they are handed to the renderer as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    pub camera_altitude_m: f64,
    pub map_style: MapStyle,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            camera_altitude_m: DEFAULT_CAMERA_ALTITUDE_M,
            map_style: MapStyle::Standard,
        }
    }
}

#[test]
fn style_selector() {
    assert_eq!(MapStyle::from_index(0), MapStyle::Standard);
    assert_eq!(MapStyle::from_index(1), MapStyle::SatelliteFlyover);
    assert_eq!(MapStyle::from_index(2), MapStyle::HybridFlyover);
    assert_eq!(MapStyle::from_index(7), MapStyle::Standard);
    assert_eq!(MapStyle::parse(" Hybrid "), Some(MapStyle::HybridFlyover));
    assert_eq!(MapStyle::parse("terrain"), None);
}
