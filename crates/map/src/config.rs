use std::env;

use cluster::ClusterOptions;
use viewport::{ControllerConfig, FALLBACK_VIEWPORT, Viewport};

/// Token value shipped in the sample `.env`; treated as unset.
pub const PLACEHOLDER_ACCESS_TOKEN: &str = "your_mapbox_access_token_here";
pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/outdoors-v12";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingAccessToken,
    PlaceholderAccessToken,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingAccessToken => {
                write!(f, "map access token is not set (MAP_ACCESS_TOKEN)")
            }
            ConfigError::PlaceholderAccessToken => write!(
                f,
                "map access token is still the placeholder value; set MAP_ACCESS_TOKEN"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Map engine settings.
///
/// Environment:
/// - `MAP_ACCESS_TOKEN` (required to render the map)
/// - `MAP_STYLE` (default: outdoors style)
/// - `MAP_FALLBACK_LON`, `MAP_FALLBACK_LAT`, `MAP_FALLBACK_ZOOM` (default: Denmark, zoom 6)
/// - `MAP_CLUSTER_RADIUS_PX` (default: 75)
/// - `MAP_FOLLOW_THRESHOLD_M` (default: 10)
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub access_token: Option<String>,
    pub style: String,
    pub fallback: Viewport,
    pub cluster_radius_px: f64,
    pub follow_threshold_m: f64,
    /// Zoom used when the first position fix recenters the map.
    pub initial_fix_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            style: DEFAULT_STYLE.to_string(),
            fallback: FALLBACK_VIEWPORT,
            cluster_radius_px: ClusterOptions::default().radius_px,
            follow_threshold_m: ControllerConfig::default().follow_threshold_m,
            initial_fix_zoom: 12.0,
        }
    }
}

impl MapConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let f64_var = |key: &str, default: f64| -> f64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        Self {
            access_token: lookup("MAP_ACCESS_TOKEN")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            style: lookup("MAP_STYLE").unwrap_or(d.style),
            fallback: Viewport {
                longitude: f64_var("MAP_FALLBACK_LON", d.fallback.longitude),
                latitude: f64_var("MAP_FALLBACK_LAT", d.fallback.latitude),
                zoom: f64_var("MAP_FALLBACK_ZOOM", d.fallback.zoom),
                bearing: 0.0,
            },
            cluster_radius_px: f64_var("MAP_CLUSTER_RADIUS_PX", d.cluster_radius_px),
            follow_threshold_m: f64_var("MAP_FOLLOW_THRESHOLD_M", d.follow_threshold_m),
            initial_fix_zoom: d.initial_fix_zoom,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn validated_token(&self) -> Result<&str, ConfigError> {
        match self.access_token.as_deref() {
            None => Err(ConfigError::MissingAccessToken),
            Some(PLACEHOLDER_ACCESS_TOKEN) => Err(ConfigError::PlaceholderAccessToken),
            Some(token) => Ok(token),
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            fallback: self.fallback,
            follow_threshold_m: self.follow_threshold_m,
            ..ControllerConfig::default()
        }
    }

    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            radius_px: self.cluster_radius_px,
            ..ClusterOptions::default()
        }
    }
}
