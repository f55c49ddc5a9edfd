//! Onyx configuration file handling

use anyhow::{Context, Result};
use onyx_animation::Easing;
use onyx_image::ScaleQuality;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level Onyx configuration (onyx.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OnyxConfig {
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub tile: TileConfig,
    #[serde(default)]
    pub image: ImageConfig,
}

/// Scheduler cadence and worker pool
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnimationConfig {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Background workers for async actors
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_workers() -> usize {
    2
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            workers: default_workers(),
        }
    }
}

impl AnimationConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Album tile geometry and animation timings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TileConfig {
    /// Fade-in when the tile joins the displayed hierarchy
    #[serde(default = "default_shown_fade_ms")]
    pub shown_fade_ms: u64,
    /// One half-cycle of the rollover pulse
    #[serde(default = "default_rollover_ms")]
    pub rollover_ms: u64,
    #[serde(default = "default_rollover_tension")]
    pub rollover_tension: f32,
    #[serde(default = "default_rollover_peak_alpha")]
    pub rollover_peak_alpha: f32,
    #[serde(default = "default_image_fade_ms")]
    pub image_fade_ms: u64,
    /// Art is scaled to fit a square of this size
    #[serde(default = "default_art_dim")]
    pub art_dim: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_shown_fade_ms() -> u64 {
    1000
}

fn default_rollover_ms() -> u64 {
    800
}

fn default_rollover_tension() -> f32 {
    0.7
}

fn default_rollover_peak_alpha() -> f32 {
    0.6
}

fn default_image_fade_ms() -> u64 {
    500
}

fn default_art_dim() -> u32 {
    100
}

fn default_width() -> u32 {
    160
}

fn default_height() -> u32 {
    180
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            shown_fade_ms: default_shown_fade_ms(),
            rollover_ms: default_rollover_ms(),
            rollover_tension: default_rollover_tension(),
            rollover_peak_alpha: default_rollover_peak_alpha(),
            image_fade_ms: default_image_fade_ms(),
            art_dim: default_art_dim(),
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Art scaling
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub quality: ScaleQuality,
}

impl OnyxConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: OnyxConfig = toml::from_str(content).context("Failed to parse Onyx config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or from `onyx.toml` inside a directory
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join("onyx.toml")
        } else {
            path.to_path_buf()
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    fn validate(&self) -> Result<()> {
        if self.animation.frame_interval_ms == 0 {
            anyhow::bail!("animation.frame_interval_ms must be positive");
        }
        let tile = &self.tile;
        if tile.shown_fade_ms == 0 || tile.rollover_ms == 0 || tile.image_fade_ms == 0 {
            anyhow::bail!("tile animation durations must be positive");
        }
        Easing::spline(tile.rollover_tension).context("tile.rollover_tension")?;
        if tile.art_dim == 0 {
            anyhow::bail!("tile.art_dim must be positive");
        }
        Ok(())
    }
}
