//! Animation configuration.
//!
//! Configs are plain JSON. Every field has a default, so `{}` is a valid
//! config and a file only needs the values it changes:
//!
//! ```json
//! {
//!   "mode": "sprite",
//!   "particle_count": 25,
//!   "sprite_path": "assets/card.png",
//!   "font_path": "assets/DejaVuSans.ttf",
//!   "sprite": { "bounciness": 0.8 }
//! }
//! ```

use crate::error::ConfigError;
use crate::particle::{GlyphTuning, SpriteTuning};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Respawn period used by glyph mode when the config does not set one.
pub const DEFAULT_GLYPH_RESPAWN_SECS: f32 = 2.5;

/// Which particle variant the scene runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Glowing card suits on a tilted floor.
    #[default]
    Glyph,
    /// Rotated sprites on a flat floor.
    Sprite,
}

/// Host window settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "glowfall".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

fn default_particle_count() -> usize {
    10
}

/// Complete animation configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,
    /// Seconds between wholesale respawns.
    ///
    /// Unset uses the mode default (2.5s for glyphs, never for sprites);
    /// zero or a negative value disables respawn.
    #[serde(default)]
    pub respawn_interval_secs: Option<f32>,
    /// Fixed RNG seed for reproducible runs. Unset seeds from the clock.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub window: WindowConfig,
    /// Image drawn by sprite particles. Unset draws black boxes.
    #[serde(default)]
    pub sprite_path: Option<PathBuf>,
    /// TrueType/OpenType font for text. Unset searches common system fonts.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default)]
    pub glyph: GlyphTuning,
    #[serde(default)]
    pub sprite: SpriteTuning,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            particle_count: default_particle_count(),
            respawn_interval_secs: None,
            seed: None,
            window: WindowConfig::default(),
            sprite_path: None,
            font_path: None,
            glyph: GlyphTuning::default(),
            sprite: SpriteTuning::default(),
        }
    }
}

impl AnimationConfig {
    /// Effective respawn period, after applying the mode default.
    pub fn respawn_interval(&self) -> Option<f32> {
        match self.respawn_interval_secs {
            Some(secs) if secs > 0.0 => Some(secs),
            Some(_) => None,
            None => match self.mode {
                Mode::Glyph => Some(DEFAULT_GLYPH_RESPAWN_SECS),
                Mode::Sprite => None,
            },
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reject values the animation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if let Some(secs) = self.respawn_interval_secs {
            if !secs.is_finite() {
                return Err(ConfigError::Invalid("respawn_interval_secs must be finite".into()));
            }
        }
        let speeds = [
            ("glyph.max_velocity", self.glyph.max_velocity),
            ("sprite.max_velocity", self.sprite.max_velocity),
        ];
        for (name, value) in speeds {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        // Every bounce has to lose speed
        let rebounds = [
            ("glyph.restitution", self.glyph.restitution),
            ("sprite.bounciness", self.sprite.bounciness),
        ];
        for (name, value) in rebounds {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be in [0, 1), got {value}"
                )));
            }
        }
        Ok(())
    }
}
