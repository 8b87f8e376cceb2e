//! Runtime settings
//!
//! Loaded from the path given as the first command-line argument, else from
//! `~/.config/ember/ember.toml`, else defaults.

use std::fs;
use std::path::{Path, PathBuf};

use ember_core::TimeConfig;
use ember_ecs::WorldConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All runtime settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub world: WorldConfig,
    pub time: TimeConfig,
    pub demo: DemoSettings,
}

impl Settings {
    /// Get the default settings file path
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ember").join("ember.toml"))
    }

    /// Load settings from `path` (or the default location), falling back to
    /// defaults on any failure
    pub fn load(path: Option<PathBuf>) -> Self {
        let Some(path) = path.or_else(Self::default_path) else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::read(&path) {
            Ok(settings) => {
                info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Failed to load settings: {:#}, using defaults", e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Parameters of the built-in demo scene
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Number of frames to simulate
    pub frames: u32,
    /// Raw delta fed to the frame clock each frame (seconds)
    pub frame_delta: f32,
    /// Short-lived walkers spawned next to the player
    pub walkers: u32,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            frames: 120,
            frame_delta: 1.0 / 60.0,
            walkers: 8,
        }
    }
}
