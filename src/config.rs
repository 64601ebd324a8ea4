//! Host configuration parsed from environment variables.
//!
//! Every knob has a default, so a bare `playfield` run works. Values that do
//! not parse fall back to the default rather than aborting startup. Only
//! values that parse but make no sense (a zero frame rate, an empty scene)
//! are rejected.

use std::path::PathBuf;
use std::time::Duration;

use scene::consts::{DEFAULT_SCENE_HEIGHT, DEFAULT_SCENE_WIDTH};
use scene::viewport::Viewport;

pub const DEFAULT_STORE_PATH: &str = "playfield.json";
pub const DEFAULT_FPS: u32 = 60;
pub const DEFAULT_FLUSH_MS: u64 = 250;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be greater than zero")]
    NotPositive { var: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Scene snapshot file.
    pub store_path: PathBuf,
    /// Frame scheduler cadence.
    pub fps: u32,
    pub scene_width: f64,
    pub scene_height: f64,
    /// Debounce interval for persisting dirty entities.
    pub flush_ms: u64,
    /// Device or file read as the external numeric source.
    pub serial_path: Option<PathBuf>,
    /// Initial state of the collision pass.
    pub collisions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            fps: DEFAULT_FPS,
            scene_width: DEFAULT_SCENE_WIDTH,
            scene_height: DEFAULT_SCENE_HEIGHT,
            flush_ms: DEFAULT_FLUSH_MS,
            serial_path: None,
            collisions: true,
        }
    }
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PLAYFIELD_STORE_PATH`: default `playfield.json`
    /// - `PLAYFIELD_FPS`: default 60
    /// - `PLAYFIELD_SCENE_WIDTH` / `PLAYFIELD_SCENE_HEIGHT`: default 800 / 600
    /// - `PLAYFIELD_FLUSH_MS`: default 250
    /// - `PLAYFIELD_SERIAL_PATH`: unset by default
    /// - `PLAYFIELD_COLLISIONS`: default `true`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] for a zero frame rate, flush
    /// interval, or scene dimension.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            store_path: env_path("PLAYFIELD_STORE_PATH").unwrap_or(defaults.store_path),
            fps: env_parse("PLAYFIELD_FPS", defaults.fps),
            scene_width: env_parse("PLAYFIELD_SCENE_WIDTH", defaults.scene_width),
            scene_height: env_parse("PLAYFIELD_SCENE_HEIGHT", defaults.scene_height),
            flush_ms: env_parse("PLAYFIELD_FLUSH_MS", defaults.flush_ms),
            serial_path: env_path("PLAYFIELD_SERIAL_PATH"),
            collisions: env_parse("PLAYFIELD_COLLISIONS", defaults.collisions),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::NotPositive { var: "PLAYFIELD_FPS" });
        }
        if self.flush_ms == 0 {
            return Err(ConfigError::NotPositive { var: "PLAYFIELD_FLUSH_MS" });
        }
        if self.scene_width <= 0.0 {
            return Err(ConfigError::NotPositive { var: "PLAYFIELD_SCENE_WIDTH" });
        }
        if self.scene_height <= 0.0 {
            return Err(ConfigError::NotPositive { var: "PLAYFIELD_SCENE_HEIGHT" });
        }
        Ok(())
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.scene_width, self.scene_height)
    }

    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps))
    }

    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_ms)
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
