use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::GameError;

pub const CONFIG_ENV: &str = "SCROLL_SHOOTER_CONFIG";
pub const TICK_HZ_ENV: &str = "SCROLL_SHOOTER_TICK_HZ";

/// Runtime configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Gameplay ticks per second.
    pub tick_hz: u32,
    /// Seconds shown before play starts or resumes a fresh level.
    pub countdown_secs: u32,
    /// Level to preselect in the menu.
    pub start_level: Option<String>,
    pub best_times_path: PathBuf,
    pub log_file: PathBuf,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        let home = home_dir();
        Self {
            tick_hz: 60,
            countdown_secs: 3,
            start_level: None,
            best_times_path: home.join(".scroll_shooter_times.json"),
            log_file: home.join(".scroll_shooter.log"),
            log_filter: "info".to_string(),
        }
    }
}

impl GameConfig {
    pub fn from_toml(text: &str) -> Result<Self, GameError> {
        let cfg: GameConfig = toml::from_str(text).map_err(|e| GameError::Config(e.to_string()))?;
        cfg.validate()
    }

    pub fn load_from(path: &Path) -> Result<Self, GameError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load from `$SCROLL_SHOOTER_CONFIG` or `~/.scroll_shooter.toml`, falling
    /// back to defaults, then apply environment overrides.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| home_dir().join(".scroll_shooter.toml"));

        let mut config = match Self::load_from(&path) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "loaded configuration");
                cfg
            }
            Err(GameError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "{e}, using defaults");
                Self::default()
            }
        };

        if let Ok(v) = std::env::var(TICK_HZ_ENV) {
            match v.parse::<u32>() {
                Ok(hz) if hz > 0 => config.tick_hz = hz,
                _ => tracing::warn!(value = %v, "ignoring invalid {TICK_HZ_ENV}"),
            }
        }
        config
    }

    fn validate(self) -> Result<Self, GameError> {
        if self.tick_hz == 0 || self.tick_hz > 1000 {
            return Err(GameError::Config(format!(
                "tick_hz must be between 1 and 1000, got {}",
                self.tick_hz
            )));
        }
        Ok(self)
    }
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}
