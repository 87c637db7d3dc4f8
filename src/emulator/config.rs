// Configuration management
//
// TOML-backed settings with load-or-default semantics: a missing or
// unreadable file silently yields the defaults, so embedding the core
// never fails on configuration.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default configuration file path
const CONFIG_FILE: &str = "famicore.toml";

/// Emulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Audio settings
    pub audio: AudioConfig,
    /// Save state settings
    pub save_state: SaveStateConfig,
}

/// Audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Whether the host should consume the sample stream
    pub enabled: bool,
    /// Output volume (0.0-1.0), applied by the host
    pub volume: f32,
}

/// Save state configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStateConfig {
    /// Number of save slots
    pub slots: u8,
    /// Directory slot files are written into
    pub save_directory: PathBuf,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            audio: AudioConfig {
                enabled: true,
                volume: 1.0,
            },
            save_state: SaveStateConfig {
                slots: 10,
                save_directory: PathBuf::from("save_states"),
            },
        }
    }
}

impl EmulatorConfig {
    /// Load the configuration file, falling back to defaults
    pub fn load_or_default() -> Self {
        match fs::read_to_string(CONFIG_FILE) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("ignoring malformed {}: {}", CONFIG_FILE, err);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist the configuration to its file
    pub fn save(&self) -> std::io::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        fs::write(CONFIG_FILE, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmulatorConfig::default();
        assert!(config.audio.enabled);
        assert_eq!(config.save_state.slots, 10);
        assert_eq!(config.save_state.save_directory, PathBuf::from("save_states"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EmulatorConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: EmulatorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.save_state.slots, config.save_state.slots);
        assert_eq!(parsed.audio.volume, config.audio.volume);
    }

    #[test]
    fn test_partial_toml_is_rejected_to_defaults() {
        let parsed: Result<EmulatorConfig, _> = toml::from_str("[audio]\nenabled = false\n");
        // Missing sections are a parse error; load_or_default falls back
        assert!(parsed.is_err());
    }
}
