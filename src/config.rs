//! Mapper settings, persisted as TOML
//!
//! ```toml
//! [mapper]
//! mapperfile = "/home/user/.config/input-mapper/mapper.map"
//! host_key_alternate = "ctrlalt"
//! poll_interval_ms = 10
//!
//! [joystick]
//! joysticktype = "auto"
//! autofire = false
//! buttonwrap = false
//! axis_button_deadzone = 60
//!
//! [[joystick.sticks]]
//! axis_pairs = [{ deadzone = 0.1, response = 1.0 }]
//! ```

use crate::controller::normalize::AxisTuning;
use crate::mapping::Mods;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/input-mapper";
const SETTINGS_FILE: &str = "settings.toml";
const MAPPER_FILE: &str = "mapper.map";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Emulated joystick hardware presented to the guest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoystickType {
    #[serde(rename = "none", alias = "false")]
    None,
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "2axis")]
    TwoAxis,
    #[serde(rename = "4axis")]
    FourAxis,
    /// Split 4-axis stick read from the second physical device
    #[serde(rename = "4axis_2")]
    FourAxisSecond,
    #[serde(rename = "fcs")]
    Fcs,
    #[serde(rename = "ch")]
    Ch,
}

/// Two-key chord that stands in for the host modifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKeyAlternate {
    #[default]
    None,
    CtrlAlt,
    CtrlShift,
    AltShift,
}

impl HostKeyAlternate {
    /// Modifier bits that must all be held for the chord
    pub fn chord(self) -> Option<Mods> {
        match self {
            Self::None => None,
            Self::CtrlAlt => Some(Mods::MOD1 | Mods::MOD2),
            Self::CtrlShift => Some(Mods::MOD1 | Mods::MOD3),
            Self::AltShift => Some(Mods::MOD2 | Mods::MOD3),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MapperSettings {
    /// Bind file
    pub mapperfile: PathBuf,
    pub host_key_alternate: HostKeyAlternate,
    /// Joystick polling throttle
    pub poll_interval_ms: u64,
}

impl Default for MapperSettings {
    fn default() -> Self {
        let mut mapperfile = get_home_dir();
        mapperfile.push(CONFIG_DIR);
        mapperfile.push(MAPPER_FILE);
        Self {
            mapperfile,
            host_key_alternate: HostKeyAlternate::None,
            poll_interval_ms: 10,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct StickTuning {
    pub axis_pairs: Vec<AxisTuning>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct JoystickSettings {
    pub joysticktype: JoystickType,
    /// Held buttons alternate pressed/released every poll
    pub autofire: bool,
    /// Physical buttons beyond the emulated ones wrap around
    pub buttonwrap: bool,
    /// Percent of full deflection an axis needs to press a button-like event
    pub axis_button_deadzone: u8,
    pub sticks: Vec<StickTuning>,
}

impl Default for JoystickSettings {
    fn default() -> Self {
        Self {
            joysticktype: JoystickType::Auto,
            autofire: false,
            buttonwrap: false,
            axis_button_deadzone: 60,
            sticks: Vec::new(),
        }
    }
}

impl JoystickSettings {
    /// Deadzone and response of one axis pair, defaults when not configured
    pub fn axis_tuning(&self, stick: usize, pair: usize) -> AxisTuning {
        self.sticks
            .get(stick)
            .and_then(|s| s.axis_pairs.get(pair))
            .copied()
            .unwrap_or_default()
    }

    /// Deadzone of axis-to-button binds on the signed 16-bit scale
    pub fn axis_button_threshold(&self) -> i32 {
        i32::from(self.axis_button_deadzone.min(100)) * crate::mapping::MAX_VALUE / 100
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub mapper: MapperSettings,
    pub joystick: JoystickSettings,
}

impl Settings {
    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(SETTINGS_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let settings = toml::from_str(&content)?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Falls back to defaults when the file is missing or broken
    pub async fn load_or_default(path: &Path) -> Self {
        match Self::load(path).await {
            Ok(settings) => settings,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [joystick]
            joysticktype = "4axis_2"
            autofire = true

            [[joystick.sticks]]
            axis_pairs = [{ deadzone = 0.25 }, { response = 2.0 }]
            "#,
        )
        .unwrap();
        assert_eq!(settings.joystick.joysticktype, JoystickType::FourAxisSecond);
        assert!(settings.joystick.autofire);
        assert_eq!(settings.mapper.poll_interval_ms, 10);

        let first = settings.joystick.axis_tuning(0, 0);
        assert_eq!(first.deadzone, 0.25);
        assert_eq!(first.response, 1.0);
        assert_eq!(settings.joystick.axis_tuning(0, 1).response, 2.0);
        assert_eq!(settings.joystick.axis_tuning(1, 0), AxisTuning::default());
    }

    #[test]
    fn legacy_false_means_none() {
        let js: JoystickSettings = toml::from_str(r#"joysticktype = "false""#).unwrap();
        assert_eq!(js.joysticktype, JoystickType::None);
    }

    #[test]
    fn host_chords() {
        let mapper: MapperSettings = toml::from_str(r#"host_key_alternate = "altshift""#).unwrap();
        assert_eq!(
            mapper.host_key_alternate.chord(),
            Some(Mods::MOD2 | Mods::MOD3)
        );
        assert_eq!(HostKeyAlternate::None.chord(), None);
    }

    #[test]
    fn axis_button_threshold_scales_percent() {
        let js = JoystickSettings {
            axis_button_deadzone: 50,
            ..Default::default()
        };
        assert_eq!(js.axis_button_threshold(), 16383);
    }

    #[tokio::test]
    async fn save_and_load_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let mut settings = Settings::default();
        settings.mapper.host_key_alternate = HostKeyAlternate::CtrlShift;
        settings.joystick.joysticktype = JoystickType::Ch;
        settings.joystick.sticks.push(StickTuning {
            axis_pairs: vec![AxisTuning {
                deadzone: 0.2,
                response: 1.5,
            }],
        });
        settings.save(&path).await.unwrap();

        assert_eq!(Settings::load(&path).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("absent.toml")).await;
        assert_eq!(settings, Settings::default());
    }
}
