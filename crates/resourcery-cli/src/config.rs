use std::path::Path;
use std::time::Duration;

use resourcery_channel::{ChannelError, DEFAULT_POLL_INTERVAL, write_bytes_atomic};
use resourcery_pipeline::{
    DEFAULT_PIPELINE_TIMEOUT, DEFAULT_POLICY_TIMEOUT, DEFAULT_STEP_TIMEOUT, PipelineOptions,
};
use resourcery_steps::DEFAULT_SEED_COUNT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILE: &str = "resourcery.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("failed to write settings: {0}")]
    Write(#[from] ChannelError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub php: String,
    pub artisan: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            php: "php".to_string(),
            artisan: "artisan".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub poll_interval_ms: u64,
    pub step_timeout_secs: u64,
    pub policy_timeout_secs: u64,
    pub pipeline_timeout_secs: u64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            step_timeout_secs: DEFAULT_STEP_TIMEOUT.as_secs(),
            policy_timeout_secs: DEFAULT_POLICY_TIMEOUT.as_secs(),
            pipeline_timeout_secs: DEFAULT_PIPELINE_TIMEOUT.as_secs(),
        }
    }
}

impl ChannelSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn policy_timeout(&self) -> Duration {
        Duration::from_secs(self.policy_timeout_secs)
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeederSettings {
    pub count: u32,
}

impl Default for SeederSettings {
    fn default() -> Self {
        Self {
            count: DEFAULT_SEED_COUNT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub compensate_on_failure: bool,
}

/// Contents of `resourcery.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub console: ConsoleSettings,
    pub channel: ChannelSettings,
    pub seeder: SeederSettings,
    pub pipeline: PipelineSettings,
}

impl Settings {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            step_timeout: self.channel.step_timeout(),
            seed_count: self.seeder.count,
            compensate_on_failure: self.pipeline.compensate_on_failure,
        }
    }
}

/// Read settings from `path`; a missing file yields the defaults.
pub fn load_settings(path: &Path) -> ConfigResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> ConfigResult<()> {
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(path, encoded.as_bytes()).map_err(ConfigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&dir.path().join(SETTINGS_FILE)).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.channel.poll_interval(), Duration::from_millis(500));
        assert_eq!(settings.channel.pipeline_timeout(), Duration::from_secs(30));
        assert_eq!(settings.seeder.count, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "[seeder]\ncount = 25\n\n[console]\nphp = \"/usr/bin/php8.3\"\n")
            .expect("write settings");

        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.seeder.count, 25);
        assert_eq!(settings.console.php, "/usr/bin/php8.3");
        assert_eq!(settings.console.artisan, "artisan");
        assert_eq!(settings.channel.step_timeout_secs, 5);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        let mut settings = Settings::default();
        settings.pipeline.compensate_on_failure = true;
        save_settings(&path, &settings).expect("save");

        let content = std::fs::read_to_string(&path).expect("read");
        assert!(content.contains("[channel]"));
        assert!(content.contains("compensate_on_failure = true"));
        assert_eq!(load_settings(&path).expect("load"), settings);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "[seeder]\ncount = \"many\"\n").expect("write settings");
        assert!(matches!(load_settings(&path), Err(ConfigError::Parse(_))));
    }
}
