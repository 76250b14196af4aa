use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub timetable: TimetableConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where the weekly timetable comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableConfig {
    /// An `http://` / `https://` URL or a local file path.
    /// Defaults to `$XDG_CONFIG_HOME/airing/schedule.json`.
    #[serde(default = "default_timetable_source")]
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Margin past the hour before re-evaluating.
    #[serde(default = "default_boundary_offset_secs")]
    pub boundary_offset_secs: u64,
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
}

/// Playback policy for embeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Channel names whose streams must be opened externally.
    #[serde(default)]
    pub external_only_channels: Vec<String>,
    /// Append `autoplay=1` to embed URLs.
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
}

/// Gesture deadzones, in the gesture's own units (pixels / wheel delta).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f64,
    #[serde(default = "default_wheel_threshold")]
    pub wheel_threshold: f64,
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            source: default_timetable_source(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            boundary_offset_secs: default_boundary_offset_secs(),
            period_secs: default_period_secs(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            external_only_channels: Vec::new(),
            autoplay: default_autoplay(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: default_swipe_threshold(),
            wheel_threshold: default_wheel_threshold(),
            drag_threshold: default_drag_threshold(),
        }
    }
}

fn default_log_file() -> PathBuf {
    platform::data_dir().join("airing.log")
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

fn default_timetable_source() -> String {
    platform::config_dir()
        .join("schedule.json")
        .to_string_lossy()
        .into_owned()
}

fn default_boundary_offset_secs() -> u64 {
    5
}

fn default_period_secs() -> u64 {
    3600
}

fn default_autoplay() -> bool {
    true
}

fn default_swipe_threshold() -> f64 {
    50.0
}

fn default_wheel_threshold() -> f64 {
    30.0
}

fn default_drag_threshold() -> f64 {
    50.0
}

impl Config {
    /// Loads the default config file, writing one with defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.http.enabled);
        assert_eq!(config.http.port, 8990);
        assert_eq!(config.http.bind_address, "127.0.0.1");
        assert_eq!(config.scheduler.boundary_offset_secs, 5);
        assert_eq!(config.scheduler.period_secs, 3600);
        assert!(config.policy.autoplay);
        assert!(config.timetable.source.ends_with("schedule.json"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [policy]
            external_only_channels = ["Restricted TV"]

            [input]
            swipe_threshold = 80.0
            "#,
        )
        .unwrap();
        assert_eq!(config.policy.external_only_channels, vec!["Restricted TV"]);
        assert!(config.policy.autoplay);
        assert_eq!(config.input.swipe_threshold, 80.0);
        assert_eq!(config.input.wheel_threshold, 30.0);
        assert_eq!(config.http.port, 8990);
    }

    #[test]
    fn test_load_creates_file_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut created = Config::load_from(&path).unwrap();
        assert!(path.exists());

        created.http.port = 9100;
        created.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.http.port, 9100);
    }
}
