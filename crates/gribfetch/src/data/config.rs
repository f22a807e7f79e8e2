use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unit the ping budget is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    #[default]
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn duration(self) -> Duration {
        match self {
            TimeUnit::Milliseconds => Duration::from_millis(1),
            TimeUnit::Seconds => Duration::from_secs(1),
            TimeUnit::Minutes => Duration::from_secs(60),
            TimeUnit::Hours => Duration::from_secs(60 * 60),
            TimeUnit::Days => Duration::from_secs(24 * 60 * 60),
        }
    }
}

pub fn default_state_path() -> PathBuf {
    std::env::temp_dir().join("gribfetch-pacing.lock")
}

/// Request budget shared by every process using the same state file.
///
/// # Examples
///
/// ```
/// use gribfetch::{GateConfig, TimeUnit};
/// use std::time::Duration;
///
/// let config = GateConfig::default().pings(10).unit(TimeUnit::Minutes);
/// assert_eq!(config.min_interval(), Duration::from_secs(6));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Number of requests permitted per `unit`.
    ///
    /// Default: 10
    pub pings: u32,

    /// Default: minutes
    pub unit: TimeUnit,

    /// Shared pacing state file. Every cooperating process must use the
    /// same path.
    ///
    /// Default: `<temp dir>/gribfetch-pacing.lock`
    pub state_path: PathBuf,

    /// Upper bound on waiting for another process to release the state file.
    ///
    /// Default: 60000
    pub lock_timeout_ms: u64,

    /// Delay between lock attempts while the state file is contended.
    ///
    /// Default: 50
    pub poll_interval_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            pings: 10,
            unit: TimeUnit::Minutes,
            state_path: default_state_path(),
            lock_timeout_ms: 60_000,
            poll_interval_ms: 50,
        }
    }
}

impl GateConfig {
    #[must_use]
    pub fn pings(mut self, pings: u32) -> Self {
        self.pings = pings;
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    #[must_use]
    pub fn state_path(mut self, state_path: impl Into<PathBuf>) -> Self {
        self.state_path = state_path.into();
        self
    }

    #[must_use]
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = timeout.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Minimum spacing between the starts of two gated operations.
    pub fn min_interval(&self) -> Duration {
        self.unit
            .duration()
            .checked_div(self.pings)
            .unwrap_or(Duration::ZERO)
    }

    pub fn lock_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn poll_interval_duration(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pings == 0 {
            return Err(Error::InvalidConfig("gate.pings must be greater than 0".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "gate.poll_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Whole-request timeout; `None` lets large payloads take as long as
    /// they need.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: None,
            user_agent: concat!("gribfetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Top-level configuration, usually read from a TOML file.
///
/// ```toml
/// [gate]
/// pings = 10
/// unit = "minutes"
/// state_path = "/tmp/gribfetch-pacing.lock"
///
/// [http]
/// connect_timeout_secs = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gate: GateConfig,
    pub http: HttpConfig,
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = gribfetch_fs::atomic_read(path.as_ref())?;
        Self::from_toml_str(&String::from_utf8_lossy(&raw))
    }

    pub fn validate(&self) -> Result<()> {
        self.gate.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_interval_from_budget() {
        let config = GateConfig::default().pings(10).unit(TimeUnit::Minutes);
        assert_eq!(config.min_interval(), Duration::from_secs(6));

        let config = GateConfig::default().pings(4).unit(TimeUnit::Seconds);
        assert_eq!(config.min_interval(), Duration::from_millis(250));
    }

    #[test]
    fn zero_pings_rejected() {
        let config = GateConfig::default().pings(0);
        assert_eq!(config.min_interval(), Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [gate]
            pings = 30
            unit = "hours"
            state_path = "/var/tmp/pacing.lock"
            "#,
        )
        .unwrap();

        assert_eq!(config.gate.pings, 30);
        assert_eq!(config.gate.unit, TimeUnit::Hours);
        assert_eq!(config.gate.state_path, PathBuf::from("/var/tmp/pacing.lock"));
        assert_eq!(config.gate.lock_timeout_ms, 60_000);
        assert_eq!(config.http, HttpConfig::default());
        assert_eq!(config.gate.min_interval(), Duration::from_secs(120));
    }

    #[test]
    fn parse_rejects_unknown_unit() {
        let err = Config::from_toml_str("[gate]\nunit = \"fortnights\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn parse_rejects_zero_pings() {
        let err = Config::from_toml_str("[gate]\npings = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gribfetch.toml");
        std::fs::write(&path, "[http]\nconnect_timeout_secs = 5\ntimeout_secs = 600\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.http.connect_timeout_secs, 5);
        assert_eq!(config.http.timeout_secs, Some(600));
        assert_eq!(config.gate, GateConfig::default());
    }
}
