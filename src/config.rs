use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::manager::permissions::DEFAULT_PROTECTED;
use crate::scheduler::{BurstSource, Selection, Ticks, DEFAULT_QUANTUM};

/// Top-level configuration, read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub sampler: SamplerSettings,

    #[serde(default)]
    pub termination: TerminationSettings,
}

/// Round-Robin simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Time quantum for preemption
    #[serde(default = "default_quantum")]
    pub quantum: Ticks,

    /// Number of processes a simulation run must select
    #[serde(default = "default_selection_size")]
    pub selection_size: usize,

    /// Inclusive range for random burst times
    #[serde(default = "default_burst_min")]
    pub burst_min: Ticks,

    #[serde(default = "default_burst_max")]
    pub burst_max: Ticks,

    /// Fixed seed for reproducible burst times
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSettings {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_ram_alert_percent")]
    pub ram_alert_percent: f32,

    #[serde(default = "default_disk_path")]
    pub disk_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationSettings {
    /// Names that are never signalled. Replaces the built-in list when set.
    #[serde(default = "default_protected")]
    pub protected: Vec<String>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            quantum: default_quantum(),
            selection_size: default_selection_size(),
            burst_min: default_burst_min(),
            burst_max: default_burst_max(),
            seed: None,
        }
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            top_n: default_top_n(),
            ram_alert_percent: default_ram_alert_percent(),
            disk_path: default_disk_path(),
        }
    }
}

impl Default for TerminationSettings {
    fn default() -> Self {
        Self {
            protected: default_protected(),
        }
    }
}

fn default_quantum() -> Ticks {
    DEFAULT_QUANTUM
}

fn default_selection_size() -> usize {
    5
}

fn default_burst_min() -> Ticks {
    1
}

fn default_burst_max() -> Ticks {
    10
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_top_n() -> usize {
    5
}

fn default_ram_alert_percent() -> f32 {
    80.0
}

fn default_disk_path() -> String {
    "/".to_string()
}

fn default_protected() -> Vec<String> {
    DEFAULT_PROTECTED.iter().map(|s| s.to_string()).collect()
}

impl SchedulerSettings {
    /// Selection step with random bursts drawn from the configured range.
    pub fn random_selection(&self) -> Selection {
        Selection::new(
            self.selection_size,
            BurstSource::Random {
                min: self.burst_min,
                max: self.burst_max,
                seed: self.seed,
            },
        )
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Candidate config paths, highest priority first.
    pub fn config_path_candidates() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join(".rr-optimizer").join("config.toml"));
        }

        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(
                PathBuf::from(xdg_config_home)
                    .join("rr-optimizer")
                    .join("config.toml"),
            );
        } else if let Some(home_dir) = home::home_dir() {
            paths.push(
                home_dir
                    .join(".config")
                    .join("rr-optimizer")
                    .join("config.toml"),
            );
        }

        paths
    }

    /// Loads the first existing candidate.
    pub fn load_auto() -> Result<Option<(Self, PathBuf)>> {
        for path in Self::config_path_candidates() {
            if path.exists() {
                let config = Self::from_file(&path)?;
                return Ok(Some((config, path)));
            }
        }
        Ok(None)
    }

    /// Explicit path if given, else auto-detected file, else defaults.
    /// Environment overrides are applied and the result validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::load_auto()? {
                Some((config, path)) => {
                    log::debug!("Loaded config from {}", path.display());
                    config
                }
                None => Config::default(),
            },
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RR_OPTIMIZER_QUANTUM") {
            self.scheduler.quantum = v
                .parse()
                .with_context(|| format!("RR_OPTIMIZER_QUANTUM is not a number: {}", v))?;
        }
        if let Some(v) = lookup("RR_OPTIMIZER_SELECTION_SIZE") {
            self.scheduler.selection_size = v
                .parse()
                .with_context(|| format!("RR_OPTIMIZER_SELECTION_SIZE is not a number: {}", v))?;
        }
        if let Some(v) = lookup("RR_OPTIMIZER_RAM_ALERT") {
            self.sampler.ram_alert_percent = v
                .parse()
                .with_context(|| format!("RR_OPTIMIZER_RAM_ALERT is not a number: {}", v))?;
        }
        if let Some(v) = lookup("RR_OPTIMIZER_INTERVAL_MS") {
            self.sampler.interval_ms = v
                .parse()
                .with_context(|| format!("RR_OPTIMIZER_INTERVAL_MS is not a number: {}", v))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler.quantum == 0 {
            bail!("scheduler.quantum must be positive");
        }
        if self.scheduler.selection_size == 0 {
            bail!("scheduler.selection_size must be positive");
        }
        if self.scheduler.burst_min == 0 || self.scheduler.burst_min > self.scheduler.burst_max {
            bail!(
                "scheduler burst range {}..={} is invalid",
                self.scheduler.burst_min,
                self.scheduler.burst_max
            );
        }
        if self.sampler.interval_ms == 0 {
            bail!("sampler.interval_ms must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.scheduler.quantum, 4);
        assert_eq!(config.scheduler.selection_size, 5);
        assert_eq!((config.scheduler.burst_min, config.scheduler.burst_max), (1, 10));
        assert_eq!(config.sampler.interval_ms, 1000);
        assert_eq!(config.sampler.ram_alert_percent, 80.0);
        assert!(config.termination.protected.contains(&"systemd".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
[scheduler]
quantum = 2
seed = 7

[sampler]
top_n = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.scheduler.quantum, 2);
        assert_eq!(config.scheduler.seed, Some(7));
        assert_eq!(config.scheduler.selection_size, 5);
        assert_eq!(config.sampler.top_n, 3);
        assert_eq!(config.sampler.interval_ms, 1000);
        assert_eq!(config.termination, TerminationSettings::default());
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[termination]\nprotected = [\"nginx\"]\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.termination.protected, vec!["nginx".to_string()]);

        std::fs::write(&path, "[scheduler]\nquantum = 0\n").unwrap();
        assert!(Config::load(Some(path.as_path())).is_err());

        std::fs::write(&path, "not toml [").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RR_OPTIMIZER_QUANTUM", "3"),
            ("RR_OPTIMIZER_RAM_ALERT", "90.5"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.scheduler.quantum, 3);
        assert_eq!(config.sampler.ram_alert_percent, 90.5);
        assert_eq!(config.sampler.interval_ms, 1000);

        let mut config = Config::default();
        let bad = config.apply_overrides(|k| {
            (k == "RR_OPTIMIZER_INTERVAL_MS").then(|| "soon".to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut config = Config::default();
        config.scheduler.burst_min = 8;
        config.scheduler.burst_max = 2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampler.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_random_selection_uses_settings() {
        let mut settings = SchedulerSettings::default();
        settings.seed = Some(1);
        settings.selection_size = 3;
        let selection = settings.random_selection();
        assert_eq!(selection.size, 3);
        assert_eq!(
            selection.burst_source,
            BurstSource::Random {
                min: 1,
                max: 10,
                seed: Some(1)
            }
        );
    }
}
