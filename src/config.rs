use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub attack: AttackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// unrar binary to invoke (name or absolute path)
    #[serde(default = "default_unrar_bin")]
    pub unrar_bin: String,

    /// Hard per-call timeout in seconds. Up to two calls per candidate,
    /// so a worker blocks at most twice this long per password.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackConfig {
    /// Worker pool size override. None means available parallelism
    /// minus one, minimum 1.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Emit a progress line every N completed candidates
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,

    /// Where to append found-password records
    #[serde(default = "default_hit_file")]
    pub hit_file: String,
}

fn default_unrar_bin() -> String {
    "unrar".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_progress_every() -> u64 {
    10
}

fn default_hit_file() -> String {
    "output/found_passwords.json".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            unrar_bin: default_unrar_bin(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            workers: None,
            progress_every: default_progress_every(),
            hit_file: default_hit_file(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse TOML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tool.unrar_bin.is_empty() {
            anyhow::bail!("tool.unrar_bin must not be empty");
        }

        if self.tool.timeout_secs == 0 {
            anyhow::bail!("tool.timeout_secs must be >= 1");
        }
        if self.tool.timeout_secs > 300 {
            anyhow::bail!("tool.timeout_secs is too high (>{}s)", 300);
        }

        if self.attack.progress_every == 0 {
            anyhow::bail!("attack.progress_every must be >= 1");
        }

        if let Some(workers) = self.attack.workers {
            if workers == 0 {
                anyhow::bail!("attack.workers must be >= 1");
            }
            if workers > 1024 {
                anyhow::bail!("attack.workers is too high (>{})", 1024);
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.tool.timeout_secs)
    }

    /// Create default configuration
    pub fn default_toml() -> String {
        r#"
[tool]
unrar_bin = "unrar"
timeout_secs = 10

[attack]
# workers = 8
progress_every = 10
hit_file = "output/found_passwords.json"
"#
        .to_string()
    }

    /// Save default config to file
    pub fn save_default(path: &str) -> Result<()> {
        fs::write(path, Self::default_toml())
            .context("Failed to write default config")?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tool: ToolConfig::default(),
            attack: AttackConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tool.timeout_secs, 10);
        assert_eq!(config.attack.progress_every, 10);
    }

    #[test]
    fn test_default_toml_round_trip() {
        let parsed: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.tool.unrar_bin, "unrar");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.tool.timeout_secs = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs must be >= 1"), "got err: {}", err);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.attack.workers = Some(0);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("attack.workers must be >= 1"), "got err: {}", err);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[attack]\nworkers = 4\n").unwrap();
        assert_eq!(config.attack.workers, Some(4));
        assert_eq!(config.tool.unrar_bin, "unrar");
        assert_eq!(config.tool.timeout_secs, 10);
    }
}
