//! Bootstrap configuration stored in `bootseq.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::core::secret::DEFAULT_SECRET_KEY_LENGTH;

pub const CONFIG_FILE_NAME: &str = "bootseq.toml";

/// Bootstrap configuration (TOML).
///
/// Edited by operators and checked into the deployment repo. Missing fields
/// fall back to the defaults the container image expects.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Directories (relative to the project root) that must exist.
    pub directories: Vec<PathBuf>,

    /// Where delegated command logs are written, relative to the project root.
    pub log_dir: PathBuf,

    /// Where the JSON run report is written, relative to the project root.
    pub report_path: PathBuf,

    pub database: DatabaseConfig,
    pub secret: SecretConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Host used when `DB_HOST` is not set.
    pub host: String,
    /// Port used when `DB_PORT` is not set.
    pub port: u16,
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "db".to_string(),
            port: 5432,
            max_attempts: 30,
            interval_ms: 1000,
            connect_timeout_ms: 1000,
        }
    }
}

impl DatabaseConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SecretConfig {
    /// Environment variable holding the application secret key.
    pub env_var: String,
    pub length: usize,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            env_var: "SECRET_KEY".to_string(),
            length: DEFAULT_SECRET_KEY_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Python interpreter used for `manage.py` and `pip`.
    pub python: String,
    pub manage_py: PathBuf,
    /// Directory the application commands run in, relative to the project root.
    pub workdir: PathBuf,
    pub requirements: PathBuf,
    pub command_timeout_secs: u64,
    /// Truncate command stdout/stderr logs beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            manage_py: PathBuf::from("manage.py"),
            workdir: PathBuf::from("."),
            requirements: PathBuf::from("requirements.txt"),
            command_timeout_secs: 10 * 60,
            output_limit_bytes: 100_000,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            directories: vec![
                PathBuf::from("logs"),
                PathBuf::from("media"),
                PathBuf::from("staticfiles"),
            ],
            log_dir: PathBuf::from(".bootseq/logs"),
            report_path: PathBuf::from(".bootseq/last_run.json"),
            database: DatabaseConfig::default(),
            secret: SecretConfig::default(),
            app: AppConfig::default(),
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.database.host.trim().is_empty() {
            return Err(anyhow!("database.host must be non-empty"));
        }
        if self.database.port == 0 {
            return Err(anyhow!("database.port must be > 0"));
        }
        if self.database.max_attempts == 0 {
            return Err(anyhow!("database.max_attempts must be > 0"));
        }
        if self.database.connect_timeout_ms == 0 {
            return Err(anyhow!("database.connect_timeout_ms must be > 0"));
        }
        if self.secret.env_var.trim().is_empty() {
            return Err(anyhow!("secret.env_var must be non-empty"));
        }
        if self.secret.length < 32 {
            return Err(anyhow!("secret.length must be >= 32"));
        }
        if self.app.python.trim().is_empty() {
            return Err(anyhow!("app.python must be non-empty"));
        }
        if self.app.manage_py.as_os_str().is_empty() {
            return Err(anyhow!("app.manage_py must be non-empty"));
        }
        if self.app.command_timeout_secs == 0 {
            return Err(anyhow!("app.command_timeout_secs must be > 0"));
        }
        if self.app.output_limit_bytes == 0 {
            return Err(anyhow!("app.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BootstrapConfig::default()`.
pub fn load_config(path: &Path) -> Result<BootstrapConfig> {
    if !path.exists() {
        let cfg = BootstrapConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BootstrapConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, BootstrapConfig::default());
    }

    #[test]
    fn zero_connect_timeout_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[database]\nconnect_timeout_ms = 0\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("connect_timeout_ms"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[database]\nhost = \"postgres\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.database.host, "postgres");
        assert_eq!(cfg.database.port, 5432);
        assert_eq!(cfg.database.max_attempts, 30);
        assert_eq!(cfg.secret.env_var, "SECRET_KEY");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[database]\nmax_attempts = 0\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("max_attempts"));
    }
}
