use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const CONFIG_DIR_ENV: &str = "SESSIONFILE_CONFIG_DIR";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_SESSION_FILE_SUFFIX: &str = ".jsonl";
const SUPPORTED_SESSION_BACKENDS: &[&str] = &["jsonl", "memory", "in_memory"];

// ── Top-level config ──────────────────────────────────────────────

/// Top-level configuration, loaded from `config.toml`.
///
/// Resolution order: `--config-dir` / `SESSIONFILE_CONFIG_DIR` env → `~/.sessionfile/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml - computed, not serialized
    #[serde(skip)]
    pub config_dir: PathBuf,
    /// Path to config.toml - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Session transcript storage (`[sessions]`).
    #[serde(default)]
    pub sessions: SessionsConfig,
}

/// Session storage configuration (`[sessions]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Directory holding session files. `~` and `$VARS` are expanded on load.
    #[serde(default = "default_sessions_dir")]
    pub dir: PathBuf,
    /// Filename suffix marking a session file. Default: `".jsonl"`.
    #[serde(default = "default_session_suffix")]
    pub suffix: String,
    /// Storage backend: `"jsonl"` (default) or `"memory"`.
    #[serde(default = "default_session_backend")]
    pub backend: String,
}

fn home_dir() -> PathBuf {
    UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf())
}

fn default_sessions_dir() -> PathBuf {
    home_dir().join(".sessionfile").join("sessions")
}

fn default_session_suffix() -> String {
    DEFAULT_SESSION_FILE_SUFFIX.to_string()
}

fn default_session_backend() -> String {
    "jsonl".to_string()
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            dir: default_sessions_dir(),
            suffix: default_session_suffix(),
            backend: default_session_backend(),
        }
    }
}

// ── Config impl ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let config_dir = home_dir().join(".sessionfile");
        Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
            sessions: SessionsConfig::default(),
        }
    }
}

fn default_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return expand_path(Path::new(&dir));
        }
    }
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".sessionfile"))
}

/// Expand `~` and environment variables in a configured path.
fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path
        .to_str()
        .with_context(|| format!("Path is not valid UTF-8: {}", path.display()))?;
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand path '{raw}'"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

impl Config {
    pub async fn load_or_init() -> Result<Self> {
        let config_dir = default_config_dir()?;
        Self::load_or_init_in(&config_dir).await
    }

    /// Load `config.toml` from `config_dir`, writing defaults on first run.
    pub async fn load_or_init_in(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        fs::create_dir_all(config_dir).await.with_context(|| {
            format!(
                "Failed to create config directory {}",
                config_dir.display()
            )
        })?;

        let initialized = !config_path.exists();
        let mut config = if initialized {
            let mut config = Config::default();
            config.config_dir = config_dir.to_path_buf();
            config.config_path = config_path.clone();
            config.save().await?;
            config
        } else {
            let contents = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            // Set computed paths that are skipped during serialization
            config.config_dir = config_dir.to_path_buf();
            config.config_path = config_path.clone();
            config
        };

        config.apply_env_overrides();
        config.sessions.dir = expand_path(&config.sessions.dir)?;
        config.validate()?;
        tracing::info!(
            path = %config.config_path.display(),
            sessions = %config.sessions.dir.display(),
            initialized,
            "Config loaded"
        );
        Ok(config)
    }

    /// Write the config back to `config_path`.
    pub async fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, contents)
            .await
            .with_context(|| format!("Failed to write {}", self.config_path.display()))?;
        Ok(())
    }

    /// Validate configuration values that would cause runtime failures.
    pub fn validate(&self) -> Result<()> {
        let suffix = &self.sessions.suffix;
        if suffix.is_empty() {
            anyhow::bail!("sessions.suffix must not be empty");
        }
        if suffix.contains(['/', '\\']) {
            anyhow::bail!("sessions.suffix must not contain path separators ({suffix})");
        }

        if self.sessions.dir.as_os_str().is_empty() {
            anyhow::bail!("sessions.dir must not be empty");
        }

        let backend = self.sessions.backend.trim().to_ascii_lowercase();
        if !SUPPORTED_SESSION_BACKENDS.contains(&backend.as_str()) {
            anyhow::bail!(
                "sessions.backend '{}' is not supported; expected one of: jsonl, memory",
                self.sessions.backend
            );
        }

        Ok(())
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = value("SESSIONFILE_SESSIONS_DIR") {
            self.sessions.dir = PathBuf::from(dir);
        }
        if let Some(suffix) = value("SESSIONFILE_SESSION_SUFFIX") {
            self.sessions.suffix = suffix;
        }
        if let Some(backend) = value("SESSIONFILE_SESSION_BACKEND") {
            self.sessions.backend = backend;
        }
    }
}
