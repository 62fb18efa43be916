use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryConfig {
    #[serde(default = "default_repository_root")]
    pub root: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            root: default_repository_root(),
        }
    }
}

/// `<home>/.tfa/repository`, or `./.tfa/repository` when no home directory
/// can be determined.
fn default_repository_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tfa")
        .join("repository")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    /// Skip TLS certificate verification. On by default to keep working
    /// against self-signed artifact servers; set to `false` to verify.
    #[serde(default = "default_insecure_tls")]
    pub insecure_tls: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            insecure_tls: default_insecure_tls(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_insecure_tls() -> bool {
    true
}
fn default_user_agent() -> String {
    format!("tfa/{}", env!("CARGO_PKG_VERSION"))
}

impl RemoteConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScanConfig {
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

fn default_state_dir() -> String {
    ".state".to_string()
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.repository.root.as_os_str().is_empty() {
        anyhow::bail!("repository.root must not be empty");
    }

    if let Some(base) = &config.remote.base_url {
        let parsed = url::Url::parse(base)
            .with_context(|| format!("remote.base_url is not a valid URL: '{}'", base))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => anyhow::bail!(
                "Unsupported remote.base_url scheme: '{}'. Must be http or https.",
                other
            ),
        }
    }

    if config.remote.timeout_secs == Some(0) {
        anyhow::bail!("remote.timeout_secs must be > 0");
    }

    if config.export.state_dir.trim().is_empty() {
        anyhow::bail!("export.state_dir must not be empty");
    }

    for pattern in &config.scan.exclude_globs {
        globset::Glob::new(pattern)
            .with_context(|| format!("Invalid scan.exclude_globs pattern: '{}'", pattern))?;
    }

    Ok(())
}
