use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::VisibilityPolicy;

/// Main configuration structure for repomirror
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory holding one bare mirror per source repository
    #[serde(default = "default_backup_directory")]
    pub backup_directory: String,

    /// Desired destination visibility
    #[serde(default)]
    pub visibility: VisibilityPolicy,

    /// Source host (GitHub) settings
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub gitlab: GitLabConfig,

    #[serde(default)]
    pub codeberg: CodebergConfig,

    #[serde(default)]
    pub bitbucket: BitbucketConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A credential that never shows up in logs or debug output
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

/// GitHub (source) configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// GitHub username (resolved from the token if null)
    pub username: Option<String>,

    #[serde(default)]
    pub token: Secret,

    /// Repositories requested per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Fixed pause between page requests
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

/// GitLab destination configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitLabConfig {
    #[serde(default = "default_gitlab_api_url")]
    pub api_url: String,

    #[serde(default = "default_gitlab_web_url")]
    pub web_url: String,

    #[serde(default)]
    pub username: String,

    /// Group full path; projects go under the user namespace when unset
    pub group: Option<String>,

    #[serde(default)]
    pub token: Secret,
}

/// Codeberg destination configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CodebergConfig {
    #[serde(default = "default_codeberg_api_url")]
    pub api_url: String,

    #[serde(default = "default_codeberg_web_url")]
    pub web_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub token: Secret,
}

/// Bitbucket Cloud destination configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BitbucketConfig {
    #[serde(default = "default_bitbucket_api_url")]
    pub api_url: String,

    #[serde(default = "default_bitbucket_web_url")]
    pub web_url: String,

    /// Atlassian account email used for REST authentication
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub workspace: String,

    /// Atlassian API token
    #[serde(default)]
    pub token: Secret,
}

/// HTTP client configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Transport timeout for a single API request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Directory for per-run log files; no log file is written when null
    #[serde(default = "default_log_directory")]
    pub directory: Option<String>,
}

// Default value functions
fn default_backup_directory() -> String {
    "./repos-backup".to_string()
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_per_page() -> u32 {
    100
}
fn default_page_delay_ms() -> u64 {
    500
}
fn default_gitlab_api_url() -> String {
    "https://gitlab.com/api/v4".to_string()
}
fn default_gitlab_web_url() -> String {
    "https://gitlab.com".to_string()
}
fn default_codeberg_api_url() -> String {
    "https://codeberg.org/api/v1".to_string()
}
fn default_codeberg_web_url() -> String {
    "https://codeberg.org".to_string()
}
fn default_bitbucket_api_url() -> String {
    "https://api.bitbucket.org/2.0".to_string()
}
fn default_bitbucket_web_url() -> String {
    "https://bitbucket.org".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_directory() -> Option<String> {
    Some("./logs".to_string())
}

// Default implementations
impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            username: None,
            token: Secret::default(),
            per_page: default_per_page(),
            page_delay_ms: default_page_delay_ms(),
        }
    }
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            api_url: default_gitlab_api_url(),
            web_url: default_gitlab_web_url(),
            username: String::new(),
            group: None,
            token: Secret::default(),
        }
    }
}

impl Default for CodebergConfig {
    fn default() -> Self {
        Self {
            api_url: default_codeberg_api_url(),
            web_url: default_codeberg_web_url(),
            username: String::new(),
            token: Secret::default(),
        }
    }
}

impl Default for BitbucketConfig {
    fn default() -> Self {
        Self {
            api_url: default_bitbucket_api_url(),
            web_url: default_bitbucket_web_url(),
            email: String::new(),
            workspace: String::new(),
            token: Secret::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
        }
    }
}

impl GitHubConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    ///
    /// Returns the path of the config file when it was created by this call,
    /// so the caller can report it once logging is up.
    pub fn load_or_default() -> Result<(Self, Option<PathBuf>)> {
        let config_path = Self::default_config_path()?;
        let mut created = None;

        let mut config = if config_path.exists() {
            Self::read(&config_path)?
        } else {
            let config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;
            created = Some(config_path);
            config
        };

        config.apply_env_overrides()?;
        config.expand_paths()?;
        Ok((config, created))
    }

    /// Load configuration from a specific file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides()?;
        config.expand_paths()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repomirror").join("config.yml"))
    }

    /// Credentials and a few run settings come from the environment when set
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(user) = env_value("GITHUB_USER") {
            self.github.username = Some(user);
        }
        if let Some(token) = env_value("GITHUB_TOKEN") {
            self.github.token = Secret::new(token);
        }
        if let Some(user) = env_value("GITLAB_USER") {
            self.gitlab.username = user;
        }
        if let Some(group) = env_value("GITLAB_GROUP") {
            self.gitlab.group = Some(group);
        }
        if let Some(token) = env_value("GITLAB_TOKEN") {
            self.gitlab.token = Secret::new(token);
        }
        if let Some(user) = env_value("CODEBERG_USER") {
            self.codeberg.username = user;
        }
        if let Some(token) = env_value("CODEBERG_TOKEN") {
            self.codeberg.token = Secret::new(token);
        }
        if let Some(email) = env_value("BITBUCKET_EMAIL") {
            self.bitbucket.email = email;
        }
        if let Some(workspace) = env_value("BITBUCKET_WORKSPACE") {
            self.bitbucket.workspace = workspace;
        }
        if let Some(token) = env_value("BITBUCKET_TOKEN") {
            self.bitbucket.token = Secret::new(token);
        }
        if let Some(dir) = env_value("BACKUP_DIR") {
            self.backup_directory = dir;
        }
        if let Some(policy) = env_value("REPO_VISIBILITY") {
            self.visibility = policy
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid REPO_VISIBILITY")?;
        }
        Ok(())
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.backup_directory = shellexpand::full(&self.backup_directory)
            .context("Failed to expand backup_directory path")?
            .into_owned();

        if let Some(dir) = &self.logging.directory {
            self.logging.directory = Some(
                shellexpand::full(dir)
                    .context("Failed to expand logging.directory path")?
                    .into_owned(),
            );
        }

        Ok(())
    }

    pub fn backup_path(&self) -> PathBuf {
        PathBuf::from(&self.backup_directory)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_directory: default_backup_directory(),
            visibility: VisibilityPolicy::default(),
            github: GitHubConfig::default(),
            gitlab: GitLabConfig::default(),
            codeberg: CodebergConfig::default(),
            bitbucket: BitbucketConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
