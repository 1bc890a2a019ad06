//! Destination provider abstraction
//!
//! Each destination host implements [`Provider`] against its own REST API and
//! auth scheme. The sync engine only ever sees `dyn Provider`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Config;
use crate::error::Result;
use crate::types::{RemoteRepo, RemoteState, Visibility};

pub mod bitbucket;
pub mod codeberg;
pub mod gitlab;

pub use bitbucket::BitbucketProvider;
pub use codeberg::CodebergProvider;
pub use gitlab::GitLabProvider;

/// Capabilities every destination host offers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name for display/logging
    fn name(&self) -> &'static str;

    /// `Absent` on 404, `Present` on success, an API error otherwise
    async fn lookup(&self, name: &str) -> Result<RemoteState>;

    /// Create a repository; only called after `lookup` returned `Absent`
    async fn create(&self, name: &str, visibility: Visibility) -> Result<RemoteRepo>;

    /// Set the visibility of an existing repository
    async fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<()>;

    /// Authenticated git push URL; never touches the network
    fn push_url(&self, name: &str) -> Result<String>;
}

/// Selectable destination hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gitlab,
    Codeberg,
    Bitbucket,
}

impl ProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gitlab => "GitLab",
            ProviderKind::Codeberg => "Codeberg",
            ProviderKind::Bitbucket => "Bitbucket",
        }
    }

    /// Settings that must be present before this provider can be used
    pub fn missing_credentials(&self, config: &Config) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            ProviderKind::Gitlab => {
                if config.gitlab.username.trim().is_empty() {
                    missing.push("GITLAB_USER");
                }
                if config.gitlab.token.is_empty() {
                    missing.push("GITLAB_TOKEN");
                }
            }
            ProviderKind::Codeberg => {
                if config.codeberg.username.trim().is_empty() {
                    missing.push("CODEBERG_USER");
                }
                if config.codeberg.token.is_empty() {
                    missing.push("CODEBERG_TOKEN");
                }
            }
            ProviderKind::Bitbucket => {
                if config.bitbucket.email.trim().is_empty() {
                    missing.push("BITBUCKET_EMAIL");
                }
                if config.bitbucket.workspace.trim().is_empty() {
                    missing.push("BITBUCKET_WORKSPACE");
                }
                if config.bitbucket.token.is_empty() {
                    missing.push("BITBUCKET_TOKEN");
                }
            }
        }
        missing
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Build the adapter for `kind`, running its one-time setup
pub async fn connect(kind: ProviderKind, config: &Config, client: Client) -> Result<Box<dyn Provider>> {
    let provider: Box<dyn Provider> = match kind {
        ProviderKind::Gitlab => Box::new(GitLabProvider::connect(&config.gitlab, client).await?),
        ProviderKind::Codeberg => Box::new(CodebergProvider::new(&config.codeberg, client)?),
        ProviderKind::Bitbucket => Box::new(BitbucketProvider::new(&config.bitbucket, client)?),
    };
    Ok(provider)
}

pub(crate) fn require(value: &str, setting: &str, provider: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(crate::error::MirrorError::setup(format!(
            "{} is not set (required for {})",
            setting, provider
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;

    #[test]
    fn test_missing_credentials_per_provider() {
        let mut config = Config::default();
        assert_eq!(
            ProviderKind::Gitlab.missing_credentials(&config),
            vec!["GITLAB_USER", "GITLAB_TOKEN"]
        );
        assert_eq!(
            ProviderKind::Bitbucket.missing_credentials(&config),
            vec!["BITBUCKET_EMAIL", "BITBUCKET_WORKSPACE", "BITBUCKET_TOKEN"]
        );

        config.codeberg.username = "alice".to_string();
        config.codeberg.token = Secret::new("cb-token");
        assert!(ProviderKind::Codeberg.missing_credentials(&config).is_empty());
    }

    #[test]
    fn test_provider_kind_names() {
        assert_eq!(ProviderKind::Gitlab.to_string(), "GitLab");
        let parsed: ProviderKind = serde_yaml::from_str("bitbucket").unwrap();
        assert_eq!(parsed, ProviderKind::Bitbucket);
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_credentials() {
        let config = Config::default();
        let client = Client::new();
        let err = connect(ProviderKind::Codeberg, &config, client).await.err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("codeberg.username"));
    }
}
