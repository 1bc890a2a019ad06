use octocrab::Octocrab;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{GitHubConfig, Secret};
use crate::error::{MirrorError, Result};
use crate::http::{self, ApiResponse};
use crate::types::SourceRepository;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Lists the authenticated user's repositories on GitHub
pub struct GitHubSource {
    client: Client,
    api_url: Url,
    username: String,
    token: Secret,
    per_page: u32,
    page_delay: Duration,
}

impl GitHubSource {
    /// Build a lister with an explicit username
    pub fn new(config: &GitHubConfig, username: impl Into<String>, client: Client) -> Result<Self> {
        if config.token.is_empty() {
            return Err(MirrorError::setup("github.token (GITHUB_TOKEN) is not set"));
        }
        let username = username.into();
        if username.trim().is_empty() {
            return Err(MirrorError::setup("github.username (GITHUB_USER) is not set"));
        }

        Ok(Self {
            client,
            api_url: http::parse_base(&config.api_url)?,
            username,
            token: config.token.clone(),
            per_page: config.per_page.max(1),
            page_delay: config.page_delay(),
        })
    }

    /// Build a lister, resolving the username from the token when none is configured
    pub async fn connect(config: &GitHubConfig, client: Client) -> Result<Self> {
        let username = match config.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => resolve_login(config).await?,
        };
        Self::new(config, username, client)
    }

    /// Get the username used for listing and for authenticated clone URLs
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &Secret {
        &self.token
    }

    /// List every repository the user owns or is a member of
    ///
    /// A failure on the first page is fatal. A failure on a later page ends the
    /// listing early and returns what was collected so far.
    pub async fn list_repositories(&self) -> Result<Vec<SourceRepository>> {
        debug!("Fetching repositories for GitHub user: {}", self.username);

        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let items = match self.fetch_page(page).await {
                Ok(items) => items,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(
                        "Stopping repository listing at page {} after error: {} ({} repositories collected)",
                        page,
                        e,
                        repositories.len()
                    );
                    break;
                }
            };

            if items.is_empty() {
                break;
            }

            for repo in &items {
                debug!("Found repository: {} (private: {})", repo.name, repo.private);
            }
            repositories.extend(items);

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
            page += 1;
        }

        info!("Found {} source repositories", repositories.len());
        Ok(repositories)
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<SourceRepository>> {
        let mut url = http::endpoint(&self.api_url, &["user", "repos"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("affiliation", "owner,member");

        let request = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(self.token.expose()))
            .header(header::ACCEPT, GITHUB_ACCEPT);

        let response = http::send(&self.client, request)
            .await
            .map_err(|e| listing_error(page, e))?;
        if !response.is_success() {
            warn!(
                "GitHub listing page {} returned HTTP {}: {}",
                page,
                response.status.as_u16(),
                response.body
            );
            return Err(source_error(response));
        }

        response.json().map_err(|e| listing_error(page, e))
    }
}

fn source_error(response: ApiResponse) -> MirrorError {
    MirrorError::SourceListing {
        status: response.status.as_u16(),
        body: response.body,
    }
}

/// Transport and decode failures on page 1 are as fatal as a bad status
fn listing_error(page: u32, err: MirrorError) -> MirrorError {
    if page == 1 {
        MirrorError::setup(format!("cannot list source repositories: {}", err))
    } else {
        err
    }
}

async fn resolve_login(config: &GitHubConfig) -> Result<String> {
    if config.token.is_empty() {
        return Err(MirrorError::setup("github.token (GITHUB_TOKEN) is not set"));
    }

    let octocrab = Octocrab::builder()
        .personal_token(config.token.expose().to_string())
        .base_uri(config.api_url.as_str())
        .map_err(|e| MirrorError::setup(format!("invalid github.api_url: {}", e)))?
        .build()
        .map_err(|e| MirrorError::setup(format!("failed to create GitHub client: {}", e)))?;

    let user = octocrab.current().user().await.map_err(|e| {
        MirrorError::setup(format!(
            "failed to resolve GitHub username from token, set GITHUB_USER: {}",
            e
        ))
    })?;

    info!("Authenticated as GitHub user: {}", user.login);
    Ok(user.login)
}
