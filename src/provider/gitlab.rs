//! GitLab destination (REST API v4)

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use url::Url;

use super::{require, Provider};
use crate::config::{GitLabConfig, Secret};
use crate::error::{MirrorError, Result};
use crate::http::{self, ApiResponse};
use crate::types::{RemoteRepo, RemoteState, Visibility};

const NAME: &str = "GitLab";

#[derive(Debug, Deserialize)]
struct Project {
    id: u64,
    visibility: Visibility,
}

#[derive(Debug, Deserialize)]
struct Group {
    id: u64,
}

pub struct GitLabProvider {
    client: Client,
    api_url: Url,
    web_url: Url,
    token: Secret,
    /// Group full path or username
    namespace: String,
    /// Set when projects are created inside a group
    group_id: Option<u64>,
}

impl GitLabProvider {
    /// Validate credentials and resolve the target group, if any
    pub async fn connect(config: &GitLabConfig, client: Client) -> Result<Self> {
        require(&config.username, "gitlab.username (GITLAB_USER)", NAME)?;
        require(config.token.expose(), "gitlab.token (GITLAB_TOKEN)", NAME)?;

        let mut provider = Self {
            client,
            api_url: http::parse_base(&config.api_url)?,
            web_url: http::parse_base(&config.web_url)?,
            token: config.token.clone(),
            namespace: config.username.trim().to_string(),
            group_id: None,
        };

        if let Some(group) = config.group.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            let id = provider.resolve_group(group).await?;
            info!("Using GitLab group {} (id {})", group, id);
            provider.namespace = group.to_string();
            provider.group_id = Some(id);
        }

        Ok(provider)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn resolve_group(&self, group: &str) -> Result<u64> {
        let url = http::endpoint(&self.api_url, &["groups", group])?;
        let response = self
            .send(self.client.get(url))
            .await
            .map_err(|e| MirrorError::setup(format!("cannot resolve GitLab group {}: {}", group, e)))?;
        if !response.is_success() {
            return Err(MirrorError::setup(format!(
                "cannot resolve GitLab group {}: HTTP {}: {}",
                group,
                response.status.as_u16(),
                response.body
            )));
        }
        let group: Group = response
            .json()
            .map_err(|e| MirrorError::setup(format!("cannot resolve GitLab group {}: {}", group, e)))?;
        Ok(group.id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse> {
        http::send(&self.client, request.header("PRIVATE-TOKEN", self.token.expose())).await
    }

    fn api_error(&self, response: ApiResponse) -> MirrorError {
        warn!("GitLab API error {}: {}", response.status.as_u16(), response.body);
        response.into_provider_error(NAME)
    }
}

#[async_trait]
impl Provider for GitLabProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn lookup(&self, name: &str) -> Result<RemoteState> {
        let full_path = format!("{}/{}", self.namespace, name);
        let url = http::endpoint(&self.api_url, &["projects", full_path.as_str()])?;
        let response = self.send(self.client.get(url)).await?;

        if response.is_not_found() {
            return Ok(RemoteState::Absent);
        }
        if !response.is_success() {
            return Err(self.api_error(response));
        }
        let project: Project = response.json()?;
        Ok(RemoteState::Present(RemoteRepo {
            id: project.id.to_string(),
            visibility: project.visibility,
        }))
    }

    async fn create(&self, name: &str, visibility: Visibility) -> Result<RemoteRepo> {
        let mut body = json!({
            "name": name,
            "path": name,
            "visibility": visibility,
            "initialize_with_readme": false,
        });
        if let Some(id) = self.group_id {
            body["namespace_id"] = json!(id);
        }

        let url = http::endpoint(&self.api_url, &["projects"])?;
        let response = self.send(self.client.post(url).json(&body)).await?;
        if !response.is_success() {
            return Err(self.api_error(response));
        }
        let project: Project = response.json()?;
        info!("Created GitLab project {}/{}", self.namespace, name);
        Ok(RemoteRepo {
            id: project.id.to_string(),
            visibility: project.visibility,
        })
    }

    async fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<()> {
        let url = http::endpoint(&self.api_url, &["projects", id])?;
        let response = self
            .send(self.client.put(url).json(&json!({ "visibility": visibility })))
            .await?;
        if !response.is_success() {
            return Err(self.api_error(response));
        }
        info!("Updated GitLab project {} visibility -> {}", id, visibility);
        Ok(())
    }

    fn push_url(&self, name: &str) -> Result<String> {
        let repo = format!("{}.git", name);
        let mut segments: Vec<&str> = self.namespace.split('/').collect();
        segments.push(&repo);
        http::credential_url(&self.web_url, "oauth2", self.token.expose(), &segments)
    }
}
