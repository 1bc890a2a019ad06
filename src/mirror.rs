//! Mirror cache - one bare `--mirror` clone per source repository
//!
//! Lifecycle per repository:
//! - path missing: `clone --mirror` from the authenticated source URL
//! - path present: `fetch --all --prune`
//! - fetch failed: delete the directory and clone again, exactly once
//!
//! A mirror whose fetch failed is never handed back as usable; the caller only
//! gets `Ok` for a freshly fetched or freshly cloned mirror.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Secret;
use crate::error::Result;
use crate::git::{self, GitRunner};
use crate::types::SourceRepository;

/// How a mirror was brought up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorStatus {
    Cloned,
    Fetched,
    /// Fetch failed and the mirror was rebuilt from scratch
    Recloned,
}

/// Owns the backup directory and the git runner used on it
pub struct MirrorCache {
    backup_dir: PathBuf,
    git: Arc<dyn GitRunner>,
    username: String,
    token: Secret,
}

impl MirrorCache {
    /// Create the cache, making sure the backup directory exists
    pub fn new(
        backup_dir: impl Into<PathBuf>,
        git: Arc<dyn GitRunner>,
        username: impl Into<String>,
        token: Secret,
    ) -> Result<Self> {
        let backup_dir = backup_dir.into();
        std::fs::create_dir_all(&backup_dir)?;
        Ok(Self {
            backup_dir,
            git,
            username: username.into(),
            token,
        })
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// `<backup_dir>/<name>.git`
    pub fn local_path(&self, name: &str) -> PathBuf {
        self.backup_dir.join(format!("{}.git", name))
    }

    /// Bring the local mirror of `repo` to a freshly fetched state
    pub async fn ensure_mirror(&self, repo: &SourceRepository) -> Result<MirrorStatus> {
        let local_path = self.local_path(&repo.name);
        let source_url = git::authenticated_url(&repo.clone_url, &self.username, self.token.expose());

        if !local_path.exists() {
            info!("Cloning (mirror) {} ...", repo.name);
            self.clone_mirror(&source_url, &local_path).await?;
            return Ok(MirrorStatus::Cloned);
        }

        match self
            .git
            .run("fetch", &git::fetch_all_args(&local_path))
            .await
        {
            Ok(()) => Ok(MirrorStatus::Fetched),
            Err(e) => {
                warn!("Recloning {} due to fetch failure: {}", repo.name, e);
                tokio::fs::remove_dir_all(&local_path).await?;
                self.clone_mirror(&source_url, &local_path).await?;
                Ok(MirrorStatus::Recloned)
            }
        }
    }

    /// Push every ref of the local mirror to `push_url`
    pub async fn push_mirror(&self, name: &str, push_url: &str) -> Result<()> {
        let local_path = self.local_path(name);
        self.git
            .run("push", &git::push_mirror_args(&local_path, push_url))
            .await
    }

    async fn clone_mirror(&self, url: &str, local_path: &Path) -> Result<()> {
        self.git
            .run("clone", &git::clone_mirror_args(url, local_path))
            .await
    }
}
