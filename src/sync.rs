//! Sync Engine - mirrors source repositories into one destination provider
//!
//! Every repository goes through three phases, strictly one repository at a
//! time:
//!
//! 1. mirror: bring the local bare mirror up to date
//! 2. reconcile: look the repository up on the destination and create it or fix
//!    its visibility
//! 3. push: `push --mirror` the local mirror to the destination
//!
//! A failure in any phase skips the rest of that repository only.

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::error::{MirrorError, Result};
use crate::mirror::MirrorCache;
use crate::provider::Provider;
use crate::reconcile::{self, Action};
use crate::types::{SourceRepository, Visibility, VisibilityPolicy};

/// Where a repository failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Mirror,
    Reconcile,
    Push,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Mirror => "mirror",
            Phase::Reconcile => "reconcile",
            Phase::Push => "push",
        })
    }
}

/// A repository that was skipped
#[derive(Debug, Clone)]
pub struct RepoFailure {
    pub name: String,
    pub phase: Phase,
    pub error: String,
}

/// Results from a complete sync operation
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub total: usize,
    pub succeeded: usize,
    /// Remote action taken for every repository that got past reconciliation
    pub actions: Vec<(String, Action)>,
    pub failures: Vec<RepoFailure>,
    pub duration: Duration,
}

impl SyncSummary {
    pub fn mutations(&self) -> usize {
        self.actions.iter().filter(|(_, a)| a.is_mutation()).count()
    }
}

/// Dry-run outcome for one repository
#[derive(Debug)]
pub struct PlannedAction {
    pub name: String,
    pub desired: Visibility,
    pub action: Result<Action>,
}

/// Drives one destination provider over the source repositories
pub struct SyncEngine {
    provider: Box<dyn Provider>,
    mirrors: MirrorCache,
    policy: VisibilityPolicy,
}

impl SyncEngine {
    pub fn new(provider: Box<dyn Provider>, mirrors: MirrorCache, policy: VisibilityPolicy) -> Self {
        Self {
            provider,
            mirrors,
            policy,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Mirror, reconcile and push every repository, continuing past failures
    pub async fn run(&self, repositories: &[SourceRepository]) -> SyncSummary {
        let started = Instant::now();
        let total = repositories.len();
        let mut succeeded = 0;
        let mut actions = Vec::new();
        let mut failures = Vec::new();

        info!(
            "Syncing {} repositories to {} (backup: {})",
            total,
            self.provider.name(),
            self.mirrors.backup_dir().display()
        );

        for repo in repositories {
            match self.sync_repository(repo, &mut actions).await {
                Ok(()) => {
                    succeeded += 1;
                    info!("Synced {} ({}/{})", repo.name, succeeded, total);
                }
                Err((phase, e)) => {
                    error!("Skipping {} [{}]: {}", repo.name, phase, e);
                    failures.push(RepoFailure {
                        name: repo.name.clone(),
                        phase,
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = SyncSummary {
            total,
            succeeded,
            actions,
            failures,
            duration: started.elapsed(),
        };

        info!(
            "Sync completed in {:.2}s: {}/{} repositories synced to {}, {} remote changes",
            summary.duration.as_secs_f64(),
            summary.succeeded,
            summary.total,
            self.provider.name(),
            summary.mutations()
        );

        summary
    }

    async fn sync_repository(
        &self,
        repo: &SourceRepository,
        actions: &mut Vec<(String, Action)>,
    ) -> std::result::Result<(), (Phase, MirrorError)> {
        let desired = self.policy.desired_for(repo);

        let status = self
            .mirrors
            .ensure_mirror(repo)
            .await
            .map_err(|e| (Phase::Mirror, e))?;
        debug!("Mirror of {} is fresh ({:?})", repo.name, status);

        let action = self
            .reconcile(&repo.name, desired)
            .await
            .map_err(|e| (Phase::Reconcile, e))?;
        actions.push((repo.name.clone(), action));

        let push_url = self
            .provider
            .push_url(&repo.name)
            .map_err(|e| (Phase::Push, e))?;
        info!("Pushing {} -> {} ...", repo.name, self.provider.name());
        self.mirrors
            .push_mirror(&repo.name, &push_url)
            .await
            .map_err(|e| (Phase::Push, e))
    }

    async fn reconcile(&self, name: &str, desired: Visibility) -> Result<Action> {
        let state = self.provider.lookup(name).await?;
        let action = reconcile::reconcile(&state, desired);
        debug!("{}: remote {:?}, desired {} -> {}", name, state, desired, action);
        reconcile::apply(self.provider.as_ref(), name, &state, action).await?;
        Ok(action)
    }

    /// Look up every repository and report the action a real run would take
    ///
    /// No git commands are run and nothing is changed on the destination.
    pub async fn plan(&self, repositories: &[SourceRepository]) -> Vec<PlannedAction> {
        let mut planned = Vec::with_capacity(repositories.len());
        for repo in repositories {
            let desired = self.policy.desired_for(repo);
            let action = self
                .provider
                .lookup(&repo.name)
                .await
                .map(|state| reconcile::reconcile(&state, desired));
            match &action {
                Ok(action) => info!("[dry-run] {}: {}", repo.name, action),
                Err(e) => error!("[dry-run] {}: lookup failed: {}", repo.name, e),
            }
            planned.push(PlannedAction {
                name: repo.name.clone(),
                desired,
                action,
            });
        }
        planned
    }
}

/// Restrict the run to one repository when a filter is given
pub fn select_repositories(
    repositories: Vec<SourceRepository>,
    filter: Option<&str>,
) -> Result<Vec<SourceRepository>> {
    let Some(name) = filter else {
        return Ok(repositories);
    };

    let selected: Vec<_> = repositories.into_iter().filter(|r| r.name == name).collect();
    if selected.is_empty() {
        return Err(MirrorError::setup(format!(
            "repository '{}' not found in the source listing",
            name
        )));
    }
    Ok(selected)
}
