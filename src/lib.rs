//! repomirror - mirror GitHub repositories to another git host
//!
//! repomirror keeps one bare mirror clone of every GitHub repository under a
//! backup directory and pushes it to a single destination per run, creating the
//! destination repository or fixing its visibility first.
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`github`]: Source repository listing
//! - [`mirror`]: Local mirror cache on top of [`git`]
//! - [`provider`]: GitLab, Codeberg and Bitbucket adapters
//! - [`reconcile`]: Remote state reconciliation
//! - [`sync`]: Per-repository orchestration

pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod health;
pub mod http;
pub mod mirror;
pub mod provider;
pub mod reconcile;
pub mod sync;
pub mod types;

pub use config::Config;
pub use error::{MirrorError, Result};
pub use github::GitHubSource;
pub use health::HealthCheck;
pub use mirror::{MirrorCache, MirrorStatus};
pub use provider::{Provider, ProviderKind};
pub use reconcile::Action;
pub use sync::{SyncEngine, SyncSummary};
pub use types::{RemoteRepo, RemoteState, SourceRepository, Visibility, VisibilityPolicy};
