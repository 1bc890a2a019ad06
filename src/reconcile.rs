//! Decide and apply the remote mutation a repository needs

use std::fmt;
use tracing::info;

use crate::error::Result;
use crate::provider::Provider;
use crate::types::{RemoteState, Visibility};

/// What has to happen on the destination before pushing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NoOp,
    Create(Visibility),
    UpdateVisibility(Visibility),
}

impl Action {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::NoOp)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoOp => f.write_str("no-op"),
            Action::Create(v) => write!(f, "create ({})", v),
            Action::UpdateVisibility(v) => write!(f, "update visibility to {}", v),
        }
    }
}

/// Pure decision from the observed remote state and the desired visibility
pub fn reconcile(state: &RemoteState, desired: Visibility) -> Action {
    match state {
        RemoteState::Absent => Action::Create(desired),
        RemoteState::Present(remote) if remote.visibility == desired => Action::NoOp,
        RemoteState::Present(_) => Action::UpdateVisibility(desired),
    }
}

/// Execute `action` for repository `name` against `provider`
pub async fn apply(provider: &dyn Provider, name: &str, state: &RemoteState, action: Action) -> Result<()> {
    match (action, state) {
        (Action::NoOp, _) => Ok(()),
        (Action::Create(visibility), _) => {
            info!("Creating {} repository {} ({})", provider.name(), name, visibility);
            provider.create(name, visibility).await?;
            Ok(())
        }
        (Action::UpdateVisibility(visibility), RemoteState::Present(remote)) => {
            info!(
                "Updating {} visibility of {}: {} -> {}",
                provider.name(),
                name,
                remote.visibility,
                visibility
            );
            provider.update_visibility(&remote.id, visibility).await
        }
        // An update without a remote handle cannot be issued; treat as a create
        (Action::UpdateVisibility(visibility), RemoteState::Absent) => {
            provider.create(name, visibility).await?;
            Ok(())
        }
    }
}
