//! Domain types shared by the source lister, provider adapters and sync engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A repository listed on the source host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceRepository {
    pub name: String,
    pub clone_url: String,
    pub private: bool,
}

impl SourceRepository {
    pub fn new(name: impl Into<String>, clone_url: impl Into<String>, private: bool) -> Self {
        Self {
            name: name.into(),
            clone_url: clone_url.into(),
            private,
        }
    }
}

/// Repository visibility as exposed by a hosting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    /// GitLab-only; can be observed on a destination but is never desired
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
        }
    }

    pub fn from_private(private: bool) -> Self {
        if private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    /// Providers that only model a private flag treat internal as not private
    pub fn is_private(&self) -> bool {
        matches!(self, Visibility::Private)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the desired destination visibility is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityPolicy {
    /// Follow the source repository's private flag
    #[default]
    Auto,
    Public,
    Private,
}

impl VisibilityPolicy {
    pub fn desired_for(&self, repo: &SourceRepository) -> Visibility {
        match self {
            VisibilityPolicy::Auto => Visibility::from_private(repo.private),
            VisibilityPolicy::Public => Visibility::Public,
            VisibilityPolicy::Private => Visibility::Private,
        }
    }
}

impl FromStr for VisibilityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(VisibilityPolicy::Auto),
            "public" => Ok(VisibilityPolicy::Public),
            "private" => Ok(VisibilityPolicy::Private),
            other => Err(format!(
                "unknown visibility policy '{}' (expected auto, public or private)",
                other
            )),
        }
    }
}

/// A repository as it exists on a destination host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    /// Provider-specific handle used for updates (project id, repo name, slug)
    pub id: String,
    pub visibility: Visibility,
}

/// Result of a destination lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    Absent,
    Present(RemoteRepo),
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn repo(private: bool) -> SourceRepository {
        SourceRepository::new("demo", "https://github.com/alice/demo.git", private)
    }

    #[test]
    fn test_auto_policy_follows_private_flag() {
        assert_eq!(VisibilityPolicy::Auto.desired_for(&repo(true)), Visibility::Private);
        assert_eq!(VisibilityPolicy::Auto.desired_for(&repo(false)), Visibility::Public);
    }

    #[quickcheck]
    fn prop_forced_policy_ignores_private_flag(private: bool) -> bool {
        VisibilityPolicy::Public.desired_for(&repo(private)) == Visibility::Public
            && VisibilityPolicy::Private.desired_for(&repo(private)) == Visibility::Private
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("auto".parse::<VisibilityPolicy>(), Ok(VisibilityPolicy::Auto));
        assert_eq!(" Public ".parse::<VisibilityPolicy>(), Ok(VisibilityPolicy::Public));
        assert_eq!("PRIVATE".parse::<VisibilityPolicy>(), Ok(VisibilityPolicy::Private));
        assert!("internal".parse::<VisibilityPolicy>().is_err());
    }

    #[test]
    fn test_visibility_serde_is_lowercase() {
        let parsed: Visibility = serde_json::from_str("\"internal\"").unwrap();
        assert_eq!(parsed, Visibility::Internal);
        assert_eq!(serde_json::to_string(&Visibility::Private).unwrap(), "\"private\"");
        assert!(!Visibility::Internal.is_private());
    }
}
