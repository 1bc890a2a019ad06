//! Preflight checks for repomirror
//!
//! Verifies the local system and the configuration before any network or git
//! work starts. Nothing here talks to a remote host.

use std::path::Path;

use crate::config::Config;
use crate::provider::ProviderKind;

/// Result of the preflight checks for one run
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Git installation status
    pub git: CheckResult,
    /// Backup directory status
    pub backup_dir: CheckResult,
    /// GitHub credentials status
    pub source: CheckResult,
    /// Credentials for the selected destination
    pub destination: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all checks for a sync to `kind`
    pub fn run(config: &Config, kind: ProviderKind) -> Self {
        Self {
            git: Self::check_git(),
            backup_dir: Self::check_backup_dir(&config.backup_path()),
            source: Self::check_source(config),
            destination: Self::check_destination(config, kind),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.all_checks().iter().all(|(_, r)| r.passed)
    }

    /// Get list of failed checks (errors only, not warnings)
    pub fn errors(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| !r.passed && !r.is_warning)
            .collect()
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| r.is_warning)
            .collect()
    }

    /// Check git installation
    fn check_git() -> CheckResult {
        match std::process::Command::new("git").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                CheckResult::ok_with_details("Git installed", version.trim().to_string())
            }
            Ok(output) => CheckResult::error_with_details(
                "Git command failed",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ),
            Err(_) => CheckResult::error_with_details(
                "Git not found in PATH",
                "Install git: https://git-scm.com/downloads",
            ),
        }
    }

    /// The backup directory must exist or be creatable under an existing directory
    fn check_backup_dir(path: &Path) -> CheckResult {
        if path.is_dir() {
            return CheckResult::ok_with_details("Backup directory exists", path.display().to_string());
        }
        if path.exists() {
            return CheckResult::error_with_details(
                "Backup path is not a directory",
                path.display().to_string(),
            );
        }

        let ancestor = path.ancestors().skip(1).find(|p| p.exists());
        match ancestor {
            Some(parent) if parent.is_dir() && !is_read_only(parent) => CheckResult::ok_with_details(
                "Backup directory will be created",
                path.display().to_string(),
            ),
            Some(parent) => CheckResult::error_with_details(
                "Backup directory cannot be created",
                format!("{} is not a writable directory", parent.display()),
            ),
            // Relative path with no existing ancestor resolves against the working directory
            None => CheckResult::ok_with_details(
                "Backup directory will be created",
                path.display().to_string(),
            ),
        }
    }

    fn check_source(config: &Config) -> CheckResult {
        if config.github.token.is_empty() {
            return CheckResult::error_with_details(
                "GitHub token missing",
                "Set GITHUB_TOKEN or github.token in the config file",
            );
        }
        match config.github.username.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => {
                CheckResult::ok_with_details("GitHub credentials present", format!("Username: {}", user))
            }
            _ => CheckResult::warning_with_details(
                "GitHub username not set",
                "It will be resolved from the token; set GITHUB_USER to skip the lookup",
            ),
        }
    }

    fn check_destination(config: &Config, kind: ProviderKind) -> CheckResult {
        let missing = kind.missing_credentials(config);
        if missing.is_empty() {
            CheckResult::ok(format!("{} credentials present", kind))
        } else {
            CheckResult::error_with_details(
                format!("{} credentials missing", kind),
                format!("Set {}", missing.join(", ")),
            )
        }
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 4] {
        [
            ("Git Installation", &self.git),
            ("Backup Directory", &self.backup_dir),
            ("Source Credentials", &self.source),
            ("Destination Credentials", &self.destination),
        ]
    }
}

fn is_read_only(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.permissions().readonly())
        .unwrap_or(true)
}
