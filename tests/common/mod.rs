//! Common test utilities and helpers for repomirror tests
#![allow(dead_code)]

use async_trait::async_trait;
use repomirror::git::GitRunner;
use repomirror::{MirrorError, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

/// Git runner that never touches the network
///
/// Clones create the target directory so the mirror cache sees a mirror on the
/// next run. Every call is recorded.
#[derive(Default)]
pub struct RecordingGit {
    pub calls: Mutex<Vec<(&'static str, Vec<String>)>>,
}

impl RecordingGit {
    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    /// Last argument of every push, i.e. the push URLs
    pub fn push_targets(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op == "push")
            .filter_map(|(_, args)| args.last().cloned())
            .collect()
    }
}

#[async_trait]
impl GitRunner for RecordingGit {
    async fn run(&self, operation: &'static str, args: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push((operation, args.to_vec()));
        if operation == "clone" {
            let target = args.last().ok_or_else(|| MirrorError::Git {
                operation,
                detail: "missing clone target".to_string(),
            })?;
            std::fs::create_dir_all(target)?;
        }
        Ok(())
    }
}

/// GitHub `/user/repos` item
pub fn github_repo(name: &str, private: bool) -> Value {
    json!({
        "name": name,
        "full_name": format!("alice/{}", name),
        "clone_url": format!("https://github.com/alice/{}.git", name),
        "private": private,
        "fork": false
    })
}

/// Run git in `dir`, panicking with its stderr on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a working repository with one commit on `main`
pub fn init_source_repo(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    std::fs::create_dir_all(&path).expect("Failed to create source repo dir");
    git(&path, &["init", "--quiet"]);
    git(&path, &["checkout", "--quiet", "-b", "main"]);
    commit_file(&path, "README.md", "hello\n");
    path
}

pub fn commit_file(repo: &Path, file: &str, content: &str) -> String {
    std::fs::write(repo.join(file), content).expect("Failed to write file");
    git(repo, &["add", file]);
    git(repo, &["commit", "--quiet", "-m", &format!("update {}", file)]);
    git(repo, &["rev-parse", "HEAD"])
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
