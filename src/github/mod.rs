pub mod cache;
pub mod client;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user's repository list as fetched from GitHub, stamped for TTL checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepoListing {
    /// Full repository names (owner/name), in upstream order
    pub repos: Vec<String>,
    /// When this listing was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RepoListing {
    /// Age of this listing relative to now
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}

/// One commit within one repository
///
/// Upstream commit-list responses do not carry the repository name, so it is
/// attached here at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRef {
    /// Commit identifier
    pub sha: String,
    /// Full name of the originating repository
    pub repo_name: String,
}

/// Full commit detail with per-file diffs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    /// Commit identifier
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Authorship date
    pub author_date: DateTime<Utc>,
    /// Changed files, in upstream order
    pub files: Vec<FileChange>,
}

/// One file's changes within a commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    /// Upstream change status (added, modified, removed, renamed, ...)
    pub status: String,
    pub additions: u32,
    pub deletions: u32,
    /// Textual diff; absent for binary files or very large diffs
    pub patch: Option<String>,
}

impl FileChange {
    /// Sum of added and deleted lines
    pub fn churn(&self) -> u32 {
        self.additions + self.deletions
    }
}

/// Strip the owner from a full repository name
pub fn short_repo_name(full: &str) -> &str {
    full.split_once('/').map(|(_, name)| name).unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_repo_name() {
        assert_eq!(short_repo_name("octocat/hello-world"), "hello-world");
        assert_eq!(short_repo_name("no-owner"), "no-owner");
        assert_eq!(short_repo_name("a/b/c"), "b/c");
    }

    #[test]
    fn test_file_change_churn() {
        let file = FileChange {
            filename: "src/lib.rs".to_string(),
            status: "modified".to_string(),
            additions: 12,
            deletions: 3,
            patch: None,
        };
        assert_eq!(file.churn(), 15);
    }

    #[test]
    fn test_repo_listing_age_is_fresh_for_new_listing() {
        let listing = RepoListing {
            repos: vec!["octocat/hello".to_string()],
            fetched_at: Utc::now(),
        };
        assert!(listing.age() < chrono::Duration::minutes(1));
    }
}
