use crate::error::{RepoPulseError, Result};
use crate::github::{CommitDetail, CommitRef, FileChange};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const REPOS_PER_PAGE: u32 = 100;

/// GitHub REST API client
pub struct GitHubClient {
    client: Client,
    token: String,
}

impl GitHubClient {
    /// Create a new GitHub API client
    pub fn new(token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("repo-pulse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, token })
    }

    /// List full names of the authenticated user's repositories
    pub async fn list_repos(&self) -> Result<Vec<String>> {
        let url = format!(
            "{}/user/repos?per_page={}",
            GITHUB_API_URL, REPOS_PER_PAGE
        );
        debug!(%url, "listing repositories");

        let response = self.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let repos: Vec<RepoRecord> = response.json().await?;
        Ok(repos.into_iter().map(|r| r.full_name).collect())
    }

    /// Commits in a repository authored at or after `since`
    ///
    /// Each returned ref is tagged with the repository name; the upstream
    /// response does not carry it.
    pub async fn fetch_commits(
        &self,
        repo_name: &str,
        since: &DateTime<Utc>,
    ) -> Result<Vec<CommitRef>> {
        let url = format!(
            "{}/repos/{}/commits?since={}",
            GITHUB_API_URL,
            repo_name,
            since.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        debug!(repo = repo_name, %url, "fetching commit list");

        let response = self.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let commits: Vec<CommitSummaryRecord> = response.json().await?;
        Ok(commits
            .into_iter()
            .map(|c| CommitRef {
                sha: c.sha,
                repo_name: repo_name.to_string(),
            })
            .collect())
    }

    /// Full detail for one commit, including per-file patches
    pub async fn fetch_commit_detail(&self, repo_name: &str, sha: &str) -> Result<CommitDetail> {
        let url = format!("{}/repos/{}/commits/{}", GITHUB_API_URL, repo_name, sha);
        debug!(repo = repo_name, sha, "fetching commit detail");

        let response = self.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let record: CommitRecord = response.json().await?;
        Ok(record.into_detail())
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", GITHUB_ACCEPT)
    }

    async fn api_error(response: Response) -> RepoPulseError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        RepoPulseError::github_api(status, message)
    }
}

// Wire records, reduced to the fields the pipeline consumes

#[derive(Debug, Deserialize)]
struct RepoRecord {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct CommitSummaryRecord {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitRecord {
    sha: String,
    commit: CommitBody,
    #[serde(default)]
    files: Vec<FileRecord>,
}

impl CommitRecord {
    fn into_detail(self) -> CommitDetail {
        CommitDetail {
            sha: self.sha,
            message: self.commit.message,
            author_date: self.commit.author.date,
            files: self
                .files
                .into_iter()
                .map(|f| FileChange {
                    filename: f.filename,
                    status: f.status,
                    additions: f.additions,
                    deletions: f.deletions,
                    patch: f.patch,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    message: String,
    author: CommitAuthorRecord,
}

#[derive(Debug, Deserialize)]
struct CommitAuthorRecord {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct FileRecord {
    filename: String,
    status: String,
    additions: u32,
    deletions: u32,
    patch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(GitHubClient::new("ghp_test".to_string()).is_ok());
    }

    #[test]
    fn test_commit_record_deserialization() {
        let json = r#"{
            "sha": "abc123",
            "node_id": "C_kwAAA",
            "commit": {
                "message": "Fix login redirect",
                "author": { "name": "Octo Cat", "email": "octo@example.com", "date": "2025-06-01T12:00:00Z" }
            },
            "files": [
                {
                    "filename": "src/auth.ts",
                    "status": "modified",
                    "additions": 10,
                    "deletions": 2,
                    "changes": 12,
                    "patch": "@@ -1 +1 @@"
                },
                {
                    "filename": "assets/logo.png",
                    "status": "added",
                    "additions": 0,
                    "deletions": 0,
                    "changes": 0
                }
            ]
        }"#;

        let record: CommitRecord = serde_json::from_str(json).unwrap();
        let detail = record.into_detail();

        assert_eq!(detail.sha, "abc123");
        assert_eq!(detail.message, "Fix login redirect");
        assert_eq!(detail.files.len(), 2);
        assert_eq!(detail.files[0].patch.as_deref(), Some("@@ -1 +1 @@"));
        // binary file: no patch in the upstream record
        assert!(detail.files[1].patch.is_none());
    }

    #[test]
    fn test_commit_record_without_files() {
        let json = r#"{
            "sha": "def456",
            "commit": {
                "message": "Empty merge",
                "author": { "date": "2025-06-02T08:30:00Z" }
            }
        }"#;

        let record: CommitRecord = serde_json::from_str(json).unwrap();
        let detail = record.into_detail();
        assert!(detail.files.is_empty());
    }

    #[test]
    fn test_repo_record_deserialization() {
        let json = r#"[{"full_name": "octocat/hello"}, {"full_name": "octocat/world"}]"#;
        let records: Vec<RepoRecord> = serde_json::from_str(json).unwrap();
        let names: Vec<String> = records.into_iter().map(|r| r.full_name).collect();
        assert_eq!(names, vec!["octocat/hello", "octocat/world"]);
    }
}
