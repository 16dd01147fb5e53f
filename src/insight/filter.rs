use crate::error::Result;
use crate::github::CommitDetail;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

/// Path substrings that mark a file as noise; matched case-insensitively
const NOISE_SUBSTRINGS: &[&str] = &[
    "node_modules/",
    "dist/",
    "build/",
    ".next/",
    "coverage/",
    ".turbo/",
    ".vercel/",
    "public/",
    ".map",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    ".min.js",
    ".min.css",
    ".svg",
    ".png",
    ".jpg",
    ".jpeg",
    ".gif",
    ".webp",
];

/// Files with more churn than this are dropped regardless of extension
const MAX_FILE_CHURN: u32 = 2000;

/// JSON files are only kept at or below this churn
const MAX_JSON_CHURN: u32 = 50;

/// Patch text is cut at this many characters
const MAX_PATCH_CHARS: usize = 4000;

const TRUNCATION_MARKER: &str = "\n...[truncated]";

/// One file that survived filtering
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilteredFile {
    pub filename: String,
    pub status: String,
    pub additions: u32,
    pub deletions: u32,
    /// Truncated patch text; `None` when upstream supplied no patch
    pub patch: Option<String>,
}

/// One commit with at least one surviving file
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilteredCommit {
    pub sha: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub files: Vec<FilteredFile>,
}

/// A repository's filtered commits, ready for prompt construction
///
/// Never constructed with an empty payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RepoSection {
    /// Full repository name (owner/name)
    pub repo: String,
    pub payload: Vec<FilteredCommit>,
}

/// Reduces raw commit details to a bounded, relevance-filtered payload
///
/// A pure function of its input: the same commits always produce the same
/// sections.
pub struct PayloadFilter {
    code_ext: Regex,
    test_file: Regex,
    small_config: Regex,
}

impl PayloadFilter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            code_ext: Regex::new(
                r"(?i)\.(ts|tsx|js|jsx|mjs|cjs|py|go|rb|java|cs|cpp|c|rs|kt|php|sh|sql|mdx?)$",
            )?,
            test_file: Regex::new(r"(?i)\.(test|spec)\.(ts|tsx|js|jsx)$")?,
            small_config: Regex::new(r"(?i)(tsconfig\.json|eslint|prettier|vite\.config|next\.config)")?,
        })
    }

    /// Build a repository section from raw commit details
    ///
    /// Returns `None` when no commit keeps at least one file.
    pub fn build_section(&self, repo_name: &str, commits: &[CommitDetail]) -> Option<RepoSection> {
        let payload: Vec<FilteredCommit> = commits
            .iter()
            .filter_map(|commit| self.filter_commit(commit))
            .collect();

        if payload.is_empty() {
            None
        } else {
            Some(RepoSection {
                repo: repo_name.to_string(),
                payload,
            })
        }
    }

    fn filter_commit(&self, commit: &CommitDetail) -> Option<FilteredCommit> {
        let files: Vec<FilteredFile> = commit
            .files
            .iter()
            .filter(|f| self.is_interesting(&f.filename, f.churn()))
            .map(|f| FilteredFile {
                filename: f.filename.clone(),
                status: f.status.clone(),
                additions: f.additions,
                deletions: f.deletions,
                patch: f.patch.as_deref().map(truncate_patch),
            })
            .collect();

        if files.is_empty() {
            return None;
        }

        Some(FilteredCommit {
            sha: commit.sha.clone(),
            message: commit.message.clone(),
            date: commit.author_date,
            files,
        })
    }

    /// Whether a file is worth showing to the model
    pub fn is_interesting(&self, filename: &str, churn: u32) -> bool {
        let lower = filename.to_lowercase();

        if is_noise_file(&lower) {
            return false;
        }
        if churn > MAX_FILE_CHURN {
            return false;
        }
        if self.test_file.is_match(filename) {
            return true;
        }
        if self.small_config.is_match(filename) {
            return true;
        }
        if self.code_ext.is_match(filename) {
            return true;
        }
        // tiny JSON changes (e.g. app settings) are still informative
        if lower.ends_with(".json") && churn <= MAX_JSON_CHURN {
            return true;
        }

        false
    }
}

fn is_noise_file(filename_lower: &str) -> bool {
    NOISE_SUBSTRINGS.iter().any(|p| filename_lower.contains(p))
}

/// Cut a patch at the character ceiling, appending a truncation marker
fn truncate_patch(patch: &str) -> String {
    match patch.char_indices().nth(MAX_PATCH_CHARS) {
        Some((idx, _)) => format!("{}{}", &patch[..idx], TRUNCATION_MARKER),
        None => patch.to_string(),
    }
}
