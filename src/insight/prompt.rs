use crate::insight::filter::{FilteredCommit, RepoSection};
use chrono::SecondsFormat;

/// Most recent commits kept per repository; older ones are silently dropped
const MAX_COMMITS_PER_REPO: usize = 20;

const REPO_SEPARATOR: &str = "\n\n====\n\n";

/// Assemble the prompt sent to the model
///
/// Deterministic: identical sections and window always yield the identical
/// string.
pub fn build_prompt(sections: &[RepoSection], past_num_days: u32) -> String {
    let repo_blocks: Vec<String> = sections.iter().map(render_section).collect();

    format!(
        "You are a senior engineer creating a development report for the past {} days.\n\
         Be concise, technical, and theme-focused. Avoid file-by-file narration unless notable.\n\
         \n\
         Tasks:\n\
         1) Summarize the period in 3-6 sentences (themes, rationale, impact).\n\
         2) Provide 2-3 resume-ready bullets (action + outcome).\n\
         3) List notable technical topics (e.g., OAuth, SSR, tests, DX).\n\
         \n\
         {}",
        past_num_days,
        repo_blocks.join(REPO_SEPARATOR)
    )
}

fn render_section(section: &RepoSection) -> String {
    let mut commits: Vec<&FilteredCommit> = section.payload.iter().collect();
    commits.sort_by(|a, b| b.date.cmp(&a.date));
    commits.truncate(MAX_COMMITS_PER_REPO);

    let commit_blocks: Vec<String> = commits.iter().map(|c| render_commit(c)).collect();

    format!("### Repo: {}\n\n{}", section.repo, commit_blocks.join("\n\n"))
}

fn render_commit(commit: &FilteredCommit) -> String {
    let file_blocks: Vec<String> = commit
        .files
        .iter()
        .map(|f| {
            let meta = format!(
                "# {} ({}, +{}/-{})",
                f.filename, f.status, f.additions, f.deletions
            );
            let diff = f.patch.as_deref().unwrap_or("(no patch available)");
            format!("{}\n{}", meta, diff)
        })
        .collect();

    format!(
        "--- COMMIT {} ---\nDate: {}\nMessage: {}\n{}",
        commit.sha,
        commit.date.to_rfc3339_opts(SecondsFormat::Secs, true),
        commit.message,
        file_blocks.join("\n\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::filter::FilteredFile;
    use chrono::{Duration, TimeZone, Utc};

    fn commit_at(sha: &str, minutes_ago: i64) -> FilteredCommit {
        FilteredCommit {
            sha: sha.to_string(),
            message: format!("message for {}", sha),
            date: Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
                - Duration::minutes(minutes_ago),
            files: vec![FilteredFile {
                filename: "src/main.rs".to_string(),
                status: "modified".to_string(),
                additions: 3,
                deletions: 1,
                patch: Some("@@ -1 +1 @@".to_string()),
            }],
        }
    }

    fn section_with(commits: Vec<FilteredCommit>) -> RepoSection {
        RepoSection {
            repo: "octocat/hello".to_string(),
            payload: commits,
        }
    }

    #[test]
    fn test_prompt_contains_header_and_blocks() {
        let sections = vec![section_with(vec![commit_at("abc", 0)])];
        let prompt = build_prompt(&sections, 7);

        assert!(prompt.contains("for the past 7 days"));
        assert!(prompt.contains("### Repo: octocat/hello"));
        assert!(prompt.contains("--- COMMIT abc ---"));
        assert!(prompt.contains("# src/main.rs (modified, +3/-1)"));
        assert!(prompt.contains("@@ -1 +1 @@"));
    }

    #[test]
    fn test_commit_cap_keeps_twenty_most_recent() {
        // 25 commits, oldest first in the payload
        let commits: Vec<FilteredCommit> = (0..25)
            .map(|i| commit_at(&format!("sha{:02}", i), (25 - i) * 10))
            .collect();
        let prompt = build_prompt(&[section_with(commits)], 7);

        // sha24 is the newest, sha05 the oldest kept, sha04 and older dropped
        assert!(prompt.contains("--- COMMIT sha24 ---"));
        assert!(prompt.contains("--- COMMIT sha05 ---"));
        assert!(!prompt.contains("--- COMMIT sha04 ---"));

        // descending order: the newest commit renders before the next one
        let newest = prompt.find("--- COMMIT sha24 ---").unwrap();
        let older = prompt.find("--- COMMIT sha23 ---").unwrap();
        assert!(newest < older);
    }

    #[test]
    fn test_missing_patch_placeholder() {
        let mut commit = commit_at("abc", 0);
        commit.files[0].patch = None;
        let prompt = build_prompt(&[section_with(vec![commit])], 7);

        assert!(prompt.contains("(no patch available)"));
    }

    #[test]
    fn test_sections_joined_with_separator() {
        let sections = vec![
            section_with(vec![commit_at("abc", 0)]),
            RepoSection {
                repo: "octocat/world".to_string(),
                payload: vec![commit_at("def", 5)],
            },
        ];
        let prompt = build_prompt(&sections, 14);

        assert!(prompt.contains("\n\n====\n\n"));
        assert!(prompt.contains("### Repo: octocat/world"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let sections = vec![section_with(vec![commit_at("abc", 0), commit_at("def", 10)])];
        assert_eq!(build_prompt(&sections, 7), build_prompt(&sections, 7));
    }
}
