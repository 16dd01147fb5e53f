use crate::cli::MAX_SELECTED_REPOS;
use crate::config::Config;
use crate::error::{RepoPulseError, Result};
use crate::github::cache::{RepoCache, SledRepoStore};
use crate::github::client::GitHubClient;
use crate::github::{short_repo_name, CommitDetail, RepoListing};
use crate::insight::filter::{PayloadFilter, RepoSection};
use crate::insight::openai::{compute_cost, OpenAiClient};
use crate::insight::prompt::build_prompt;
use crate::insight::store::InsightStore;
use crate::insight::{GenerationOutcome, Insight};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Coordinates the insight generation pipeline
///
/// Repo listing (cached) -> commit discovery -> commit detail fan-out ->
/// payload filtering -> prompt -> model call -> persistence.
pub struct Orchestrator {
    config: Config,
    github: GitHubClient,
    openai: OpenAiClient,
    repo_cache: RepoCache,
    store: InsightStore,
    filter: PayloadFilter,
}

impl Orchestrator {
    /// Create a new orchestrator from validated configuration
    pub fn new(config: Config) -> Result<Self> {
        let github = GitHubClient::new(config.get_github_token()?)?;
        let openai =
            OpenAiClient::new(config.get_openai_api_key()?)?.with_model(config.model.clone());

        let repo_store = SledRepoStore::new(&config.cache_dir()?)?;
        let repo_cache = RepoCache::new(Box::new(repo_store), config.repo_cache_ttl_days);

        let store = InsightStore::new(&config.data_dir()?)?;
        let filter = PayloadFilter::new()?;

        Ok(Self {
            config,
            github,
            openai,
            repo_cache,
            store,
            filter,
        })
    }

    /// The user's repositories, served from the cache unless stale or forced
    pub async fn list_repos(&self, force: bool) -> Result<RepoListing> {
        self.repo_cache.get(&self.github, force).await
    }

    /// Run the whole pipeline for the selected repositories
    ///
    /// Suspends until every fetch, the filtering, and the model call
    /// complete; returns one aggregate outcome or one error.
    pub async fn generate(&self, repos: &[String], past_num_days: u32) -> Result<GenerationOutcome> {
        if repos.is_empty() {
            return Err(RepoPulseError::validation("no repositories selected"));
        }
        if repos.len() > MAX_SELECTED_REPOS {
            return Err(RepoPulseError::validation(format!(
                "at most {} repositories per run",
                MAX_SELECTED_REPOS
            )));
        }
        if past_num_days == 0 {
            return Err(RepoPulseError::validation(
                "time window must cover at least one day",
            ));
        }

        let since = Utc::now() - Duration::days(past_num_days as i64);

        let sections = self.collect_sections(repos, &since).await;
        let outcome = self.generate_insight(&sections, since, past_num_days).await?;

        match outcome {
            GenerationOutcome::Generated(insight) => {
                let stored = self.store.save(insight)?;
                Ok(GenerationOutcome::Generated(stored))
            }
            empty => Ok(empty),
        }
    }

    /// Discover commits per repository, fetch their details, and filter
    ///
    /// Failures are isolated per repository and per commit: a failing unit is
    /// logged and skipped, and its siblings proceed.
    async fn collect_sections(&self, repos: &[String], since: &DateTime<Utc>) -> Vec<RepoSection> {
        // commit discovery, concurrent across the selected repositories
        let discoveries = join_all(
            repos
                .iter()
                .map(|repo| async move { (repo.as_str(), self.github.fetch_commits(repo, since).await) }),
        )
        .await;

        let mut refs = Vec::new();
        for (repo, result) in discoveries {
            match result {
                Ok(commits) if commits.is_empty() => {
                    debug!(repo, "no commits in window");
                }
                Ok(commits) => refs.extend(commits),
                Err(e) => {
                    warn!(repo, error = %e, "skipping repository: commit discovery failed");
                }
            }
        }

        // detail fetches for all commits of all repositories, bounded fan-out
        let details: Vec<(String, Result<CommitDetail>)> = stream::iter(refs)
            .map(|commit| async move {
                let result = self
                    .github
                    .fetch_commit_detail(&commit.repo_name, &commit.sha)
                    .await;
                (commit.repo_name, result)
            })
            .buffer_unordered(self.config.max_concurrent_requests)
            .collect()
            .await;

        let mut by_repo: HashMap<String, Vec<CommitDetail>> = HashMap::new();
        for (repo, result) in details {
            match result {
                Ok(detail) => by_repo.entry(repo).or_default().push(detail),
                Err(e) => {
                    warn!(repo, error = %e, "skipping commit: detail fetch failed");
                }
            }
        }

        // sections in selection order; empty ones are dropped by the filter
        repos
            .iter()
            .filter_map(|repo| {
                by_repo
                    .get(repo)
                    .and_then(|commits| self.filter.build_section(repo, commits))
            })
            .collect()
    }

    /// Build the prompt, call the model, and shape the result
    ///
    /// Empty input maps to `GenerationOutcome::Empty` before any model call.
    async fn generate_insight(
        &self,
        sections: &[RepoSection],
        since: DateTime<Utc>,
        past_num_days: u32,
    ) -> Result<GenerationOutcome> {
        if sections.is_empty() {
            return Ok(GenerationOutcome::Empty);
        }

        let prompt = build_prompt(sections, past_num_days);
        let completion = self.openai.complete(prompt).await?;

        let cost_usd = compute_cost(&completion.usage);
        let repos = sections
            .iter()
            .map(|s| short_repo_name(&s.repo).to_string())
            .collect();

        Ok(GenerationOutcome::Generated(Insight {
            id: String::new(),
            content: completion.content,
            usage: completion.usage,
            cost_usd,
            model: self.openai.model().to_string(),
            repos,
            since_iso: since,
            created_at: Utc::now(),
        }))
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_orchestrator(temp_dir: &TempDir) -> Orchestrator {
        let config = Config {
            github_token: Some("ghp_test".to_string()),
            openai_api_key: Some("sk-test".to_string()),
            cache_dir: Some(temp_dir.path().join("cache")),
            data_dir: Some(temp_dir.path().join("data")),
            ..Config::default()
        };
        Orchestrator::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_selection() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(&temp_dir);

        let result = orchestrator.generate(&[], 7).await;
        assert!(matches!(result, Err(RepoPulseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_generate_rejects_too_many_repos() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(&temp_dir);

        let repos: Vec<String> = (0..4).map(|i| format!("octocat/repo{}", i)).collect();
        let result = orchestrator.generate(&repos, 7).await;
        assert!(matches!(result, Err(RepoPulseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_generate_rejects_zero_window() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(&temp_dir);

        let result = orchestrator
            .generate(&["octocat/hello".to_string()], 0)
            .await;
        assert!(matches!(result, Err(RepoPulseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_sections_yield_empty_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = test_orchestrator(&temp_dir);

        let outcome = orchestrator
            .generate_insight(&[], Utc::now(), 7)
            .await
            .unwrap();
        assert!(matches!(outcome, GenerationOutcome::Empty));
    }
}
