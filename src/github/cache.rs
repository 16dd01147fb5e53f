use crate::error::Result;
use crate::github::client::GitHubClient;
use crate::github::RepoListing;
use chrono::{Duration, Utc};
use sled::Db;
use std::future::Future;
use std::path::Path;
use tracing::debug;

const LISTING_KEY: &str = "repo_listing";

/// Backing store for the cached repository listing
///
/// Decouples cache lifetime and medium from the pipeline logic.
pub trait RepoStore: Send + Sync {
    fn read(&self) -> Result<Option<RepoListing>>;
    fn write(&self, listing: &RepoListing) -> Result<()>;
}

/// Sled-backed repository listing store
pub struct SledRepoStore {
    db: Db,
}

impl SledRepoStore {
    /// Create or open the store under the given cache directory
    pub fn new(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)?;

        let db_path = cache_dir.join("repos.sled");
        let db = sled::open(db_path)?;

        Ok(Self { db })
    }
}

impl RepoStore for SledRepoStore {
    fn read(&self) -> Result<Option<RepoListing>> {
        match self.db.get(LISTING_KEY)? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn write(&self, listing: &RepoListing) -> Result<()> {
        let data = serde_json::to_vec(listing)?;
        self.db.insert(LISTING_KEY, data)?;
        self.db.flush()?;
        Ok(())
    }
}

/// Client-side repository list cache with a freshness window
///
/// Concurrent refreshes are not coalesced; the last writer wins. The cache is
/// advisory, so a lost write costs at most one extra listing call.
pub struct RepoCache {
    store: Box<dyn RepoStore>,
    ttl: Duration,
}

impl RepoCache {
    pub fn new(store: Box<dyn RepoStore>, ttl_days: i64) -> Self {
        Self {
            store,
            ttl: Duration::days(ttl_days),
        }
    }

    /// Return the cached listing if it is younger than the TTL
    pub fn fresh(&self) -> Result<Option<RepoListing>> {
        match self.store.read()? {
            Some(listing) if Utc::now() - listing.fetched_at < self.ttl => Ok(Some(listing)),
            _ => Ok(None),
        }
    }

    /// Return the repository listing, refreshing from GitHub when the cache
    /// is stale, absent, or `force` is set
    ///
    /// A failed refresh surfaces the error and leaves any existing entry
    /// untouched.
    pub async fn get(&self, client: &GitHubClient, force: bool) -> Result<RepoListing> {
        self.get_with(force, client.list_repos()).await
    }

    async fn get_with<F>(&self, force: bool, refresh: F) -> Result<RepoListing>
    where
        F: Future<Output = Result<Vec<String>>>,
    {
        if !force {
            if let Some(listing) = self.fresh()? {
                debug!(repos = listing.repos.len(), "using cached repository listing");
                return Ok(listing);
            }
        }

        let repos = refresh.await?;
        let listing = RepoListing {
            repos,
            fetched_at: Utc::now(),
        };
        self.store.write(&listing)?;

        debug!(repos = listing.repos.len(), "refreshed repository listing");
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoPulseError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct MemStore {
        listing: Mutex<Option<RepoListing>>,
    }

    impl MemStore {
        fn new(listing: Option<RepoListing>) -> Self {
            Self {
                listing: Mutex::new(listing),
            }
        }
    }

    impl RepoStore for MemStore {
        fn read(&self) -> Result<Option<RepoListing>> {
            Ok(self.listing.lock().unwrap().clone())
        }

        fn write(&self, listing: &RepoListing) -> Result<()> {
            *self.listing.lock().unwrap() = Some(listing.clone());
            Ok(())
        }
    }

    fn listing_aged(days: i64) -> RepoListing {
        RepoListing {
            repos: vec!["octocat/hello".to_string()],
            fetched_at: Utc::now() - Duration::days(days),
        }
    }

    #[test]
    fn test_sled_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledRepoStore::new(temp_dir.path()).unwrap();

        assert!(store.read().unwrap().is_none());

        let listing = listing_aged(0);
        store.write(&listing).unwrap();
        assert_eq!(store.read().unwrap(), Some(listing));
    }

    #[test]
    fn test_fresh_listing_within_ttl() {
        let cache = RepoCache::new(Box::new(MemStore::new(Some(listing_aged(6)))), 7);
        assert!(cache.fresh().unwrap().is_some());
    }

    #[test]
    fn test_stale_listing_beyond_ttl() {
        let cache = RepoCache::new(Box::new(MemStore::new(Some(listing_aged(8)))), 7);
        assert!(cache.fresh().unwrap().is_none());
    }

    #[test]
    fn test_fresh_with_empty_store() {
        let cache = RepoCache::new(Box::new(MemStore::new(None)), 7);
        assert!(cache.fresh().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_skips_network_when_fresh() {
        let cache = RepoCache::new(Box::new(MemStore::new(Some(listing_aged(1)))), 7);
        let fetches = AtomicUsize::new(0);

        let listing = cache
            .get_with(false, async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["octocat/refetched".to_string()])
            })
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 0);
        assert_eq!(listing.repos, vec!["octocat/hello".to_string()]);
    }

    #[tokio::test]
    async fn test_get_refreshes_when_stale() {
        let cache = RepoCache::new(Box::new(MemStore::new(Some(listing_aged(8)))), 7);
        let fetches = AtomicUsize::new(0);

        let listing = cache
            .get_with(false, async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["octocat/refetched".to_string()])
            })
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(listing.repos, vec!["octocat/refetched".to_string()]);
    }

    #[tokio::test]
    async fn test_get_force_always_refreshes() {
        let cache = RepoCache::new(Box::new(MemStore::new(Some(listing_aged(0)))), 7);
        let fetches = AtomicUsize::new(0);

        let listing = cache
            .get_with(true, async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["octocat/refetched".to_string()])
            })
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(listing.repos, vec!["octocat/refetched".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cache_untouched() {
        let stale = listing_aged(8);
        let store = Box::new(MemStore::new(Some(stale.clone())));
        let cache = RepoCache::new(store, 7);

        let result = cache
            .get_with(true, async {
                Err(RepoPulseError::github_api(503, "unavailable"))
            })
            .await;

        assert!(result.is_err());
        // the stale entry is still present in the backing store
        assert_eq!(cache.store.read().unwrap(), Some(stale));
    }
}
