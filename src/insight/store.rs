use crate::error::Result;
use crate::insight::Insight;
use sled::Db;
use std::path::Path;

/// Durable store for generated insights
///
/// Keys sort chronologically, so a recency-ordered listing is a reverse scan.
pub struct InsightStore {
    db: Db,
}

impl InsightStore {
    /// Create or open the store under the given data directory
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("insights.sled");
        let db = sled::open(db_path)?;

        Ok(Self { db })
    }

    /// Persist an insight, assigning its identifier
    pub fn save(&self, mut insight: Insight) -> Result<Insight> {
        let id = Self::generate_id(&insight);
        insight.id = id.clone();

        let data = serde_json::to_vec(&insight)?;
        self.db.insert(id.as_bytes(), data)?;
        self.db.flush()?;

        Ok(insight)
    }

    /// Stored insights, newest first
    pub fn list(&self, take: usize) -> Result<Vec<Insight>> {
        let mut insights = Vec::new();

        for item in self.db.iter().rev().take(take) {
            let (_, value) = item?;
            insights.push(serde_json::from_slice(&value)?);
        }

        Ok(insights)
    }

    /// Look up one insight by identifier
    pub fn get(&self, id: &str) -> Result<Option<Insight>> {
        match self.db.get(id.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Delete an insight; returns whether it existed
    pub fn delete(&self, id: &str) -> Result<bool> {
        let existed = self.db.remove(id.as_bytes())?.is_some();
        self.db.flush()?;
        Ok(existed)
    }

    /// Zero-padded creation millis plus a content hash; lexicographic order
    /// matches chronological order
    fn generate_id(insight: &Insight) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        insight.content.hash(&mut hasher);
        insight.repos.hash(&mut hasher);
        insight.created_at.timestamp_micros().hash(&mut hasher);

        format!(
            "{:013}-{:016x}",
            insight.created_at.timestamp_millis().max(0),
            hasher.finish()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::Usage;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn insight_aged(content: &str, minutes_ago: i64) -> Insight {
        let created_at = Utc::now() - Duration::minutes(minutes_ago);
        Insight {
            id: String::new(),
            content: content.to_string(),
            usage: Usage::default(),
            cost_usd: 0.0,
            model: "gpt-4o-mini".to_string(),
            repos: vec!["hello".to_string()],
            since_iso: created_at - Duration::days(7),
            created_at,
        }
    }

    #[test]
    fn test_save_assigns_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = InsightStore::new(temp_dir.path()).unwrap();

        let saved = store.save(insight_aged("first", 0)).unwrap();
        assert!(!saved.id.is_empty());
        assert_eq!(store.list(10).unwrap().len(), 1);
    }

    #[test]
    fn test_get_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = InsightStore::new(temp_dir.path()).unwrap();

        let saved = store.save(insight_aged("findable", 0)).unwrap();

        let loaded = store.get(&saved.id).unwrap().unwrap();
        assert_eq!(loaded.content, "findable");
        assert_eq!(loaded.id, saved.id);

        assert!(store.get("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = InsightStore::new(temp_dir.path()).unwrap();

        store.save(insight_aged("oldest", 30)).unwrap();
        store.save(insight_aged("middle", 20)).unwrap();
        store.save(insight_aged("newest", 10)).unwrap();

        let listed = store.list(2).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "newest");
        assert_eq!(listed[1].content, "middle");
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = InsightStore::new(temp_dir.path()).unwrap();

        let saved = store.save(insight_aged("doomed", 0)).unwrap();

        assert!(store.delete(&saved.id).unwrap());
        assert!(store.get(&saved.id).unwrap().is_none());
        assert!(!store.delete(&saved.id).unwrap());
    }
}
