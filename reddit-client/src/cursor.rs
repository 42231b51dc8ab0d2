use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Per-subreddit high-water mark: the id of the most recent post seen in the
/// last successful listing. Consulted before building a listing request and
/// advanced only after a non-empty successful response, so it moves forward
/// monotonically for the lifetime of the process.
#[derive(Debug, Default)]
pub struct PaginationCursorStore {
    cursors: RwLock<HashMap<String, String>>,
}

impl PaginationCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, subreddit: &str) -> Option<String> {
        self.cursors.read().await.get(subreddit).cloned()
    }

    pub async fn advance(&self, subreddit: &str, post_id: &str) {
        debug!("Advancing cursor for r/{} to {}", subreddit, post_id);
        self.cursors
            .write()
            .await
            .insert(subreddit.to_string(), post_id.to_string());
    }

    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.cursors.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_cursor() {
        let store = PaginationCursorStore::new();
        assert_eq!(store.get("rust").await, None);
    }

    #[tokio::test]
    async fn test_advance_and_read_back() {
        let store = PaginationCursorStore::new();
        store.advance("rust", "abc123").await;
        assert_eq!(store.get("rust").await, Some("abc123".to_string()));

        store.advance("rust", "def456").await;
        assert_eq!(store.get("rust").await, Some("def456".to_string()));

        // Other subreddits are unaffected
        assert_eq!(store.get("programming").await, None);
    }
}
