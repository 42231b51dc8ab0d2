use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A normalized post collected from one subreddit, with its top comments
/// attached after enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    pub permalink: String,
    pub author: String,
    pub score: i64,
    pub created_utc: i64,
    pub num_comments: u32,
    pub subreddit: String,
    #[serde(default)]
    pub top_comments: Vec<Comment>,
}

impl Post {
    /// Creation time as a timezone-aware timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_utc, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub author: String,
    pub score: i64,
    pub created_utc: i64,
}

/// A per-subreddit failure absorbed during a run. The run continues; the
/// failure is surfaced here instead of aborting sibling work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFailure {
    pub subreddit: String,
    pub detail: String,
}

/// Outcome of one collection run. `cancelled` marks a partial result cut
/// short by the caller; `failures` records every absorbed per-source error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResult {
    pub total: usize,
    pub counts_by_subreddit: HashMap<String, usize>,
    pub posts: Vec<Post>,
    pub cancelled: bool,
    pub failures: Vec<SourceFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_serialization_round_trip() {
        let post = Post {
            id: "abc123".to_string(),
            title: "Test Post".to_string(),
            body: "This is test content".to_string(),
            permalink: "https://reddit.com/r/test/comments/abc123".to_string(),
            author: "test_user".to_string(),
            score: 42,
            created_utc: 1640995200,
            num_comments: 7,
            subreddit: "test".to_string(),
            top_comments: vec![Comment {
                id: "c1".to_string(),
                body: "nice".to_string(),
                author: "someone".to_string(),
                score: 3,
                created_utc: 1640995300,
            }],
        };

        let serialized = serde_json::to_string(&post).unwrap();
        let deserialized: Post = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.id, post.id);
        assert_eq!(deserialized.top_comments.len(), 1);

        assert_eq!(post.created_at().timestamp(), 1640995200);
    }
}
