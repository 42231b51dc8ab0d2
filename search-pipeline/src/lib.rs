//! Boundary to the managed search collaborators: embedding generation,
//! vector indexing, and summarization are consumed as black boxes behind
//! trait seams; this crate shapes collected posts into the records they
//! accept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threadscout_core::{CoreError, Post};
use tracing::warn;

/// Top comments carried into the index per post.
pub const MAX_INDEXED_COMMENTS: usize = 3;

/// A post flattened for embedding and indexing: `text` is the embeddable
/// surface, the rest is retrievable metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub text: String,
    pub title: String,
    pub author: String,
    pub subreddit: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub score: i64,
    pub num_comments: u32,
    pub top_comments: Vec<String>,
}

impl IndexRecord {
    pub fn from_post(post: &Post) -> Self {
        let top_comments: Vec<String> = post
            .top_comments
            .iter()
            .take(MAX_INDEXED_COMMENTS)
            .map(|c| c.body.clone())
            .collect();

        let mut text = format!("{}\n\n{}", post.title, post.body);
        for comment in &top_comments {
            text.push_str("\n\n");
            text.push_str(comment);
        }

        Self {
            id: post.id.clone(),
            text,
            title: post.title.clone(),
            author: post.author.clone(),
            subreddit: post.subreddit.clone(),
            url: post.permalink.clone(),
            created_at: post.created_at(),
            score: post.score,
            num_comments: post.num_comments,
            top_comments,
        }
    }
}

/// Per-batch outcome reported by the vector index.
#[derive(Debug, Clone, Default)]
pub struct UpsertReceipt {
    pub upserted: usize,
    pub failed: usize,
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, records: &[(IndexRecord, Vec<f32>)]) -> Result<UpsertReceipt, CoreError>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// The answer must be grounded only in the supplied records.
    async fn summarize(&self, query: &str, context: &[IndexRecord]) -> Result<String, CoreError>;
}

/// Embed and upsert a set of collected posts. A post whose embedding fails
/// is counted as failed and skipped; it never blocks the rest of the batch.
pub async fn index_posts(
    embedder: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    posts: &[Post],
) -> Result<UpsertReceipt, CoreError> {
    let mut embedded = Vec::with_capacity(posts.len());
    let mut failed = 0usize;

    for post in posts {
        let record = IndexRecord::from_post(post);
        match embedder.embed(&record.text).await {
            Ok(vector) => embedded.push((record, vector)),
            Err(e) => {
                warn!("Embedding failed for post {}: {}", post.id, e);
                failed += 1;
            }
        }
    }

    let mut receipt = index.upsert(&embedded).await?;
    receipt.failed += failed;
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadscout_core::{Comment, RedditApiError};

    fn sample_post() -> Post {
        Post {
            id: "abc123".to_string(),
            title: "Test Post".to_string(),
            body: "This is test content".to_string(),
            permalink: "https://www.reddit.com/r/test/comments/abc123/".to_string(),
            author: "test_user".to_string(),
            score: 42,
            created_utc: 1640995200,
            num_comments: 9,
            subreddit: "test".to_string(),
            top_comments: (0..5)
                .map(|i| Comment {
                    id: format!("c{}", i),
                    body: format!("comment {}", i),
                    author: "commenter".to_string(),
                    score: 5,
                    created_utc: 1640995300,
                })
                .collect(),
        }
    }

    #[test]
    fn record_bounds_the_comment_slice() {
        let record = IndexRecord::from_post(&sample_post());
        assert_eq!(record.top_comments.len(), MAX_INDEXED_COMMENTS);
        assert_eq!(record.top_comments[0], "comment 0");
    }

    #[test]
    fn record_text_flattens_title_body_and_comments() {
        let record = IndexRecord::from_post(&sample_post());
        assert!(record.text.starts_with("Test Post\n\nThis is test content"));
        assert!(record.text.contains("comment 2"));
        assert!(!record.text.contains("comment 3"));
    }

    struct FixedEmbedder {
        fail_for: Option<String>,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError> {
            if let Some(needle) = &self.fail_for {
                if text.contains(needle.as_str()) {
                    return Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                        details: "embedding rejected".to_string(),
                    }));
                }
            }
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    struct CountingIndex;

    #[async_trait]
    impl VectorIndex for CountingIndex {
        async fn upsert(
            &self,
            records: &[(IndexRecord, Vec<f32>)],
        ) -> Result<UpsertReceipt, CoreError> {
            Ok(UpsertReceipt {
                upserted: records.len(),
                failed: 0,
            })
        }
    }

    #[tokio::test]
    async fn embedding_failure_skips_only_that_post() {
        let mut failing = sample_post();
        failing.id = "bad1".to_string();
        failing.title = "Broken Post".to_string();
        let posts = vec![sample_post(), failing];

        let embedder = FixedEmbedder {
            fail_for: Some("Broken Post".to_string()),
        };
        let receipt = index_posts(&embedder, &CountingIndex, &posts).await.unwrap();

        assert_eq!(receipt.upserted, 1);
        assert_eq!(receipt.failed, 1);
    }
}
