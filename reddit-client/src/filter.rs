use crate::api::RedditPostData;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Thresholds for the quality predicate. Tunable configuration rather than
/// constants so deployments can loosen or tighten without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub min_score: i64,
    pub min_comments: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_score: 10,
            min_comments: 5,
        }
    }
}

impl QualityConfig {
    /// Looser thresholds used by the ad-hoc search path.
    pub fn relaxed() -> Self {
        Self {
            min_score: 5,
            min_comments: 5,
        }
    }
}

/// Pure predicate deciding whether a raw post is worth collecting.
#[derive(Debug, Clone, Default)]
pub struct QualityFilter {
    config: QualityConfig,
}

impl QualityFilter {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn accepts(&self, post: &RedditPostData) -> bool {
        let accepted = post.score > self.config.min_score
            && post.num_comments > self.config.min_comments
            && !post.removed
            && !post.deleted
            && !post.selftext.is_empty();
        trace!(
            "Quality filter {} post {} (score={}, comments={})",
            if accepted { "accepted" } else { "rejected" },
            post.id,
            post.score,
            post.num_comments
        );
        accepted
    }
}
