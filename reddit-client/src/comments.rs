use crate::api::RedditApi;
use crate::auth::TokenManager;
use crate::cache::PassiveCache;
use crate::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use threadscout_core::{Comment, CoreError};
use tracing::{debug, warn};

/// Fetches and normalizes the top comments for a single post, backed by the
/// passive cache. Enrichment failures are absorbed: a post whose comments
/// cannot be fetched keeps an empty comment list and stays in the run.
pub struct CommentFetcher {
    api: Arc<dyn RedditApi>,
    tokens: Arc<TokenManager>,
    retry: RetryPolicy,
    cache: PassiveCache<String, Vec<Comment>>,
}

impl CommentFetcher {
    pub fn new(
        api: Arc<dyn RedditApi>,
        tokens: Arc<TokenManager>,
        retry: RetryPolicy,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            api,
            tokens,
            retry,
            cache: PassiveCache::new(cache_ttl),
        }
    }

    pub async fn fetch_top_comments(&self, post_id: &str, limit: u32) -> Vec<Comment> {
        if let Some(cached) = self.cache.get(post_id).await {
            debug!("Comment cache hit for post {}", post_id);
            return cached;
        }

        match self.fetch_fresh(post_id, limit).await {
            Ok(comments) => {
                self.cache.insert(post_id.to_string(), comments.clone()).await;
                comments
            }
            Err(e) => {
                warn!("Comment fetch for post {} failed: {}", post_id, e);
                Vec::new()
            }
        }
    }

    async fn fetch_fresh(&self, post_id: &str, limit: u32) -> Result<Vec<Comment>, CoreError> {
        let token = self.tokens.get_token().await?;

        let api = self.api.clone();
        let token_value = token.value.clone();
        let raw = self
            .retry
            .execute("fetch comments", move || {
                let api = api.clone();
                let token_value = token_value.clone();
                let post_id = post_id.to_string();
                async move { api.fetch_comments(&token_value, &post_id, limit).await }
            })
            .await?;

        let comments: Vec<Comment> = raw
            .into_iter()
            .filter(|c| !c.stickied && !c.body.is_empty())
            .map(Comment::from)
            .take(limit as usize)
            .collect();

        debug!(
            "Normalized {} top comments for post {}",
            comments.len(),
            post_id
        );
        Ok(comments)
    }
}
