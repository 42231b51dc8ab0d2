use crate::api::{HttpRedditApi, RedditApi};
use crate::auth::TokenManager;
use crate::cache::DEFAULT_CACHE_TTL;
use crate::comments::CommentFetcher;
use crate::cursor::PaginationCursorStore;
use crate::dedupe;
use crate::filter::{QualityConfig, QualityFilter};
use crate::retry::{RetryConfig, RetryPolicy};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use threadscout_core::{AppConfig, CollectionResult, CoreError, ErrorExt, Post, SourceFailure};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tunables for one collector instance. Delays are the rate-limiting
/// mechanism against the upstream service; there is no dynamic backpressure
/// from observed failure rate.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Subreddits fetched concurrently per batch
    pub batch_size: usize,
    /// Posts enriched with comments concurrently per sub-batch
    pub comment_batch_size: usize,
    /// Sleep between comment sub-batches
    pub comment_batch_delay: Duration,
    /// Sleep between subreddit batches
    pub batch_delay: Duration,
    /// Top comments kept per post
    pub comment_limit: u32,
    /// Freshness window of the comment cache
    pub cache_ttl: Duration,
    pub retry: RetryConfig,
    pub quality: QualityConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            comment_batch_size: 10,
            comment_batch_delay: Duration::from_secs(1),
            batch_delay: Duration::from_millis(1500),
            comment_limit: 5,
            cache_ttl: DEFAULT_CACHE_TTL,
            retry: RetryConfig::default(),
            quality: QualityConfig::default(),
        }
    }
}

/// Drives a whole collection run: batched concurrent listing fetches with
/// pagination cursors, quality filtering, comment enrichment, throttling
/// sleeps, per-source failure isolation, and final deduplication.
pub struct Collector {
    api: Arc<dyn RedditApi>,
    tokens: Arc<TokenManager>,
    comments: CommentFetcher,
    cursors: PaginationCursorStore,
    filter: QualityFilter,
    retry: RetryPolicy,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(api: Arc<dyn RedditApi>, config: CollectorConfig) -> Self {
        let tokens = Arc::new(TokenManager::new(
            api.clone(),
            RetryPolicy::new(config.retry.clone()),
        ));
        let comments = CommentFetcher::new(
            api.clone(),
            tokens.clone(),
            RetryPolicy::new(config.retry.clone()),
            config.cache_ttl,
        );

        Self {
            tokens,
            comments,
            cursors: PaginationCursorStore::new(),
            filter: QualityFilter::new(config.quality.clone()),
            retry: RetryPolicy::new(config.retry.clone()),
            api,
            config,
        }
    }

    /// Production wiring over the live HTTP API.
    pub fn with_http_api(app: &AppConfig, config: CollectorConfig) -> Self {
        let api = Arc::new(HttpRedditApi::new(
            app.client_id.clone(),
            app.client_secret.clone(),
            app.user_agent.clone(),
        ));
        Self::new(api, config)
    }

    pub async fn run(
        &self,
        subreddits: &[String],
        per_source_limit: u32,
    ) -> Result<CollectionResult, CoreError> {
        self.run_with_cancel(subreddits, per_source_limit, CancellationToken::new())
            .await
    }

    /// Like [`Collector::run`], checking the token before each batch and each
    /// comment sub-batch. In-flight requests finish; nothing new starts after
    /// cancellation, and the partial result is returned with `cancelled` set.
    pub async fn run_with_cancel(
        &self,
        subreddits: &[String],
        per_source_limit: u32,
        cancel: CancellationToken,
    ) -> Result<CollectionResult, CoreError> {
        let run_id = Uuid::new_v4();
        info!(
            "Starting collection run {} over {} subreddits",
            run_id,
            subreddits.len()
        );

        // No usable token at all is the one fatal condition
        self.tokens.get_token().await?;

        let batches: Vec<&[String]> = subreddits.chunks(self.config.batch_size.max(1)).collect();
        let batch_count = batches.len();

        let mut collected: Vec<Post> = Vec::new();
        let mut failures: Vec<SourceFailure> = Vec::new();

        for (index, batch) in batches.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    "Collection run {} cancelled before batch {}/{}",
                    run_id,
                    index + 1,
                    batch_count
                );
                break;
            }

            debug!(
                "Run {}: batch {}/{} with {} subreddits",
                run_id,
                index + 1,
                batch_count,
                batch.len()
            );

            let outcomes = join_all(
                batch
                    .iter()
                    .map(|subreddit| self.fetch_source(subreddit, per_source_limit)),
            )
            .await;

            let mut batch_posts: Vec<Post> = Vec::new();
            for (subreddit, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(posts) => batch_posts.extend(posts),
                    Err(e) => {
                        e.log_warn();
                        failures.push(SourceFailure {
                            subreddit: subreddit.clone(),
                            detail: format!("{}: {}", e.error_code(), e),
                        });
                    }
                }
            }

            self.enrich_batch(&mut batch_posts, &cancel).await;
            collected.extend(batch_posts);

            if index + 1 < batch_count && !cancel.is_cancelled() {
                self.pause(self.config.batch_delay, &cancel).await;
            }
        }

        let cancelled = cancel.is_cancelled();
        let posts = dedupe::dedupe_posts(collected);
        let counts_by_subreddit = dedupe::counts_by_subreddit(&posts);
        info!(
            "Collection run {} finished: {} unique posts, {} failed sources{}",
            run_id,
            posts.len(),
            failures.len(),
            if cancelled { " (cancelled)" } else { "" }
        );

        Ok(CollectionResult {
            total: posts.len(),
            counts_by_subreddit,
            posts,
            cancelled,
            failures,
        })
    }

    /// One subreddit listing: consult the cursor, fetch through the retry
    /// budget, advance the cursor on non-empty success, filter and map.
    async fn fetch_source(
        &self,
        subreddit: &str,
        per_source_limit: u32,
    ) -> Result<Vec<Post>, CoreError> {
        let token = self.tokens.get_token().await?;
        let after = self.cursors.get(subreddit).await;

        let api = self.api.clone();
        let token_value = token.value;
        let name = subreddit.to_string();
        let raw = self
            .retry
            .execute("fetch listing", move || {
                let api = api.clone();
                let token_value = token_value.clone();
                let name = name.clone();
                let after = after.clone();
                async move {
                    api.fetch_listing(&token_value, &name, per_source_limit, after.as_deref())
                        .await
                }
            })
            .await?;

        if let Some(first) = raw.first() {
            self.cursors.advance(subreddit, &first.id).await;
        }

        let raw_count = raw.len();
        let posts: Vec<Post> = raw
            .into_iter()
            .filter(|p| self.filter.accepts(p))
            .map(Post::from)
            .collect();
        debug!(
            "r/{}: {} of {} raw posts passed the quality filter",
            subreddit,
            posts.len(),
            raw_count
        );
        Ok(posts)
    }

    /// Attach top comments to every post of a batch, in bounded concurrent
    /// sub-batches with a throttling sleep between them.
    async fn enrich_batch(&self, posts: &mut [Post], cancel: &CancellationToken) {
        let mut first = true;
        for chunk in posts.chunks_mut(self.config.comment_batch_size.max(1)) {
            if cancel.is_cancelled() {
                warn!("Cancellation requested, skipping remaining comment enrichment");
                break;
            }
            if !first {
                self.pause(self.config.comment_batch_delay, cancel).await;
            }
            first = false;

            let results = join_all(chunk.iter().map(|post| {
                self.comments
                    .fetch_top_comments(&post.id, self.config.comment_limit)
            }))
            .await;

            for (post, comments) in chunk.iter_mut().zip(results) {
                post.top_comments = comments;
            }
        }
    }

    async fn pause(&self, duration: Duration, cancel: &CancellationToken) {
        tokio::select! {
            _ = sleep(duration) => {}
            _ = cancel.cancelled() => {
                debug!("Throttle pause interrupted by cancellation");
            }
        }
    }

    /// Current per-subreddit pagination high-water marks.
    pub async fn cursor_snapshot(&self) -> HashMap<String, String> {
        self.cursors.snapshot().await
    }

    pub fn retry_metrics(&self) -> crate::retry::RetryMetrics {
        self.retry.get_metrics()
    }
}
