pub mod api;
pub mod auth;
pub mod cache;
pub mod collector;
pub mod comments;
pub mod cursor;
pub mod dedupe;
pub mod filter;
pub mod metrics;
pub mod retry;


pub use api::{HttpRedditApi, RedditApi};
pub use auth::{AccessToken, TokenManager};
pub use cache::PassiveCache;
pub use collector::{Collector, CollectorConfig};
pub use comments::CommentFetcher;
pub use cursor::PaginationCursorStore;
pub use filter::{QualityConfig, QualityFilter};
pub use retry::{RetryConfig, RetryPolicy};
