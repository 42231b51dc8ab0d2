use crate::metrics::{MetricsCollector, RequestMetrics};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use threadscout_core::{Comment, CoreError, Post, RedditApiError};
use tracing::{debug, error, info, warn};
use url::Url;

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// Raw post record as the listing endpoint returns it. Fields without a
/// `default` are required; a child missing one of them is dropped as
/// malformed rather than collected with holes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub author: String,
    pub subreddit: String,
    pub permalink: String,
    pub created_utc: f64,
    pub score: i64,
    pub num_comments: u32,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    pub body: String,
    pub author: String,
    pub score: i64,
    pub created_utc: f64,
    #[serde(default)]
    pub stickied: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Upstream surface consumed by the collection engine. Production uses
/// [`HttpRedditApi`]; tests substitute call-counting mocks.
#[async_trait]
pub trait RedditApi: Send + Sync {
    /// Client-credentials exchange against the auth endpoint.
    async fn exchange_credentials(&self) -> Result<AccessTokenResponse, CoreError>;

    /// One page of posts for a subreddit, newest first. `after` is the bare
    /// id of the most recent item already seen.
    async fn fetch_listing(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<RedditPostData>, CoreError>;

    /// Top-sorted comments for a single post, bounded to `limit`.
    async fn fetch_comments(
        &self,
        access_token: &str,
        post_id: &str,
        limit: u32,
    ) -> Result<Vec<RedditCommentData>, CoreError>;
}

#[derive(Debug)]
pub struct HttpRedditApi {
    http_client: Client,
    client_id: String,
    client_secret: String,
    metrics: Arc<MetricsCollector>,
    user_agent: String,
}

impl HttpRedditApi {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        let metrics = Arc::new(MetricsCollector::new());

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            client_id,
            client_secret,
            metrics,
            user_agent,
        }
    }

    pub async fn get_metrics(&self) -> crate::metrics::ApiMetrics {
        self.metrics.get_metrics().await
    }

    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);
        let start_time = Instant::now();

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let outcome = request_builder.send().await;
        let response_time = start_time.elapsed();

        let (status_code, rate_limited) = match &outcome {
            Ok(response) => (
                Some(response.status().as_u16()),
                response.status().as_u16() == 429,
            ),
            Err(_) => (None, false),
        };
        self.metrics
            .record_request(RequestMetrics {
                endpoint: endpoint.to_string(),
                status_code,
                response_time,
                success: status_code.map(|s| (200..300).contains(&s)).unwrap_or(false),
                rate_limited,
            })
            .await;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        if response.status().is_success() {
            debug!("Request successful: {} {}", response.status(), endpoint);
            return Ok(response);
        }

        error!(
            "Request failed with status: {} for {}",
            response.status(),
            endpoint
        );
        Err(CoreError::RedditApi(classify_status(
            response.status().as_u16(),
            endpoint,
            response.headers().get("retry-after"),
        )))
    }
}

fn classify_status(
    status: u16,
    endpoint: &str,
    retry_after: Option<&reqwest::header::HeaderValue>,
) -> RedditApiError {
    match status {
        429 => {
            let retry_after = retry_after
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => RedditApiError::NotFound {
            resource: endpoint.to_string(),
        },
        status if status >= 500 => RedditApiError::ServerError {
            status_code: status,
        },
        status => RedditApiError::InvalidResponse {
            details: format!("unexpected status {} for {}", status, endpoint),
        },
    }
}

#[async_trait]
impl RedditApi for HttpRedditApi {
    async fn exchange_credentials(&self) -> Result<AccessTokenResponse, CoreError> {
        debug!("Exchanging client credentials for an access token");
        let response = self
            .http_client
            .post(REDDIT_AUTH_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("User-Agent", &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: format!("credential exchange rejected with status {}", status),
            }));
        }
        if !status.is_success() {
            return Err(CoreError::RedditApi(classify_status(
                status.as_u16(),
                "/api/v1/access_token",
                response.headers().get("retry-after"),
            )));
        }

        let token: AccessTokenResponse = response.json().await.map_err(|e| {
            error!("Failed to parse token response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "token response missing access_token/expires_in".to_string(),
            })
        })?;

        Ok(token)
    }

    async fn fetch_listing(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/new", subreddit);
        let limit_str = limit.to_string();
        // The listing endpoint takes fullnames, the cursor store keeps bare ids
        let after_fullname = after.map(|id| format!("t3_{}", id));

        let mut params = vec![("limit", limit_str.as_str())];
        if let Some(ref fullname) = after_fullname {
            params.push(("after", fullname.as_str()));
        }

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params))
            .await?;

        let listing: RedditListing<serde_json::Value> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("failed to parse listing for r/{}", subreddit),
            })
        })?;

        let posts = posts_from_listing(listing);
        info!("Retrieved {} posts from r/{}", posts.len(), subreddit);
        Ok(posts)
    }

    async fn fetch_comments(
        &self,
        access_token: &str,
        post_id: &str,
        limit: u32,
    ) -> Result<Vec<RedditCommentData>, CoreError> {
        let endpoint = format!("/comments/{}", post_id);
        let limit_str = limit.to_string();
        let params = [("sort", "top"), ("limit", limit_str.as_str())];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params))
            .await?;

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            error!("Failed to parse comments for {}: {}", post_id, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("failed to parse comments for post {}", post_id),
            })
        })?;

        let comments = comments_from_response(payload)?;
        debug!("Retrieved {} comments for post {}", comments.len(), post_id);
        Ok(comments)
    }
}

/// Extract post records from a listing envelope. Children that are not posts
/// or are missing required fields are skipped with a warning, never carried
/// forward as partial records.
pub(crate) fn posts_from_listing(listing: RedditListing<serde_json::Value>) -> Vec<RedditPostData> {
    let mut posts = Vec::with_capacity(listing.data.children.len());
    for child in listing.data.children {
        if child.kind != "t3" {
            debug!("Skipping non-post listing child of kind {}", child.kind);
            continue;
        }
        match serde_json::from_value::<RedditPostData>(child.data) {
            Ok(post) => posts.push(post),
            Err(e) => warn!("Skipping malformed post record: {}", e),
        }
    }
    posts
}

/// The comments endpoint answers with a two-element array; the second
/// element is the comment listing. Anything shorter is a malformed response.
pub(crate) fn comments_from_response(
    payload: serde_json::Value,
) -> Result<Vec<RedditCommentData>, CoreError> {
    let listings: Vec<RedditListing<serde_json::Value>> =
        serde_json::from_value(payload).map_err(|e| RedditApiError::InvalidResponse {
            details: format!("comments payload is not a listing pair: {}", e),
        })?;

    let comment_listing = listings
        .into_iter()
        .nth(1)
        .ok_or_else(|| RedditApiError::InvalidResponse {
            details: "comments payload missing its second element".to_string(),
        })?;

    let mut comments = Vec::with_capacity(comment_listing.data.children.len());
    for child in comment_listing.data.children {
        // "more" stubs and other non-comment children carry no comment body
        if child.kind != "t1" {
            continue;
        }
        match serde_json::from_value::<RedditCommentData>(child.data) {
            Ok(comment) => comments.push(comment),
            Err(e) => warn!("Skipping malformed comment record: {}", e),
        }
    }
    Ok(comments)
}

impl From<RedditPostData> for Post {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            body: post_data.selftext,
            permalink: absolute_permalink(&post_data.permalink),
            author: post_data.author,
            score: post_data.score,
            created_utc: post_data.created_utc as i64,
            num_comments: post_data.num_comments,
            subreddit: post_data.subreddit,
            top_comments: Vec::new(),
        }
    }
}

impl From<RedditCommentData> for Comment {
    fn from(comment_data: RedditCommentData) -> Self {
        Self {
            id: comment_data.id,
            body: comment_data.body,
            author: comment_data.author,
            score: comment_data.score,
            created_utc: comment_data.created_utc as i64,
        }
    }
}

fn absolute_permalink(permalink: &str) -> String {
    match Url::parse(REDDIT_WEB_BASE).and_then(|base| base.join(permalink)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", REDDIT_WEB_BASE, permalink),
    }
}
