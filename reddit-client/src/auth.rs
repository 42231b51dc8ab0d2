use crate::api::RedditApi;
use crate::retry::RetryPolicy;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use threadscout_core::{CoreError, RedditApiError};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Application-only access credential. Replaced wholesale on refresh, never
/// mutated in place.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: SystemTime,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

/// Owns the upstream credential lifecycle. The token slot sits behind an
/// async mutex that is held across the refresh call, so concurrent callers
/// finding an absent or expired token queue on the lock and pick up the
/// fresh token instead of issuing duplicate exchanges.
pub struct TokenManager {
    api: Arc<dyn RedditApi>,
    retry: RetryPolicy,
    current: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(api: Arc<dyn RedditApi>, retry: RetryPolicy) -> Self {
        Self {
            api,
            retry,
            current: Mutex::new(None),
        }
    }

    /// Returns a token that is guaranteed unexpired at return time. A cached
    /// valid token costs no network call; otherwise one credential exchange
    /// runs (through the retry budget) and its failure is fatal.
    pub async fn get_token(&self) -> Result<AccessToken, CoreError> {
        let mut slot = self.current.lock().await;

        if let Some(token) = slot.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
            debug!("Cached access token expired, refreshing");
        } else {
            debug!("No access token yet, performing initial exchange");
        }

        let api = self.api.clone();
        let response = self
            .retry
            .execute("exchange credentials", move || {
                let api = api.clone();
                async move { api.exchange_credentials().await }
            })
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. }) => e,
                other => CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: other.to_string(),
                }),
            })?;

        let token = AccessToken {
            value: response.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(response.expires_in),
        };
        info!(
            "Obtained new access token, valid for {} seconds",
            response.expires_in
        );
        *slot = Some(token.clone());
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let now = SystemTime::now();

        let valid = AccessToken {
            value: "valid_token".to_string(),
            expires_at: now + Duration::from_secs(3600),
        };
        assert!(!valid.is_expired());

        let expired = AccessToken {
            value: "expired_token".to_string(),
            expires_at: now - Duration::from_secs(3600),
        };
        assert!(expired.is_expired());
    }
}
