use crate::error::*;
use std::time::Duration;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> &'static str;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        if let CoreError::RedditApi(e) = self {
            error!("Reddit API error details: {:?}", e);
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_retryable(),
            CoreError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            CoreError::TransientUpstream { .. } => false, // retry budget already spent
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after }) => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Config(e) => format!("Configuration problem: {}", e),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Serialization(_) => "Received data could not be decoded.".to_string(),
            CoreError::TransientUpstream { operation, .. } => {
                format!("Reddit kept failing while we tried to {}.", operation)
            }
            CoreError::Cancelled => "The collection run was cancelled.".to_string(),
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::Internal { .. } => "An internal error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API",
            CoreError::Config(_) => "CONFIG",
            CoreError::Network(_) => "NETWORK",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::TransientUpstream { .. } => "UPSTREAM_EXHAUSTED",
            CoreError::Cancelled => "CANCELLED",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::Internal { .. } => "INTERNAL",
        }
    }
}

impl RedditApiError {
    pub fn is_retryable(&self) -> bool {
        match self {
            RedditApiError::RateLimitExceeded { .. } => true,
            RedditApiError::ServerError { .. } => true,
            RedditApiError::RequestTimeout => true,
            // Parse failures are skipped by the caller, not retried
            RedditApiError::InvalidResponse { .. } => false,
            RedditApiError::AuthenticationFailed { .. } => false,
            RedditApiError::InvalidToken => false,
            RedditApiError::Forbidden { .. } => false,
            RedditApiError::NotFound { .. } => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { reason } => {
                format!("Reddit authentication failed: {}", reason)
            }
            RedditApiError::InvalidToken => {
                "Your Reddit authentication token is invalid. Please re-authenticate.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => {
                format!("Reddit is rate limiting us. Try again in {} seconds.", retry_after)
            }
            RedditApiError::Forbidden { resource } => {
                format!("Access to {} is forbidden.", resource)
            }
            RedditApiError::NotFound { resource } => format!("Could not find: {}", resource),
            RedditApiError::ServerError { status_code } => {
                format!("Reddit returned a server error ({}).", status_code)
            }
            RedditApiError::RequestTimeout => "The request to Reddit timed out.".to_string(),
            RedditApiError::InvalidResponse { details } => {
                format!("Reddit returned an unexpected response: {}", details)
            }
        }
    }
}
