use std::time::Duration;
use threadscout_core::{ConfigError, CoreError, ErrorExt, RedditApiError};

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "subreddits".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let exhausted = CoreError::TransientUpstream {
        operation: "fetch listing".to_string(),
        attempts: 3,
        last_error: "server error: 502".to_string(),
    };
    assert_eq!(exhausted.error_code(), "UPSTREAM_EXHAUSTED");

    assert_eq!(CoreError::Cancelled.error_code(), "CANCELLED");
}

#[test]
fn test_retryable_errors() {
    let retryable_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable_error.is_retryable());

    let non_retryable_error = CoreError::Config(ConfigError::MissingField {
        field: "client_id".to_string(),
    });
    assert!(!non_retryable_error.is_retryable());

    // A spent retry budget is terminal, not retryable again
    let exhausted = CoreError::TransientUpstream {
        operation: "fetch comments".to_string(),
        attempts: 3,
        last_error: "timeout".to_string(),
    };
    assert!(!exhausted.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let timeout_error = CoreError::RedditApi(RedditApiError::RequestTimeout);
    assert_eq!(timeout_error.retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(!message.is_empty());
    assert!(message.contains("authentication token is invalid"));

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "client_id".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(!message.is_empty());
    assert!(message.contains("client_id"));
}
