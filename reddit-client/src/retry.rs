use std::sync::{Arc, Mutex};
use std::time::Duration;
use threadscout_core::{CoreError, ErrorExt};
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, first try included
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000, // 1 second
            max_delay_ms: 30000, // 30 seconds
            backoff_multiplier: 2.0,
            jitter_factor: 0.1, // 10% jitter
        }
    }
}

impl RetryConfig {
    /// Create retry config optimized for the Reddit API
    pub fn reddit() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000, // Start with 2 seconds for Reddit API
            max_delay_ms: 60000, // Max 1 minute delay
            backoff_multiplier: 2.0,
            jitter_factor: 0.2, // 20% jitter to prevent thundering herd
        }
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Retry after the delay the upstream asked for
    RetryWithDelay(Duration),
    /// Don't retry (for permanent failures)
    NoRetry,
}

/// Determine retry strategy based on error type
pub fn get_retry_strategy(error: &CoreError) -> RetryStrategy {
    if let Some(delay) = error.retry_after() {
        return RetryStrategy::RetryWithDelay(delay);
    }
    if error.is_retryable() {
        RetryStrategy::Retry
    } else {
        RetryStrategy::NoRetry
    }
}

/// Calculate delay with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential_delay = if attempt == 0 {
        Duration::from_millis(config.base_delay_ms)
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms.min(config.max_delay_ms))
    };

    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);
    let final_delay = exponential_delay + Duration::from_millis(jitter);

    final_delay.min(Duration::from_millis(config.max_delay_ms))
}

/// Retry counters for monitoring
#[derive(Debug, Clone, Default)]
pub struct RetryMetrics {
    pub total_retries: u64,
    pub successful_retries: u64,
    pub failed_operations: u64,
}

/// Wraps a single upstream call in a bounded-attempt loop. Transient errors
/// back off and retry; permanent errors surface immediately; an exhausted
/// budget re-raises the last error tagged as upstream exhaustion.
#[derive(Debug)]
pub struct RetryPolicy {
    config: RetryConfig,
    metrics: Arc<Mutex<RetryMetrics>>,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(Mutex::new(RetryMetrics::default())),
        }
    }

    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut last_error: Option<CoreError> = None;

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                debug!("Retry attempt {} for {}", attempt, operation_name);
            }

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        let mut metrics = self.metrics.lock().unwrap();
                        metrics.successful_retries += 1;
                        info!(
                            "Operation {} succeeded after {} retries",
                            operation_name, attempt
                        );
                    }
                    return Ok(result);
                }
                Err(err) => {
                    let strategy = get_retry_strategy(&err);
                    let attempts_left = attempt + 1 < self.config.max_attempts;

                    match strategy {
                        RetryStrategy::NoRetry => {
                            debug!(
                                "Not retrying {} due to error type: {}",
                                operation_name, err
                            );
                            self.metrics.lock().unwrap().failed_operations += 1;
                            return Err(err);
                        }
                        RetryStrategy::Retry if attempts_left => {
                            let delay = calculate_delay(attempt, &self.config);
                            info!("Retrying {} in {:?} due to: {}", operation_name, delay, err);
                            self.metrics.lock().unwrap().total_retries += 1;
                            last_error = Some(err);
                            sleep(delay).await;
                        }
                        RetryStrategy::RetryWithDelay(delay) if attempts_left => {
                            info!(
                                "Retrying {} after requested delay of {:?} due to: {}",
                                operation_name, delay, err
                            );
                            self.metrics.lock().unwrap().total_retries += 1;
                            last_error = Some(err);
                            sleep(delay).await;
                        }
                        _ => {
                            last_error = Some(err);
                        }
                    }
                }
            }
        }

        self.metrics.lock().unwrap().failed_operations += 1;
        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error during retry execution".to_string());
        error!(
            "Operation {} failed after {} attempts: {}",
            operation_name, self.config.max_attempts, last
        );

        Err(CoreError::TransientUpstream {
            operation: operation_name.to_string(),
            attempts: self.config.max_attempts,
            last_error: last,
        })
    }

    pub fn get_metrics(&self) -> RetryMetrics {
        self.metrics.lock().unwrap().clone()
    }

    pub fn reset_metrics(&self) {
        let mut metrics = self.metrics.lock().unwrap();
        *metrics = RetryMetrics::default();
    }
}
