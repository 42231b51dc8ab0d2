use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rate_limited_requests: u64,
    pub average_response_time: Duration,
    pub last_request_time: Option<SystemTime>,
    pub requests_by_endpoint: HashMap<String, EndpointMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointMetrics {
    pub request_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub total_response_time: Duration,
}

#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub endpoint: String,
    pub status_code: Option<u16>,
    pub response_time: Duration,
    pub success: bool,
    pub rate_limited: bool,
}

impl EndpointMetrics {
    fn new() -> Self {
        Self {
            request_count: 0,
            success_count: 0,
            error_count: 0,
            total_response_time: Duration::from_millis(0),
        }
    }

    fn update(&mut self, metrics: &RequestMetrics) {
        self.request_count += 1;
        self.total_response_time += metrics.response_time;
        if metrics.success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.request_count == 0 {
            return 0.0;
        }
        self.success_count as f64 / self.request_count as f64
    }

    pub fn average_response_time(&self) -> Duration {
        if self.request_count == 0 {
            return Duration::from_millis(0);
        }
        self.total_response_time / self.request_count as u32
    }
}

#[derive(Debug)]
pub struct MetricsCollector {
    metrics: RwLock<ApiMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: RwLock::new(ApiMetrics::default()),
        }
    }

    pub async fn record_request(&self, request: RequestMetrics) {
        let mut metrics = self.metrics.write().await;

        let previous_total = metrics.total_requests;
        metrics.total_requests += 1;
        if request.success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }
        if request.rate_limited {
            metrics.rate_limited_requests += 1;
        }

        // Running average over every request seen so far
        let total_time = metrics.average_response_time * previous_total as u32
            + request.response_time;
        metrics.average_response_time = total_time / metrics.total_requests as u32;
        metrics.last_request_time = Some(SystemTime::now());

        metrics
            .requests_by_endpoint
            .entry(request.endpoint.clone())
            .or_insert_with(EndpointMetrics::new)
            .update(&request);
    }

    pub async fn get_metrics(&self) -> ApiMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn get_endpoint_metrics(&self, endpoint: &str) -> Option<EndpointMetrics> {
        self.metrics
            .read()
            .await
            .requests_by_endpoint
            .get(endpoint)
            .cloned()
    }

    pub async fn reset_metrics(&self) {
        let mut metrics = self.metrics.write().await;
        *metrics = ApiMetrics::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request(endpoint: &str, success: bool) -> RequestMetrics {
        RequestMetrics {
            endpoint: endpoint.to_string(),
            status_code: Some(if success { 200 } else { 502 }),
            response_time: Duration::from_millis(150),
            success,
            rate_limited: false,
        }
    }

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new();
        collector.record_request(sample_request("/r/rust/new", true)).await;

        let api_metrics = collector.get_metrics().await;
        assert_eq!(api_metrics.total_requests, 1);
        assert_eq!(api_metrics.successful_requests, 1);
        assert_eq!(api_metrics.failed_requests, 0);
        assert!(api_metrics.last_request_time.is_some());
    }

    #[tokio::test]
    async fn test_endpoint_specific_metrics() {
        let collector = MetricsCollector::new();
        collector.record_request(sample_request("/r/rust/new", true)).await;
        collector.record_request(sample_request("/r/rust/new", false)).await;

        let endpoint_metrics = collector.get_endpoint_metrics("/r/rust/new").await.unwrap();
        assert_eq!(endpoint_metrics.request_count, 2);
        assert_eq!(endpoint_metrics.success_count, 1);
        assert_eq!(endpoint_metrics.success_rate(), 0.5);
        assert_eq!(
            endpoint_metrics.average_response_time(),
            Duration::from_millis(150)
        );
    }

    #[tokio::test]
    async fn test_reset() {
        let collector = MetricsCollector::new();
        collector.record_request(sample_request("/comments/abc", true)).await;
        collector.reset_metrics().await;

        let api_metrics = collector.get_metrics().await;
        assert_eq!(api_metrics.total_requests, 0);
        assert!(api_metrics.requests_by_endpoint.is_empty());
    }
}
