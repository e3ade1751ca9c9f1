//! Sliding-window performance monitor.
//!
//! Records one entry per completed request into a bounded ring buffer and
//! summarizes the trailing window on demand. Recording is a side channel:
//! it must never fail a request, so everything here is infallible.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use metrics::counter;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::cache::lock::mutex_guard;
use crate::config::MonitorSettings;

const METRIC_SLOW_REQUEST: &str = "lesto_slow_request_total";

/// One completed request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetric {
    pub endpoint: String,
    pub method: String,
    pub duration_ms: u64,
    pub cache_hit: bool,
    pub status: u16,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(skip)]
    recorded_at: Instant,
}

/// Aggregates over the requested window.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total_requests: usize,
    pub cache_hit_rate: f64,
    pub error_rate: f64,
    pub avg_response_time_ms: f64,
}

/// Per-endpoint breakdown row.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub requests: usize,
    pub avg_time_ms: f64,
    pub error_rate: f64,
}

/// The metrics-read surface handed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub summary: MetricsSummary,
    pub endpoints: Vec<EndpointStats>,
}

/// Bounded in-memory recorder of request latencies and outcomes.
pub struct PerformanceMonitor {
    records: Mutex<VecDeque<RequestMetric>>,
    capacity: usize,
    slow_threshold: Duration,
    development: bool,
}

impl PerformanceMonitor {
    pub fn new(settings: &MonitorSettings, development: bool) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: settings.capacity.max(1),
            slow_threshold: settings.slow_threshold(),
            development,
        }
    }

    /// Append one request record, trimming the buffer past capacity.
    pub fn record_metric(
        &self,
        endpoint: &str,
        method: &str,
        duration: Duration,
        cache_hit: bool,
        status: u16,
    ) {
        let duration_ms = duration.as_millis() as u64;
        if duration > self.slow_threshold {
            counter!(METRIC_SLOW_REQUEST, "endpoint" => endpoint.to_string()).increment(1);
            if self.development {
                warn!(endpoint, method, duration_ms, "slow request");
            }
        }

        let mut records = mutex_guard(&self.records, "monitor");
        records.push_back(RequestMetric {
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            duration_ms,
            cache_hit,
            status,
            timestamp: OffsetDateTime::now_utc(),
            recorded_at: Instant::now(),
        });
        while records.len() > self.capacity {
            records.pop_front();
        }
    }

    /// Summarize the trailing `window`.
    pub fn get_metrics(&self, window: Duration) -> MetricsReport {
        let records = mutex_guard(&self.records, "monitor");
        let now = Instant::now();
        let recent: Vec<&RequestMetric> = records
            .iter()
            .filter(|record| now.duration_since(record.recorded_at) <= window)
            .collect();

        let total = recent.len();
        let summary = if total == 0 {
            MetricsSummary {
                total_requests: 0,
                cache_hit_rate: 0.0,
                error_rate: 0.0,
                avg_response_time_ms: 0.0,
            }
        } else {
            let hits = recent.iter().filter(|r| r.cache_hit).count();
            let errors = recent.iter().filter(|r| r.status >= 400).count();
            let total_ms: u64 = recent.iter().map(|r| r.duration_ms).sum();
            MetricsSummary {
                total_requests: total,
                cache_hit_rate: hits as f64 / total as f64,
                error_rate: errors as f64 / total as f64,
                avg_response_time_ms: total_ms as f64 / total as f64,
            }
        };

        let mut endpoints = Vec::new();
        for record in &recent {
            if endpoints
                .iter()
                .any(|stats: &EndpointStats| stats.endpoint == record.endpoint)
            {
                continue;
            }
            let group: Vec<&&RequestMetric> = recent
                .iter()
                .filter(|r| r.endpoint == record.endpoint)
                .collect();
            let requests = group.len();
            let group_ms: u64 = group.iter().map(|r| r.duration_ms).sum();
            let group_errors = group.iter().filter(|r| r.status >= 400).count();
            endpoints.push(EndpointStats {
                endpoint: record.endpoint.clone(),
                requests,
                avg_time_ms: group_ms as f64 / requests as f64,
                error_rate: group_errors as f64 / requests as f64,
            });
        }
        endpoints.sort_by(|a, b| {
            b.avg_time_ms
                .partial_cmp(&a.avg_time_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        MetricsReport { summary, endpoints }
    }

    /// How many records are currently retained (bounded by capacity).
    pub fn len(&self) -> usize {
        mutex_guard(&self.records, "monitor").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(capacity: usize) -> PerformanceMonitor {
        let settings = MonitorSettings {
            capacity,
            slow_request_ms: 500,
        };
        PerformanceMonitor::new(&settings, false)
    }

    #[test]
    fn records_are_trimmed_past_capacity() {
        let monitor = monitor(3);
        for i in 0..5 {
            monitor.record_metric(
                &format!("/api/e{i}"),
                "GET",
                Duration::from_millis(10),
                false,
                200,
            );
        }
        assert_eq!(monitor.len(), 3);
        // the survivors are the three most recent endpoints
        let report = monitor.get_metrics(Duration::from_secs(60));
        let names: Vec<&str> = report
            .endpoints
            .iter()
            .map(|e| e.endpoint.as_str())
            .collect();
        assert!(names.contains(&"/api/e4"));
        assert!(!names.contains(&"/api/e0"));
    }

    #[test]
    fn summary_rates_and_average() {
        let monitor = monitor(100);
        monitor.record_metric("/api/posts", "GET", Duration::from_millis(100), true, 200);
        monitor.record_metric("/api/posts", "GET", Duration::from_millis(300), false, 200);
        monitor.record_metric("/api/media", "GET", Duration::from_millis(200), false, 500);
        monitor.record_metric("/api/media", "GET", Duration::from_millis(400), true, 404);

        let report = monitor.get_metrics(Duration::from_secs(60));
        assert_eq!(report.summary.total_requests, 4);
        assert!((report.summary.cache_hit_rate - 0.5).abs() < f64::EPSILON);
        assert!((report.summary.error_rate - 0.5).abs() < f64::EPSILON);
        assert!((report.summary.avg_response_time_ms - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn endpoints_sorted_by_average_latency_descending() {
        let monitor = monitor(100);
        monitor.record_metric("/fast", "GET", Duration::from_millis(10), false, 200);
        monitor.record_metric("/slow", "GET", Duration::from_millis(900), false, 200);
        monitor.record_metric("/mid", "GET", Duration::from_millis(100), false, 200);

        let report = monitor.get_metrics(Duration::from_secs(60));
        let names: Vec<&str> = report
            .endpoints
            .iter()
            .map(|e| e.endpoint.as_str())
            .collect();
        assert_eq!(names, vec!["/slow", "/mid", "/fast"]);
    }

    #[test]
    fn per_endpoint_error_rate() {
        let monitor = monitor(100);
        monitor.record_metric("/api/posts", "GET", Duration::from_millis(10), false, 200);
        monitor.record_metric("/api/posts", "GET", Duration::from_millis(10), false, 503);

        let report = monitor.get_metrics(Duration::from_secs(60));
        let posts = report
            .endpoints
            .iter()
            .find(|e| e.endpoint == "/api/posts")
            .expect("endpoint row");
        assert_eq!(posts.requests, 2);
        assert!((posts.error_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_window_reports_zeroes() {
        let monitor = monitor(10);
        let report = monitor.get_metrics(Duration::from_secs(60));
        assert_eq!(report.summary.total_requests, 0);
        assert_eq!(report.summary.cache_hit_rate, 0.0);
        assert!(report.endpoints.is_empty());
    }

    #[test]
    fn wide_window_includes_fresh_records() {
        let monitor = monitor(10);
        monitor.record_metric("/api/posts", "GET", Duration::from_millis(5), false, 200);
        let report = monitor.get_metrics(Duration::from_secs(3600));
        assert_eq!(report.summary.total_requests, 1);
    }
}
