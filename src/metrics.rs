//! Performance metrics and statistics tracking for the assessment service.

use crate::types::readings::Domain;
use crate::types::report::NarrativeStatus;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for service performance
pub struct ServiceMetrics {
    /// Total assessments completed
    pub assessments_processed: AtomicU64,
    /// Assessments that ended in an error
    pub assessments_failed: AtomicU64,
    pub narratives_generated: AtomicU64,
    pub narratives_unavailable: AtomicU64,
    pub narratives_disabled: AtomicU64,
    /// Assessments by category
    categories: RwLock<HashMap<String, u64>>,
    /// End-to-end processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Model inference times (in microseconds)
    model_times: RwLock<HashMap<Domain, Vec<u64>>>,
    /// EQS distribution buckets (0-10, 10-20, ..., 90-100)
    eqs_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            assessments_processed: AtomicU64::new(0),
            assessments_failed: AtomicU64::new(0),
            narratives_generated: AtomicU64::new(0),
            narratives_unavailable: AtomicU64::new(0),
            narratives_disabled: AtomicU64::new(0),
            categories: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            model_times: RwLock::new(HashMap::new()),
            eqs_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed assessment
    pub fn record_assessment(&self, processing_time: Duration, eqs: f64, category: &str) {
        self.assessments_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (eqs / 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.eqs_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut categories) = self.categories.write() {
            *categories.entry(category.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a failed assessment
    pub fn record_failure(&self) {
        self.assessments_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record model inference time
    pub fn record_model_time(&self, domain: Domain, duration: Duration) {
        if let Ok(mut times) = self.model_times.write() {
            let model_times = times.entry(domain).or_default();
            model_times.push(duration.as_micros() as u64);
            // Keep only last 1000 per model
            if model_times.len() > 1000 {
                model_times.drain(0..500);
            }
        }
    }

    /// Record the narrative outcome of an assessment
    pub fn record_narrative(&self, status: NarrativeStatus) {
        let counter = match status {
            NarrativeStatus::Generated => &self.narratives_generated,
            NarrativeStatus::Unavailable => &self.narratives_unavailable,
            NarrativeStatus::Disabled => &self.narratives_disabled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        match self.processing_times.read() {
            Ok(times) => ProcessingStats::from_samples(&times),
            Err(_) => ProcessingStats::default(),
        }
    }

    /// Get per-domain model stats
    pub fn get_model_stats(&self) -> HashMap<Domain, ProcessingStats> {
        let Ok(times) = self.model_times.read() else {
            return HashMap::new();
        };

        times
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(&domain, samples)| (domain, ProcessingStats::from_samples(samples)))
            .collect()
    }

    /// Get current throughput (assessments per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.assessments_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get EQS distribution
    pub fn get_eqs_distribution(&self) -> [u64; 10] {
        self.eqs_buckets.read().map(|b| *b).unwrap_or_default()
    }

    /// Get assessments by category
    pub fn get_categories(&self) -> HashMap<String, u64> {
        self.categories
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Point-in-time view of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            assessments_processed: self.assessments_processed.load(Ordering::Relaxed),
            assessments_failed: self.assessments_failed.load(Ordering::Relaxed),
            narratives_generated: self.narratives_generated.load(Ordering::Relaxed),
            narratives_unavailable: self.narratives_unavailable.load(Ordering::Relaxed),
            narratives_disabled: self.narratives_disabled.load(Ordering::Relaxed),
            throughput_per_sec: self.get_throughput(),
            processing: self.get_processing_stats(),
            models: self
                .get_model_stats()
                .into_iter()
                .map(|(domain, stats)| (domain.to_string(), stats))
                .collect(),
            categories: self.get_categories(),
            eqs_distribution: self.get_eqs_distribution(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let failure_rate = {
            let total = snapshot.assessments_processed + snapshot.assessments_failed;
            if total > 0 {
                (snapshot.assessments_failed as f64 / total as f64) * 100.0
            } else {
                0.0
            }
        };

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║         ENVIRONMENTAL QUALITY SERVICE - METRICS SUMMARY      ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Assessments: {:>8}  │  Throughput: {:>6.1} req/s            ║",
            snapshot.assessments_processed, snapshot.throughput_per_sec
        );
        info!(
            "║ Failures:    {:>8}  │  Failure Rate: {:>5.1}%               ║",
            snapshot.assessments_failed, failure_rate
        );
        info!(
            "║ Narratives:  generated={} unavailable={} disabled={}",
            snapshot.narratives_generated,
            snapshot.narratives_unavailable,
            snapshot.narratives_disabled
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>6} p50={:>6} p95={:>6} p99={:>6} ║",
            snapshot.processing.mean_us,
            snapshot.processing.p50_us,
            snapshot.processing.p95_us,
            snapshot.processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Categories:                                                  ║");
        for (category, count) in &snapshot.categories {
            let pct = if snapshot.assessments_processed > 0 {
                (*count as f64 / snapshot.assessments_processed as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)", category, count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ EQS Distribution:                                            ║");
        let total: u64 = snapshot.eqs_distribution.iter().sum();
        for (i, &count) in snapshot.eqs_distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:>3}-{:<3}: {:>6} ({:>5.1}%) {}",
                i * 10,
                (i + 1) * 10,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        if !snapshot.models.is_empty() {
            info!("Model Inference Times (μs):");
            for (domain, stats) in &snapshot.models {
                info!(
                    "  {}: mean={} p50={} p99={} (calls={})",
                    domain, stats.mean_us, stats.p50_us, stats.p99_us, stats.count
                );
            }
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics over recorded samples
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl ProcessingStats {
    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        Self {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }
}

/// Serializable metrics view served by the API
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub assessments_processed: u64,
    pub assessments_failed: u64,
    pub narratives_generated: u64,
    pub narratives_unavailable: u64,
    pub narratives_disabled: u64,
    pub throughput_per_sec: f64,
    pub processing: ProcessingStats,
    pub models: HashMap<String, ProcessingStats>,
    pub categories: HashMap<String, u64>,
    pub eqs_distribution: [u64; 10],
    pub uptime_secs: u64,
}

/// Periodic metrics reporter that logs summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
