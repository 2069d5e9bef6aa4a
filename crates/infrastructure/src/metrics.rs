use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use synthdns_application::ports::{MatchLabels, SynthesisMetrics, TemplateLabels};

/// Atomic counter store behind the [`SynthesisMetrics`] port. Totals
/// and per-label counts are incremented lock-free and can be read at
/// any time from the management side.
#[derive(Default)]
pub struct SynthesisMetricsRecorder {
    matches_total: AtomicU64,
    render_failures_total: AtomicU64,
    rr_failures_total: AtomicU64,
    matches: DashMap<MatchLabels, u64>,
    render_failures: DashMap<TemplateLabels, u64>,
    rr_failures: DashMap<TemplateLabels, u64>,
}

impl SynthesisMetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches_total(&self) -> u64 {
        self.matches_total.load(Ordering::Relaxed)
    }

    pub fn render_failures_total(&self) -> u64 {
        self.render_failures_total.load(Ordering::Relaxed)
    }

    pub fn rr_failures_total(&self) -> u64 {
        self.rr_failures_total.load(Ordering::Relaxed)
    }

    pub fn match_count(&self, labels: &MatchLabels) -> u64 {
        self.matches.get(labels).map(|v| *v).unwrap_or(0)
    }

    pub fn render_failure_count(&self, labels: &TemplateLabels) -> u64 {
        self.render_failures.get(labels).map(|v| *v).unwrap_or(0)
    }

    pub fn rr_failure_count(&self, labels: &TemplateLabels) -> u64 {
        self.rr_failures.get(labels).map(|v| *v).unwrap_or(0)
    }

    pub fn reset(&self) {
        self.matches_total.store(0, Ordering::Relaxed);
        self.render_failures_total.store(0, Ordering::Relaxed);
        self.rr_failures_total.store(0, Ordering::Relaxed);
        self.matches.clear();
        self.render_failures.clear();
        self.rr_failures.clear();
    }
}

impl SynthesisMetrics for SynthesisMetricsRecorder {
    fn record_match(&self, labels: &MatchLabels) {
        self.matches_total.fetch_add(1, Ordering::Relaxed);
        self.matches
            .entry(labels.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);
    }

    fn record_render_failure(&self, labels: &TemplateLabels) {
        self.render_failures_total.fetch_add(1, Ordering::Relaxed);
        self.render_failures
            .entry(labels.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);
    }

    fn record_rr_failure(&self, labels: &TemplateLabels) {
        self.rr_failures_total.fetch_add(1, Ordering::Relaxed);
        self.rr_failures
            .entry(labels.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);
    }
}
