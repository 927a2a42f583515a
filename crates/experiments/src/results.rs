//! Structured results produced by the A/B test engine.

use neuroads_analytics::MetricsSummary;
use neuroads_core::types::{ABTest, AdCreative, VariantLabel};
use neuroads_integrations::LaunchReceipt;
use neuroads_stats::{MetricKind, TestWinner};
use serde::{Deserialize, Serialize};

/// Outcome of creating and launching a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestLaunch {
    pub test: ABTest,
    pub variants: Vec<AdCreative>,
    pub receipts: Vec<LaunchReceipt>,
}

/// Aggregated performance for one variant label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantPerformance {
    pub label: VariantLabel,
    pub metrics: MetricsSummary,
    /// Impressions are the sample-size proxy for stop decisions.
    pub sample_size: u64,
}

/// One pairwise statistical test between two variant labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseTest {
    pub variant_a: VariantLabel,
    pub variant_b: VariantLabel,
    pub metric: MetricKind,
    pub p_value: f64,
    pub effect_size: f64,
    pub winner: TestWinner,
    pub confidence_interval: Option<(f64, f64)>,
    pub is_significant: bool,
}

/// Per-cycle statistical analysis: per-variant aggregates plus all
/// pairwise comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticalResults {
    pub variants: Vec<VariantPerformance>,
    pub pairwise_tests: Vec<PairwiseTest>,
    pub is_significant: bool,
}

/// The declared winner once a test stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerDeclaration {
    /// Resolved variant label; `None` for a tie or no clear winner.
    pub winner: Option<VariantLabel>,
    /// 1 - p_value of the decisive pairwise test; 0 with no clear winner.
    pub confidence: f64,
    /// Effect size of the decisive test as a percentage.
    pub improvement: f64,
    pub p_value: Option<f64>,
    pub metric: Option<MetricKind>,
    pub reason: String,
}

impl WinnerDeclaration {
    /// "No clear winner" is still a valid terminal result.
    pub fn no_clear_winner() -> Self {
        Self {
            winner: None,
            confidence: 0.0,
            improvement: 0.0,
            p_value: None,
            metric: None,
            reason: "No statistically significant difference found".to_string(),
        }
    }
}

/// Structured result of one analysis cycle. Failures are reported here
/// rather than propagated, so the caller can retry on the next cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Keep the test running.
    Continue {
        reason: String,
        results: StatisticalResults,
    },
    /// Test stopped and finalized this cycle.
    Completed {
        stop_reason: String,
        winner: WinnerDeclaration,
        recommendations: Vec<String>,
        results: StatisticalResults,
    },
    /// Analysis could not run yet; safe to retry with no side effects.
    Skipped { reason: String },
    /// Unexpected failure, caught at the operation boundary. The test's
    /// persisted state is unchanged.
    Failed { error: String },
}

impl AnalysisOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisOutcome::Completed { .. })
    }
}
