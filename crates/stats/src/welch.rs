//! Welch's unequal-variance t-test over per-variant metric summaries.
//!
//! No raw per-impression observations are retained by the data model, so
//! variance cannot be measured. It is estimated from an assumed 20%
//! coefficient of variation instead: var = (mean * 0.2)^2. This is a known
//! approximation, kept deliberately.

use crate::distributions::students_t_cdf;
use crate::proportion::TestWinner;
use serde::{Deserialize, Serialize};

/// Assumed coefficient of variation used to estimate variance from a mean.
const ASSUMED_CV: f64 = 0.2;

/// Floor for the effect-size denominator.
const EFFECT_SIZE_EPSILON: f64 = 0.001;

/// Which campaign metric a mean summarizes. Cost metrics invert the winner
/// rule: lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Ctr,
    ConversionRate,
    Cpc,
    Cpa,
    Roas,
}

impl MetricKind {
    pub fn lower_is_better(&self) -> bool {
        matches!(self, MetricKind::Cpc | MetricKind::Cpa)
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Ctr => write!(f, "ctr"),
            MetricKind::ConversionRate => write!(f, "conversion_rate"),
            MetricKind::Cpc => write!(f, "cpc"),
            MetricKind::Cpa => write!(f, "cpa"),
            MetricKind::Roas => write!(f, "roas"),
        }
    }
}

/// Summary statistics for one variant group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupSummary {
    pub mean: f64,
    pub sample_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanTestResult {
    pub p_value: f64,
    pub t_score: f64,
    pub degrees_of_freedom: f64,
    /// |mean_a - mean_b| / max(mean_b, epsilon); 0 when mean_b is 0.
    pub effect_size: f64,
    pub winner: TestWinner,
    pub mean_a: f64,
    pub mean_b: f64,
}

/// Two-tailed Welch t-test between two group summaries.
pub fn welch_t_test(a: GroupSummary, b: GroupSummary, metric: MetricKind) -> MeanTestResult {
    let mean_a = a.mean;
    let mean_b = b.mean;

    let var_a = (mean_a * ASSUMED_CV).powi(2);
    let var_b = (mean_b * ASSUMED_CV).powi(2);

    let n_a = a.sample_size.max(1) as f64;
    let n_b = b.sample_size.max(1) as f64;

    let se_diff = (var_a / n_a + var_b / n_b).sqrt();

    if se_diff == 0.0 {
        return MeanTestResult {
            p_value: 1.0,
            t_score: 0.0,
            degrees_of_freedom: 1.0,
            effect_size: 0.0,
            winner: TestWinner::Inconclusive,
            mean_a,
            mean_b,
        };
    }

    let t_score = (mean_a - mean_b) / se_diff;

    // Welch-Satterthwaite degrees of freedom, floored at 1. With n = 1 the
    // denominator degenerates; the floor keeps the CDF well defined.
    let numerator = (var_a / n_a + var_b / n_b).powi(2);
    let denominator =
        (var_a / n_a).powi(2) / (n_a - 1.0) + (var_b / n_b).powi(2) / (n_b - 1.0);
    let df = if denominator.is_finite() && denominator > 0.0 {
        (numerator / denominator).max(1.0)
    } else {
        1.0
    };

    let p_value = 2.0 * (1.0 - students_t_cdf(t_score.abs(), df));

    let effect_size = if mean_b > 0.0 {
        (mean_a - mean_b).abs() / mean_b.max(EFFECT_SIZE_EPSILON)
    } else {
        0.0
    };

    let winner = if metric.lower_is_better() {
        if mean_a < mean_b {
            TestWinner::A
        } else if mean_b < mean_a {
            TestWinner::B
        } else {
            TestWinner::Tie
        }
    } else if mean_a > mean_b {
        TestWinner::A
    } else if mean_b > mean_a {
        TestWinner::B
    } else {
        TestWinner::Tie
    };

    MeanTestResult {
        p_value,
        t_score,
        degrees_of_freedom: df,
        effect_size,
        winner,
        mean_a,
        mean_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(mean: f64, sample_size: u64) -> GroupSummary {
        GroupSummary { mean, sample_size }
    }

    #[test]
    fn identical_means_tie_with_p_value_one() {
        let result = welch_t_test(group(12.5, 500), group(12.5, 500), MetricKind::Roas);
        assert_eq!(result.winner, TestWinner::Tie);
        assert!((result.p_value - 1.0).abs() < 1e-9);
        assert_eq!(result.effect_size, 0.0);
    }

    #[test]
    fn both_means_zero_is_inconclusive() {
        let result = welch_t_test(group(0.0, 100), group(0.0, 100), MetricKind::Cpa);
        assert_eq!(result.winner, TestWinner::Inconclusive);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn cost_metrics_reward_the_lower_mean() {
        // A acquires at $5, B at $9: A wins on CPA
        let result = welch_t_test(group(5.0, 800), group(9.0, 800), MetricKind::Cpa);
        assert_eq!(result.winner, TestWinner::A);
        assert!(result.p_value < 0.05);

        // Same means on ROAS: higher wins, so B
        let result = welch_t_test(group(5.0, 800), group(9.0, 800), MetricKind::Roas);
        assert_eq!(result.winner, TestWinner::B);
    }

    #[test]
    fn effect_size_is_relative_to_b() {
        let result = welch_t_test(group(3.0, 100), group(2.0, 100), MetricKind::Ctr);
        assert!((result.effect_size - 0.5).abs() < 1e-9);
    }

    #[test]
    fn single_sample_groups_do_not_panic() {
        let result = welch_t_test(group(4.0, 1), group(6.0, 1), MetricKind::Cpc);
        assert!(result.degrees_of_freedom >= 1.0);
        assert!(result.p_value > 0.0 && result.p_value <= 1.0);
    }
}
