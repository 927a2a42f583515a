//! Two-proportion z-test for comparing conversion-style rates between two
//! variants.

use crate::distributions::normal_cdf;
use serde::{Deserialize, Serialize};

/// Which side of a two-sample test won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestWinner {
    A,
    B,
    Tie,
    Inconclusive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProportionTestResult {
    pub p_value: f64,
    pub z_score: f64,
    /// Relative lift of A versus B: |p_a - p_b| / p_b (0 when p_b is 0).
    pub effect_size: f64,
    pub winner: TestWinner,
    /// 95% confidence interval for the difference in proportions.
    pub confidence_interval: (f64, f64),
    pub p_a: f64,
    pub p_b: f64,
}

impl ProportionTestResult {
    fn inconclusive(p_a: f64, p_b: f64) -> Self {
        Self {
            p_value: 1.0,
            z_score: 0.0,
            effect_size: 0.0,
            winner: TestWinner::Inconclusive,
            confidence_interval: (0.0, 0.0),
            p_a,
            p_b,
        }
    }
}

/// Two-tailed two-proportion z-test.
///
/// Degenerate inputs (either trial count zero, or zero pooled standard
/// error) return `p_value = 1.0` and an inconclusive winner rather than an
/// error.
pub fn two_proportion_z_test(
    successes_a: u64,
    trials_a: u64,
    successes_b: u64,
    trials_b: u64,
) -> ProportionTestResult {
    if trials_a == 0 || trials_b == 0 {
        return ProportionTestResult::inconclusive(0.0, 0.0);
    }

    let p_a = successes_a as f64 / trials_a as f64;
    let p_b = successes_b as f64 / trials_b as f64;

    let p_pool = (successes_a + successes_b) as f64 / (trials_a + trials_b) as f64;
    let se =
        (p_pool * (1.0 - p_pool) * (1.0 / trials_a as f64 + 1.0 / trials_b as f64)).sqrt();

    if se == 0.0 {
        return ProportionTestResult::inconclusive(p_a, p_b);
    }

    let z_score = (p_a - p_b) / se;
    let p_value = 2.0 * (1.0 - normal_cdf(z_score.abs()));

    let effect_size = if p_b > 0.0 {
        (p_a - p_b).abs() / p_b
    } else {
        0.0
    };

    let winner = if p_a > p_b {
        TestWinner::A
    } else if p_b > p_a {
        TestWinner::B
    } else {
        TestWinner::Tie
    };

    let se_diff = (p_a * (1.0 - p_a) / trials_a as f64 + p_b * (1.0 - p_b) / trials_b as f64)
        .sqrt();
    let margin = 1.96 * se_diff;
    let diff = p_a - p_b;

    ProportionTestResult {
        p_value,
        z_score,
        effect_size,
        winner,
        confidence_interval: (diff - margin, diff + margin),
        p_a,
        p_b,
    }
}
