//! Per-ad-set scoring relative to campaign-wide averages over the
//! lookback window.

use neuroads_analytics::{MetricsSummary, RawTotals};
use neuroads_core::types::AdSet;
use serde::{Deserialize, Serialize};

/// Each ratio term is capped so one runaway ad set cannot dominate.
const RATIO_CAP: f64 = 2.0;

/// Campaign-wide average metrics over the lookback window. A zero
/// denominator yields a zero average, which zeroes the matching score term.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CampaignAverages {
    pub ctr: f64,
    pub cpc: f64,
    pub cpa: f64,
    pub roas: f64,
    pub conversion_rate: f64,
}

impl CampaignAverages {
    pub fn from_totals(totals: &RawTotals) -> Self {
        let summary = MetricsSummary::from_totals(*totals);
        Self {
            ctr: summary.ctr,
            cpc: summary.cpc,
            cpa: summary.cpa,
            roas: summary.roas,
            conversion_rate: summary.conversion_rate,
        }
    }
}

/// One ad set's scored performance for an optimization cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSetPerformance {
    pub ad_set: AdSet,
    pub metrics: MetricsSummary,
    pub performance_score: f64,
    pub efficiency_score: f64,
    pub spend_utilization: f64,
}

/// Composite performance score: ROAS 40%, conversion rate 25%, CTR 20%,
/// inverse CPA 15%, each ratio relative to the campaign average and capped
/// at 2.0. Terms whose campaign average is zero contribute nothing.
pub fn performance_score(metrics: &MetricsSummary, averages: &CampaignAverages) -> f64 {
    let mut score = 0.0;

    if averages.roas > 0.0 {
        score += (metrics.roas / averages.roas).min(RATIO_CAP) * 0.40;
    }
    if averages.conversion_rate > 0.0 {
        score += (metrics.conversion_rate / averages.conversion_rate).min(RATIO_CAP) * 0.25;
    }
    if averages.ctr > 0.0 {
        score += (metrics.ctr / averages.ctr).min(RATIO_CAP) * 0.20;
    }
    // Lower CPA is better, so the ratio is inverted
    if averages.cpa > 0.0 && metrics.cpa > 0.0 {
        score += (averages.cpa / metrics.cpa).min(RATIO_CAP) * 0.15;
    }

    score
}

/// Efficiency score: utilization band at 60% weight plus normalized ROAS
/// at 40%. Ideal utilization is 80-95% of the allocated budget.
pub fn efficiency_score(spend_utilization: f64, roas: f64) -> f64 {
    let utilization_score = if (0.8..=0.95).contains(&spend_utilization) {
        1.0
    } else if spend_utilization < 0.8 {
        spend_utilization / 0.8
    } else {
        (1.0 - (spend_utilization - 0.95) * 2.0).max(0.5)
    };

    let roas_score = if roas > 0.0 { (roas / 3.0).min(1.0) } else { 0.0 };

    utilization_score * 0.6 + roas_score * 0.4
}

/// Fraction of the allocated budget spent in the window; 0 with no budget.
pub fn spend_utilization(spend: f64, allocated_budget: f64) -> f64 {
    if allocated_budget > 0.0 {
        spend / allocated_budget
    } else {
        0.0
    }
}
