//! Summary statistics over raw performance counters.
//!
//! Every derived ratio is defined as 0 when its denominator is 0. Nothing
//! downstream ever sees a NaN or a division error.

use serde::{Deserialize, Serialize};

/// Summed raw counters over a date window and scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub revenue: f64,
}

impl RawTotals {
    pub fn add(&mut self, other: &RawTotals) {
        self.impressions += other.impressions;
        self.clicks += other.clicks;
        self.conversions += other.conversions;
        self.spend += other.spend;
        self.revenue += other.revenue;
    }
}

/// Aggregated metrics with derived ratios for one campaign, ad set, or
/// creative over a date window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub revenue: f64,
    /// clicks / impressions * 100
    pub ctr: f64,
    /// conversions / clicks * 100
    pub conversion_rate: f64,
    /// spend / clicks
    pub cpc: f64,
    /// spend / conversions
    pub cpa: f64,
    /// revenue / spend
    pub roas: f64,
}

impl MetricsSummary {
    pub fn from_totals(totals: RawTotals) -> Self {
        let impressions = totals.impressions as f64;
        let clicks = totals.clicks as f64;
        let conversions = totals.conversions as f64;

        Self {
            impressions: totals.impressions,
            clicks: totals.clicks,
            conversions: totals.conversions,
            spend: totals.spend,
            revenue: totals.revenue,
            ctr: ratio(clicks, impressions) * 100.0,
            conversion_rate: ratio(conversions, clicks) * 100.0,
            cpc: ratio(totals.spend, clicks),
            cpa: ratio(totals.spend, conversions),
            roas: ratio(totals.revenue, totals.spend),
        }
    }
}

/// numerator / denominator, defined as 0 when the denominator is 0.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
