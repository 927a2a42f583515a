//! The budget optimizer: scores every ad set against its campaign's
//! averages, identifies moves, redistributes freed budget under a per-cycle
//! cap, and persists the result with an append-only audit record.
//!
//! Budgets are advisory ceilings. The math never forces ad set allocations
//! to sum to the campaign total: freed budget that no increase candidate
//! can absorb under the cap is simply left unassigned.

use crate::outcome::{BudgetChange, Opportunity, OpportunityKind, OptimizationOutcome};
use crate::scoring::{
    efficiency_score, performance_score, spend_utilization, AdSetPerformance, CampaignAverages,
};
use chrono::{DateTime, Duration, Utc};
use neuroads_analytics::{MetricsQuery, MetricsSource, MetricsSummary, RawTotals};
use neuroads_core::types::{AdSet, BudgetOptimization, CampaignMetricsSnapshot};
use neuroads_core::{AllocationConfig, CampaignStore, NeuroAdsError, NeuroAdsResult};
use neuroads_integrations::PlatformRegistry;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Budget reallocation engine. Thresholds are fixed at construction.
pub struct BudgetOptimizer {
    config: AllocationConfig,
}

impl BudgetOptimizer {
    pub fn new(config: AllocationConfig) -> Self {
        Self { config }
    }

    /// Runs one optimization cycle for a campaign at `as_of`.
    pub fn optimize(
        &self,
        store: &CampaignStore,
        metrics: &dyn MetricsSource,
        registry: &PlatformRegistry,
        campaign_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> NeuroAdsResult<OptimizationOutcome> {
        let campaign = store
            .get_campaign(campaign_id)
            .ok_or_else(|| NeuroAdsError::NotFound(format!("campaign {campaign_id}")))?;

        let performances = self.score_ad_sets(store, metrics, campaign_id, as_of);
        if performances.is_empty() {
            info!(campaign_id = %campaign_id, "No performance data in lookback window");
            return Ok(OptimizationOutcome::InsufficientData {
                reason: "Insufficient performance data".to_string(),
            });
        }

        let opportunities = self.identify_opportunities(&performances);
        if opportunities.is_empty() {
            info!(campaign_id = %campaign_id, "No optimization opportunities");
            return Ok(OptimizationOutcome::NoOpportunities {
                reason: "No optimization opportunities found".to_string(),
            });
        }

        let allocation = self.allocate(&performances, &opportunities);
        let ad_sets = store.ad_sets_for_campaign(campaign_id);

        if !self.should_apply(&ad_sets, &allocation) {
            info!(campaign_id = %campaign_id, "Proposed budget changes below threshold");
            return Ok(OptimizationOutcome::BelowThreshold {
                reason: "Budget changes below threshold or too risky".to_string(),
            });
        }

        let outcome = self.apply(
            store,
            metrics,
            registry,
            campaign.id,
            &ad_sets,
            &allocation,
            &opportunities,
            as_of,
        )?;
        Ok(outcome)
    }

    // ─── Scoring ─────────────────────────────────────────────────────────

    /// Aggregates each ad set's metrics over the lookback window, scores it
    /// against the campaign averages, and ranks the result best-first.
    /// Ad sets with no data in the window are excluded.
    pub fn score_ad_sets(
        &self,
        store: &CampaignStore,
        metrics: &dyn MetricsSource,
        campaign_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Vec<AdSetPerformance> {
        let end = as_of.date_naive();
        let start = end - Duration::days(self.config.performance_lookback_days as i64);

        let rows: Vec<(AdSet, RawTotals)> = store
            .ad_sets_for_campaign(campaign_id)
            .into_iter()
            .map(|ad_set| {
                let totals =
                    metrics.totals(&MetricsQuery::ad_set(campaign_id, ad_set.id, start, end));
                (ad_set, totals)
            })
            .filter(|(_, totals)| *totals != RawTotals::default())
            .collect();

        let mut campaign_totals = RawTotals::default();
        for (_, totals) in &rows {
            campaign_totals.add(totals);
        }
        let averages = CampaignAverages::from_totals(&campaign_totals);

        let mut performances: Vec<AdSetPerformance> = rows
            .into_iter()
            .map(|(ad_set, totals)| {
                let summary = MetricsSummary::from_totals(totals);
                let utilization = spend_utilization(summary.spend, ad_set.allocated_budget);
                AdSetPerformance {
                    performance_score: performance_score(&summary, &averages),
                    efficiency_score: efficiency_score(utilization, summary.roas),
                    spend_utilization: utilization,
                    metrics: summary,
                    ad_set,
                }
            })
            .collect();

        performances.sort_by(|a, b| {
            b.performance_score
                .partial_cmp(&a.performance_score)
                .unwrap_or(Ordering::Equal)
        });
        performances
    }

    // ─── Opportunities ───────────────────────────────────────────────────

    /// Applies the opportunity rules and drops anything below the
    /// confidence threshold. With fewer than two scored ad sets there is
    /// nothing to move budget between.
    ///
    /// An underperforming ad set is never also flagged as underutilized:
    /// one decrease per ad set per cycle.
    pub fn identify_opportunities(&self, performances: &[AdSetPerformance]) -> Vec<Opportunity> {
        let mut opportunities = Vec::new();
        if performances.len() < 2 {
            return opportunities;
        }

        for perf in performances {
            let score = perf.performance_score;
            let utilization = perf.spend_utilization;

            if score > 1.2 && utilization > 0.8 {
                opportunities.push(Opportunity {
                    ad_set_id: perf.ad_set.id,
                    kind: OpportunityKind::IncreaseBudget,
                    current_budget: perf.ad_set.allocated_budget,
                    reason: format!(
                        "High performance score ({score:.2}) with high utilization"
                    ),
                    confidence: (score / 1.5).min(1.0),
                    suggested_change: (score - 1.0).min(0.2),
                });
            } else if score < 0.8 {
                // Only if actually spending
                if utilization > 0.3 {
                    opportunities.push(Opportunity {
                        ad_set_id: perf.ad_set.id,
                        kind: OpportunityKind::DecreaseBudget,
                        current_budget: perf.ad_set.allocated_budget,
                        reason: format!("Low performance score ({score:.2})"),
                        confidence: (1.0 - score).min(1.0),
                        suggested_change: (1.0 - score).min(0.3),
                    });
                }
            } else if utilization < 0.6 {
                opportunities.push(Opportunity {
                    ad_set_id: perf.ad_set.id,
                    kind: OpportunityKind::DecreaseBudget,
                    current_budget: perf.ad_set.allocated_budget,
                    reason: format!(
                        "Low budget utilization ({:.1}%)",
                        utilization * 100.0
                    ),
                    confidence: 1.0 - utilization,
                    suggested_change: (1.0 - utilization).min(0.4),
                });
            }
        }

        opportunities.retain(|opp| opp.confidence >= self.config.confidence_threshold);
        opportunities
    }

    // ─── Redistribution ──────────────────────────────────────────────────

    /// Computes the new budget per ad set: decreases are taken first into a
    /// pool, then the pool is split across increase candidates weighted by
    /// confidence x suggested change. Every move is capped at
    /// `max_budget_change_per_day` of the ad set's prior budget.
    pub fn allocate(
        &self,
        performances: &[AdSetPerformance],
        opportunities: &[Opportunity],
    ) -> HashMap<Uuid, f64> {
        let mut allocation: HashMap<Uuid, f64> = performances
            .iter()
            .map(|p| (p.ad_set.id, p.ad_set.allocated_budget))
            .collect();
        let cap = self.config.max_budget_change_per_day;

        let mut pool = 0.0;
        for opp in opportunities
            .iter()
            .filter(|o| o.kind == OpportunityKind::DecreaseBudget)
        {
            if let Some(budget) = allocation.get_mut(&opp.ad_set_id) {
                let decrease = (*budget * opp.suggested_change).min(*budget * cap);
                *budget -= decrease;
                pool += decrease;
            }
        }

        let increases: Vec<&Opportunity> = opportunities
            .iter()
            .filter(|o| o.kind == OpportunityKind::IncreaseBudget)
            .collect();
        if increases.is_empty() || pool <= 0.0 {
            return allocation;
        }

        let total_weight: f64 = increases
            .iter()
            .map(|o| o.confidence * o.suggested_change)
            .sum();
        if total_weight <= 0.0 {
            return allocation;
        }

        for opp in increases {
            if let Some(budget) = allocation.get_mut(&opp.ad_set_id) {
                let weight = opp.confidence * opp.suggested_change / total_weight;
                let increase = (pool * weight).min(*budget * cap);
                *budget += increase;
            }
        }

        allocation
    }

    /// The aggregate relative change must clear the minimum threshold.
    fn should_apply(&self, ad_sets: &[AdSet], allocation: &HashMap<Uuid, f64>) -> bool {
        let mut total_change = 0.0;
        let mut total_budget = 0.0;

        for ad_set in ad_sets {
            let new_budget = allocation
                .get(&ad_set.id)
                .copied()
                .unwrap_or(ad_set.allocated_budget);
            total_change += (new_budget - ad_set.allocated_budget).abs();
            total_budget += ad_set.allocated_budget;
        }

        total_budget > 0.0
            && total_change / total_budget >= self.config.min_budget_change_threshold
    }

    // ─── Apply ───────────────────────────────────────────────────────────

    /// Persists the new budgets and the audit record as one unit, then
    /// pushes the updates to the platforms. A platform failure is logged
    /// and does not invalidate the already-persisted allocation.
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        store: &CampaignStore,
        metrics: &dyn MetricsSource,
        registry: &PlatformRegistry,
        campaign_id: Uuid,
        ad_sets: &[AdSet],
        allocation: &HashMap<Uuid, f64>,
        opportunities: &[Opportunity],
        as_of: DateTime<Utc>,
    ) -> NeuroAdsResult<OptimizationOutcome> {
        let mut previous_allocation = HashMap::new();
        let mut new_allocation = HashMap::new();
        let mut writes = Vec::new();
        let mut changes = Vec::new();

        for ad_set in ad_sets {
            let previous = ad_set.allocated_budget;
            let new_budget = allocation.get(&ad_set.id).copied().unwrap_or(previous);
            previous_allocation.insert(ad_set.id, previous);
            new_allocation.insert(ad_set.id, new_budget);

            let delta = new_budget - previous;
            // Per-ad-set writes below the relative threshold are skipped
            if delta.abs() < previous * self.config.min_budget_change_threshold
                || delta.abs() < f64::EPSILON
            {
                continue;
            }

            writes.push((ad_set.id, new_budget));
            changes.push(BudgetChange {
                ad_set_id: ad_set.id,
                ad_set_name: ad_set.name.clone(),
                platform: ad_set.platform,
                previous_budget: previous,
                new_budget,
                change_amount: delta,
                change_percentage: if previous > 0.0 {
                    delta / previous * 100.0
                } else {
                    0.0
                },
            });
        }

        let expected_improvement = expected_improvement(opportunities);
        let reason = optimization_summary(opportunities);
        let record = BudgetOptimization {
            id: Uuid::new_v4(),
            campaign_id,
            previous_allocation,
            new_allocation,
            optimization_reason: reason.clone(),
            performance_metrics: self.metrics_snapshot(metrics, campaign_id, as_of),
            expected_roas_improvement: expected_improvement,
            created_at: as_of,
        };
        let optimization_id = record.id;

        store.apply_allocation(&writes, record)?;

        for change in &changes {
            let Some(ad_set) = store.get_ad_set(change.ad_set_id) else {
                continue;
            };
            let Some(adapter) = registry.get(ad_set.platform) else {
                warn!(
                    ad_set_id = %ad_set.id,
                    platform = %ad_set.platform,
                    "No adapter registered; budget update not pushed to platform"
                );
                continue;
            };
            if let Err(e) = adapter.update_budget(&ad_set, change.new_budget) {
                warn!(
                    ad_set_id = %ad_set.id,
                    platform = %ad_set.platform,
                    error = %e,
                    "Failed to push budget update to platform"
                );
            }
        }

        info!(
            campaign_id = %campaign_id,
            optimization_id = %optimization_id,
            changes = changes.len(),
            expected_improvement,
            "Budget optimization applied"
        );

        Ok(OptimizationOutcome::Applied {
            optimization_id,
            changes,
            expected_improvement,
            reason,
            opportunities_count: opportunities.len(),
        })
    }

    fn metrics_snapshot(
        &self,
        metrics: &dyn MetricsSource,
        campaign_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> CampaignMetricsSnapshot {
        let end = as_of.date_naive();
        let start = end - Duration::days(self.config.performance_lookback_days as i64);
        let totals = metrics.totals(&MetricsQuery::campaign(campaign_id, start, end));
        let summary = MetricsSummary::from_totals(totals);

        CampaignMetricsSnapshot {
            period_start: start,
            period_end: end,
            impressions: totals.impressions,
            clicks: totals.clicks,
            conversions: totals.conversions,
            spend: totals.spend,
            revenue: totals.revenue,
            roas: summary.roas,
        }
    }
}

/// Expected ROAS improvement: 10% potential per increase and 5% per
/// decrease, weighted by confidence and capped at 50%.
fn expected_improvement(opportunities: &[Opportunity]) -> f64 {
    let improvement: f64 = opportunities
        .iter()
        .map(|opp| match opp.kind {
            OpportunityKind::IncreaseBudget => opp.confidence * 0.1,
            OpportunityKind::DecreaseBudget => opp.confidence * 0.05,
        })
        .sum();
    improvement.min(0.5)
}

fn optimization_summary(opportunities: &[Opportunity]) -> String {
    let increases = opportunities
        .iter()
        .filter(|o| o.kind == OpportunityKind::IncreaseBudget)
        .count();
    let decreases = opportunities
        .iter()
        .filter(|o| o.kind == OpportunityKind::DecreaseBudget)
        .count();

    let mut summary = format!(
        "Budget optimization applied: {increases} budget increases for high-performing ad sets, \
         {decreases} budget decreases for underperforming ad sets."
    );
    if !opportunities.is_empty() {
        let avg_confidence: f64 = opportunities.iter().map(|o| o.confidence).sum::<f64>()
            / opportunities.len() as f64;
        summary.push_str(&format!(
            " Average confidence: {:.1}%",
            avg_confidence * 100.0
        ));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opportunity(kind: OpportunityKind, confidence: f64) -> Opportunity {
        Opportunity {
            ad_set_id: Uuid::new_v4(),
            kind,
            current_budget: 1000.0,
            reason: String::new(),
            confidence,
            suggested_change: 0.2,
        }
    }

    #[test]
    fn expected_improvement_is_capped_at_half() {
        let opportunities: Vec<Opportunity> = (0..10)
            .map(|_| opportunity(OpportunityKind::IncreaseBudget, 1.0))
            .collect();
        assert!((expected_improvement(&opportunities) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn summary_counts_both_directions() {
        let opportunities = vec![
            opportunity(OpportunityKind::IncreaseBudget, 1.0),
            opportunity(OpportunityKind::DecreaseBudget, 0.6),
        ];
        let summary = optimization_summary(&opportunities);
        assert!(summary.contains("1 budget increases"));
        assert!(summary.contains("1 budget decreases"));
        assert!(summary.contains("Average confidence: 80.0%"));
    }
}
