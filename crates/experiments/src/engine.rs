//! The A/B test engine: creation and launch, per-cycle analysis, stop
//! decisions, winner declaration, and finalization.
//!
//! All decisions are computed from aggregated metrics before any platform
//! side effect runs, so adapter failures never corrupt a decision already
//! persisted.

use crate::plan::TestPlan;
use crate::results::{
    AnalysisOutcome, PairwiseTest, StatisticalResults, TestLaunch, VariantPerformance,
    WinnerDeclaration,
};
use chrono::{DateTime, Utc};
use neuroads_analytics::{MetricsQuery, MetricsSource, MetricsSummary, RawTotals};
use neuroads_core::types::{
    ABTest, AdCreative, Platform, TestStatus, TestType, VariantLabel,
};
use neuroads_core::{CampaignStore, ExperimentConfig, NeuroAdsError, NeuroAdsResult};
use neuroads_integrations::{LaunchConfig, PlatformRegistry};
use neuroads_stats::{two_proportion_z_test, welch_t_test, GroupSummary, MetricKind, TestWinner};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Automated A/B testing engine. Thresholds are fixed at construction.
pub struct ABTestEngine {
    config: ExperimentConfig,
}

impl ABTestEngine {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    // ─── Create and launch ───────────────────────────────────────────────

    /// Validates the plan, creates the test and its variant creatives, and
    /// launches them on every platform the campaign targets. A launch
    /// failure rolls the created test and creatives back fully: a draft
    /// test with a failed launch never lingers.
    pub fn create_test(
        &self,
        store: &CampaignStore,
        registry: &PlatformRegistry,
        campaign_id: Uuid,
        plan: &TestPlan,
        now: DateTime<Utc>,
    ) -> NeuroAdsResult<TestLaunch> {
        plan.validate()?;

        let campaign = store
            .get_campaign(campaign_id)
            .ok_or_else(|| NeuroAdsError::NotFound(format!("campaign {campaign_id}")))?;
        let primary_ad_set = store.primary_ad_set(campaign_id).ok_or_else(|| {
            NeuroAdsError::Validation("No ad set found for campaign".to_string())
        })?;

        let test = ABTest {
            id: Uuid::new_v4(),
            campaign_id,
            name: format!("{} - {} test", campaign.name, plan.test_type),
            test_type: plan.test_type,
            status: TestStatus::Draft,
            confidence_level: 0.95,
            minimum_sample_size: plan.min_sample_size.unwrap_or(self.config.min_sample_size),
            test_duration_days: plan
                .duration_days
                .unwrap_or(self.config.default_test_duration_days),
            winner_creative: None,
            statistical_significance: None,
            started_at: None,
            completed_at: None,
            created_at: now,
        };

        let variants: Vec<AdCreative> = plan
            .variants
            .iter()
            .enumerate()
            .map(|(index, spec)| AdCreative {
                id: Uuid::new_v4(),
                ad_set_id: primary_ad_set.id,
                name: format!("{} - Variant {}", test.name, index + 1),
                creative_type: spec.creative_type,
                headline: spec.headline.clone(),
                description: spec.description.clone(),
                call_to_action: spec.call_to_action.clone(),
                destination_url: spec.destination_url.clone(),
                image_url: spec.image_url.clone(),
                video_url: spec.video_url.clone(),
                variant_label: VariantLabel::from_index(index),
                ai_confidence_score: spec.confidence_score,
                is_active: true,
                is_winner: false,
                created_at: now,
            })
            .collect();

        store.insert_test(test.clone());
        for variant in &variants {
            store.insert_creative(variant.clone());
        }

        let mut target_platforms: Vec<Platform> = Vec::new();
        for ad_set in store.ad_sets_for_campaign(campaign_id) {
            if !target_platforms.contains(&ad_set.platform) {
                target_platforms.push(ad_set.platform);
            }
        }

        let launch_config = LaunchConfig {
            traffic_split: plan.traffic_split,
        };
        let mut receipts = Vec::new();
        for platform in target_platforms {
            let launch = registry
                .get(platform)
                .ok_or_else(|| {
                    NeuroAdsError::Platform(format!("No adapter registered for {platform}"))
                })
                .and_then(|adapter| adapter.launch_variants(&campaign, &variants, &launch_config));
            match launch {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => {
                    self.rollback_launch(store, test.id, &variants);
                    warn!(
                        test_id = %test.id,
                        platform = %platform,
                        error = %e,
                        "A/B test launch failed, rolled back"
                    );
                    return Err(e);
                }
            }
        }

        store.mark_test_running(test.id, now)?;
        let test = store
            .get_test(test.id)
            .ok_or_else(|| NeuroAdsError::NotFound(format!("A/B test {}", test.id)))?;

        info!(
            test_id = %test.id,
            campaign_id = %campaign_id,
            test_type = %test.test_type,
            variants = variants.len(),
            "A/B test launched"
        );

        Ok(TestLaunch {
            test,
            variants,
            receipts,
        })
    }

    fn rollback_launch(&self, store: &CampaignStore, test_id: Uuid, variants: &[AdCreative]) {
        for variant in variants {
            store.remove_creative(variant.id);
        }
        store.remove_test(test_id);
    }

    /// Cancels a draft or running test.
    pub fn cancel_test(
        &self,
        store: &CampaignStore,
        test_id: Uuid,
        now: DateTime<Utc>,
    ) -> NeuroAdsResult<()> {
        store.cancel_test(test_id, now)?;
        info!(test_id = %test_id, "A/B test cancelled");
        Ok(())
    }

    // ─── Per-cycle analysis ──────────────────────────────────────────────

    /// Runs one analysis cycle at `as_of`. Failures are caught here and
    /// reported as a structured outcome; the test's persisted state is
    /// left unchanged so the next cycle can retry.
    pub fn analyze(
        &self,
        store: &CampaignStore,
        metrics: &dyn MetricsSource,
        registry: &PlatformRegistry,
        test_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AnalysisOutcome {
        match self.try_analyze(store, metrics, registry, test_id, as_of) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(test_id = %test_id, error = %e, "A/B test analysis failed");
                AnalysisOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    fn try_analyze(
        &self,
        store: &CampaignStore,
        metrics: &dyn MetricsSource,
        registry: &PlatformRegistry,
        test_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> NeuroAdsResult<AnalysisOutcome> {
        let test = store
            .get_test(test_id)
            .ok_or_else(|| NeuroAdsError::NotFound(format!("A/B test {test_id}")))?;

        if test.status.is_terminal() {
            return Ok(AnalysisOutcome::Skipped {
                reason: format!("Test is not running (status: {})", test.status),
            });
        }
        let Some(started_at) = test.started_at else {
            return Ok(AnalysisOutcome::Skipped {
                reason: "Test has not been launched".to_string(),
            });
        };

        let creatives = test_creatives(store, &test, started_at);
        let results = self.statistical_results(metrics, &test, &creatives, started_at, as_of);
        let Some(results) = results else {
            return Ok(AnalysisOutcome::Skipped {
                reason: "Insufficient test data".to_string(),
            });
        };

        let days_running = (as_of - started_at).num_days();
        let (should_stop, stop_reason) = self.stop_decision(&test, &results, days_running);

        if !should_stop {
            info!(
                test_id = %test_id,
                days_running,
                reason = %stop_reason,
                "A/B test continues"
            );
            return Ok(AnalysisOutcome::Continue {
                reason: stop_reason,
                results,
            });
        }

        let winner = self.declare_winner(&results);
        self.finalize(store, registry, &test, &creatives, &winner, as_of)?;
        let recommendations = self.recommendations(&test, &winner);

        info!(
            test_id = %test_id,
            days_running,
            stop_reason = %stop_reason,
            winner = ?winner.winner,
            confidence = winner.confidence,
            "A/B test completed"
        );

        Ok(AnalysisOutcome::Completed {
            stop_reason,
            winner,
            recommendations,
            results,
        })
    }

    /// Aggregates per-variant metrics and runs every pairwise test.
    /// Returns `None` with fewer than two populated variant labels.
    fn statistical_results(
        &self,
        metrics: &dyn MetricsSource,
        test: &ABTest,
        creatives: &[AdCreative],
        started_at: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> Option<StatisticalResults> {
        let start = started_at.date_naive();
        let end = as_of.date_naive();

        let mut groups: BTreeMap<VariantLabel, Vec<&AdCreative>> = BTreeMap::new();
        for creative in creatives {
            if let Some(label) = creative.variant_label {
                groups.entry(label).or_default().push(creative);
            }
        }
        if groups.len() < 2 {
            return None;
        }

        let variants: Vec<VariantPerformance> = groups
            .iter()
            .map(|(label, group)| {
                let mut totals = RawTotals::default();
                for creative in group {
                    totals.add(&metrics.totals(&MetricsQuery::creative(
                        test.campaign_id,
                        creative.id,
                        start,
                        end,
                    )));
                }
                VariantPerformance {
                    label: *label,
                    sample_size: totals.impressions,
                    metrics: MetricsSummary::from_totals(totals),
                }
            })
            .collect();

        let pairwise_tests = self.pairwise_tests(&variants, test.test_type);
        let is_significant = pairwise_tests.iter().any(|t| t.is_significant);

        Some(StatisticalResults {
            variants,
            pairwise_tests,
            is_significant,
        })
    }

    fn pairwise_tests(
        &self,
        variants: &[VariantPerformance],
        test_type: TestType,
    ) -> Vec<PairwiseTest> {
        let metric = primary_metric(test_type);
        let mut tests = Vec::new();

        for i in 0..variants.len() {
            for j in (i + 1)..variants.len() {
                let a = &variants[i];
                let b = &variants[j];
                let (p_value, effect_size, winner, confidence_interval) = match metric {
                    MetricKind::Ctr => {
                        let r = two_proportion_z_test(
                            a.metrics.clicks,
                            a.metrics.impressions,
                            b.metrics.clicks,
                            b.metrics.impressions,
                        );
                        (
                            r.p_value,
                            r.effect_size,
                            r.winner,
                            Some(r.confidence_interval),
                        )
                    }
                    MetricKind::ConversionRate => {
                        let r = two_proportion_z_test(
                            a.metrics.conversions,
                            a.metrics.clicks,
                            b.metrics.conversions,
                            b.metrics.clicks,
                        );
                        (
                            r.p_value,
                            r.effect_size,
                            r.winner,
                            Some(r.confidence_interval),
                        )
                    }
                    // Continuous metrics: no per-observation data exists,
                    // so the Welch test works from summary means.
                    _ => {
                        let r = welch_t_test(
                            GroupSummary {
                                mean: metric_mean(&a.metrics, metric),
                                sample_size: a.sample_size,
                            },
                            GroupSummary {
                                mean: metric_mean(&b.metrics, metric),
                                sample_size: b.sample_size,
                            },
                            metric,
                        );
                        (r.p_value, r.effect_size, r.winner, None)
                    }
                };

                tests.push(PairwiseTest {
                    variant_a: a.label,
                    variant_b: b.label,
                    metric,
                    p_value,
                    effect_size,
                    winner,
                    confidence_interval,
                    is_significant: p_value < self.config.significance_threshold,
                });
            }
        }

        tests
    }

    // ─── Stop decision ───────────────────────────────────────────────────

    /// Evaluates the stop rules in strict priority order.
    fn stop_decision(
        &self,
        test: &ABTest,
        results: &StatisticalResults,
        days_running: i64,
    ) -> (bool, String) {
        if days_running < self.config.min_test_days as i64 {
            return (
                false,
                "Test running less than minimum duration".to_string(),
            );
        }

        if days_running >= self.config.max_test_duration_days as i64 {
            return (true, "Maximum test duration reached".to_string());
        }

        let sample_size_met = results
            .variants
            .iter()
            .all(|v| v.sample_size >= test.minimum_sample_size);
        if !sample_size_met {
            return (false, "Minimum sample size not reached".to_string());
        }

        let very_significant = results.pairwise_tests.iter().any(|t| {
            t.p_value < self.config.early_stopping_threshold
                && t.effect_size > self.config.minimum_effect_size
        });
        if very_significant {
            return (true, "Early stopping - very significant result".to_string());
        }

        let significant = results.pairwise_tests.iter().any(|t| {
            t.p_value < self.config.significance_threshold
                && t.effect_size > self.config.minimum_effect_size
        });
        if significant && days_running >= self.config.min_days_for_significance as i64 {
            return (true, "Statistically significant result".to_string());
        }

        if days_running >= test.test_duration_days as i64 {
            return (true, "Planned test duration completed".to_string());
        }

        (false, "Continue test".to_string())
    }

    // ─── Winner declaration and finalization ─────────────────────────────

    fn declare_winner(&self, results: &StatisticalResults) -> WinnerDeclaration {
        let best = results
            .pairwise_tests
            .iter()
            .filter(|t| t.is_significant)
            .min_by(|a, b| {
                a.p_value
                    .partial_cmp(&b.p_value)
                    .unwrap_or(Ordering::Equal)
            });

        let Some(best) = best else {
            return WinnerDeclaration::no_clear_winner();
        };

        let winner_label = match best.winner {
            TestWinner::A => Some(best.variant_a),
            TestWinner::B => Some(best.variant_b),
            TestWinner::Tie | TestWinner::Inconclusive => None,
        };

        WinnerDeclaration {
            winner: winner_label,
            confidence: 1.0 - best.p_value,
            improvement: best.effect_size * 100.0,
            p_value: Some(best.p_value),
            metric: Some(best.metric),
            reason: format!("Statistically significant improvement in {}", best.metric),
        }
    }

    /// Persists the completion as one unit, then pushes pauses to the
    /// platforms. A pause failure is logged and does not invalidate the
    /// already-persisted decision.
    fn finalize(
        &self,
        store: &CampaignStore,
        registry: &PlatformRegistry,
        test: &ABTest,
        creatives: &[AdCreative],
        winner: &WinnerDeclaration,
        as_of: DateTime<Utc>,
    ) -> NeuroAdsResult<()> {
        let (winner_creative, losers): (Option<Uuid>, Vec<&AdCreative>) = match winner.winner {
            Some(label) => {
                let winning = creatives
                    .iter()
                    .find(|c| c.variant_label == Some(label))
                    .map(|c| c.id);
                let losing = creatives
                    .iter()
                    .filter(|c| c.variant_label.is_some() && c.variant_label != Some(label))
                    .collect();
                (winning, losing)
            }
            // Tie or inconclusive: nothing is paused.
            None => (None, Vec::new()),
        };

        let pause_ids: Vec<Uuid> = losers.iter().map(|c| c.id).collect();
        store.complete_test(test.id, as_of, winner.confidence, winner_creative, &pause_ids)?;

        for creative in losers {
            let Some(ad_set) = store.get_ad_set(creative.ad_set_id) else {
                continue;
            };
            let Some(adapter) = registry.get(ad_set.platform) else {
                warn!(
                    creative_id = %creative.id,
                    platform = %ad_set.platform,
                    "No adapter registered; losing variant not paused on platform"
                );
                continue;
            };
            if let Err(e) = adapter.pause_creative(creative) {
                warn!(
                    creative_id = %creative.id,
                    platform = %ad_set.platform,
                    error = %e,
                    "Failed to pause losing variant on platform"
                );
            }
        }

        Ok(())
    }

    /// Advisory operator-facing suggestions. Text only, no behavior.
    fn recommendations(&self, test: &ABTest, winner: &WinnerDeclaration) -> Vec<String> {
        let mut recommendations = Vec::new();

        if let Some(label) = winner.winner {
            recommendations.push(format!(
                "Winner found: variant {} with {:.1}% improvement at {:.1}% confidence. \
                 Scale the winning variant across all campaigns.",
                label,
                winner.improvement,
                winner.confidence * 100.0
            ));
            if winner.improvement > 20.0 {
                recommendations.push(
                    "Significant improvement detected. Consider testing similar variations \
                     to further optimize performance."
                        .to_string(),
                );
            }
            recommendations.push(format!(
                "Apply learnings from {} test to future campaign creation.",
                test.test_type
            ));
        } else {
            recommendations.push(
                "No clear winner found. Consider testing more distinct variations \
                 or running the test longer with more traffic."
                    .to_string(),
            );
        }

        match test.test_type {
            TestType::Headline => recommendations.push(
                "Test headline variations with different value propositions, \
                 emotional appeals, or urgency elements."
                    .to_string(),
            ),
            TestType::Cta => recommendations.push(
                "Continue testing different call-to-action phrases that match \
                 your campaign objective and audience intent."
                    .to_string(),
            ),
            _ => {}
        }

        recommendations
    }
}

/// The creatives participating in a test: campaign creatives materialized
/// at or after launch, carrying a variant label.
fn test_creatives(
    store: &CampaignStore,
    test: &ABTest,
    started_at: DateTime<Utc>,
) -> Vec<AdCreative> {
    store
        .creatives_for_campaign(test.campaign_id)
        .into_iter()
        .filter(|c| c.created_at >= started_at && c.variant_label.is_some())
        .collect()
}

/// Metric tested for each test type.
fn primary_metric(test_type: TestType) -> MetricKind {
    match test_type {
        TestType::Headline | TestType::Description | TestType::Cta => MetricKind::Ctr,
        TestType::Creative => MetricKind::ConversionRate,
        TestType::Audience => MetricKind::Ctr,
    }
}

fn metric_mean(metrics: &MetricsSummary, metric: MetricKind) -> f64 {
    match metric {
        MetricKind::Ctr => metrics.ctr,
        MetricKind::ConversionRate => metrics.conversion_rate,
        MetricKind::Cpc => metrics.cpc,
        MetricKind::Cpa => metrics.cpa,
        MetricKind::Roas => metrics.roas,
    }
}
