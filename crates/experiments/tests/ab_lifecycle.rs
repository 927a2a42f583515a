//! End-to-end A/B test lifecycle scenarios: launch, rollback, stop-rule
//! priority, winner declaration, and finalization.

use chrono::{DateTime, Duration, Utc};
use neuroads_analytics::{AnalyticsRecord, AnalyticsStore};
use neuroads_core::types::*;
use neuroads_core::{CampaignStore, ExperimentConfig};
use neuroads_experiments::{ABTestEngine, AnalysisOutcome, TestPlan, VariantSpec};
use neuroads_integrations::{PlatformRegistry, SandboxAdapter};
use std::sync::Arc;
use uuid::Uuid;

struct Fixture {
    store: CampaignStore,
    analytics: AnalyticsStore,
    registry: PlatformRegistry,
    sandbox: Arc<SandboxAdapter>,
    campaign_id: Uuid,
}

fn fixture() -> Fixture {
    let store = CampaignStore::new();
    let campaign = Campaign {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: "Summer Sale".to_string(),
        description: String::new(),
        campaign_type: CampaignType::Conversions,
        status: CampaignStatus::Active,
        total_budget: 10_000.0,
        daily_budget: Some(500.0),
        auto_optimization: true,
        auto_budget_reallocation: true,
        auto_ab_testing: true,
        created_at: Utc::now() - Duration::days(30),
        updated_at: Utc::now(),
    };
    let campaign_id = campaign.id;
    store.insert_campaign(campaign);
    store.insert_ad_set(AdSet {
        id: Uuid::new_v4(),
        campaign_id,
        platform: Platform::Google,
        name: "Google search".to_string(),
        allocated_budget: 1000.0,
        spend: 0.0,
        impressions: 0,
        clicks: 0,
        conversions: 0,
        is_active: true,
        created_at: Utc::now() - Duration::days(30),
    });

    let sandbox = Arc::new(SandboxAdapter::new(Platform::Google));
    let mut registry = PlatformRegistry::new();
    registry.register(sandbox.clone());

    Fixture {
        store,
        analytics: AnalyticsStore::new(),
        registry,
        sandbox,
        campaign_id,
    }
}

fn two_variant_plan(test_type: TestType) -> TestPlan {
    TestPlan::new(
        test_type,
        vec![
            VariantSpec {
                headline: "Save 20% today".to_string(),
                ..VariantSpec::default()
            },
            VariantSpec {
                headline: "Limited time offer".to_string(),
                ..VariantSpec::default()
            },
        ],
    )
}

/// Launches a test and backdates started_at so the analysis cycle sees the
/// requested number of running days.
fn launch_backdated(
    fx: &Fixture,
    engine: &ABTestEngine,
    plan: &TestPlan,
    days_ago: i64,
    as_of: DateTime<Utc>,
) -> (Uuid, Vec<AdCreative>) {
    let started = as_of - Duration::days(days_ago);
    let launch = engine
        .create_test(&fx.store, &fx.registry, fx.campaign_id, plan, started)
        .expect("launch");
    (launch.test.id, launch.variants)
}

fn ingest(
    fx: &Fixture,
    creative_id: Uuid,
    as_of: DateTime<Utc>,
    impressions: u64,
    clicks: u64,
    conversions: u64,
) {
    fx.analytics.ingest(AnalyticsRecord {
        id: Uuid::new_v4(),
        campaign_id: fx.campaign_id,
        ad_set_id: None,
        creative_id: Some(creative_id),
        date: (as_of - Duration::days(1)).date_naive(),
        impressions,
        clicks,
        conversions,
        spend: 100.0,
        revenue: 300.0,
    });
}

#[test]
fn create_test_rejects_fewer_than_two_variants() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let plan = TestPlan::new(TestType::Headline, vec![VariantSpec::default()]);

    let result = engine.create_test(&fx.store, &fx.registry, fx.campaign_id, &plan, Utc::now());
    assert!(result.is_err());
    assert!(fx.store.tests_for_campaign(fx.campaign_id).is_empty());
    assert!(fx.store.creatives_for_campaign(fx.campaign_id).is_empty());
}

#[test]
fn launch_failure_rolls_back_test_and_creatives() {
    let fx = fixture();
    fx.sandbox.fail_launches(true);
    let engine = ABTestEngine::new(ExperimentConfig::default());

    let result = engine.create_test(
        &fx.store,
        &fx.registry,
        fx.campaign_id,
        &two_variant_plan(TestType::Headline),
        Utc::now(),
    );
    assert!(result.is_err());
    assert!(fx.store.tests_for_campaign(fx.campaign_id).is_empty());
    assert!(fx.store.creatives_for_campaign(fx.campaign_id).is_empty());
}

#[test]
fn successful_launch_stamps_labels_in_order_and_runs() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());

    let launch = engine
        .create_test(
            &fx.store,
            &fx.registry,
            fx.campaign_id,
            &two_variant_plan(TestType::Headline),
            Utc::now(),
        )
        .unwrap();

    assert_eq!(launch.test.status, TestStatus::Running);
    assert!(launch.test.started_at.is_some());
    assert_eq!(launch.variants[0].variant_label, Some(VariantLabel::A));
    assert_eq!(launch.variants[1].variant_label, Some(VariantLabel::B));
    assert_eq!(launch.receipts.len(), 1);
}

#[test]
fn two_days_running_never_stops_even_when_very_significant() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let (test_id, variants) =
        launch_backdated(&fx, &engine, &two_variant_plan(TestType::Headline), 2, as_of);

    // Overwhelming difference: would be significant at any threshold
    ingest(&fx, variants[0].id, as_of, 50_000, 5_000, 0);
    ingest(&fx, variants[1].id, as_of, 50_000, 1_000, 0);

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    match outcome {
        AnalysisOutcome::Continue { reason, .. } => {
            assert_eq!(reason, "Test running less than minimum duration");
        }
        other => panic!("expected continue, got {other:?}"),
    }
    assert_eq!(
        fx.store.get_test(test_id).unwrap().status,
        TestStatus::Running
    );
}

#[test]
fn twenty_days_running_always_stops_even_without_significance() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let (test_id, variants) =
        launch_backdated(&fx, &engine, &two_variant_plan(TestType::Headline), 20, as_of);

    // Identical performance: nothing significant
    ingest(&fx, variants[0].id, as_of, 10_000, 300, 10);
    ingest(&fx, variants[1].id, as_of, 10_000, 300, 10);

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    match outcome {
        AnalysisOutcome::Completed {
            stop_reason,
            winner,
            ..
        } => {
            assert_eq!(stop_reason, "Maximum test duration reached");
            assert!(winner.winner.is_none());
            assert_eq!(winner.confidence, 0.0);
        }
        other => panic!("expected completed, got {other:?}"),
    }

    // No clear winner: nothing paused, nothing flagged
    let test = fx.store.get_test(test_id).unwrap();
    assert_eq!(test.status, TestStatus::Completed);
    assert!(test.winner_creative.is_none());
    for variant in &variants {
        let creative = fx.store.get_creative(variant.id).unwrap();
        assert!(creative.is_active);
        assert!(!creative.is_winner);
    }
}

#[test]
fn sample_size_gate_blocks_significance_stop() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let mut plan = two_variant_plan(TestType::Headline);
    plan.min_sample_size = Some(50_000);
    let (test_id, variants) = launch_backdated(&fx, &engine, &plan, 6, as_of);

    ingest(&fx, variants[0].id, as_of, 10_000, 800, 0);
    ingest(&fx, variants[1].id, as_of, 10_000, 600, 0);

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    match outcome {
        AnalysisOutcome::Continue { reason, .. } => {
            assert_eq!(reason, "Minimum sample size not reached");
        }
        other => panic!("expected continue, got {other:?}"),
    }
}

#[test]
fn very_significant_headline_test_stops_early_and_finalizes() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let mut plan = two_variant_plan(TestType::Headline);
    plan.min_sample_size = Some(5_000);
    let (test_id, variants) = launch_backdated(&fx, &engine, &plan, 6, as_of);

    // 8% vs 6% CTR at 10k impressions each: p far below 0.01,
    // effect size |0.08 - 0.06| / 0.06 = 0.333
    ingest(&fx, variants[0].id, as_of, 10_000, 800, 0);
    ingest(&fx, variants[1].id, as_of, 10_000, 600, 0);

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    let (stop_reason, winner) = match outcome {
        AnalysisOutcome::Completed {
            stop_reason,
            winner,
            ..
        } => (stop_reason, winner),
        other => panic!("expected completed, got {other:?}"),
    };

    assert_eq!(stop_reason, "Early stopping - very significant result");
    assert_eq!(winner.winner, Some(VariantLabel::A));
    assert!((winner.improvement - 33.3).abs() < 0.5);
    assert!(winner.confidence > 0.99);

    let test = fx.store.get_test(test_id).unwrap();
    assert_eq!(test.status, TestStatus::Completed);
    assert!(test.completed_at.is_some());
    assert_eq!(test.winner_creative, Some(variants[0].id));
    assert_eq!(test.statistical_significance, Some(winner.confidence));

    let creative_a = fx.store.get_creative(variants[0].id).unwrap();
    let creative_b = fx.store.get_creative(variants[1].id).unwrap();
    assert!(creative_a.is_winner);
    assert!(creative_a.is_active);
    assert!(!creative_b.is_winner);
    assert!(!creative_b.is_active);
}

#[test]
fn moderately_significant_result_stops_after_five_days() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let mut plan = two_variant_plan(TestType::Headline);
    plan.min_sample_size = Some(5_000);
    let (test_id, variants) = launch_backdated(&fx, &engine, &plan, 6, as_of);

    // 4.6% vs 4.0% CTR: p around 0.037 (between 0.01 and 0.05),
    // effect size 0.15
    ingest(&fx, variants[0].id, as_of, 10_000, 460, 0);
    ingest(&fx, variants[1].id, as_of, 10_000, 400, 0);

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    match outcome {
        AnalysisOutcome::Completed {
            stop_reason,
            winner,
            ..
        } => {
            assert_eq!(stop_reason, "Statistically significant result");
            assert_eq!(winner.winner, Some(VariantLabel::A));
        }
        other => panic!("expected completed, got {other:?}"),
    }
}

#[test]
fn moderately_significant_result_waits_before_five_days() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let mut plan = two_variant_plan(TestType::Headline);
    plan.min_sample_size = Some(5_000);
    let (test_id, variants) = launch_backdated(&fx, &engine, &plan, 4, as_of);

    ingest(&fx, variants[0].id, as_of, 10_000, 460, 0);
    ingest(&fx, variants[1].id, as_of, 10_000, 400, 0);

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    match outcome {
        AnalysisOutcome::Continue { reason, .. } => {
            assert_eq!(reason, "Continue test");
        }
        other => panic!("expected continue, got {other:?}"),
    }
}

#[test]
fn planned_duration_completes_without_significance() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let mut plan = two_variant_plan(TestType::Headline);
    plan.duration_days = Some(7);
    let (test_id, variants) = launch_backdated(&fx, &engine, &plan, 7, as_of);

    ingest(&fx, variants[0].id, as_of, 10_000, 300, 0);
    ingest(&fx, variants[1].id, as_of, 10_000, 305, 0);

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    match outcome {
        AnalysisOutcome::Completed {
            stop_reason,
            winner,
            recommendations,
            ..
        } => {
            assert_eq!(stop_reason, "Planned test duration completed");
            assert!(winner.winner.is_none());
            assert_eq!(winner.confidence, 0.0);
            assert!(recommendations
                .iter()
                .any(|r| r.contains("No clear winner found")));
        }
        other => panic!("expected completed, got {other:?}"),
    }
}

#[test]
fn creative_test_compares_conversion_rates() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let mut plan = two_variant_plan(TestType::Creative);
    plan.min_sample_size = Some(1_000);
    let (test_id, variants) = launch_backdated(&fx, &engine, &plan, 6, as_of);

    // Same CTR, very different conversion rates
    ingest(&fx, variants[0].id, as_of, 20_000, 2_000, 300);
    ingest(&fx, variants[1].id, as_of, 20_000, 2_000, 150);

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    match outcome {
        AnalysisOutcome::Completed { winner, results, .. } => {
            assert_eq!(winner.winner, Some(VariantLabel::A));
            assert!(results
                .pairwise_tests
                .iter()
                .all(|t| t.metric == neuroads_stats::MetricKind::ConversionRate));
        }
        other => panic!("expected completed, got {other:?}"),
    }
}

#[test]
fn pause_failure_does_not_invalidate_persisted_decision() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let mut plan = two_variant_plan(TestType::Headline);
    plan.min_sample_size = Some(5_000);
    let (test_id, variants) = launch_backdated(&fx, &engine, &plan, 6, as_of);

    ingest(&fx, variants[0].id, as_of, 10_000, 800, 0);
    ingest(&fx, variants[1].id, as_of, 10_000, 600, 0);

    fx.sandbox.fail_pauses(true);
    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    assert!(outcome.is_completed());

    // Local state still reflects the decision
    let test = fx.store.get_test(test_id).unwrap();
    assert_eq!(test.status, TestStatus::Completed);
    assert!(!fx.store.get_creative(variants[1].id).unwrap().is_active);
}

#[test]
fn terminal_tests_are_skipped_and_unchanged() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());
    let as_of = Utc::now();
    let (test_id, _) =
        launch_backdated(&fx, &engine, &two_variant_plan(TestType::Headline), 6, as_of);

    engine.cancel_test(&fx.store, test_id, as_of).unwrap();

    let outcome = engine.analyze(&fx.store, &fx.analytics, &fx.registry, test_id, as_of);
    match outcome {
        AnalysisOutcome::Skipped { reason } => {
            assert_eq!(reason, "Test is not running (status: cancelled)");
        }
        other => panic!("expected skipped, got {other:?}"),
    }
    assert_eq!(
        fx.store.get_test(test_id).unwrap().status,
        TestStatus::Cancelled
    );
}

#[test]
fn missing_test_reports_structured_failure() {
    let fx = fixture();
    let engine = ABTestEngine::new(ExperimentConfig::default());

    let outcome = engine.analyze(
        &fx.store,
        &fx.analytics,
        &fx.registry,
        Uuid::new_v4(),
        Utc::now(),
    );
    assert!(matches!(outcome, AnalysisOutcome::Failed { .. }));
}
