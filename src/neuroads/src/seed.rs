//! Seeded sandbox world for the CLI: one campaign with a strong and a weak
//! ad set, a week of analytics, and a running headline test with six days
//! of variant data.

use chrono::{DateTime, Duration, Utc};
use neuroads_analytics::{AnalyticsRecord, AnalyticsStore};
use neuroads_core::types::*;
use neuroads_core::{AppConfig, CampaignStore, NeuroAdsResult};
use neuroads_experiments::{ABTestEngine, TestPlan, VariantSpec};
use neuroads_integrations::{PlatformRegistry, SandboxAdapter};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct DemoWorld {
    pub store: CampaignStore,
    pub analytics: AnalyticsStore,
    pub registry: PlatformRegistry,
    pub campaign_id: Uuid,
    pub test_id: Uuid,
}

pub fn seed(config: &AppConfig, now: DateTime<Utc>) -> NeuroAdsResult<DemoWorld> {
    let store = CampaignStore::new();
    let analytics = AnalyticsStore::new();

    let mut registry = PlatformRegistry::new();
    registry.register(Arc::new(SandboxAdapter::new(Platform::Google)));
    registry.register(Arc::new(SandboxAdapter::new(Platform::Meta)));

    let campaign = Campaign {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: "Aurora Launch".to_string(),
        description: "Sandbox demo campaign".to_string(),
        campaign_type: CampaignType::Conversions,
        status: CampaignStatus::Active,
        total_budget: 2000.0,
        daily_budget: Some(300.0),
        auto_optimization: true,
        auto_budget_reallocation: true,
        auto_ab_testing: true,
        created_at: now - Duration::days(30),
        updated_at: now,
    };
    let campaign_id = campaign.id;
    store.insert_campaign(campaign);

    let strong = AdSet {
        id: Uuid::new_v4(),
        campaign_id,
        platform: Platform::Google,
        name: "Google search".to_string(),
        allocated_budget: 1200.0,
        spend: 0.0,
        impressions: 0,
        clicks: 0,
        conversions: 0,
        is_active: true,
        created_at: now - Duration::days(30),
    };
    let weak = AdSet {
        id: Uuid::new_v4(),
        campaign_id,
        platform: Platform::Meta,
        name: "Meta feed".to_string(),
        allocated_budget: 800.0,
        spend: 0.0,
        impressions: 0,
        clicks: 0,
        conversions: 0,
        is_active: true,
        created_at: now - Duration::days(29),
    };
    let strong_id = strong.id;
    let weak_id = weak.id;
    store.insert_ad_set(strong);
    store.insert_ad_set(weak);

    // Six days of history: Google converts well, Meta burns budget
    for days_ago in 1..=6 {
        let date = (now - Duration::days(days_ago)).date_naive();
        analytics.ingest(AnalyticsRecord {
            id: Uuid::new_v4(),
            campaign_id,
            ad_set_id: Some(strong_id),
            creative_id: None,
            date,
            impressions: 1500,
            clicks: 75,
            conversions: 15,
            spend: 180.0,
            revenue: 900.0,
        });
        analytics.ingest(AnalyticsRecord {
            id: Uuid::new_v4(),
            campaign_id,
            ad_set_id: Some(weak_id),
            creative_id: None,
            date,
            impressions: 1500,
            clicks: 15,
            conversions: 1,
            spend: 120.0,
            revenue: 60.0,
        });
    }

    // A headline test launched six days ago, with one variant clearly ahead
    let engine = ABTestEngine::new(config.experiments.clone());
    let mut plan = TestPlan::new(
        TestType::Headline,
        vec![
            VariantSpec {
                headline: "Ship faster with Aurora".to_string(),
                ..VariantSpec::default()
            },
            VariantSpec {
                headline: "Aurora: the modern launch platform".to_string(),
                ..VariantSpec::default()
            },
        ],
    );
    plan.min_sample_size = Some(5000);
    let launch = engine.create_test(
        &store,
        &registry,
        campaign_id,
        &plan,
        now - Duration::days(6),
    )?;

    let clicks_per_variant = [800u64, 600u64];
    for (variant, clicks) in launch.variants.iter().zip(clicks_per_variant) {
        analytics.ingest(AnalyticsRecord {
            id: Uuid::new_v4(),
            campaign_id,
            ad_set_id: Some(strong_id),
            creative_id: Some(variant.id),
            date: (now - Duration::days(1)).date_naive(),
            impressions: 10_000,
            clicks,
            conversions: clicks / 10,
            spend: 200.0,
            revenue: 800.0,
        });
    }

    info!(
        campaign_id = %campaign_id,
        test_id = %launch.test.id,
        records = analytics.len(),
        "Sandbox world seeded"
    );

    Ok(DemoWorld {
        store,
        analytics,
        registry,
        campaign_id,
        test_id: launch.test.id,
    })
}
