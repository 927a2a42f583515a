//! In-memory campaign store backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store. This
//! provides the same API surface for development and testing.
//!
//! Callers must serialize concurrent invocations against the same campaign
//! or test (per-entity locking or a single-writer scheduler); the store does
//! not implement cross-entity locking itself.

use crate::error::{NeuroAdsError, NeuroAdsResult};
use crate::types::{ABTest, AdCreative, AdSet, BudgetOptimization, Campaign, TestStatus};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store for campaigns, ad sets, creatives, A/B
/// tests, and the append-only budget-optimization audit log.
pub struct CampaignStore {
    campaigns: DashMap<Uuid, Campaign>,
    ad_sets: DashMap<Uuid, AdSet>,
    creatives: DashMap<Uuid, AdCreative>,
    ab_tests: DashMap<Uuid, ABTest>,
    optimizations: DashMap<Uuid, BudgetOptimization>,
}

impl CampaignStore {
    pub fn new() -> Self {
        info!("Campaign store initialized (in-memory, development mode)");
        Self {
            campaigns: DashMap::new(),
            ad_sets: DashMap::new(),
            creatives: DashMap::new(),
            ab_tests: DashMap::new(),
            optimizations: DashMap::new(),
        }
    }

    // ─── Campaigns ───────────────────────────────────────────────────────

    pub fn insert_campaign(&self, campaign: Campaign) {
        self.campaigns.insert(campaign.id, campaign);
    }

    pub fn get_campaign(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    pub fn list_campaigns(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> =
            self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    /// Removes a campaign and everything owned by it.
    pub fn delete_campaign(&self, id: Uuid) -> bool {
        let removed = self.campaigns.remove(&id).is_some();
        if removed {
            let ad_set_ids: Vec<Uuid> = self
                .ad_sets
                .iter()
                .filter(|r| r.value().campaign_id == id)
                .map(|r| *r.key())
                .collect();
            for ad_set_id in &ad_set_ids {
                self.ad_sets.remove(ad_set_id);
            }
            self.creatives
                .retain(|_, c| !ad_set_ids.contains(&c.ad_set_id));
            self.ab_tests.retain(|_, t| t.campaign_id != id);
            self.optimizations.retain(|_, o| o.campaign_id != id);
        }
        removed
    }

    // ─── Ad sets ─────────────────────────────────────────────────────────

    pub fn insert_ad_set(&self, ad_set: AdSet) {
        self.ad_sets.insert(ad_set.id, ad_set);
    }

    pub fn get_ad_set(&self, id: Uuid) -> Option<AdSet> {
        self.ad_sets.get(&id).map(|r| r.value().clone())
    }

    /// Ad sets for a campaign in creation order.
    pub fn ad_sets_for_campaign(&self, campaign_id: Uuid) -> Vec<AdSet> {
        let mut ad_sets: Vec<AdSet> = self
            .ad_sets
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        ad_sets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        ad_sets
    }

    /// The campaign's first ad set; test variants are attached here.
    pub fn primary_ad_set(&self, campaign_id: Uuid) -> Option<AdSet> {
        self.ad_sets_for_campaign(campaign_id).into_iter().next()
    }

    // ─── Creatives ───────────────────────────────────────────────────────

    pub fn insert_creative(&self, creative: AdCreative) {
        self.creatives.insert(creative.id, creative);
    }

    pub fn get_creative(&self, id: Uuid) -> Option<AdCreative> {
        self.creatives.get(&id).map(|r| r.value().clone())
    }

    pub fn remove_creative(&self, id: Uuid) -> bool {
        self.creatives.remove(&id).is_some()
    }

    /// All creatives attached to any ad set of the campaign.
    pub fn creatives_for_campaign(&self, campaign_id: Uuid) -> Vec<AdCreative> {
        let ad_set_ids: Vec<Uuid> = self
            .ad_sets
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| *r.key())
            .collect();
        let mut creatives: Vec<AdCreative> = self
            .creatives
            .iter()
            .filter(|r| ad_set_ids.contains(&r.value().ad_set_id))
            .map(|r| r.value().clone())
            .collect();
        creatives.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        creatives
    }

    // ─── A/B tests ───────────────────────────────────────────────────────

    pub fn insert_test(&self, test: ABTest) {
        self.ab_tests.insert(test.id, test);
    }

    pub fn get_test(&self, id: Uuid) -> Option<ABTest> {
        self.ab_tests.get(&id).map(|r| r.value().clone())
    }

    pub fn remove_test(&self, id: Uuid) -> bool {
        self.ab_tests.remove(&id).is_some()
    }

    pub fn tests_for_campaign(&self, campaign_id: Uuid) -> Vec<ABTest> {
        let mut tests: Vec<ABTest> = self
            .ab_tests
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        tests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tests
    }

    /// Marks a draft test as launched.
    pub fn mark_test_running(&self, id: Uuid, started_at: DateTime<Utc>) -> NeuroAdsResult<()> {
        let mut entry = self
            .ab_tests
            .get_mut(&id)
            .ok_or_else(|| NeuroAdsError::NotFound(format!("A/B test {id}")))?;
        entry.status = TestStatus::Running;
        entry.started_at = Some(started_at);
        Ok(())
    }

    pub fn cancel_test(&self, id: Uuid, completed_at: DateTime<Utc>) -> NeuroAdsResult<()> {
        let mut entry = self
            .ab_tests
            .get_mut(&id)
            .ok_or_else(|| NeuroAdsError::NotFound(format!("A/B test {id}")))?;
        if entry.status.is_terminal() {
            return Err(NeuroAdsError::Validation(format!(
                "Test {id} is already terminal"
            )));
        }
        entry.status = TestStatus::Cancelled;
        entry.completed_at = Some(completed_at);
        Ok(())
    }

    /// Applies a test completion as one unit: status, significance, winner
    /// flag, and loser pauses. Everything is validated before any mutation
    /// so a failure leaves the store untouched.
    pub fn complete_test(
        &self,
        test_id: Uuid,
        completed_at: DateTime<Utc>,
        statistical_significance: f64,
        winner_creative: Option<Uuid>,
        pause_creatives: &[Uuid],
    ) -> NeuroAdsResult<()> {
        if !self.ab_tests.contains_key(&test_id) {
            return Err(NeuroAdsError::NotFound(format!("A/B test {test_id}")));
        }
        if let Some(winner_id) = winner_creative {
            if !self.creatives.contains_key(&winner_id) {
                return Err(NeuroAdsError::NotFound(format!("creative {winner_id}")));
            }
        }
        for creative_id in pause_creatives {
            if !self.creatives.contains_key(creative_id) {
                return Err(NeuroAdsError::NotFound(format!("creative {creative_id}")));
            }
        }

        if let Some(mut test) = self.ab_tests.get_mut(&test_id) {
            test.status = TestStatus::Completed;
            test.completed_at = Some(completed_at);
            test.statistical_significance = Some(statistical_significance);
            test.winner_creative = winner_creative;
        }
        if let Some(winner_id) = winner_creative {
            if let Some(mut creative) = self.creatives.get_mut(&winner_id) {
                creative.is_winner = true;
            }
        }
        for creative_id in pause_creatives {
            if let Some(mut creative) = self.creatives.get_mut(creative_id) {
                creative.is_active = false;
            }
        }
        Ok(())
    }

    // ─── Budget optimization ─────────────────────────────────────────────

    /// Applies new ad set budgets and appends the audit record as one unit.
    /// All ad sets are validated before any budget is written.
    pub fn apply_allocation(
        &self,
        changes: &[(Uuid, f64)],
        record: BudgetOptimization,
    ) -> NeuroAdsResult<()> {
        for (ad_set_id, new_budget) in changes {
            if *new_budget < 0.0 {
                return Err(NeuroAdsError::Validation(format!(
                    "Negative budget {new_budget} for ad set {ad_set_id}"
                )));
            }
            if !self.ad_sets.contains_key(ad_set_id) {
                return Err(NeuroAdsError::NotFound(format!("ad set {ad_set_id}")));
            }
        }

        for (ad_set_id, new_budget) in changes {
            if let Some(mut ad_set) = self.ad_sets.get_mut(ad_set_id) {
                ad_set.allocated_budget = *new_budget;
            }
        }
        self.optimizations.insert(record.id, record);
        Ok(())
    }

    /// Audit history for a campaign, oldest first. Records are never updated.
    pub fn optimizations_for_campaign(&self, campaign_id: Uuid) -> Vec<BudgetOptimization> {
        let mut records: Vec<BudgetOptimization> = self
            .optimizations
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new()
    }
}
