//! Sandbox platform adapter: records every call in memory and supports
//! failure injection, standing in for the real platform APIs in tests and
//! the demo binary.

use crate::adapter::{LaunchConfig, LaunchReceipt, PlatformAdapter};
use chrono::NaiveDate;
use neuroads_analytics::RawTotals;
use neuroads_core::types::{AdCreative, AdSet, Campaign, Platform};
use neuroads_core::{NeuroAdsError, NeuroAdsResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxCall {
    CreateCampaign { campaign_id: Uuid },
    LaunchVariants { campaign_id: Uuid, count: usize },
    PauseCreative { creative_id: Uuid },
    UpdateBudget { ad_set_id: Uuid, new_budget: f64 },
    GetMetrics { campaign_id: Uuid },
}

pub struct SandboxAdapter {
    platform: Platform,
    fail_launches: AtomicBool,
    fail_pauses: AtomicBool,
    fail_budget_updates: AtomicBool,
    calls: Mutex<Vec<SandboxCall>>,
}

impl SandboxAdapter {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            fail_launches: AtomicBool::new(false),
            fail_pauses: AtomicBool::new(false),
            fail_budget_updates: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_launches(&self, fail: bool) {
        self.fail_launches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pauses(&self, fail: bool) {
        self.fail_pauses.store(fail, Ordering::SeqCst);
    }

    pub fn fail_budget_updates(&self, fail: bool) {
        self.fail_budget_updates.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SandboxCall> {
        // Recover the log even if a caller panicked mid-assertion; the Vec
        // itself is never left in a partial state.
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, call: SandboxCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    fn external_id(&self, kind: &str) -> String {
        format!("{}-{}-{:08x}", self.platform, kind, rand::random::<u32>())
    }
}

impl PlatformAdapter for SandboxAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn create_campaign(&self, campaign: &Campaign) -> NeuroAdsResult<String> {
        self.record(SandboxCall::CreateCampaign {
            campaign_id: campaign.id,
        });
        Ok(self.external_id("campaign"))
    }

    fn launch_variants(
        &self,
        campaign: &Campaign,
        variants: &[AdCreative],
        config: &LaunchConfig,
    ) -> NeuroAdsResult<LaunchReceipt> {
        if self.fail_launches.load(Ordering::SeqCst) {
            return Err(NeuroAdsError::Platform(format!(
                "{} rejected variant launch",
                self.platform
            )));
        }
        self.record(SandboxCall::LaunchVariants {
            campaign_id: campaign.id,
            count: variants.len(),
        });
        info!(
            platform = %self.platform,
            campaign_id = %campaign.id,
            variants = variants.len(),
            "Sandbox launch"
        );
        Ok(LaunchReceipt {
            platform: self.platform,
            variants_launched: variants.len(),
            external_ids: variants.iter().map(|_| self.external_id("creative")).collect(),
            traffic_split: config.traffic_split,
        })
    }

    fn pause_creative(&self, creative: &AdCreative) -> NeuroAdsResult<()> {
        if self.fail_pauses.load(Ordering::SeqCst) {
            return Err(NeuroAdsError::Platform(format!(
                "{} rejected creative pause",
                self.platform
            )));
        }
        self.record(SandboxCall::PauseCreative {
            creative_id: creative.id,
        });
        Ok(())
    }

    fn update_budget(&self, ad_set: &AdSet, new_budget: f64) -> NeuroAdsResult<()> {
        if self.fail_budget_updates.load(Ordering::SeqCst) {
            return Err(NeuroAdsError::Platform(format!(
                "{} rejected budget update",
                self.platform
            )));
        }
        self.record(SandboxCall::UpdateBudget {
            ad_set_id: ad_set.id,
            new_budget,
        });
        Ok(())
    }

    fn get_metrics(
        &self,
        campaign: &Campaign,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> NeuroAdsResult<RawTotals> {
        self.record(SandboxCall::GetMetrics {
            campaign_id: campaign.id,
        });
        Ok(RawTotals::default())
    }
}
