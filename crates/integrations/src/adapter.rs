//! Base trait shared by all advertising platform integrations.

use chrono::NaiveDate;
use neuroads_analytics::RawTotals;
use neuroads_core::types::{AdCreative, AdSet, Campaign, Platform};
use neuroads_core::NeuroAdsResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Launch parameters for a set of test variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Fraction of traffic sent to each variant (0.5 for a 50/50 split).
    pub traffic_split: f64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self { traffic_split: 0.5 }
    }
}

/// Outcome of a successful variant launch on one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchReceipt {
    pub platform: Platform,
    pub variants_launched: usize,
    pub external_ids: Vec<String>,
    pub traffic_split: f64,
}

/// Capability set every platform integration implements. Each operation
/// can fail independently of any statistical decision already computed.
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Creates the campaign on the platform, returning its external id.
    fn create_campaign(&self, campaign: &Campaign) -> NeuroAdsResult<String>;

    /// Pushes test variants live.
    fn launch_variants(
        &self,
        campaign: &Campaign,
        variants: &[AdCreative],
        config: &LaunchConfig,
    ) -> NeuroAdsResult<LaunchReceipt>;

    /// Pauses a single creative.
    fn pause_creative(&self, creative: &AdCreative) -> NeuroAdsResult<()>;

    /// Pushes a new ad set budget to the platform.
    fn update_budget(&self, ad_set: &AdSet, new_budget: f64) -> NeuroAdsResult<()>;

    /// Platform-reported performance totals for a date window.
    fn get_metrics(
        &self,
        campaign: &Campaign,
        start: NaiveDate,
        end: NaiveDate,
    ) -> NeuroAdsResult<RawTotals>;
}

/// Registry mapping each platform to its adapter.
#[derive(Default)]
pub struct PlatformRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn get(&self, platform: Platform) -> Option<&Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform)
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.adapters.keys().copied().collect()
    }
}
