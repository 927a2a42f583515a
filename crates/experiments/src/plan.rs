//! Test configuration supplied by the caller when creating an A/B test.

use neuroads_core::types::{CreativeType, TestType, VariantLabel};
use neuroads_core::{NeuroAdsError, NeuroAdsResult};
use serde::{Deserialize, Serialize};

/// Content for one test variant. One ad creative is materialized per
/// variant, labeled by its position in the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSpec {
    pub creative_type: CreativeType,
    pub headline: String,
    pub description: String,
    pub call_to_action: String,
    pub destination_url: String,
    pub image_url: String,
    pub video_url: String,
    pub confidence_score: f64,
}

impl Default for VariantSpec {
    fn default() -> Self {
        Self {
            creative_type: CreativeType::Text,
            headline: "Test Headline".to_string(),
            description: "Test Description".to_string(),
            call_to_action: "Learn More".to_string(),
            destination_url: "https://example.com".to_string(),
            image_url: String::new(),
            video_url: String::new(),
            confidence_score: 0.8,
        }
    }
}

/// Configuration for a new automated A/B test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPlan {
    pub test_type: TestType,
    pub variants: Vec<VariantSpec>,
    /// Fraction of traffic per variant (0.5 for a 50/50 split).
    pub traffic_split: f64,
    /// Planned duration; engine default applies when absent.
    pub duration_days: Option<u32>,
    /// Minimum impressions per variant; engine default applies when absent.
    pub min_sample_size: Option<u64>,
}

impl TestPlan {
    pub fn new(test_type: TestType, variants: Vec<VariantSpec>) -> Self {
        Self {
            test_type,
            variants,
            traffic_split: 0.5,
            duration_days: None,
            min_sample_size: None,
        }
    }

    /// Validates the plan before anything is persisted.
    pub fn validate(&self) -> NeuroAdsResult<()> {
        if self.variants.len() < 2 {
            return Err(NeuroAdsError::Validation(
                "Need at least 2 variants for A/B test".to_string(),
            ));
        }
        if VariantLabel::from_index(self.variants.len() - 1).is_none() {
            return Err(NeuroAdsError::Validation(format!(
                "Too many variants: {} (maximum 5)",
                self.variants.len()
            )));
        }
        if !(self.traffic_split > 0.0 && self.traffic_split <= 1.0) {
            return Err(NeuroAdsError::Validation(format!(
                "Invalid traffic split: {}",
                self.traffic_split
            )));
        }
        Ok(())
    }
}
