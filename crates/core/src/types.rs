//! Domain model: campaigns, ad sets, creatives, A/B tests, and the
//! budget-optimization audit record.
//!
//! `Campaign` is the root aggregate; ad sets, creatives, tests, and
//! optimization records are cascade-deleted with it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Supported advertising platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Google,
    Meta,
    LinkedIn,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Google => write!(f, "google"),
            Platform::Meta => write!(f, "meta"),
            Platform::LinkedIn => write!(f, "linkedin"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    Awareness,
    Traffic,
    Engagement,
    Leads,
    Conversions,
    Sales,
}

/// An autonomous advertising campaign. Root aggregate for ad sets,
/// creatives, A/B tests, and optimization history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub total_budget: f64,
    pub daily_budget: Option<f64>,
    /// Allows the allocation engine to mutate ad set budgets.
    pub auto_optimization: bool,
    pub auto_budget_reallocation: bool,
    pub auto_ab_testing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A budget- and targeting-scoped subdivision of a campaign on one platform.
///
/// `allocated_budget` is owned exclusively by the allocation engine once
/// auto-optimization is enabled. Budgets are advisory ceilings: the sum of
/// ad set allocations is not required to equal the campaign total budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSet {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub platform: Platform,
    pub name: String,
    pub allocated_budget: f64,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreativeType {
    Text,
    Image,
    Video,
    Carousel,
}

/// Variant label stamped on a creative when it is materialized for an A/B
/// test. Assigned from launch-time variant ordering and never re-derived
/// from display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariantLabel {
    A,
    B,
    C,
    D,
    E,
}

impl VariantLabel {
    /// Label for the variant at `index` in launch order.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(VariantLabel::A),
            1 => Some(VariantLabel::B),
            2 => Some(VariantLabel::C),
            3 => Some(VariantLabel::D),
            4 => Some(VariantLabel::E),
            _ => None,
        }
    }
}

impl fmt::Display for VariantLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantLabel::A => write!(f, "A"),
            VariantLabel::B => write!(f, "B"),
            VariantLabel::C => write!(f, "C"),
            VariantLabel::D => write!(f, "D"),
            VariantLabel::E => write!(f, "E"),
        }
    }
}

/// One concrete piece of ad content belonging to an ad set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdCreative {
    pub id: Uuid,
    pub ad_set_id: Uuid,
    pub name: String,
    pub creative_type: CreativeType,
    pub headline: String,
    pub description: String,
    pub call_to_action: String,
    pub destination_url: String,
    pub image_url: String,
    pub video_url: String,
    /// Set when the creative was created as an A/B test variant.
    pub variant_label: Option<VariantLabel>,
    pub ai_confidence_score: f64,
    pub is_active: bool,
    pub is_winner: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    Headline,
    Description,
    Cta,
    Creative,
    Audience,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestType::Headline => write!(f, "headline"),
            TestType::Description => write!(f, "description"),
            TestType::Cta => write!(f, "cta"),
            TestType::Creative => write!(f, "creative"),
            TestType::Audience => write!(f, "audience"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Draft,
    Running,
    Completed,
    Cancelled,
}

impl TestStatus {
    /// Completed and cancelled tests never re-enter draft or running.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TestStatus::Completed | TestStatus::Cancelled)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Draft => write!(f, "draft"),
            TestStatus::Running => write!(f, "running"),
            TestStatus::Completed => write!(f, "completed"),
            TestStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An A/B test over ad creative variants within one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ABTest {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub test_type: TestType,
    pub status: TestStatus,
    pub confidence_level: f64,
    /// Minimum impressions per variant before a significance stop is allowed.
    pub minimum_sample_size: u64,
    pub test_duration_days: u32,
    /// Set at most once, during finalization.
    pub winner_creative: Option<Uuid>,
    pub statistical_significance: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Campaign-level metrics snapshot captured on each applied optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetricsSnapshot {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub revenue: f64,
    pub roas: f64,
}

/// Immutable audit record for one applied budget-optimization cycle.
/// Append-only: created exactly once per applied cycle, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetOptimization {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub previous_allocation: HashMap<Uuid, f64>,
    pub new_allocation: HashMap<Uuid, f64>,
    pub optimization_reason: String,
    pub performance_metrics: CampaignMetricsSnapshot,
    pub expected_roas_improvement: f64,
    pub created_at: DateTime<Utc>,
}
