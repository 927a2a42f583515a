//! Opportunities and structured outcomes produced by the budget optimizer.

use neuroads_core::types::Platform;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    IncreaseBudget,
    DecreaseBudget,
}

/// One identified budget move, before redistribution and caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub ad_set_id: Uuid,
    pub kind: OpportunityKind,
    pub current_budget: f64,
    pub reason: String,
    pub confidence: f64,
    /// Suggested move as a fraction of the current budget.
    pub suggested_change: f64,
}

/// One persisted budget write, reported back to the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetChange {
    pub ad_set_id: Uuid,
    pub ad_set_name: String,
    pub platform: Platform,
    pub previous_budget: f64,
    pub new_budget: f64,
    pub change_amount: f64,
    pub change_percentage: f64,
}

/// Result of one optimization cycle. The no-op variants are ordinary
/// outcomes, distinct from errors: nothing was wrong, there was just
/// nothing worth doing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationOutcome {
    /// Budgets were rewritten and an audit record appended.
    Applied {
        optimization_id: Uuid,
        changes: Vec<BudgetChange>,
        expected_improvement: f64,
        reason: String,
        opportunities_count: usize,
    },
    /// No ad set had performance data in the lookback window.
    InsufficientData { reason: String },
    /// Data was present but nothing cleared the opportunity rules.
    NoOpportunities { reason: String },
    /// Proposed moves were too small to be worth persisting.
    BelowThreshold { reason: String },
}

impl OptimizationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, OptimizationOutcome::Applied { .. })
    }
}
