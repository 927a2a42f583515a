//! Budget allocation engine: scores ad sets against campaign averages,
//! moves budget from weak or idle ad sets to strong ones under per-cycle
//! caps, and records every applied cycle in an append-only audit log.

pub mod optimizer;
pub mod outcome;
pub mod scoring;

pub use optimizer::BudgetOptimizer;
pub use outcome::{BudgetChange, Opportunity, OpportunityKind, OptimizationOutcome};
pub use scoring::{AdSetPerformance, CampaignAverages};
