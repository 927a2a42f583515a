//! A/B test engine: test lifecycle (draft → running → completed/cancelled),
//! per-cycle statistical analysis, stop decisions, winner declaration, and
//! finalization.

pub mod engine;
pub mod plan;
pub mod results;

pub use engine::ABTestEngine;
pub use plan::{TestPlan, VariantSpec};
pub use results::{
    AnalysisOutcome, PairwiseTest, StatisticalResults, TestLaunch, VariantPerformance,
    WinnerDeclaration,
};
