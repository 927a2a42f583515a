//! Statistical test library: two-sample hypothesis tests over count data.
//!
//! Pure functions with no domain dependency — identical inputs always
//! produce identical outputs.

pub mod distributions;
pub mod proportion;
pub mod welch;

pub use proportion::{two_proportion_z_test, ProportionTestResult, TestWinner};
pub use welch::{welch_t_test, GroupSummary, MeanTestResult, MetricKind};
