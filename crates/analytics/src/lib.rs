//! Performance analytics: append-only daily records and the metrics
//! aggregator that collapses them into summary statistics.

pub mod aggregator;
pub mod store;

pub use aggregator::{MetricsSummary, RawTotals};
pub use store::{AnalyticsRecord, AnalyticsStore, MetricsQuery, MetricsSource};
