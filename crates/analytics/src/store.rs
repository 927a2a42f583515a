//! Append-only analytics ingestion and the query interface the engines
//! read aggregates through.
//!
//! Production: replace with a columnar store (ClickHouse or similar); the
//! in-memory store keeps the same query surface for development and tests.

use crate::aggregator::RawTotals;
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// One row per (campaign, optional ad set, optional creative, day).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub ad_set_id: Option<Uuid>,
    pub creative_id: Option<Uuid>,
    pub date: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub revenue: f64,
}

/// Scope and window for a metrics query. Dates are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsQuery {
    pub campaign_id: Uuid,
    pub ad_set_id: Option<Uuid>,
    pub creative_id: Option<Uuid>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MetricsQuery {
    pub fn campaign(campaign_id: Uuid, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            campaign_id,
            ad_set_id: None,
            creative_id: None,
            start,
            end,
        }
    }

    pub fn ad_set(
        campaign_id: Uuid,
        ad_set_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            campaign_id,
            ad_set_id: Some(ad_set_id),
            creative_id: None,
            start,
            end,
        }
    }

    pub fn creative(
        campaign_id: Uuid,
        creative_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            campaign_id,
            ad_set_id: None,
            creative_id: Some(creative_id),
            start,
            end,
        }
    }

    fn matches(&self, record: &AnalyticsRecord) -> bool {
        if record.campaign_id != self.campaign_id {
            return false;
        }
        if let Some(ad_set_id) = self.ad_set_id {
            if record.ad_set_id != Some(ad_set_id) {
                return false;
            }
        }
        if let Some(creative_id) = self.creative_id {
            if record.creative_id != Some(creative_id) {
                return false;
            }
        }
        record.date >= self.start && record.date <= self.end
    }
}

/// Read side of the analytics store. Empty windows yield zeroed totals,
/// never errors.
pub trait MetricsSource: Send + Sync {
    fn totals(&self, query: &MetricsQuery) -> RawTotals;
}

/// Thread-safe append-only analytics store.
pub struct AnalyticsStore {
    records: DashMap<Uuid, AnalyticsRecord>,
}

impl AnalyticsStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn ingest(&self, record: AnalyticsRecord) {
        debug!(
            campaign_id = %record.campaign_id,
            date = %record.date,
            impressions = record.impressions,
            "Analytics record ingested"
        );
        self.records.insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MetricsSource for AnalyticsStore {
    fn totals(&self, query: &MetricsQuery) -> RawTotals {
        let mut totals = RawTotals::default();
        for record in self.records.iter() {
            let record = record.value();
            if query.matches(record) {
                totals.add(&RawTotals {
                    impressions: record.impressions,
                    clicks: record.clicks,
                    conversions: record.conversions,
                    spend: record.spend,
                    revenue: record.revenue,
                });
            }
        }
        totals
    }
}

impl Default for AnalyticsStore {
    fn default() -> Self {
        Self::new()
    }
}
