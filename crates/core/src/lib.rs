//! Core domain types, configuration, error taxonomy, and storage for the
//! NeuroAds experiment and allocation engines.

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{AllocationConfig, AppConfig, ExperimentConfig};
pub use error::{NeuroAdsError, NeuroAdsResult};
pub use store::CampaignStore;
