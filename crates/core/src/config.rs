use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `NEUROADS__`.
///
/// Engine thresholds are explicit configuration values handed to each
/// engine at construction, so tests can vary them deterministically.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub experiments: ExperimentConfig,
    #[serde(default)]
    pub allocation: AllocationConfig,
}

/// Thresholds governing the A/B test engine.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    /// Minimum impressions per variant before significance can stop a test.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: u64,
    /// Hard stop regardless of significance.
    #[serde(default = "default_max_test_duration_days")]
    pub max_test_duration_days: u32,
    /// p-value below which a pairwise test counts as significant (95%).
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,
    /// Relative effect size required to declare a winner (10%).
    #[serde(default = "default_minimum_effect_size")]
    pub minimum_effect_size: f64,
    /// Early-stop p-value threshold (99%).
    #[serde(default = "default_early_stopping_threshold")]
    pub early_stopping_threshold: f64,
    /// Minimum observation window in days; no stop decision before this.
    #[serde(default = "default_min_test_days")]
    pub min_test_days: u32,
    /// Days a test must run before a regular (non-early) significance stop.
    #[serde(default = "default_min_days_for_significance")]
    pub min_days_for_significance: u32,
    /// Default planned duration for new tests.
    #[serde(default = "default_test_duration_days")]
    pub default_test_duration_days: u32,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            min_sample_size: default_min_sample_size(),
            max_test_duration_days: default_max_test_duration_days(),
            significance_threshold: default_significance_threshold(),
            minimum_effect_size: default_minimum_effect_size(),
            early_stopping_threshold: default_early_stopping_threshold(),
            min_test_days: default_min_test_days(),
            min_days_for_significance: default_min_days_for_significance(),
            default_test_duration_days: default_test_duration_days(),
        }
    }
}

/// Thresholds governing the budget allocation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationConfig {
    /// Minimum aggregate (and per-ad-set) relative change to persist.
    #[serde(default = "default_min_budget_change_threshold")]
    pub min_budget_change_threshold: f64,
    /// Per-ad-set cap on budget movement in one cycle.
    #[serde(default = "default_max_budget_change_per_day")]
    pub max_budget_change_per_day: f64,
    /// Days of performance history scored each cycle.
    #[serde(default = "default_performance_lookback_days")]
    pub performance_lookback_days: u32,
    /// Opportunities below this confidence are discarded.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            min_budget_change_threshold: default_min_budget_change_threshold(),
            max_budget_change_per_day: default_max_budget_change_per_day(),
            performance_lookback_days: default_performance_lookback_days(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("NEUROADS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

fn default_min_sample_size() -> u64 {
    100
}

fn default_max_test_duration_days() -> u32 {
    14
}

fn default_significance_threshold() -> f64 {
    0.05
}

fn default_minimum_effect_size() -> f64 {
    0.1
}

fn default_early_stopping_threshold() -> f64 {
    0.01
}

fn default_min_test_days() -> u32 {
    3
}

fn default_min_days_for_significance() -> u32 {
    5
}

fn default_test_duration_days() -> u32 {
    7
}

fn default_min_budget_change_threshold() -> f64 {
    0.05
}

fn default_max_budget_change_per_day() -> f64 {
    0.20
}

fn default_performance_lookback_days() -> u32 {
    7
}

fn default_confidence_threshold() -> f64 {
    0.7
}
