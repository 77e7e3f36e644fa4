// Market pricing and launch configuration models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One market price sample for a resource class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceObservation {
    pub resource_class: String,
    pub product: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Output of the bid estimator. final_bid is what gets published; the rest
/// records how it was derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BidEstimate {
    pub statistic_value: f64,
    pub margin_multiplier: f64,
    pub final_bid: f64,
    pub sample_count: usize,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// What happens to an instance when the market reclaims it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptionPolicy {
    Terminate,
    Stop,
    Hibernate,
}

/// Market-facing options carried on a launch config version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketOptions {
    pub bid: f64,
    pub interruption_policy: InterruptionPolicy,
    #[serde(default)]
    pub max_duration_minutes: Option<u32>,
}

/// One immutable version of a launch configuration. Only the default pointer
/// ever moves; version contents never change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfigVersion {
    pub config_id: String,
    pub version_number: u64,
    /// The version this one was derived from; root versions have none.
    #[serde(default)]
    pub source_version: Option<String>,
    pub market_options: MarketOptions,
    pub is_default: bool,
}
