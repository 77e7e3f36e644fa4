use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub stores: StoresConfig,
    pub pricing: PricingConfig,
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Base URLs and timeouts for the upstream stores.
#[derive(Debug, Clone, Deserialize)]
pub struct StoresConfig {
    pub market_url: String,
    pub launch_url: String,
    pub parameter_url: String,
    pub archive_url: String,
    pub scaler_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Resource class the fleet bids on (e.g. "g5.4xlarge").
    pub resource_class: String,
    #[serde(default = "default_product")]
    pub product: String,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u64,
    #[serde(default = "default_margin_multiplier")]
    pub margin_multiplier: f64,
    #[serde(default = "default_parameter_name")]
    pub parameter_name: String,
    /// Launch config whose default version carries the bid.
    pub config_id: String,
    #[serde(default = "default_source_version")]
    pub source_version: String,
    /// Run a pricing cycle every N seconds when schedule is not set.
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Optional cron expression for cycles (e.g. "0 0 * * * *" = hourly). Uses local time.
    #[serde(default)]
    pub schedule: Option<String>,
}

fn default_product() -> String {
    "Linux/UNIX".to_string()
}

fn default_lookback_hours() -> u64 {
    3
}

fn default_margin_multiplier() -> f64 {
    1.2
}

fn default_parameter_name() -> String {
    "SpotInstanceMaxPrice".to_string()
}

fn default_source_version() -> String {
    "1".to_string()
}

fn default_cycle_interval_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Deadline for handler work on one event, in seconds.
    pub hook_timeout_secs: u64,
    /// Heartbeat the scaler on overrun instead of abandoning immediately.
    #[serde(default)]
    pub extend_deadline: bool,
    /// Extensions allowed per event when extend_deadline is set.
    #[serde(default)]
    pub max_extensions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5000
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config = Self::load_from_str(&s)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Deployment-injected identifiers win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LAUNCH_CONFIG_ID")
            && !v.is_empty()
        {
            self.pricing.config_id = v;
        }
        if let Ok(v) = std::env::var("RESOURCE_CLASS")
            && !v.is_empty()
        {
            self.pricing.resource_class = v;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        for (key, url) in [
            ("stores.market_url", &self.stores.market_url),
            ("stores.launch_url", &self.stores.launch_url),
            ("stores.parameter_url", &self.stores.parameter_url),
            ("stores.archive_url", &self.stores.archive_url),
            ("stores.scaler_url", &self.stores.scaler_url),
        ] {
            anyhow::ensure!(!url.is_empty(), "{} must be non-empty", key);
        }
        anyhow::ensure!(
            self.stores.request_timeout_secs > 0,
            "stores.request_timeout_secs must be > 0, got {}",
            self.stores.request_timeout_secs
        );
        anyhow::ensure!(
            self.stores.connect_timeout_secs > 0,
            "stores.connect_timeout_secs must be > 0, got {}",
            self.stores.connect_timeout_secs
        );
        anyhow::ensure!(
            !self.pricing.resource_class.is_empty(),
            "pricing.resource_class must be non-empty"
        );
        anyhow::ensure!(
            !self.pricing.product.is_empty(),
            "pricing.product must be non-empty"
        );
        anyhow::ensure!(
            self.pricing.lookback_hours > 0,
            "pricing.lookback_hours must be > 0, got {}",
            self.pricing.lookback_hours
        );
        anyhow::ensure!(
            self.pricing.margin_multiplier >= 1.0,
            "pricing.margin_multiplier must be >= 1.0, got {}",
            self.pricing.margin_multiplier
        );
        anyhow::ensure!(
            !self.pricing.parameter_name.is_empty(),
            "pricing.parameter_name must be non-empty"
        );
        anyhow::ensure!(
            !self.pricing.config_id.is_empty(),
            "pricing.config_id must be non-empty"
        );
        anyhow::ensure!(
            !self.pricing.source_version.is_empty(),
            "pricing.source_version must be non-empty"
        );
        anyhow::ensure!(
            self.pricing.cycle_interval_secs > 0,
            "pricing.cycle_interval_secs must be > 0, got {}",
            self.pricing.cycle_interval_secs
        );
        if let Some(ref schedule) = self.pricing.schedule {
            anyhow::ensure!(
                cron::Schedule::from_str(schedule).is_ok(),
                "pricing.schedule is not a valid cron expression: {}",
                schedule
            );
        }
        anyhow::ensure!(
            self.lifecycle.hook_timeout_secs > 0,
            "lifecycle.hook_timeout_secs must be > 0, got {}",
            self.lifecycle.hook_timeout_secs
        );
        if self.lifecycle.extend_deadline {
            anyhow::ensure!(
                self.lifecycle.max_extensions > 0,
                "lifecycle.max_extensions must be > 0 when extend_deadline is set"
            );
        }
        anyhow::ensure!(
            self.retry.max_attempts > 0,
            "retry.max_attempts must be > 0, got {}",
            self.retry.max_attempts
        );
        anyhow::ensure!(
            self.retry.initial_delay_ms > 0,
            "retry.initial_delay_ms must be > 0, got {}",
            self.retry.initial_delay_ms
        );
        anyhow::ensure!(
            self.retry.max_delay_ms >= self.retry.initial_delay_ms,
            "retry.max_delay_ms must be >= retry.initial_delay_ms, got {}",
            self.retry.max_delay_ms
        );
        Ok(())
    }
}
