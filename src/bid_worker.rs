// Background pricing controller: sample -> estimate -> publish on a schedule.
// Cycles run on a cron expression or fixed interval; a failed cycle changes nothing.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::config::AppConfig;
use crate::estimator;
use crate::launch_repo::LaunchConfigStore;
use crate::market_repo::MarketHistory;
use crate::models::BidEstimate;
use crate::param_repo::ParameterStore;
use crate::publisher::Publisher;
use crate::retry::{self, RetryPolicy};
use crate::sampler::Sampler;
use crate::stores::StoreError;

/// Store clients and shutdown for the pricing worker.
pub struct BidWorkerDeps {
    pub market: Arc<dyn MarketHistory>,
    pub launch: Arc<dyn LaunchConfigStore>,
    pub params: Arc<dyn ParameterStore>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Pricing worker config, flattened from the app config.
#[derive(Debug, Clone)]
pub struct BidWorkerConfig {
    pub resource_class: String,
    pub product: String,
    pub lookback_hours: u64,
    pub margin_multiplier: f64,
    pub parameter_name: String,
    pub config_id: String,
    pub source_version: String,
    /// Run a cycle every N seconds when schedule is not set.
    pub cycle_interval_secs: u64,
    /// Optional cron expression (e.g. "0 0 * * * *" = hourly). Uses local time.
    pub schedule: Option<String>,
    pub retry: RetryPolicy,
}

impl BidWorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            resource_class: config.pricing.resource_class.clone(),
            product: config.pricing.product.clone(),
            lookback_hours: config.pricing.lookback_hours,
            margin_multiplier: config.pricing.margin_multiplier,
            parameter_name: config.pricing.parameter_name.clone(),
            config_id: config.pricing.config_id.clone(),
            source_version: config.pricing.source_version.clone(),
            cycle_interval_secs: config.pricing.cycle_interval_secs,
            schedule: config.pricing.schedule.clone(),
            retry: RetryPolicy::from_config(&config.retry),
        }
    }
}

/// The last bid this worker pushed out, kept for the freshness guard.
pub struct AppliedBid {
    pub final_bid: f64,
    pub window_end: DateTime<Utc>,
}

/// What one cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    Applied(BidEstimate),
    SkippedStale { window_end: DateTime<Utc> },
}

/// Spawns the pricing worker. Returns a join handle.
pub fn spawn(deps: BidWorkerDeps, config: BidWorkerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(deps, config).await;
    })
}

#[instrument(
    skip(deps, config),
    fields(config_id = %config.config_id, resource_class = %config.resource_class)
)]
async fn run(deps: BidWorkerDeps, config: BidWorkerConfig) {
    let BidWorkerDeps {
        market,
        launch,
        params,
        mut shutdown_rx,
    } = deps;

    let sampler = Sampler::new(market, config.lookback_hours, config.retry.clone());
    let publisher = Publisher::new(
        launch,
        config.retry.clone(),
        config.config_id.clone(),
        config.source_version.clone(),
    );
    let mut last_applied: Option<AppliedBid> = None;

    let (cycle_tx, mut cycle_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(cycle_scheduler(config.clone(), cycle_tx));

    loop {
        tokio::select! {
            _ = cycle_rx.recv() => {
                match run_cycle(&sampler, &publisher, params.as_ref(), &config, &mut last_applied).await {
                    Ok(CycleOutcome::Applied(estimate)) => {
                        info!(
                            final_bid = estimate.final_bid,
                            sample_count = estimate.sample_count,
                            window_end = %estimate.window_end,
                            "bid applied"
                        );
                    }
                    Ok(CycleOutcome::SkippedStale { window_end }) => {
                        debug!(window_end = %window_end, "cycle skipped; market window not newer");
                    }
                    Err(e) => {
                        warn!(error = %e, "pricing cycle failed; bid left unchanged");
                    }
                }
            }
            _ = &mut shutdown_rx => {
                debug!("Pricing worker shutting down");
                break;
            }
        }
    }
}

/// Sends a message on `tx` at each cycle time (cron or fixed interval). Uses local time for cron.
async fn cycle_scheduler(config: BidWorkerConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid schedule; pricing cycles will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            let next = schedule.after(&now).next();
            if let Some(next) = next {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.cycle_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}

/// Runs one sample -> estimate -> publish pass. Any error leaves the current
/// bid in place; the next cycle starts clean.
pub async fn run_cycle(
    sampler: &Sampler,
    publisher: &Publisher,
    params: &dyn ParameterStore,
    config: &BidWorkerConfig,
    last_applied: &mut Option<AppliedBid>,
) -> anyhow::Result<CycleOutcome> {
    let now = Utc::now();
    let observations = sampler
        .sample(&config.resource_class, &config.product, now)
        .await?;
    let estimate = estimator::estimate(&observations, config.margin_multiplier)?;

    if let Some(prev) = last_applied.as_ref()
        && estimate.window_end <= prev.window_end
    {
        debug!(
            last_bid = prev.final_bid,
            last_window_end = %prev.window_end,
            "stale window; keeping current bid"
        );
        return Ok(CycleOutcome::SkippedStale {
            window_end: estimate.window_end,
        });
    }

    let published = publisher.publish(&estimate).await?;

    // Advisory record, written only after the default actually moved.
    let value = format_bid(estimate.final_bid);
    if let Err(e) = retry::retry(
        &config.retry,
        "put_parameter",
        || params.put_parameter(&config.parameter_name, &value, true),
        StoreError::is_transient,
    )
    .await
    {
        warn!(
            error = %e,
            parameter_name = %config.parameter_name,
            "advisory bid parameter not updated"
        );
    }

    debug!(version_number = published.version_number, "cycle complete");
    *last_applied = Some(AppliedBid {
        final_bid: estimate.final_bid,
        window_end: estimate.window_end,
    });
    Ok(CycleOutcome::Applied(estimate))
}

/// Bids travel as fixed 4-decimal strings.
pub fn format_bid(bid: f64) -> String {
    format!("{:.4}", bid)
}
