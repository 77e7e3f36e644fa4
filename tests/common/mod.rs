// Shared test helpers: in-memory store fakes with call counting

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fleetwarden::archive_repo::LogArchive;
use fleetwarden::launch_repo::{CreateVersionRequest, LaunchConfigStore};
use fleetwarden::market_repo::{MarketHistory, PriceQuery};
use fleetwarden::models::*;
use fleetwarden::param_repo::ParameterStore;
use fleetwarden::retry::RetryPolicy;
use fleetwarden::scaler_repo::{ActionHandle, FleetScaler};
use fleetwarden::stores::StoreError;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Observation `minutes_before` minutes before base_time.
pub fn observation(minutes_before: i64, price: f64) -> PriceObservation {
    PriceObservation {
        resource_class: "g5.4xlarge".to_string(),
        product: "Linux/UNIX".to_string(),
        timestamp: base_time() - Duration::minutes(minutes_before),
        price,
    }
}

/// Observation `minutes_before` minutes before the wall clock, for code paths
/// that sample relative to Utc::now().
pub fn recent_observation(minutes_before: i64, price: f64) -> PriceObservation {
    PriceObservation {
        resource_class: "g5.4xlarge".to_string(),
        product: "Linux/UNIX".to_string(),
        timestamp: Utc::now() - Duration::minutes(minutes_before),
        price,
    }
}

pub fn status_error(operation: &'static str, status: u16) -> StoreError {
    StoreError::Status {
        operation,
        status,
        body: String::new(),
    }
}

pub fn unavailable(operation: &'static str) -> StoreError {
    status_error(operation, 503)
}

/// Short delays so retry paths finish quickly under test.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: std::time::Duration::from_millis(5),
        max_delay: std::time::Duration::from_millis(20),
    }
}

pub fn terminating_event(instance_id: &str) -> LifecycleEvent {
    LifecycleEvent {
        event_id: "evt-1".to_string(),
        group_name: "workers".to_string(),
        hook_name: "terminate-hook".to_string(),
        instance_id: Some(instance_id.to_string()),
        transition: TransitionKind::Terminating,
        action_token: "token-1".to_string(),
        metadata: None,
    }
}

pub fn launching_event(instance_id: &str) -> LifecycleEvent {
    LifecycleEvent {
        event_id: "evt-2".to_string(),
        group_name: "workers".to_string(),
        hook_name: "launch-hook".to_string(),
        instance_id: Some(instance_id.to_string()),
        transition: TransitionKind::Launching,
        action_token: "token-2".to_string(),
        metadata: None,
    }
}

/// Source launch config version the fakes start from.
pub fn base_version() -> LaunchConfigVersion {
    LaunchConfigVersion {
        config_id: "lt-test".to_string(),
        version_number: 1,
        source_version: None,
        market_options: MarketOptions {
            bid: 0.5,
            interruption_policy: InterruptionPolicy::Terminate,
            max_duration_minutes: Some(60),
        },
        is_default: true,
    }
}

/// Decrements a remaining-failures counter; true if this call should fail.
/// Tests drive each fake from one task, so load + store is enough.
fn take_failure(remaining: &AtomicUsize) -> bool {
    let current = remaining.load(Ordering::SeqCst);
    if current > 0 {
        remaining.store(current - 1, Ordering::SeqCst);
        true
    } else {
        false
    }
}

/// Pops the next queued failure status, front first.
fn take_queued(queue: &Mutex<Vec<u16>>) -> Option<u16> {
    let mut queue = queue.lock().unwrap();
    if queue.is_empty() {
        None
    } else {
        Some(queue.remove(0))
    }
}

pub struct FakeMarket {
    pub observations: Mutex<Vec<PriceObservation>>,
    pub calls: AtomicUsize,
    pub fail_times: AtomicUsize,
}

impl FakeMarket {
    pub fn new(observations: Vec<PriceObservation>) -> Self {
        Self {
            observations: Mutex::new(observations),
            calls: AtomicUsize::new(0),
            fail_times: AtomicUsize::new(0),
        }
    }

    /// Fails the first `times` calls with 503, then serves the observations.
    pub fn failing(times: usize) -> Self {
        let market = Self::new(vec![]);
        market.fail_times.store(times, Ordering::SeqCst);
        market
    }
}

#[async_trait]
impl MarketHistory for FakeMarket {
    async fn price_history(
        &self,
        _query: &PriceQuery,
    ) -> Result<Vec<PriceObservation>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_times) {
            return Err(unavailable("price_history"));
        }
        Ok(self.observations.lock().unwrap().clone())
    }
}

pub struct FakeLaunchStore {
    pub source: Mutex<LaunchConfigVersion>,
    pub versions: Mutex<Vec<LaunchConfigVersion>>,
    pub default_version: Mutex<Option<u64>>,
    pub describe_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub promote_calls: AtomicUsize,
    pub describe_failures: Mutex<Vec<u16>>,
    pub create_failures: Mutex<Vec<u16>>,
    pub promote_failures: Mutex<Vec<u16>>,
}

impl FakeLaunchStore {
    pub fn new() -> Self {
        Self {
            source: Mutex::new(base_version()),
            versions: Mutex::new(vec![]),
            default_version: Mutex::new(None),
            describe_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            promote_calls: AtomicUsize::new(0),
            describe_failures: Mutex::new(vec![]),
            create_failures: Mutex::new(vec![]),
            promote_failures: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl LaunchConfigStore for FakeLaunchStore {
    async fn describe_version(
        &self,
        _config_id: &str,
        _version: &str,
    ) -> Result<LaunchConfigVersion, StoreError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = take_queued(&self.describe_failures) {
            return Err(status_error("describe_version", status));
        }
        Ok(self.source.lock().unwrap().clone())
    }

    async fn create_version(
        &self,
        config_id: &str,
        request: &CreateVersionRequest,
    ) -> Result<LaunchConfigVersion, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = take_queued(&self.create_failures) {
            return Err(status_error("create_version", status));
        }
        let mut versions = self.versions.lock().unwrap();
        let version = LaunchConfigVersion {
            config_id: config_id.to_string(),
            version_number: versions.len() as u64 + 2,
            source_version: Some(request.source_version.clone()),
            market_options: request.market_options.clone(),
            is_default: false,
        };
        versions.push(version.clone());
        Ok(version)
    }

    async fn promote_default(
        &self,
        _config_id: &str,
        version_number: u64,
    ) -> Result<(), StoreError> {
        self.promote_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = take_queued(&self.promote_failures) {
            return Err(status_error("promote_default", status));
        }
        *self.default_version.lock().unwrap() = Some(version_number);
        Ok(())
    }
}

pub struct FakeParams {
    pub values: Mutex<Vec<(String, String)>>,
    pub calls: AtomicUsize,
    pub fail_times: AtomicUsize,
}

impl FakeParams {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
            fail_times: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ParameterStore for FakeParams {
    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        _overwrite: bool,
    ) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_times) {
            return Err(unavailable("put_parameter"));
        }
        self.values
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }
}

pub struct FakeArchive {
    pub objects: Mutex<Vec<(String, Bytes)>>,
    pub calls: AtomicUsize,
    pub fail_times: AtomicUsize,
    /// Per-write delay, for deadline tests.
    pub delay_ms: AtomicU64,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
            fail_times: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl LogArchive for FakeArchive {
    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if take_failure(&self.fail_times) {
            return Err(unavailable("put_object"));
        }
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), body));
        Ok(())
    }
}

pub struct FakeScaler {
    pub completions: Mutex<Vec<(ActionHandle, HookResult)>>,
    pub heartbeats: AtomicUsize,
    pub fail_complete_times: AtomicUsize,
    pub fail_heartbeat_times: AtomicUsize,
}

impl FakeScaler {
    pub fn new() -> Self {
        Self {
            completions: Mutex::new(vec![]),
            heartbeats: AtomicUsize::new(0),
            fail_complete_times: AtomicUsize::new(0),
            fail_heartbeat_times: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FleetScaler for FakeScaler {
    async fn complete_action(
        &self,
        handle: &ActionHandle,
        result: HookResult,
    ) -> Result<(), StoreError> {
        if take_failure(&self.fail_complete_times) {
            return Err(unavailable("complete_action"));
        }
        self.completions
            .lock()
            .unwrap()
            .push((handle.clone(), result));
        Ok(())
    }

    async fn record_heartbeat(&self, _handle: &ActionHandle) -> Result<(), StoreError> {
        self.heartbeats.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_heartbeat_times) {
            return Err(unavailable("record_heartbeat"));
        }
        Ok(())
    }
}
