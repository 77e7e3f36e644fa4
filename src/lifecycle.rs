// Lifecycle transition coordinator: one state machine pass per scaler event.
// Every validated event ends with exactly one completion report to the scaler.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::archive_repo::LogArchive;
use crate::config::LifecycleConfig;
use crate::models::{
    ActivationReport, EventState, HookOutcome, HookResult, LifecycleEvent, TransitionKind,
};
use crate::retry::{self, RetryPolicy};
use crate::scaler_repo::{ActionHandle, FleetScaler};
use crate::stores::StoreError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("event carries no instance id")]
    MissingInstanceId,
    #[error("archive write failed: {0}")]
    Archive(#[from] StoreError),
    #[error("manifest encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Deadline policy for handler work on one event.
#[derive(Debug, Clone)]
pub struct HookPolicy {
    pub hook_timeout: Duration,
    pub extend_deadline: bool,
    pub max_extensions: u32,
}

impl HookPolicy {
    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self {
            hook_timeout: Duration::from_secs(config.hook_timeout_secs),
            extend_deadline: config.extend_deadline,
            max_extensions: config.max_extensions,
        }
    }
}

/// How the handler run for one event ended.
enum HandlerVerdict {
    Completed,
    TimedOut,
    Failed(LifecycleError),
}

/// Drives one lifecycle event from Received to a terminal state.
pub struct Coordinator {
    scaler: Arc<dyn FleetScaler>,
    archive: Arc<dyn LogArchive>,
    policy: HookPolicy,
    retry: RetryPolicy,
}

impl Coordinator {
    pub fn new(
        scaler: Arc<dyn FleetScaler>,
        archive: Arc<dyn LogArchive>,
        policy: HookPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            scaler,
            archive,
            policy,
            retry,
        }
    }

    /// Runs the full state machine for one event and returns the terminal
    /// report. Rejected events emit no outcome; everything else reports
    /// exactly one Continue or Abandon to the scaler.
    pub async fn process(&self, event: LifecycleEvent) -> ActivationReport {
        let mut state = EventState::Received;
        debug!(
            event_id = %event.event_id,
            transition = event.transition.as_str(),
            "lifecycle event received"
        );

        let handle = match validate(&event) {
            Ok(handle) => handle,
            Err(e) => {
                state = advance(&event.event_id, state, EventState::Rejected);
                warn!(
                    error = %e,
                    event_id = %event.event_id,
                    transition = event.transition.as_str(),
                    "lifecycle event rejected"
                );
                return ActivationReport {
                    state,
                    outcome: None,
                };
            }
        };
        state = advance(&event.event_id, state, EventState::Validated);
        state = advance(&event.event_id, state, EventState::Handling);

        let (terminal, result) = match self.run_with_deadline(&event, &handle).await {
            HandlerVerdict::Completed => (EventState::Completed, HookResult::Continue),
            HandlerVerdict::TimedOut => {
                state = advance(&event.event_id, state, EventState::TimedOut);
                warn!(
                    instance_id = %handle.instance_id,
                    action_token = %handle.action_token,
                    "handler overran its deadline"
                );
                (EventState::Abandoned, HookResult::Abandon)
            }
            HandlerVerdict::Failed(e) => {
                warn!(
                    error = %e,
                    instance_id = %handle.instance_id,
                    action_token = %handle.action_token,
                    "handler failed"
                );
                (EventState::Abandoned, HookResult::Abandon)
            }
        };
        state = advance(&event.event_id, state, terminal);
        debug_assert!(state.is_terminal());

        // The single emission point: one outcome per action token.
        let outcome = HookOutcome {
            action_token: handle.action_token.clone(),
            result,
            instance_id: handle.instance_id.clone(),
        };
        self.emit_outcome(&handle, result).await;
        ActivationReport {
            state,
            outcome: Some(outcome),
        }
    }

    /// Runs the transition handler under the hook deadline. Each overrun may
    /// buy one extension via a scaler heartbeat, up to the configured cap.
    async fn run_with_deadline(
        &self,
        event: &LifecycleEvent,
        handle: &ActionHandle,
    ) -> HandlerVerdict {
        let handler = self.dispatch(event, handle);
        tokio::pin!(handler);
        let mut extensions_used: u32 = 0;
        loop {
            match tokio::time::timeout(self.policy.hook_timeout, &mut handler).await {
                Ok(Ok(())) => return HandlerVerdict::Completed,
                Ok(Err(e)) => return HandlerVerdict::Failed(e),
                Err(_) => {
                    if !self.policy.extend_deadline || extensions_used >= self.policy.max_extensions
                    {
                        return HandlerVerdict::TimedOut;
                    }
                    // One shot: a failed heartbeat forfeits the extension.
                    if let Err(e) = self.scaler.record_heartbeat(handle).await {
                        warn!(
                            error = %e,
                            instance_id = %handle.instance_id,
                            "heartbeat failed; abandoning"
                        );
                        return HandlerVerdict::TimedOut;
                    }
                    extensions_used += 1;
                    debug!(
                        instance_id = %handle.instance_id,
                        extensions_used,
                        "deadline extended"
                    );
                }
            }
        }
    }

    async fn dispatch(
        &self,
        event: &LifecycleEvent,
        handle: &ActionHandle,
    ) -> Result<(), LifecycleError> {
        match &event.transition {
            TransitionKind::Terminating => self.handle_termination(event, handle).await,
            TransitionKind::Launching => self.handle_launch(handle).await,
            TransitionKind::Other(transition) => {
                info!(
                    transition = %transition,
                    instance_id = %handle.instance_id,
                    "unrecognized lifecycle transition; nothing to do"
                );
                Ok(())
            }
        }
    }

    /// Archives the departing instance's log bundle, then releases its state.
    async fn handle_termination(
        &self,
        event: &LifecycleEvent,
        handle: &ActionHandle,
    ) -> Result<(), LifecycleError> {
        let key = archive_key(&handle.instance_id);
        let manifest = termination_manifest(event, handle)?;
        retry::retry(
            &self.retry,
            "put_object",
            || self.archive.put_object(&key, manifest.clone()),
            StoreError::is_transient,
        )
        .await?;
        info!(
            instance_id = %handle.instance_id,
            key = %key,
            "termination logs archived"
        );
        debug!(instance_id = %handle.instance_id, "instance state cleaned up");
        Ok(())
    }

    /// Launch-side initialization. The fleet currently needs nothing beyond
    /// an acknowledgement before the instance goes into service.
    async fn handle_launch(&self, handle: &ActionHandle) -> Result<(), LifecycleError> {
        info!(
            instance_id = %handle.instance_id,
            group_name = %handle.group_name,
            "instance launching; initialization acknowledged"
        );
        Ok(())
    }

    /// Delivers the completion to the scaler. Delivery failure is logged and
    /// swallowed; the scaler's own hook timeout closes the action.
    async fn emit_outcome(&self, handle: &ActionHandle, result: HookResult) {
        match retry::retry(
            &self.retry,
            "complete_action",
            || self.scaler.complete_action(handle, result),
            StoreError::is_transient,
        )
        .await
        {
            Ok(()) => info!(
                instance_id = %handle.instance_id,
                action_token = %handle.action_token,
                result = result.as_str(),
                "lifecycle action completed"
            ),
            Err(e) => warn!(
                error = %e,
                instance_id = %handle.instance_id,
                action_token = %handle.action_token,
                "completion not delivered; scaler timeout will close the action"
            ),
        }
    }
}

/// An event is actionable only with a non-empty instance id; everything else
/// on the detail block is mandatory at deserialization already.
fn validate(event: &LifecycleEvent) -> Result<ActionHandle, LifecycleError> {
    let Some(instance_id) = event.instance_id.as_deref() else {
        return Err(LifecycleError::MissingInstanceId);
    };
    if instance_id.is_empty() {
        return Err(LifecycleError::MissingInstanceId);
    }
    Ok(ActionHandle {
        hook_name: event.hook_name.clone(),
        group_name: event.group_name.clone(),
        action_token: event.action_token.clone(),
        instance_id: instance_id.to_string(),
    })
}

/// Archive prefix for one instance's log bundle.
pub fn archive_key(instance_id: &str) -> String {
    format!("logs/{}/", instance_id)
}

fn termination_manifest(
    event: &LifecycleEvent,
    handle: &ActionHandle,
) -> Result<Bytes, LifecycleError> {
    let manifest = serde_json::json!({
        "instanceId": handle.instance_id,
        "groupName": handle.group_name,
        "transition": event.transition.as_str(),
        "archivedAt": Utc::now().to_rfc3339(),
        "metadata": event.metadata,
    });
    Ok(Bytes::from(serde_json::to_vec(&manifest)?))
}

fn advance(event_id: &str, from: EventState, to: EventState) -> EventState {
    debug!(event_id, from = ?from, to = ?to, "state transition");
    to
}
