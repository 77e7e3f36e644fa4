// Scaler lifecycle event models: wire envelope, domain event, outcome report

use serde::{Deserialize, Serialize};

/// Wire value the scaler sends for a terminating instance.
pub const TRANSITION_TERMINATING: &str = "autoscaling:EC2_INSTANCE_TERMINATING";
/// Wire value the scaler sends for a launching instance.
pub const TRANSITION_LAUNCHING: &str = "autoscaling:EC2_INSTANCE_LAUNCHING";

/// Which transition the scaler announced. Unrecognized kinds keep their wire
/// string so they can be acknowledged without failing the hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionKind {
    Launching,
    Terminating,
    Other(String),
}

impl TransitionKind {
    pub fn parse(wire: &str) -> Self {
        match wire {
            TRANSITION_LAUNCHING => TransitionKind::Launching,
            TRANSITION_TERMINATING => TransitionKind::Terminating,
            other => TransitionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransitionKind::Launching => TRANSITION_LAUNCHING,
            TransitionKind::Terminating => TRANSITION_TERMINATING,
            TransitionKind::Other(s) => s,
        }
    }
}

/// One lifecycle event as the coordinator sees it.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub event_id: String,
    pub group_name: String,
    pub hook_name: String,
    /// Absent on malformed scaler notifications; such events are rejected.
    pub instance_id: Option<String>,
    pub transition: TransitionKind,
    pub action_token: String,
    pub metadata: Option<String>,
}

/// Scaler event envelope as received on the webhook. Unknown envelope fields
/// (detail-type, source, region, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerEnvelope {
    #[serde(default)]
    pub id: String,
    pub detail: ScalerDetail,
}

/// The `detail` block of the scaler envelope. Field names follow the
/// scaler's wire format.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerDetail {
    #[serde(rename = "EC2InstanceId", default)]
    pub instance_id: Option<String>,
    #[serde(rename = "LifecycleTransition")]
    pub transition: String,
    #[serde(rename = "LifecycleHookName")]
    pub hook_name: String,
    #[serde(rename = "AutoScalingGroupName")]
    pub group_name: String,
    #[serde(rename = "LifecycleActionToken")]
    pub action_token: String,
    #[serde(rename = "NotificationMetadata", default)]
    pub metadata: Option<String>,
}

impl From<ScalerEnvelope> for LifecycleEvent {
    fn from(envelope: ScalerEnvelope) -> Self {
        let d = envelope.detail;
        LifecycleEvent {
            event_id: envelope.id,
            group_name: d.group_name,
            hook_name: d.hook_name,
            instance_id: d.instance_id,
            transition: TransitionKind::parse(&d.transition),
            action_token: d.action_token,
            metadata: d.metadata,
        }
    }
}

/// Processing states of one event. Completed, Rejected and Abandoned are
/// terminal; TimedOut always advances to Abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    Received,
    Validated,
    Handling,
    Completed,
    Rejected,
    TimedOut,
    Abandoned,
}

impl EventState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventState::Completed | EventState::Rejected | EventState::Abandoned
        )
    }
}

/// Completion result reported to the scaler for a lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HookResult {
    Continue,
    Abandon,
}

impl HookResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookResult::Continue => "CONTINUE",
            HookResult::Abandon => "ABANDON",
        }
    }
}

/// The single completion record emitted for an action token.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookOutcome {
    pub action_token: String,
    pub result: HookResult,
    pub instance_id: String,
}

/// Terminal report for one coordinator activation (webhook response body).
/// outcome is None only for rejected events, which emit no completion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationReport {
    pub state: EventState,
    pub outcome: Option<HookOutcome>,
}
