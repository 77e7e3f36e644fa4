// Model tests: scaler wire format, state serialization, market JSON

use chrono::{TimeZone, Utc};
use fleetwarden::models::*;

const SCALER_EVENT: &str = r#"{
    "id": "4d1b3c6e-9c5a-4b2e-8f3d-1a2b3c4d5e6f",
    "detail-type": "EC2 Instance-terminate Lifecycle Action",
    "source": "aws.autoscaling",
    "detail": {
        "EC2InstanceId": "i-0f2a19b3c4d5e6f70",
        "LifecycleTransition": "autoscaling:EC2_INSTANCE_TERMINATING",
        "LifecycleHookName": "drain-hook",
        "AutoScalingGroupName": "workers",
        "LifecycleActionToken": "87654321-aaaa-bbbb-cccc-123456789012",
        "NotificationMetadata": "{\"pool\":\"gpu\"}"
    }
}"#;

#[test]
fn test_scaler_envelope_parses_to_event() {
    let envelope: ScalerEnvelope = serde_json::from_str(SCALER_EVENT).expect("envelope");
    let event = LifecycleEvent::from(envelope);
    assert_eq!(event.event_id, "4d1b3c6e-9c5a-4b2e-8f3d-1a2b3c4d5e6f");
    assert_eq!(event.instance_id.as_deref(), Some("i-0f2a19b3c4d5e6f70"));
    assert_eq!(event.transition, TransitionKind::Terminating);
    assert_eq!(event.hook_name, "drain-hook");
    assert_eq!(event.group_name, "workers");
    assert_eq!(
        event.action_token,
        "87654321-aaaa-bbbb-cccc-123456789012"
    );
    assert_eq!(event.metadata.as_deref(), Some("{\"pool\":\"gpu\"}"));
}

#[test]
fn test_scaler_envelope_without_instance_id() {
    let mut value: serde_json::Value = serde_json::from_str(SCALER_EVENT).unwrap();
    value["detail"]
        .as_object_mut()
        .unwrap()
        .remove("EC2InstanceId");
    let envelope: ScalerEnvelope = serde_json::from_value(value).expect("envelope");
    let event = LifecycleEvent::from(envelope);
    assert!(event.instance_id.is_none());
}

#[test]
fn test_scaler_envelope_missing_token_fails_to_parse() {
    let mut value: serde_json::Value = serde_json::from_str(SCALER_EVENT).unwrap();
    value["detail"]
        .as_object_mut()
        .unwrap()
        .remove("LifecycleActionToken");
    assert!(serde_json::from_value::<ScalerEnvelope>(value).is_err());
}

#[test]
fn test_transition_kind_wire_strings() {
    assert_eq!(
        TransitionKind::parse("autoscaling:EC2_INSTANCE_TERMINATING"),
        TransitionKind::Terminating
    );
    assert_eq!(
        TransitionKind::parse("autoscaling:EC2_INSTANCE_LAUNCHING"),
        TransitionKind::Launching
    );
    let other = TransitionKind::parse("autoscaling:EC2_INSTANCE_REBALANCE");
    assert_eq!(
        other,
        TransitionKind::Other("autoscaling:EC2_INSTANCE_REBALANCE".to_string())
    );
    assert_eq!(other.as_str(), "autoscaling:EC2_INSTANCE_REBALANCE");
    assert_eq!(
        TransitionKind::Terminating.as_str(),
        "autoscaling:EC2_INSTANCE_TERMINATING"
    );
}

#[test]
fn test_hook_result_serializes_screaming_snake() {
    assert_eq!(
        serde_json::to_value(HookResult::Continue).unwrap(),
        serde_json::json!("CONTINUE")
    );
    assert_eq!(
        serde_json::to_value(HookResult::Abandon).unwrap(),
        serde_json::json!("ABANDON")
    );
}

#[test]
fn test_event_state_serializes_screaming_snake() {
    assert_eq!(
        serde_json::to_value(EventState::TimedOut).unwrap(),
        serde_json::json!("TIMED_OUT")
    );
    assert_eq!(
        serde_json::to_value(EventState::Completed).unwrap(),
        serde_json::json!("COMPLETED")
    );
}

#[test]
fn test_activation_report_json_shape() {
    let report = ActivationReport {
        state: EventState::Completed,
        outcome: Some(HookOutcome {
            action_token: "token-9".to_string(),
            result: HookResult::Continue,
            instance_id: "i-0abc".to_string(),
        }),
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["state"], "COMPLETED");
    assert_eq!(json["outcome"]["actionToken"], "token-9");
    assert_eq!(json["outcome"]["result"], "CONTINUE");
    assert_eq!(json["outcome"]["instanceId"], "i-0abc");
}

#[test]
fn test_price_observation_from_market_json() {
    let json = r#"{
        "resourceClass": "g5.4xlarge",
        "product": "Linux/UNIX",
        "timestamp": "2024-05-01T12:00:00Z",
        "price": 0.1234
    }"#;
    let observation: PriceObservation = serde_json::from_str(json).expect("observation");
    assert_eq!(observation.resource_class, "g5.4xlarge");
    assert_eq!(observation.price, 0.1234);
    assert_eq!(
        observation.timestamp,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    );
}

#[test]
fn test_launch_config_version_wire_shape() {
    let version = LaunchConfigVersion {
        config_id: "lt-0abc123".to_string(),
        version_number: 7,
        source_version: Some("1".to_string()),
        market_options: MarketOptions {
            bid: 0.1320,
            interruption_policy: InterruptionPolicy::Terminate,
            max_duration_minutes: None,
        },
        is_default: false,
    };
    let json = serde_json::to_string(&version).unwrap();
    assert!(json.contains("\"configId\""));
    assert!(json.contains("\"versionNumber\""));
    assert!(json.contains("\"interruptionPolicy\":\"terminate\""));
    let back: LaunchConfigVersion = serde_json::from_str(&json).unwrap();
    assert_eq!(back, version);
}
