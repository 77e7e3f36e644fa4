// Send a sample lifecycle event to a running fleetwarden instance.
//
// Usage: cargo run --example send_event -- [BASE_URL] [INSTANCE_ID]
//   BASE_URL     default: http://127.0.0.1:8088
//   INSTANCE_ID  default: i-0demo

use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let base = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("http://127.0.0.1:8088");
    let instance_id = args.get(2).map(String::as_str).unwrap_or("i-0demo");

    let envelope = serde_json::json!({
        "id": "demo-event",
        "detail": {
            "EC2InstanceId": instance_id,
            "LifecycleTransition": "autoscaling:EC2_INSTANCE_TERMINATING",
            "LifecycleHookName": "drain-hook",
            "AutoScalingGroupName": "workers",
            "LifecycleActionToken": "demo-token"
        }
    });

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/events/lifecycle", base.trim_end_matches('/')))
        .json(&envelope)
        .send()
        .await?;

    println!("{}", resp.text().await?);
    Ok(())
}
