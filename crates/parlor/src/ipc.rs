//! Request/reply calls between processes, carried over presence
//! pub/sub.
//!
//! The caller publishes a request envelope carrying a one-shot reply
//! topic; the serving side publishes the reply envelope there. Reply
//! envelopes carry an outcome code so remote failures and remote
//! timeouts surface as distinct errors.

use std::sync::Arc;
use std::time::Duration;

use parlor_presence::Presence;
use parlor_protocol::IpcOutcome;
use rand::Rng;
use tokio::sync::mpsc;

use crate::MatchMakeError;

fn reply_topic(topic: &str) -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    let nonce: String =
        bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{topic}:reply:{nonce}")
}

/// Calls a remote handler subscribed on `topic` and waits for its
/// reply.
pub async fn remote_call<P>(
    presence: &P,
    topic: &str,
    payload: serde_json::Value,
    timeout: Duration,
) -> Result<serde_json::Value, MatchMakeError>
where
    P: Presence + ?Sized,
{
    let reply_on = reply_topic(topic);
    let (tx, mut rx) = mpsc::unbounded_channel();
    presence
        .subscribe(
            &reply_on,
            Arc::new(move |reply| {
                let _ = tx.send(reply);
            }),
        )
        .await?;

    let request = serde_json::json!({
        "replyTo": reply_on,
        "payload": payload,
    });
    presence.publish(topic, request).await?;

    let reply = tokio::time::timeout(timeout, rx.recv()).await;
    presence.unsubscribe(&reply_on).await?;

    let reply = match reply {
        Ok(Some(reply)) => reply,
        _ => return Err(MatchMakeError::IpcTimeout(topic.to_string())),
    };

    let outcome = reply
        .get("outcome")
        .and_then(serde_json::Value::as_u64)
        .and_then(|code| u8::try_from(code).ok())
        .and_then(IpcOutcome::from_u8);

    match outcome {
        Some(IpcOutcome::Success) => Ok(reply
            .get("payload")
            .cloned()
            .unwrap_or(serde_json::Value::Null)),
        Some(IpcOutcome::Error) => {
            let message = reply
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("remote call failed")
                .to_string();
            Err(MatchMakeError::IpcError(topic.to_string(), message))
        }
        Some(IpcOutcome::Timeout) | None => {
            Err(MatchMakeError::IpcTimeout(topic.to_string()))
        }
    }
}

/// Serves remote calls arriving on `topic` with `handler`.
///
/// Requests without a reply topic are dropped. Replies are published
/// from a spawned task so the subscriber callback never blocks the
/// bus.
pub async fn respond_to<P, F>(
    presence: &Arc<P>,
    topic: &str,
    handler: F,
) -> Result<(), MatchMakeError>
where
    P: Presence + ?Sized + 'static,
    F: Fn(serde_json::Value) -> Result<serde_json::Value, String>
        + Send
        + Sync
        + 'static,
{
    let reply_presence = Arc::clone(presence);
    presence
        .subscribe(
            topic,
            Arc::new(move |request| {
                let Some(reply_to) = request
                    .get("replyTo")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
                else {
                    tracing::warn!("request without reply topic, dropping");
                    return;
                };
                let payload = request
                    .get("payload")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);

                let reply = match handler(payload) {
                    Ok(value) => serde_json::json!({
                        "outcome": IpcOutcome::Success.as_u8(),
                        "payload": value,
                    }),
                    Err(message) => serde_json::json!({
                        "outcome": IpcOutcome::Error.as_u8(),
                        "message": message,
                    }),
                };

                let presence = Arc::clone(&reply_presence);
                tokio::spawn(async move {
                    if let Err(err) =
                        presence.publish(&reply_to, reply).await
                    {
                        tracing::warn!(%err, "reply publish failed");
                    }
                });
            }),
        )
        .await?;
    Ok(())
}
