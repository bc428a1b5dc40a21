use super::events::{CallEvent, CallEventMessage};
use anyhow::{Context, Result};
use async_nats::Client;
use futures::stream::{BoxStream, StreamExt};
use tracing::{info, warn};

/// Subject the provider webhook bridge publishes call events on
pub fn call_subject(call_id: &str) -> String {
    format!("voice.call.{}.events", call_id)
}

/// NATS relay delivering provider call events
pub struct NatsEventRelay {
    client: Client,
}

impl NatsEventRelay {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Subscribe to the events of one call, decoded and filtered by call id
    pub async fn subscribe_call(&self, call_id: &str) -> Result<BoxStream<'static, CallEvent>> {
        let subject = call_subject(call_id);

        info!("Subscribing to call events on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to call events")?;

        let call_id = call_id.to_string();
        let events = subscriber.filter_map(move |msg| {
            futures::future::ready(decode_call_event(&call_id, &msg.payload))
        });

        Ok(events.boxed())
    }
}

/// Decode one relayed envelope, keeping it only if it belongs to `call_id`
pub fn decode_call_event(call_id: &str, payload: &[u8]) -> Option<CallEvent> {
    match serde_json::from_slice::<CallEventMessage>(payload) {
        Ok(envelope) if envelope.call_id == call_id => Some(envelope.event),
        Ok(envelope) => {
            warn!(
                "Ignoring event for call {} on {}",
                envelope.call_id,
                call_subject(call_id)
            );
            None
        }
        Err(e) => {
            warn!("Failed to parse call event message: {}", e);
            None
        }
    }
}
