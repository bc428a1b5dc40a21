//! Voice transport adapter
//!
//! Wraps the external voice-call provider:
//! - call creation and post-call artifact retrieval over the provider REST API
//! - a typed call event stream relayed over NATS

pub mod events;
mod nats;
mod provider;

pub use events::{CallEvent, CallEventMessage, Utterance};
pub use nats::{call_subject, decode_call_event, NatsEventRelay};
pub use provider::ProviderApi;

use crate::error::{InterviewError, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

/// Credentials returned when a call is created
#[derive(Debug, Clone, Serialize)]
pub struct CallHandle {
    /// Short-lived token the client uses to join the call
    pub access_credential: String,
    pub external_call_id: String,
}

/// Provider-side artifacts available after the call ends
#[derive(Debug, Clone, Default)]
pub struct CallArtifacts {
    pub recording_url: Option<String>,
    /// Final provider transcript, untimestamped
    pub transcript: Vec<Utterance>,
}

#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Failure is a `Transport` error; the caller may retry.
    async fn create_call(&self, room_id: &str, display_name: &str) -> Result<CallHandle>;

    async fn fetch_call_artifacts(&self, external_call_id: &str) -> Result<CallArtifacts>;

    /// Typed event stream for one call
    async fn subscribe(&self, external_call_id: &str) -> Result<BoxStream<'static, CallEvent>>;
}

/// Production transport: provider REST API plus the NATS event relay
pub struct ProviderTransport {
    api: ProviderApi,
    relay: NatsEventRelay,
}

impl ProviderTransport {
    pub fn new(api: ProviderApi, relay: NatsEventRelay) -> Self {
        Self { api, relay }
    }
}

#[async_trait]
impl VoiceTransport for ProviderTransport {
    async fn create_call(&self, room_id: &str, display_name: &str) -> Result<CallHandle> {
        self.api.create_web_call(room_id, display_name).await
    }

    async fn fetch_call_artifacts(&self, external_call_id: &str) -> Result<CallArtifacts> {
        self.api.get_call(external_call_id).await
    }

    async fn subscribe(&self, external_call_id: &str) -> Result<BoxStream<'static, CallEvent>> {
        self.relay
            .subscribe_call(external_call_id)
            .await
            .map_err(|e| InterviewError::Transport(format!("{:#}", e)))
    }
}
