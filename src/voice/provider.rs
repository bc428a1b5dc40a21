use super::events::Utterance;
use super::{CallArtifacts, CallHandle};
use crate::config::VoiceConfig;
use crate::error::{InterviewError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Serialize)]
struct CreateWebCallRequest<'a> {
    agent_id: &'a str,
    metadata: CallMetadata<'a>,
}

#[derive(Serialize)]
struct CallMetadata<'a> {
    room_id: &'a str,
    display_name: &'a str,
}

#[derive(Deserialize)]
struct CreateWebCallResponse {
    access_token: String,
    call_id: String,
}

#[derive(Deserialize)]
struct CallDetailResponse {
    #[serde(default)]
    recording_url: Option<String>,
    #[serde(default)]
    transcript_object: Vec<Utterance>,
}

/// REST client for the voice-call provider
pub struct ProviderApi {
    client: Client,
    api_url: String,
    api_key: String,
    agent_id: String,
}

impl ProviderApi {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            agent_id: config.agent_id.clone(),
        }
    }

    pub async fn create_web_call(&self, room_id: &str, display_name: &str) -> Result<CallHandle> {
        let request = CreateWebCallRequest {
            agent_id: &self.agent_id,
            metadata: CallMetadata {
                room_id,
                display_name,
            },
        };

        let response = self
            .client
            .post(format!("{}/v2/create-web-call", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InterviewError::Transport(format!("create call: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Voice provider rejected call for room {}: {}", room_id, status);
            return Err(InterviewError::Transport(format!(
                "create call returned {}",
                status
            )));
        }

        let created: CreateWebCallResponse = response
            .json()
            .await
            .map_err(|e| InterviewError::Transport(format!("create call response: {}", e)))?;

        info!("Created call {} for room {}", created.call_id, room_id);

        Ok(CallHandle {
            access_credential: created.access_token,
            external_call_id: created.call_id,
        })
    }

    pub async fn get_call(&self, call_id: &str) -> Result<CallArtifacts> {
        let response = self
            .client
            .get(format!("{}/v2/get-call/{}", self.api_url, call_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| InterviewError::Transport(format!("get call: {}", e)))?;

        if !response.status().is_success() {
            return Err(InterviewError::Transport(format!(
                "get call {} returned {}",
                call_id,
                response.status()
            )));
        }

        let detail: CallDetailResponse = response
            .json()
            .await
            .map_err(|e| InterviewError::Transport(format!("get call response: {}", e)))?;

        Ok(CallArtifacts {
            recording_url: detail.recording_url,
            transcript: detail.transcript_object,
        })
    }
}
