//! Text-generation service access shared by the code analyzer and the report generator

pub mod decode;
mod openai;

pub use decode::{decode_payload, strip_fences, Validate};
pub use openai::ChatCompletionsClient;

use anyhow::Result;
use async_trait::async_trait;

/// A text-generation backend that answers one prompt with one completion
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}
