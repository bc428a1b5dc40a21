use crate::error::{InterviewError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves a bearer credential to the id of the user it was issued to
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, bearer: &str) -> Result<String>;
}

/// Fixed token → owner table, loaded from configuration
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl IdentityResolver for StaticTokens {
    async fn resolve(&self, bearer: &str) -> Result<String> {
        self.tokens
            .get(bearer)
            .cloned()
            .ok_or(InterviewError::Unauthorized)
    }
}
