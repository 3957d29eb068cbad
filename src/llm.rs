//! Optional hosted-model escalation.
//!
//! The router answers most queries from its own heuristics; anything it can't
//! place may be forwarded to an [`LlmClient`] when one is configured. A failed
//! or absent client always degrades to the canned fallback reply.

use std::error::Error;
use std::fmt;

use async_trait::async_trait;

use crate::model::{AiResponse, UserQuery};

#[derive(Debug)]
pub enum LlmError {
    /// The backing service could not be reached.
    Unavailable(String),
    /// The service answered with something we could not use.
    BadResponse(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Unavailable(msg) => write!(f, "llm unavailable: {msg}"),
            LlmError::BadResponse(msg) => write!(f, "llm bad response: {msg}"),
        }
    }
}

impl Error for LlmError {}

/// A hosted completion backend for queries the heuristics can't answer.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, query: &UserQuery) -> Result<AiResponse, LlmError>;
}
