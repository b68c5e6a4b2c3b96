use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::services::capability::DownstreamError;

/// Result of a successful token verification.
///
/// The gateway does not interpret it. It lives in the request extensions for
/// the duration of the request and is forwarded to capabilities as `meta.user`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VerifiedIdentity(Value);

impl VerifiedIdentity {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Why a token was refused. The `Display` text is what the caller sees in the
/// 403 body, so variants render the underlying message only.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Remote(#[from] DownstreamError),

    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// The `verifyToken(token)` capability.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}
