use async_trait::async_trait;
use serde_json::json;

use crate::services::auth::verifier::{TokenVerifier, VerifiedIdentity, VerifyError};
use crate::services::capability::{CallMeta, CapabilityClient};

pub const VERIFY_TOKEN_CAPABILITY: &str = "jwt.verifyToken";

/// Delegates verification to the `jwt.verifyToken` capability.
#[derive(Clone, Debug)]
pub struct RemoteTokenVerifier {
    client: CapabilityClient,
}

impl RemoteTokenVerifier {
    pub fn new(client: CapabilityClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenVerifier for RemoteTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let identity = self
            .client
            .call(
                VERIFY_TOKEN_CAPABILITY,
                &json!({ "token": token }),
                &CallMeta::default(),
            )
            .await?;

        Ok(VerifiedIdentity::new(identity))
    }
}
