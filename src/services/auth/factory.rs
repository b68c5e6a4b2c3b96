/// Factory: build the `TokenVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{
    TokenVerifier, VerifyError, jwt::JwtTokenVerifier, remote::RemoteTokenVerifier,
};
use crate::services::capability::CapabilityClient;

/// Local verification when a public key is configured, otherwise the
/// `jwt.verifyToken` capability.
pub fn build_token_verifier(
    config: &Config,
    client: &CapabilityClient,
) -> Result<Arc<dyn TokenVerifier>, VerifyError> {
    let Some(pem) = config.access_jwt_public_key_pem.as_deref() else {
        tracing::info!("verifying bearer tokens through the jwt.verifyToken capability");
        return Ok(Arc::new(RemoteTokenVerifier::new(client.clone())));
    };

    let verifier = JwtTokenVerifier::new(
        pem,
        &config.access_jwt_algorithm,
        config.auth_issuer.as_deref(),
        config.auth_audience.as_deref(),
        config.access_token_leeway_seconds,
    )?;
    tracing::info!(algorithm = %config.access_jwt_algorithm, "verifying bearer tokens locally");

    Ok(Arc::new(verifier))
}
