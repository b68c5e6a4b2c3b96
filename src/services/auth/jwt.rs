use std::str::FromStr;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde_json::Value;

use crate::services::auth::verifier::{TokenVerifier, VerifiedIdentity, VerifyError};

/// Local access-token verifier, used instead of the remote capability when the
/// gateway is given the issuer's public key.
///
/// - Key material is intentionally not printable via Debug.
/// - Claims are returned untouched as the opaque identity.
#[derive(Clone)]
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtTokenVerifier {
    pub fn new(
        public_key_pem: &str,
        algorithm: &str,
        issuer: Option<&str>,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, VerifyError> {
        let algorithm = Algorithm::from_str(algorithm)?;
        let decoding_key = decoding_key(algorithm, public_key_pem.as_bytes())?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = leeway_seconds;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            // otherwise any token carrying `aud` would be refused
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Value, VerifyError> {
        let data = jsonwebtoken::decode::<Value>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }
}

fn decoding_key(algorithm: Algorithm, pem: &[u8]) -> Result<DecodingKey, VerifyError> {
    let key = match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem)?,
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem)?,
        Algorithm::EdDSA => DecodingKey::from_ed_pem(pem)?,
        // shared-secret algorithms have no public key to verify with
        _ => return Err(VerifyError::Jwt(ErrorKind::InvalidAlgorithm.into())),
    };

    Ok(key)
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        self.verify(token).map(VerifiedIdentity::new)
    }
}
