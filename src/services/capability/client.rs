//! HTTP transport for named capability calls.
//!
//! A call `entities.getByUuid(params)` is sent as
//! `POST <base>/entities.getByUuid` with body `{"params": {...}, "meta": {...}}`.
//! A 2xx answer carries the result as JSON; anything else is expected to carry
//! a [`DownstreamError`] body.
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::services::auth::VerifiedIdentity;
use crate::services::capability::error::DownstreamError;

/// Metadata propagated with every call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<VerifiedIdentity>,
}

impl CallMeta {
    pub fn with_user(user: Option<VerifiedIdentity>) -> Self {
        Self { user }
    }
}

#[derive(Serialize)]
struct CallBody<'a> {
    params: &'a Value,
    meta: &'a CallMeta,
}

#[derive(Clone, Debug)]
pub struct CapabilityClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CapabilityClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, mut base_url: Url) -> Self {
        // `Url::join` replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self { http, base_url }
    }

    pub fn endpoint(&self, capability: &str) -> Result<Url, DownstreamError> {
        self.base_url.join(capability).map_err(|e| {
            DownstreamError::new(format!("invalid capability name '{capability}': {e}"))
        })
    }

    pub async fn call(
        &self,
        capability: &str,
        params: &Value,
        meta: &CallMeta,
    ) -> Result<Value, DownstreamError> {
        let url = self.endpoint(capability)?;

        let res = self
            .http
            .post(url)
            .json(&CallBody { params, meta })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(capability, error = %e, "capability transport failure");
                DownstreamError::new(format!("capability '{capability}' unreachable: {e}"))
            })?;

        let status = res.status();
        let body = res
            .bytes()
            .await
            .map_err(|e| DownstreamError::new(format!("capability '{capability}' body: {e}")))?;

        if status.is_success() {
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&body).map_err(|e| {
                DownstreamError::new(format!("capability '{capability}' returned invalid json: {e}"))
            });
        }

        Err(decode_failure(capability, status, &body))
    }
}

fn decode_failure(capability: &str, status: StatusCode, body: &[u8]) -> DownstreamError {
    match serde_json::from_slice::<DownstreamError>(body) {
        Ok(err) => err,
        Err(_) => {
            tracing::debug!(capability, %status, "capability failure without error body");
            DownstreamError::new(format!("capability '{capability}' failed with {status}"))
        }
    }
}
