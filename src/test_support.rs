//! Test doubles for the capability traits and helpers to drive the router.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::api;
use crate::services::auth::{TokenVerifier, VerifiedIdentity, VerifyError};
use crate::services::capability::DownstreamError;
use crate::services::entities::{EntityCapability, EntityService, Params};
use crate::services::health::{DEFAULT_RESTART_AFTER_MS, HealthProbe, ProcessStart};
use crate::state::AppState;

pub const ACCEPTED_TOKEN: &str = "good-token";

/// Accepts `ACCEPTED_TOKEN` only; everything else fails like an expired JWT.
pub struct StaticVerifier;

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        if token == ACCEPTED_TOKEN {
            Ok(VerifiedIdentity::new(json!({"sub": "user-1"})))
        } else {
            Err(VerifyError::Remote(DownstreamError::new("jwt expired")))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub capability: EntityCapability,
    pub params: Params,
    pub identity: Option<VerifiedIdentity>,
}

/// Answers every capability with the same outcome and records the calls.
pub struct RecordingEntities {
    outcome: Result<Value, DownstreamError>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingEntities {
    pub fn ok(value: Value) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(value),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: DownstreamError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(err),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityService for RecordingEntities {
    async fn invoke(
        &self,
        capability: EntityCapability,
        params: Params,
        identity: Option<VerifiedIdentity>,
    ) -> Result<Value, DownstreamError> {
        self.calls.lock().unwrap().push(Call {
            capability,
            params,
            identity,
        });
        self.outcome.clone()
    }
}

pub fn state(entities: Arc<RecordingEntities>, started_at: DateTime<Utc>) -> AppState {
    AppState::new(
        Arc::new(StaticVerifier),
        entities,
        HealthProbe::new(&ProcessStart::at(started_at), DEFAULT_RESTART_AFTER_MS),
    )
}

/// The route table alone, without the HTTP middleware stack.
pub fn app(
    entities: Arc<RecordingEntities>,
    entities_require_auth: bool,
    started_at: DateTime<Utc>,
) -> Router {
    let state = state(entities, started_at);
    api::routes(&state, &api::route_table(entities_require_auth)).with_state(state)
}

pub fn request(
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_text(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
