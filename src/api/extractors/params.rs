//! Parameters handed to a capability.
//!
//! Query string, JSON body and named path segments are merged into one object.
//! On key collisions the path segment wins over the body, and the body wins
//! over the query string.
//!
//! Only JSON bodies contribute parameters. An empty body, or one sent with any
//! other content type, contributes nothing.
use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::PathRejection},
    http::{HeaderMap, header},
};
use serde_json::Value;

use crate::error::AppError;
use crate::services::entities::Params;

pub struct CapabilityParams(pub Params);

impl<S> FromRequest<S> for CapabilityParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let path = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, state).await
        {
            Ok(Path(path)) => path,
            // route template without named segments
            Err(PathRejection::MissingPathParams(_)) => HashMap::new(),
            Err(e) => return Err(AppError::downstream(e.status().as_u16(), e.body_text())),
        };

        let Query(query) = Query::<HashMap<String, String>>::from_request_parts(&mut parts, state)
            .await
            .map_err(|e| AppError::downstream(e.status().as_u16(), e.body_text()))?;

        let body = if is_json(&parts.headers) {
            let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
                .await
                .map_err(|e| AppError::downstream(e.status().as_u16(), e.body_text()))?;

            if bytes.is_empty() {
                Params::new()
            } else {
                let Json(body) = Json::<Params>::from_bytes(&bytes)?;
                body
            }
        } else {
            Params::new()
        };

        Ok(Self(merge(query, body, path)))
    }
}

/// `application/json` or any `application/*+json` media type.
fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn merge(query: HashMap<String, String>, body: Params, path: HashMap<String, String>) -> Params {
    let mut params: Params = query
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    params.extend(body);
    params.extend(path.into_iter().map(|(k, v)| (k, Value::String(v))));

    params
}
