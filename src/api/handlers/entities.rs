/*
 * Responsibility
 * - /entities 系 alias の実体: capability へ転送して結果をそのまま返す
 * - 失敗時は route の error hook (normalize) を一度だけ通して AppError にする
 */
use axum::Json;
use serde_json::Value;

use crate::error::{AppError, Classified, classify};
use crate::services::auth::VerifiedIdentity;
use crate::services::capability::DownstreamError;
use crate::services::entities::{EntityCapability, Params};
use crate::state::AppState;

/// Route-level error hook, called once per failed capability call.
pub type ErrorHook = fn(EntityCapability, DownstreamError) -> AppError;

pub async fn dispatch(
    state: &AppState,
    capability: EntityCapability,
    on_error: ErrorHook,
    identity: Option<VerifiedIdentity>,
    params: Params,
) -> Result<Json<Value>, AppError> {
    tracing::debug!(capability = capability.name(), "invoking capability");

    state
        .entities
        .invoke(capability, params, identity)
        .await
        .map(Json)
        .map_err(|err| on_error(capability, err))
}

/// Default error hook: classify, log, hand the error to the response writer.
pub fn normalize(capability: EntityCapability, err: DownstreamError) -> AppError {
    let Classified {
        error,
        context_status,
    } = classify(err);

    tracing::warn!(
        capability = capability.name(),
        status_code = error.status_code(),
        context_status = ?context_status,
        error = %error,
        "capability failed"
    );

    error
}
