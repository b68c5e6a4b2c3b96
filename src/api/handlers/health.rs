/*
 * Responsibility
 * - GET /health-check (uptime 付きの疎通確認)
 * - 閾値を超えたら 410 "Restart" で再起動を促す
 */
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::services::health::HealthStatus;
use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> HealthStatus {
    state.health.check(Utc::now())
}

impl IntoResponse for HealthStatus {
    fn into_response(self) -> Response {
        match self {
            HealthStatus::Ok { elapsed_ms } => {
                (StatusCode::OK, format!("ok {elapsed_ms}")).into_response()
            }
            HealthStatus::Restart => (StatusCode::GONE, "Restart").into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::body_text;

    #[tokio::test]
    async fn ok_body_carries_elapsed_ms() {
        let res = HealthStatus::Ok { elapsed_ms: 1000 }.into_response();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "ok 1000");
    }

    #[tokio::test]
    async fn restart_is_gone() {
        let res = HealthStatus::Restart.into_response();

        assert_eq!(res.status(), StatusCode::GONE);
        assert_eq!(body_text(res).await, "Restart");
    }
}
