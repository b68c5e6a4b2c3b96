/*
 * Responsibility
 * - URL 構造を宣言的に定義 (route group ごとの alias テーブル)
 * - alias: (method, path template) → capability | inline handler
 * - group ごとに bearer gate の有無と error hook を決める
 */
use std::collections::BTreeMap;

use axum::{
    Router,
    extract::State,
    routing::{MethodFilter, MethodRouter},
};

use crate::api::extractors::{CapabilityParams, MaybeIdentity};
use crate::api::handlers::{
    entities::{self, ErrorHook},
    health,
};
use crate::middleware::auth::access;
use crate::services::entities::EntityCapability;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Capability(EntityCapability),
    HealthCheck,
}

#[derive(Debug, Clone, Copy)]
pub struct Alias {
    pub method: MethodFilter,
    pub path: &'static str,
    pub target: Target,
}

impl Alias {
    pub const fn capability(
        method: MethodFilter,
        path: &'static str,
        capability: EntityCapability,
    ) -> Self {
        Self {
            method,
            path,
            target: Target::Capability(capability),
        }
    }

    pub const fn inline(method: MethodFilter, path: &'static str, target: Target) -> Self {
        Self {
            method,
            path,
            target,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteGroup {
    pub path: &'static str,
    pub authorization: bool,
    pub aliases: &'static [Alias],
    pub on_error: ErrorHook,
}

impl RouteGroup {
    pub const fn with_authorization(mut self, authorization: bool) -> Self {
        self.authorization = authorization;
        self
    }

    pub fn full_path(&self, alias: &Alias) -> String {
        match (self.path, alias.path) {
            (prefix, "/") => prefix.to_string(),
            ("/", path) => path.to_string(),
            (prefix, path) => format!("{prefix}{path}"),
        }
    }
}

// Public CRUD: the bearer gate is off for this group unless configured.
pub const ENTITIES: RouteGroup = RouteGroup {
    path: "/entities",
    authorization: false,
    on_error: entities::normalize,
    aliases: &[
        Alias::capability(MethodFilter::POST, "/", EntityCapability::Create),
        Alias::capability(MethodFilter::GET, "/", EntityCapability::GetAll),
        Alias::capability(MethodFilter::GET, "/{uuid}", EntityCapability::GetByUuid),
        Alias::capability(MethodFilter::PATCH, "/{uuid}", EntityCapability::Update),
        Alias::capability(MethodFilter::DELETE, "/{uuid}", EntityCapability::Delete),
    ],
};

pub const ROOT: RouteGroup = RouteGroup {
    path: "/",
    authorization: false,
    on_error: entities::normalize,
    aliases: &[Alias::inline(
        MethodFilter::GET,
        "/health-check",
        Target::HealthCheck,
    )],
};

pub fn route_table(entities_require_auth: bool) -> [RouteGroup; 2] {
    [ENTITIES.with_authorization(entities_require_auth), ROOT]
}

pub fn routes(state: &AppState, groups: &[RouteGroup]) -> Router<AppState> {
    groups.iter().fold(Router::new(), |router, group| {
        router.merge(group_router(state, group))
    })
}

fn group_router(state: &AppState, group: &RouteGroup) -> Router<AppState> {
    // aliases sharing a path template end up on one MethodRouter
    let mut by_path: BTreeMap<String, MethodRouter<AppState>> = BTreeMap::new();
    for alias in group.aliases {
        let path = group.full_path(alias);
        let method_router = by_path.remove(&path).unwrap_or_else(MethodRouter::new);
        by_path.insert(path, attach(method_router, alias, group.on_error));
    }

    let router = by_path
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(&path, method_router)
        });

    if group.authorization {
        access::apply(router, state.clone())
    } else {
        router
    }
}

fn attach(
    method_router: MethodRouter<AppState>,
    alias: &Alias,
    on_error: ErrorHook,
) -> MethodRouter<AppState> {
    match alias.target {
        Target::HealthCheck => method_router.on(alias.method, health::health_check),
        Target::Capability(capability) => method_router.on(
            alias.method,
            move |State(state): State<AppState>,
                  MaybeIdentity(identity): MaybeIdentity,
                  CapabilityParams(params): CapabilityParams| async move {
                entities::dispatch(&state, capability, on_error, identity, params).await
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::capability::{DownstreamError, FieldViolation};
    use crate::test_support::{
        ACCEPTED_TOKEN, RecordingEntities, app, body_json, body_text, request,
    };
    use axum::http::{Method, StatusCode};
    use chrono::{TimeDelta, Utc};
    use serde_json::json;
    use tower::ServiceExt;

    #[test]
    fn full_paths() {
        assert_eq!(ENTITIES.full_path(&ENTITIES.aliases[0]), "/entities");
        assert_eq!(ENTITIES.full_path(&ENTITIES.aliases[2]), "/entities/{uuid}");
        assert_eq!(ROOT.full_path(&ROOT.aliases[0]), "/health-check");
    }

    #[test]
    fn entities_group_is_public_by_default() {
        let [entities, root] = route_table(false);
        assert!(!entities.authorization);
        assert!(!root.authorization);
        assert!(route_table(true)[0].authorization);
    }

    #[tokio::test]
    async fn health_check_reports_uptime() {
        let entities = RecordingEntities::ok(json!(null));
        let res = app(entities, false, Utc::now())
            .oneshot(request(Method::GET, "/health-check", None, None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.starts_with("ok "));
    }

    #[tokio::test]
    async fn health_check_asks_for_restart() {
        let entities = RecordingEntities::ok(json!(null));
        let started_at = Utc::now() - TimeDelta::hours(2);
        let res = app(entities, false, started_at)
            .oneshot(request(Method::GET, "/health-check", None, None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::GONE);
        assert_eq!(body_text(res).await, "Restart");
    }

    #[tokio::test]
    async fn aliases_reach_their_capabilities() {
        let cases = [
            (Method::POST, "/entities", EntityCapability::Create),
            (Method::GET, "/entities", EntityCapability::GetAll),
            (Method::GET, "/entities/e-1", EntityCapability::GetByUuid),
            (Method::PATCH, "/entities/e-1", EntityCapability::Update),
            (Method::DELETE, "/entities/e-1", EntityCapability::Delete),
        ];

        for (method, uri, capability) in cases {
            let entities = RecordingEntities::ok(json!({"ok": true}));
            let res = app(entities.clone(), false, Utc::now())
                .oneshot(request(method, uri, None, None))
                .await
                .unwrap();

            assert_eq!(res.status(), StatusCode::OK, "{uri}");
            assert_eq!(body_json(res).await, json!({"ok": true}));

            let calls = entities.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].capability, capability);
        }
    }

    #[tokio::test]
    async fn params_merge_path_body_and_query() {
        let entities = RecordingEntities::ok(json!({}));
        let res = app(entities.clone(), false, Utc::now())
            .oneshot(request(
                Method::PATCH,
                "/entities/e-1?uuid=ignored&dry_run=true",
                None,
                Some(json!({"name": "widget", "uuid": "also-ignored"})),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let calls = entities.calls();
        assert_eq!(calls[0].params["uuid"], "e-1");
        assert_eq!(calls[0].params["name"], "widget");
        assert_eq!(calls[0].params["dry_run"], "true");
    }

    #[tokio::test]
    async fn entities_skip_the_gate_by_default() {
        let entities = RecordingEntities::ok(json!([]));
        let res = app(entities.clone(), false, Utc::now())
            .oneshot(request(Method::GET, "/entities", None, None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(entities.calls()[0].identity, None);
    }

    #[tokio::test]
    async fn validation_error_is_normalized() {
        let err = DownstreamError::validation(
            "Parameters validation error!",
            vec![FieldViolation::new("X")],
        );
        let res = app(RecordingEntities::failing(err), false, Utc::now())
            .oneshot(request(Method::POST, "/entities", None, Some(json!({}))))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res).await,
            json!({"message": "X", "statusCode": 400, "status": "VALIDATION_ERROR"})
        );
    }

    #[tokio::test]
    async fn unclassified_error_is_500() {
        let err = DownstreamError::new("database exploded");
        let res = app(RecordingEntities::failing(err), false, Utc::now())
            .oneshot(request(Method::GET, "/entities", None, None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(res).await,
            json!({"message": "database exploded", "statusCode": 500, "status": "UNKNOWN_ERROR"})
        );
    }

    #[tokio::test]
    async fn status_code_override_is_honoured() {
        let err = DownstreamError::new("entity not found").with_status_code(404);
        let res = app(RecordingEntities::failing(err), false, Utc::now())
            .oneshot(request(Method::GET, "/entities/e-404", None, None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await["status"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_json_body_is_enveloped() {
        let entities = RecordingEntities::ok(json!({}));
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/entities")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();

        let res = app(entities.clone(), false, Utc::now())
            .oneshot(req)
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["status"], "BAD_REQUEST");
        assert!(entities.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_json_body_carries_no_params() {
        let entities = RecordingEntities::ok(json!({}));
        let req = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri("/entities/e-1")
            .header("content-type", "application/json")
            .body(axum::body::Body::empty())
            .unwrap();

        let res = app(entities.clone(), false, Utc::now())
            .oneshot(req)
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let calls = entities.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].capability, EntityCapability::Delete);
        assert_eq!(calls[0].params.len(), 1);
        assert_eq!(calls[0].params["uuid"], "e-1");
    }

    #[tokio::test]
    async fn non_json_body_is_skipped() {
        let entities = RecordingEntities::ok(json!([]));
        let req = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/entities?limit=5")
            .header("content-type", "text/plain")
            .body(axum::body::Body::from("hello"))
            .unwrap();

        let res = app(entities.clone(), false, Utc::now())
            .oneshot(req)
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let calls = entities.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].capability, EntityCapability::GetAll);
        assert_eq!(calls[0].params.len(), 1);
        assert_eq!(calls[0].params["limit"], "5");
    }

    #[tokio::test]
    async fn gate_rejects_missing_token() {
        let entities = RecordingEntities::ok(json!({}));
        let res = app(entities.clone(), true, Utc::now())
            .oneshot(request(Method::GET, "/entities", None, None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(res).await,
            json!({"code": 401, "error": "Invalid authorization token"})
        );
        assert!(entities.calls().is_empty());
    }

    #[tokio::test]
    async fn gate_rejects_other_schemes() {
        for header in ["Basic dXNlcjpwYXNz", "bearer good-token", "Token good-token"] {
            let entities = RecordingEntities::ok(json!({}));
            let res = app(entities.clone(), true, Utc::now())
                .oneshot(request(Method::GET, "/entities", Some(header), None))
                .await
                .unwrap();

            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{header}");
            assert!(entities.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn gate_rejects_refused_token() {
        let entities = RecordingEntities::ok(json!({}));
        let res = app(entities.clone(), true, Utc::now())
            .oneshot(request(
                Method::GET,
                "/entities",
                Some("Bearer stale-token"),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(res).await,
            json!({"code": 403, "error": {"message": "jwt expired"}})
        );
        assert!(entities.calls().is_empty());
    }

    #[tokio::test]
    async fn gate_forwards_identity() {
        let entities = RecordingEntities::ok(json!({"id": "e-1"}));
        let header = format!("Bearer {ACCEPTED_TOKEN}");
        let res = app(entities.clone(), true, Utc::now())
            .oneshot(request(Method::GET, "/entities/e-1", Some(&header), None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let identity = entities.calls()[0].identity.clone().unwrap();
        assert_eq!(identity.as_value()["sub"], "user-1");
    }

    #[tokio::test]
    async fn gate_does_not_cover_health_or_unknown_paths() {
        let entities = RecordingEntities::ok(json!({}));
        let router = app(entities, true, Utc::now());

        let res = router
            .clone()
            .oneshot(request(Method::GET, "/health-check", None, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = router
            .oneshot(request(Method::GET, "/nowhere", None, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
