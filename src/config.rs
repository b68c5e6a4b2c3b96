/*
 * Responsibility
 * - 環境変数や設定の読み込み (capability transport, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use url::Url;

use crate::services::health::DEFAULT_RESTART_AFTER_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub capability_base_url: Url,
    pub capability_timeout_ms: u64,

    // local verification is used only when the public key is present
    pub access_jwt_public_key_pem: Option<String>,
    pub access_jwt_algorithm: String,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub access_token_leeway_seconds: u64,

    pub entities_require_auth: bool,
    pub health_restart_after_ms: i64,

    pub request_body_limit_bytes: usize,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = split_list(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let capability_base_url = std::env::var("CAPABILITY_BASE_URL")
            .map_err(|_| ConfigError::Missing("CAPABILITY_BASE_URL"))
            .and_then(|s| Url::parse(&s).map_err(|_| ConfigError::Invalid("CAPABILITY_BASE_URL")))?;

        let capability_timeout_ms = parse_or("CAPABILITY_TIMEOUT_MS", 10_000);

        let access_jwt_public_key_pem = non_empty("ACCESS_JWT_PUBLIC_KEY_PEM")
            .map(|pem| pem.replace("\\n", "\n"));

        let access_jwt_algorithm =
            non_empty("ACCESS_JWT_ALGORITHM").unwrap_or_else(|| "RS256".to_string());

        let auth_issuer = non_empty("AUTH_ISSUER");
        let auth_audience = non_empty("AUTH_AUDIENCE");

        let access_token_leeway_seconds = parse_or("ACCESS_TOKEN_LEEWAY_SECONDS", 60);

        let entities_require_auth = match non_empty("ENTITIES_REQUIRE_AUTH") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid("ENTITIES_REQUIRE_AUTH"))?,
            None => false,
        };

        let health_restart_after_ms = parse_or("HEALTH_RESTART_AFTER_MS", DEFAULT_RESTART_AFTER_MS);

        let request_body_limit_bytes = parse_or("REQUEST_BODY_LIMIT_BYTES", 1024 * 1024);
        let request_timeout_seconds = parse_or("REQUEST_TIMEOUT_SECONDS", 30);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            capability_base_url,
            capability_timeout_ms,
            access_jwt_public_key_pem,
            access_jwt_algorithm,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            entities_require_auth,
            health_restart_after_ms,
            request_body_limit_bytes,
            request_timeout_seconds,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
