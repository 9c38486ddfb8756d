//! Axum-based HTTP gateway for the DevNest chat backend.
//!
//! - `GET /`, `GET /api/health`: service banner and status
//! - `POST /api/chat`: provider completion, falling back to the template responder
//! - `/api/auth/*`: Supabase token exchange and profile lookup (see [`auth`])
//!
//! Every response is a typed envelope: a per-endpoint success body with
//! `success: true`, or an [`ApiError`] rendered as `{success: false, message}`.

pub mod auth;

use crate::auth::JwtIssuer;
use crate::config::Config;
use crate::dispatcher;
use crate::integrations::{AuthBackend, ChatRecord, ChatStore, SupabaseClient};
use crate::providers::{self, Provider, DEVNEST_SYSTEM_PROMPT};
use crate::util::truncate_with_ellipsis;
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (60s)
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
/// Sliding window used by chat rate limiting.
pub const CHAT_RATE_LIMIT_WINDOW_SECS: u64 = 3600;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often the rate limiter sweeps stale client entries from its map.
const RATE_LIMITER_SWEEP_INTERVAL_SECS: u64 = 300; // 5 minutes

/// Longest message preview written to logs.
const LOG_PREVIEW_CHARS: usize = 80;

#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    limit_per_window: u32,
    window: Duration,
    requests: Mutex<(HashMap<String, Vec<Instant>>, Instant)>,
}

impl SlidingWindowRateLimiter {
    pub fn new(limit_per_window: u32, window: Duration) -> Self {
        Self {
            limit_per_window,
            window,
            requests: Mutex::new((HashMap::new(), Instant::now())),
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    pub fn allow(&self, key: &str) -> bool {
        if self.limit_per_window == 0 {
            return true;
        }

        let now = Instant::now();
        let cutoff = now.checked_sub(self.window).unwrap_or_else(Instant::now);

        let mut guard = self.requests.lock();
        let (requests, last_sweep) = &mut *guard;

        // Periodic sweep: remove clients with no recent requests
        if last_sweep.elapsed() >= Duration::from_secs(RATE_LIMITER_SWEEP_INTERVAL_SECS) {
            requests.retain(|_, timestamps| {
                timestamps.retain(|t| *t > cutoff);
                !timestamps.is_empty()
            });
            *last_sweep = now;
        }

        let entry = requests.entry(key.to_owned()).or_default();
        entry.retain(|instant| *instant > cutoff);

        if entry.len() >= self.limit_per_window as usize {
            return false;
        }

        entry.push(now);
        true
    }
}

fn forwarded_client_ip(headers: &HeaderMap) -> Option<String> {
    for header_name in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(value) = headers.get(header_name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return Some(first.to_owned());
            }
        }
    }
    None
}

/// Rate-limit key: the TCP peer IP, or the proxy-reported client IP when
/// `trust_forwarded_headers` is set.
fn rate_limit_key(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_headers: bool) -> String {
    if trust_forwarded_headers {
        if let Some(ip) = forwarded_client_ip(headers) {
            return ip;
        }
    }
    peer.ip().to_string()
}

// ══════════════════════════════════════════════════════════════════════════════
// STATE
// ══════════════════════════════════════════════════════════════════════════════

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    /// Chat provider. `None` means every chat is answered by the template responder.
    pub provider: Option<Arc<dyn Provider>>,
    pub model: String,
    pub temperature: f64,
    /// Supabase token/profile lookups for `/api/auth/*`.
    pub auth_backend: Option<Arc<dyn AuthBackend>>,
    /// Chat persistence; failures never affect the chat response.
    pub chat_store: Option<Arc<dyn ChatStore>>,
    pub jwt: Option<Arc<JwtIssuer>>,
    pub chat_limiter: Arc<SlidingWindowRateLimiter>,
    /// Key rate limits on `X-Forwarded-For` / `X-Real-IP` (behind a reverse proxy).
    pub trust_forwarded_headers: bool,
}

impl AppState {
    fn database_configured(&self) -> bool {
        self.auth_backend.is_some() || self.chat_store.is_some()
    }

    fn ai_status(&self) -> AiStatus {
        match self.provider {
            Some(ref provider) => AiStatus {
                provider: provider.name().to_string(),
                model: self.model.clone(),
                status: "ACTIVE",
            },
            None => AiStatus {
                provider: "none".into(),
                model: "manual-templates".into(),
                status: "DISABLED",
            },
        }
    }
}

/// Build handler state from configuration, constructing every client handle.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let provider: Option<Arc<dyn Provider>> = match config.provider.credentials() {
        Some((name, key)) => Some(Arc::from(providers::create_provider(
            name,
            key,
            config.provider.api_url.as_deref(),
            config.provider.max_tokens,
            Duration::from_secs(config.provider.timeout_secs),
        )?)),
        None => None,
    };
    let model = config.provider.effective_model().unwrap_or_default();

    match provider {
        Some(ref p) => tracing::info!(provider = p.name(), model = %model, "🤖 AI provider: ACTIVE"),
        None => tracing::warn!("🤖 AI provider: not configured, chat uses manual responses"),
    }

    let supabase = match config.supabase.clone() {
        Some(sb) => {
            let client = Arc::new(SupabaseClient::new(sb)?);
            if client.health_check().await {
                tracing::info!("🚀 Supabase: Connected");
            } else {
                tracing::warn!("🚀 Supabase: configured but not reachable");
            }
            Some(client)
        }
        None => {
            tracing::warn!("🚀 Supabase: Not Configured");
            None
        }
    };

    let jwt = match config.auth.jwt_secret.as_deref() {
        Some(secret) => Some(Arc::new(JwtIssuer::new(
            secret,
            Duration::from_secs(config.auth.token_ttl_secs),
        )?)),
        None => {
            tracing::warn!("JWT_SECRET not set; /api/auth/verify and /api/auth/profile are disabled");
            None
        }
    };

    Ok(AppState {
        provider,
        model,
        temperature: config.provider.temperature,
        auth_backend: supabase.clone().map(|c| c as Arc<dyn AuthBackend>),
        chat_store: supabase.map(|c| c as Arc<dyn ChatStore>),
        jwt,
        chat_limiter: Arc::new(SlidingWindowRateLimiter::new(
            config.gateway.chat_requests_per_hour,
            Duration::from_secs(CHAT_RATE_LIMIT_WINDOW_SECS),
        )),
        trust_forwarded_headers: config.gateway.trust_forwarded_headers,
    })
}

/// Assemble routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // ── CORS: any origin ──
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/", get(handle_root))
        .route("/api/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .route("/api/auth/verify", post(auth::handle_auth_verify))
        .route("/api/auth/profile", get(auth::handle_auth_profile))
        .route("/api/auth/test", get(auth::handle_auth_test))
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Serve the gateway until Ctrl-C.
pub async fn run_gateway(host: &str, port: u16, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual = listener.local_addr()?;

    tracing::info!("🚀 Server running at http://{actual}");
    tracing::info!("📍 Health: http://{actual}/api/health");

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// ENVELOPES
// ══════════════════════════════════════════════════════════════════════════════

/// Error half of every endpoint's envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Too many requests. Please retry later.")]
    RateLimited { retry_after: u64 },
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retry_after = match self {
            ApiError::RateLimited { retry_after } => Some(retry_after),
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            retry_after,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AiStatus {
    pub provider: String,
    pub model: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub database: &'static str,
    pub ai: AiStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub health: &'static str,
    pub chat: &'static str,
    pub auth_verify: &'static str,
    pub auth_profile: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub success: bool,
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
    pub ai: AiStatus,
}

/// Where a chat reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseSource {
    #[serde(rename = "AI Provider")]
    Provider,
    #[serde(rename = "Manual Response")]
    Manual,
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "userId", alias = "user_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    pub source: ResponseSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatReply {
    fn from_provider(response: String, model: &str) -> Self {
        Self {
            success: true,
            response,
            source: ResponseSource::Provider,
            model: Some(model.to_string()),
        }
    }

    fn manual(response: String) -> Self {
        Self {
            success: true,
            response,
            source: ResponseSource::Manual,
            model: None,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// GET /: service banner
async fn handle_root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        success: true,
        message: "🚀 DevNest Backend API",
        version: API_VERSION,
        endpoints: Endpoints {
            health: "GET /api/health",
            chat: "POST /api/chat",
            auth_verify: "POST /api/auth/verify",
            auth_profile: "GET /api/auth/profile",
        },
        ai: state.ai_status(),
    })
}

/// GET /api/health (public, no secrets)
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "🚀 DevNest Backend Running!",
        database: if state.database_configured() {
            "Supabase Connected"
        } else {
            "Not Connected"
        },
        ai: state.ai_status(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// POST /api/chat: answer a chat message
async fn handle_chat(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = body.map_err(|e| {
        tracing::warn!("Chat JSON parse error: {e}");
        ApiError::BadRequest("Invalid JSON body. Expected: {\"message\": \"...\"}".into())
    })?;

    let message = body
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Message is required".into()))?;

    // Only accepted chats count against the quota.
    let client_key = rate_limit_key(&headers, peer, state.trust_forwarded_headers);
    if !state.chat_limiter.allow(&client_key) {
        tracing::warn!("/api/chat rate limit exceeded for key: {client_key}");
        return Err(ApiError::RateLimited {
            retry_after: state.chat_limiter.window_secs(),
        });
    }

    let request_id = uuid::Uuid::new_v4();
    tracing::info!(
        %request_id,
        client = %client_key,
        "📨 User message: {}",
        truncate_with_ellipsis(message, LOG_PREVIEW_CHARS)
    );

    let reply = generate_reply(&state, message).await;

    if let Some(ref store) = state.chat_store {
        let record = ChatRecord::new(body.user_id.as_deref(), message, &reply.response);
        match store.insert_chat(&record).await {
            Ok(()) => tracing::debug!(%request_id, "Chat saved"),
            Err(e) => tracing::warn!(%request_id, "Chat save failed: {e}"),
        }
    }

    Ok(Json(reply))
}

/// Provider first; template responder when there is no provider or it fails.
async fn generate_reply(state: &AppState, message: &str) -> ChatReply {
    if let Some(ref provider) = state.provider {
        match provider
            .chat_with_system(
                Some(DEVNEST_SYSTEM_PROMPT),
                message,
                &state.model,
                state.temperature,
            )
            .await
        {
            Ok(response) => {
                tracing::info!(provider = provider.name(), "✅ AI response ready");
                return ChatReply::from_provider(response, &state.model);
            }
            Err(e) => {
                tracing::error!(
                    "Chat provider error, using manual response: {}",
                    providers::sanitize_api_error(&e.to_string())
                );
            }
        }
    }

    let category = dispatcher::classify(message);
    tracing::debug!(%category, "Manual response");
    ChatReply::manual(dispatcher::dispatch(message))
}
