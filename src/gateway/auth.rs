//! `/api/auth/*` handlers: Supabase token exchange and profile lookup.

use super::{ApiError, AppState};
use crate::auth::bearer_token;
use crate::integrations::AuthUser;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<AuthUser> for UserSummary {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.user_metadata.display_name,
            avatar_url: user.user_metadata.avatar_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct AuthTestResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
}

/// POST /api/auth/verify: exchange a Supabase access token for an application JWT
pub(super) async fn handle_auth_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, ApiError> {
    let token =
        bearer_token(&headers).ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

    let backend = state
        .auth_backend
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Supabase auth is not configured".into()))?;
    let issuer = state
        .jwt
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Token signing is not configured".into()))?;

    let user = backend.get_user(token).await.map_err(|e| {
        tracing::warn!("Supabase token rejected: {e}");
        ApiError::Unauthorized("Invalid token".into())
    })?;

    let app_token = issuer.issue(&user).map_err(|e| {
        tracing::error!("Token issue failed: {e}");
        ApiError::Internal("Server error during authentication".into())
    })?;

    tracing::info!(user_id = %user.id, "🔐 User verified");

    Ok(Json(VerifyResponse {
        success: true,
        token: app_token,
        user: user.into(),
    }))
}

/// GET /api/auth/profile: profile row for the holder of an application JWT
pub(super) async fn handle_auth_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Access denied. No token provided.".into()))?;

    let issuer = state
        .jwt
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Token signing is not configured".into()))?;
    let claims = issuer.verify(token).map_err(|e| {
        tracing::debug!("Profile token rejected: {e}");
        ApiError::BadRequest("Invalid token.".into())
    })?;

    let backend = state
        .auth_backend
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Supabase auth is not configured".into()))?;

    match backend.get_profile(&claims.id).await {
        Ok(Some(user)) => Ok(Json(ProfileResponse {
            success: true,
            user,
        })),
        Ok(None) => Err(ApiError::NotFound("User not found".into())),
        Err(e) => {
            tracing::error!(user_id = %claims.id, "Profile lookup failed: {e}");
            Err(ApiError::Internal("Server error fetching user profile".into()))
        }
    }
}

/// GET /api/auth/test
pub(super) async fn handle_auth_test() -> Json<AuthTestResponse> {
    Json(AuthTestResponse {
        success: true,
        message: "Supabase Auth API is working!",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body_json, test_state};
    use super::*;
    use crate::auth::JwtIssuer;
    use crate::integrations::{AuthBackend, UserMetadata};
    use async_trait::async_trait;
    use axum::http::{header, HeaderValue, StatusCode};
    use axum::response::IntoResponse;
    use std::sync::Arc;
    use std::time::Duration;

    /// Accepts only `good-token`; knows a single profile row for `user-1`.
    struct MockBackend {
        profile_error: bool,
    }

    #[async_trait]
    impl AuthBackend for MockBackend {
        async fn get_user(&self, access_token: &str) -> anyhow::Result<AuthUser> {
            if access_token != "good-token" {
                anyhow::bail!("Supabase rejected token (401)");
            }
            Ok(AuthUser {
                id: "user-1".into(),
                email: Some("dev@example.com".into()),
                role: Some("authenticated".into()),
                user_metadata: UserMetadata {
                    display_name: Some("Dev".into()),
                    avatar_url: None,
                },
            })
        }

        async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<serde_json::Value>> {
            if self.profile_error {
                anyhow::bail!("connection refused");
            }
            Ok((user_id == "user-1")
                .then(|| serde_json::json!({"id": "user-1", "display_name": "Dev"})))
        }
    }

    fn issuer() -> Arc<JwtIssuer> {
        Arc::new(JwtIssuer::new("test-secret", Duration::from_secs(3600)).unwrap())
    }

    fn auth_state(profile_error: bool) -> AppState {
        let mut state = test_state();
        state.auth_backend = Some(Arc::new(MockBackend { profile_error }));
        state.jwt = Some(issuer());
        state
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn app_token_for(id: &str) -> String {
        issuer()
            .issue(&AuthUser {
                id: id.into(),
                email: None,
                role: None,
                user_metadata: UserMetadata::default(),
            })
            .unwrap()
    }

    #[tokio::test]
    async fn verify_without_token_is_unauthorized() {
        let response = handle_auth_verify(State(auth_state(false)), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "No token provided");
    }

    #[tokio::test]
    async fn verify_rejected_token_is_unauthorized() {
        let response = handle_auth_verify(State(auth_state(false)), bearer("forged"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Invalid token");
    }

    #[tokio::test]
    async fn verify_issues_token_carrying_user_id() {
        let response = handle_auth_verify(State(auth_state(false)), bearer("good-token"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["user"]["id"], "user-1");
        assert_eq!(json["user"]["email"], "dev@example.com");
        assert_eq!(json["user"]["display_name"], "Dev");

        let claims = issuer().verify(json["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.id, "user-1");
        assert_eq!(claims.role.as_deref(), Some("authenticated"));
    }

    #[tokio::test]
    async fn verify_without_configuration_is_unavailable() {
        let response = handle_auth_verify(State(test_state()), bearer("good-token"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn profile_without_token_is_unauthorized() {
        let response = handle_auth_profile(State(auth_state(false)), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["message"],
            "Access denied. No token provided."
        );
    }

    #[tokio::test]
    async fn profile_with_bad_token_is_bad_request() {
        let response = handle_auth_profile(State(auth_state(false)), bearer("not.a.jwt"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Invalid token.");
    }

    #[tokio::test]
    async fn profile_returns_row() {
        let response = handle_auth_profile(State(auth_state(false)), bearer(&app_token_for("user-1")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["user"]["display_name"], "Dev");
    }

    #[tokio::test]
    async fn profile_missing_row_is_not_found() {
        let response = handle_auth_profile(State(auth_state(false)), bearer(&app_token_for("ghost")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "User not found");
    }

    #[tokio::test]
    async fn profile_lookup_failure_is_internal_error() {
        let response = handle_auth_profile(State(auth_state(true)), bearer(&app_token_for("user-1")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn auth_test_reports_working() {
        let json = body_json(handle_auth_test().await.into_response()).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Supabase Auth API is working!");
    }
}
