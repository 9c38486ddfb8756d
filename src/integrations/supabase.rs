//! Supabase integration for DevNest.
//!
//! Talks to two Supabase surfaces over plain HTTP:
//! - GoTrue (`/auth/v1/user`) to resolve a user's access token
//! - PostgREST (`/rest/v1/<table>`) for the `users` and `chats` tables
//!
//! ## Design
//! - HTTP client (reqwest) with a 30s timeout
//! - Table calls use the service key when configured, else the anon key
//! - Token lookups always send the anon key as `apikey` and the caller's token as bearer

use super::{AuthBackend, ChatStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored in place of anonymous or missing user ids.
pub const ANONYMOUS_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

// ── Configuration ────────────────────────────────────────────────

/// Supabase connection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Supabase project URL (e.g., https://xxxx.supabase.co).
    pub url: String,
    /// Public anon key.
    pub anon_key: String,
    /// Optional service role key (server-side, never exposed to client).
    pub service_key: Option<String>,
}

impl SupabaseConfig {
    /// Both URL and anon key are present.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }

    fn table_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.anon_key)
    }
}

// ── Data models ──────────────────────────────────────────────────

/// Metadata attached to a Supabase auth user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMetadata {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// User as returned by `GET /auth/v1/user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Row for the `chats` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub user_id: String,
    pub prompt: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl ChatRecord {
    pub fn new(user_id: Option<&str>, prompt: &str, response: &str) -> Self {
        Self {
            user_id: storage_user_id(user_id),
            prompt: prompt.to_string(),
            response: response.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Map a caller-supplied user id to the value stored in `chats.user_id`.
pub fn storage_user_id(user_id: Option<&str>) -> String {
    match user_id.map(str::trim) {
        Some(id) if !id.is_empty() && !id.starts_with("anonymous") => id.to_string(),
        _ => ANONYMOUS_USER_ID.to_string(),
    }
}

// ── Supabase client ──────────────────────────────────────────────

/// Supabase HTTP client.
pub struct SupabaseClient {
    config: SupabaseConfig,
    http: reqwest::Client,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    pub fn new(config: SupabaseConfig) -> anyhow::Result<Self> {
        if !config.is_configured() {
            anyhow::bail!("Supabase URL and anon key are required");
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self { config, http })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Build the PostgREST URL for a table.
    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url(), table)
    }

    fn auth_user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url())
    }

    /// Headers for PostgREST table requests.
    fn table_headers(&self) -> Vec<(&'static str, String)> {
        let key = self.config.table_key();
        vec![
            ("apikey", key.to_string()),
            ("Authorization", format!("Bearer {key}")),
        ]
    }

    // ── Auth operations ──────────────────────────────────────

    /// Resolve the user owning `access_token`.
    pub async fn get_user(&self, access_token: &str) -> anyhow::Result<AuthUser> {
        let resp = self
            .http
            .get(self.auth_user_url())
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("Supabase rejected access token: {}", resp.status());
        }

        Ok(resp.json().await?)
    }

    // ── Table operations ─────────────────────────────────────

    /// Fetch a row from the `users` table by id.
    pub async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<serde_json::Value>> {
        let mut request = self
            .http
            .get(self.table_url("users"))
            .query(&[("id", format!("eq.{user_id}")), ("select", "*".to_string())]);
        for (key, value) in self.table_headers() {
            request = request.header(key, value);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("Failed to fetch profile: {}", resp.status());
        }

        let rows: Vec<serde_json::Value> = resp.json().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a chat exchange into the `chats` table.
    pub async fn insert_chat(&self, record: &ChatRecord) -> anyhow::Result<()> {
        let mut request = self
            .http
            .post(self.table_url("chats"))
            .header("Prefer", "return=minimal")
            .json(&[record]);
        for (key, value) in self.table_headers() {
            request = request.header(key, value);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Failed to insert chat ({status}): {}",
                crate::util::truncate_with_ellipsis(&body, 200)
            );
        }

        Ok(())
    }

    /// Check if the Supabase REST endpoint is reachable.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/rest/v1/", self.base_url());
        let mut request = self.http.get(&url);
        for (key, value) in self.table_headers() {
            request = request.header(key, value);
        }

        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn get_user(&self, access_token: &str) -> anyhow::Result<AuthUser> {
        SupabaseClient::get_user(self, access_token).await
    }

    async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<serde_json::Value>> {
        SupabaseClient::get_profile(self, user_id).await
    }
}

#[async_trait]
impl ChatStore for SupabaseClient {
    async fn insert_chat(&self, record: &ChatRecord) -> anyhow::Result<()> {
        SupabaseClient::insert_chat(self, record).await
    }
}
