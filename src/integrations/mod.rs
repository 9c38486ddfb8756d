//! External service integrations.
//!
//! The gateway depends on the traits below rather than on a concrete
//! client, so handlers can be exercised without a live Supabase project.

pub mod supabase;

pub use supabase::{AuthUser, ChatRecord, SupabaseClient, SupabaseConfig, UserMetadata};

use async_trait::async_trait;

/// Resolves access tokens and user profiles.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange a provider-issued access token for the user it belongs to.
    async fn get_user(&self, access_token: &str) -> anyhow::Result<AuthUser>;

    /// Fetch the profile row for `user_id`, `None` if absent.
    async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<serde_json::Value>>;
}

/// Persists chat exchanges.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn insert_chat(&self, record: &ChatRecord) -> anyhow::Result<()>;
}
