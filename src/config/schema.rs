use crate::auth::DEFAULT_TOKEN_TTL_SECS;
use crate::integrations::SupabaseConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration (`devnest.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub provider: ProviderConfig,
    pub supabase: Option<SupabaseConfig>,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Chat requests allowed per client per hour (0 = unlimited).
    pub chat_requests_per_hour: u32,
    /// Key rate limits on `X-Forwarded-For` / `X-Real-IP` instead of the peer IP.
    /// Enable only behind a reverse proxy that sets these headers.
    pub trust_forwarded_headers: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            chat_requests_per_hour: 10,
            trust_forwarded_headers: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// "groq" or "openai". Inferred from which API key is present when unset.
    pub name: Option<String>,
    pub api_key: Option<String>,
    /// Overrides the provider's built-in base URL.
    pub api_url: Option<String>,
    /// Defaults to the provider's standard model.
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: None,
            api_key: None,
            api_url: None,
            model: None,
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl ProviderConfig {
    /// Provider name and key, if both are usable.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let name = self.name.as_deref().filter(|n| !n.trim().is_empty())?;
        let key = self.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some((name, key))
    }

    /// Effective model: configured value, else the provider default.
    pub fn effective_model(&self) -> Option<String> {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| {
                self.name
                    .as_deref()
                    .and_then(crate::providers::default_model)
                    .map(str::to_string)
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}
