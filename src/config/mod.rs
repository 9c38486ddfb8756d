pub mod schema;

pub use schema::{AuthConfig, Config, GatewayConfig, ProviderConfig};

use anyhow::{Context, Result};
use std::path::Path;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "devnest.toml";

impl Config {
    /// Load configuration: TOML file (explicit path, or `devnest.toml` if
    /// present), then `.env`, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        // A missing .env is normal.
        let _ = dotenv::dotenv();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply environment overrides using `lookup` (injected for tests).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(p) => self.gateway.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {port}"),
            }
        }
        if let Some(trust) = get("TRUST_FORWARDED_HEADERS") {
            match trust.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.gateway.trust_forwarded_headers = true,
                "0" | "false" | "no" => self.gateway.trust_forwarded_headers = false,
                _ => tracing::warn!("Ignoring invalid TRUST_FORWARDED_HEADERS value: {trust}"),
            }
        }

        if let Some(name) = get("AI_PROVIDER") {
            self.provider.name = Some(name.trim().to_lowercase());
        }
        if let Some(model) = get("AI_MODEL") {
            self.provider.model = Some(model);
        }
        let groq_key = get("GROQ_API_KEY");
        let openai_key = get("OPENAI_API_KEY");
        if self.provider.name.is_none() {
            if groq_key.is_some() {
                self.provider.name = Some("groq".into());
            } else if openai_key.is_some() {
                self.provider.name = Some("openai".into());
            }
        }
        let env_key = match self.provider.name.as_deref() {
            Some("groq") => groq_key,
            Some("openai") => openai_key,
            _ => None,
        };
        if let Some(key) = env_key {
            self.provider.api_key = Some(key);
        }

        let supabase = self.supabase.get_or_insert_with(Default::default);
        if let Some(url) = get("SUPABASE_URL") {
            supabase.url = url;
        }
        if let Some(key) = get("SUPABASE_ANON_KEY") {
            supabase.anon_key = key;
        }
        if let Some(key) = get("SUPABASE_SERVICE_KEY") {
            supabase.service_key = Some(key);
        }
        if !supabase.is_configured() {
            self.supabase = None;
        }

        if let Some(secret) = get("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
    }
}
