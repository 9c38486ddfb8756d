pub mod compatible;
pub mod traits;

pub use compatible::OpenAiCompatibleProvider;
pub use traits::Provider;

use std::time::Duration;

/// System prompt sent with every chat request.
pub const DEVNEST_SYSTEM_PROMPT: &str = "You are DevNest AI - a professional coding assistant. You specialize in:
- React, JavaScript, TypeScript, Python, CSS, HTML
- Web development, debugging, optimization
- Clear explanations with clean code examples";

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const MAX_ERROR_CHARS: usize = 200;

/// Default model for a provider name.
pub fn default_model(name: &str) -> Option<&'static str> {
    match name {
        "groq" => Some("llama-3.1-8b-instant"),
        "openai" => Some("gpt-3.5-turbo"),
        _ => None,
    }
}

fn default_base_url(name: &str) -> Option<&'static str> {
    match name {
        "groq" => Some(GROQ_BASE_URL),
        "openai" => Some(OPENAI_BASE_URL),
        _ => None,
    }
}

/// Build a provider by name. A non-empty `api_url` overrides the built-in base URL.
pub fn create_provider(
    name: &str,
    api_key: &str,
    api_url: Option<&str>,
    max_tokens: u32,
    timeout: Duration,
) -> anyhow::Result<Box<dyn Provider>> {
    let Some(builtin) = default_base_url(name) else {
        anyhow::bail!("Unknown provider '{name}' (expected 'groq' or 'openai')");
    };
    if api_key.trim().is_empty() {
        anyhow::bail!("Provider '{name}' requires a non-empty API key");
    }
    let base_url = api_url.filter(|u| !u.trim().is_empty()).unwrap_or(builtin);

    Ok(Box::new(OpenAiCompatibleProvider::new(
        name, base_url, api_key, max_tokens, timeout,
    )?))
}

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Earliest key prefix at or after `from` that starts a word.
fn next_key_prefix(input: &str, from: usize) -> Option<(usize, usize)> {
    ["sk-", "gsk_"]
        .iter()
        .filter_map(|prefix| {
            input[from..]
                .match_indices(prefix)
                .map(|(i, _)| from + i)
                .find(|&i| {
                    input[..i]
                        .chars()
                        .next_back()
                        .is_none_or(|c| !c.is_ascii_alphanumeric())
                })
                .map(|i| (i, prefix.len()))
        })
        .min_by_key(|(i, _)| *i)
}

/// Redact key-looking tokens (`sk-…`, `gsk_…`) and cap length for logging.
pub fn sanitize_api_error(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some((start, prefix_len)) = next_key_prefix(input, pos) {
        let after = start + prefix_len;
        let secret_len = input[after..]
            .find(|c: char| !is_secret_char(c))
            .unwrap_or(input.len() - after);
        if secret_len > 0 {
            out.push_str(&input[copied..start]);
            out.push_str("[REDACTED]");
            copied = after + secret_len;
        }
        pos = after + secret_len;
    }
    out.push_str(&input[copied..]);

    crate::util::truncate_with_ellipsis(&out, MAX_ERROR_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_models() {
        assert_eq!(default_model("groq"), Some("llama-3.1-8b-instant"));
        assert_eq!(default_model("openai"), Some("gpt-3.5-turbo"));
        assert_eq!(default_model("anthropic"), None);
    }

    #[test]
    fn create_known_providers() {
        let groq = create_provider("groq", "gsk_x", None, 1024, Duration::from_secs(5)).unwrap();
        assert_eq!(groq.name(), "groq");
        let openai =
            create_provider("openai", "sk-x", Some("http://localhost:9"), 150, Duration::from_secs(5))
                .unwrap();
        assert_eq!(openai.name(), "openai");
    }

    #[test]
    fn create_unknown_provider_fails() {
        let err = create_provider("ollama", "k", None, 10, Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn create_provider_requires_key() {
        assert!(create_provider("groq", "  ", None, 10, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn sanitize_redacts_key_tokens() {
        let s = sanitize_api_error("Incorrect API key provided: sk-abc123XYZ. Also gsk_zz9.");
        assert_eq!(s, "Incorrect API key provided: [REDACTED]. Also [REDACTED].");
    }

    #[test]
    fn sanitize_keeps_hyphenated_words() {
        assert_eq!(
            sanitize_api_error("task-runner failed: risk-free mask-x"),
            "task-runner failed: risk-free mask-x"
        );
        assert_eq!(
            sanitize_api_error("bad key (sk-live1) for task-runner"),
            "bad key ([REDACTED]) for task-runner"
        );
        assert_eq!(sanitize_api_error("sk-abc"), "[REDACTED]");
    }

    #[test]
    fn sanitize_keeps_bare_prefix() {
        assert_eq!(sanitize_api_error("risk- assessment"), "risk- assessment");
    }

    #[test]
    fn sanitize_truncates_long_errors() {
        let long = "x".repeat(500);
        let s = sanitize_api_error(&long);
        assert!(s.chars().count() <= MAX_ERROR_CHARS + 3);
        assert!(s.ends_with("..."));
    }

    #[test]
    fn system_prompt_mentions_devnest() {
        assert!(DEVNEST_SYSTEM_PROMPT.starts_with("You are DevNest AI"));
    }
}
