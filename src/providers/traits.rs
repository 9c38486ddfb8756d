use async_trait::async_trait;

/// A chat-completion backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short provider name for logs and health output (e.g. "groq").
    fn name(&self) -> &str {
        "provider"
    }

    async fn chat_with_system(
        &self,
        system_prompt: Option<&str>,
        message: &str,
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<String>;
}
