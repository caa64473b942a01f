use vigil_llm::{LlmError, ProviderClient};

const KNOWN_PROVIDERS: &[&str] = &["openai", "deepseek", "gemini", "custom"];

/// Offline provider client that answers with the prompt it was given.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider;

impl ProviderClient for EchoProvider {
    async fn call(&self, provider: &str, prompt: &str) -> Result<String, LlmError> {
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(LlmError::UnknownProvider(provider.to_owned()));
        }
        Ok(format!("[{provider}] {prompt}"))
    }
}
