use crate::error::LlmError;

/// Transport to remote text-generation backends, addressed by provider name.
pub trait ProviderClient: Send + Sync {
    /// Send `prompt` to `provider` and return the response text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unknown or the call fails.
    fn call(
        &self,
        provider: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

impl<T: ProviderClient> ProviderClient for std::sync::Arc<T> {
    async fn call(&self, provider: &str, prompt: &str) -> Result<String, LlmError> {
        (**self).call(provider, prompt).await
    }
}
