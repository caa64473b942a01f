//! Test-only mock provider client.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::ProviderClient;

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    pub default_response: String,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_response(self, provider: &str, response: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(provider.to_owned(), response.to_owned());
        self
    }

    #[must_use]
    pub fn failing(self, provider: &str) -> Self {
        self.failing.lock().unwrap().insert(provider.to_owned());
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Every `(provider, prompt)` pair received so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ProviderClient for MockProvider {
    async fn call(&self, provider: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((provider.to_owned(), prompt.to_owned()));
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.failing.lock().unwrap().contains(provider) {
            return Err(LlmError::ProviderFailed {
                provider: provider.to_owned(),
                reason: "mock failure".into(),
            });
        }
        let responses = self.responses.lock().unwrap();
        Ok(responses
            .get(provider)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_per_provider_response() {
        let mock = MockProvider::default().with_response("openai", "from openai");
        assert_eq!(mock.call("openai", "hi").await.unwrap(), "from openai");
        assert_eq!(mock.call("gemini", "hi").await.unwrap(), "mock response");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_provider_errors_and_is_logged() {
        let mock = MockProvider::default().failing("gemini");
        let err = mock.call("gemini", "q").await.unwrap_err();
        assert!(matches!(err, LlmError::ProviderFailed { .. }));
        assert_eq!(mock.calls(), vec![("gemini".to_owned(), "q".to_owned())]);
    }

    #[tokio::test]
    async fn clones_share_call_log() {
        let mock = MockProvider::default();
        let clone = mock.clone();
        clone.call("custom", "x").await.unwrap();
        assert_eq!(mock.call_count(), 1);
    }
}
