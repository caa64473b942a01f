mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use vigil_llm::{ProviderRouter, TaskCategory, TaskClassifier};
use vigil_tools::config::MAX_DURATION_SECS;

use crate::error::GatewayError;

/// Upper bound for `cache.ttl_secs` (30 days).
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 3600;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject snapshots the gateway cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let secs = self.security.default_duration_secs;
        if secs == 0 || secs > MAX_DURATION_SECS {
            return Err(GatewayError::Config(format!(
                "security.default_duration_secs must be between 1 and {MAX_DURATION_SECS}, got {secs}"
            )));
        }
        if self.security.keyword.trim().is_empty() {
            return Err(GatewayError::Config(
                "security.keyword must not be empty".into(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(GatewayError::Config(
                "cache.capacity must be at least 1".into(),
            ));
        }
        if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(GatewayError::Config(format!(
                "cache.ttl_secs must be at most {MAX_CACHE_TTL_SECS}, got {}",
                self.cache.ttl_secs
            )));
        }
        if self.context.max_turns == 0 {
            return Err(GatewayError::Config(
                "context.max_turns must be at least 1".into(),
            ));
        }
        if self.routing.default_provider.trim().is_empty() {
            return Err(GatewayError::Config(
                "routing.default_provider must not be empty".into(),
            ));
        }
        self.routing.provider_mapping()?;
        self.routing.classifier()?;
        Ok(())
    }
}

fn parse_category(name: &str) -> Result<TaskCategory, GatewayError> {
    name.parse()
        .map_err(|_| GatewayError::Config(format!("unknown task category '{name}'")))
}

impl RoutingConfig {
    /// # Errors
    ///
    /// Returns `GatewayError::Config` for unknown category names or empty provider names.
    pub fn provider_mapping(&self) -> Result<BTreeMap<TaskCategory, String>, GatewayError> {
        self.providers
            .iter()
            .map(|(name, provider)| {
                let category = parse_category(name)?;
                if provider.trim().is_empty() {
                    return Err(GatewayError::Config(format!(
                        "routing.providers.{name} must not be empty"
                    )));
                }
                Ok((category, provider.trim().to_owned()))
            })
            .collect()
    }

    /// Built-in classifier extended with `extra_patterns`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown categories or patterns that fail to compile.
    pub fn classifier(&self) -> Result<TaskClassifier, GatewayError> {
        let mut classifier = TaskClassifier::new();
        for (name, patterns) in &self.extra_patterns {
            classifier = classifier.with_extra_patterns(parse_category(name)?, patterns)?;
        }
        Ok(classifier)
    }

    /// # Errors
    ///
    /// See [`Self::provider_mapping`] and [`Self::classifier`].
    pub fn router(&self) -> Result<ProviderRouter, GatewayError> {
        Ok(
            ProviderRouter::new(self.provider_mapping()?, self.default_provider.trim())
                .with_smart_routing(self.smart_routing)
                .with_classifier(self.classifier()?),
        )
    }
}
