use std::collections::BTreeMap;

use serde::Deserialize;
use vigil_llm::router::{DEFAULT_PROVIDER, default_mapping};

pub use vigil_tools::{FeaturesConfig, SecurityConfig};

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_owned()
}

fn default_providers() -> BTreeMap<String, String> {
    default_mapping()
        .into_iter()
        .map(|(category, provider)| (category.as_str().to_owned(), provider))
        .collect()
}

fn default_cache_capacity() -> usize {
    vigil_memory::cache::DEFAULT_CAPACITY
}

fn default_cache_ttl_secs() -> u64 {
    vigil_memory::cache::DEFAULT_TTL.as_secs()
}

fn default_max_turns() -> usize {
    vigil_memory::context::DEFAULT_MAX_TURNS
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Category to provider mapping, keyed by category name.
///
/// A `[routing.providers]` table replaces the built-in mapping wholesale;
/// unmapped categories go to `default_provider`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_true")]
    pub smart_routing: bool,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, String>,
    #[serde(default)]
    pub extra_patterns: BTreeMap<String, Vec<String>>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            smart_routing: true,
            default_provider: default_provider(),
            providers: default_providers(),
            extra_patterns: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_turns: default_max_turns(),
        }
    }
}
