use std::collections::BTreeMap;
use std::fmt;

use crate::classifier::{TaskCategory, TaskClassifier};

pub const DEFAULT_PROVIDER: &str = "gemini";

/// Provider tried next when the primary fails, per provider.
const FALLBACK_CHAINS: &[(&str, &[&str])] = &[
    ("openai", &["deepseek", "gemini", "custom"]),
    ("deepseek", &["openai", "gemini", "custom"]),
    ("gemini", &["openai", "deepseek", "custom"]),
    ("custom", &["openai", "deepseek", "gemini"]),
];

const PROVIDER_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "openai",
        "OpenAI GPT-4 (expert code generation & creative writing)",
    ),
    ("deepseek", "DeepSeek (strong reasoning & math capabilities)"),
    ("gemini", "Google Gemini (web search & factual information)"),
    ("custom", "Custom endpoint"),
];

/// Built-in category to provider mapping.
#[must_use]
pub fn default_mapping() -> BTreeMap<TaskCategory, String> {
    [
        (TaskCategory::Research, "gemini"),
        (TaskCategory::Code, "openai"),
        (TaskCategory::Math, "deepseek"),
        (TaskCategory::Creative, "openai"),
        (TaskCategory::Factual, "gemini"),
        (TaskCategory::System, "deepseek"),
    ]
    .into_iter()
    .map(|(c, p)| (c, p.to_owned()))
    .collect()
}

#[must_use]
pub fn provider_description(provider: &str) -> &'static str {
    PROVIDER_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == provider)
        .map_or("Unknown provider", |(_, desc)| desc)
}

/// Outcome of classifying and routing a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub category: TaskCategory,
    pub provider: String,
    pub scores: Vec<(TaskCategory, usize)>,
}

impl RouteDecision {
    #[must_use]
    pub fn score(&self) -> usize {
        self.scores
            .iter()
            .find(|(c, _)| *c == self.category)
            .map_or(0, |(_, s)| *s)
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} task (score {}) -> {}: {}",
            self.category,
            self.score(),
            self.provider,
            provider_description(&self.provider)
        )
    }
}

/// Maps task categories to provider names and exposes per-provider fallback chains.
#[derive(Debug, Clone)]
pub struct ProviderRouter {
    mapping: BTreeMap<TaskCategory, String>,
    default_provider: String,
    smart_routing: bool,
    classifier: TaskClassifier,
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new(default_mapping(), DEFAULT_PROVIDER)
    }
}

impl ProviderRouter {
    #[must_use]
    pub fn new(mapping: BTreeMap<TaskCategory, String>, default_provider: impl Into<String>) -> Self {
        Self {
            mapping,
            default_provider: default_provider.into(),
            smart_routing: true,
            classifier: TaskClassifier::new(),
        }
    }

    #[must_use]
    pub fn with_smart_routing(mut self, enabled: bool) -> Self {
        self.smart_routing = enabled;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: TaskClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn classifier(&self) -> &TaskClassifier {
        &self.classifier
    }

    #[must_use]
    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    #[must_use]
    pub fn smart_routing(&self) -> bool {
        self.smart_routing
    }

    /// Provider for `category`, or the default provider when the category is
    /// unmapped or smart routing is off.
    #[must_use]
    pub fn route(&self, category: TaskCategory) -> &str {
        if !self.smart_routing {
            return &self.default_provider;
        }
        self.mapping
            .get(&category)
            .map_or(self.default_provider.as_str(), String::as_str)
    }

    /// Alternates to try after `provider` fails, in order.
    ///
    /// Providers outside the static table degrade to the default provider.
    #[must_use]
    pub fn fallback_chain(&self, provider: &str) -> Vec<String> {
        if let Some((_, chain)) = FALLBACK_CHAINS.iter().find(|(name, _)| *name == provider) {
            return chain.iter().map(|&p| p.to_owned()).collect();
        }
        if provider == self.default_provider {
            Vec::new()
        } else {
            vec![self.default_provider.clone()]
        }
    }

    /// `provider` followed by its fallback chain.
    #[must_use]
    pub fn full_chain(&self, provider: &str) -> Vec<String> {
        let mut chain = vec![provider.to_owned()];
        chain.extend(self.fallback_chain(provider));
        chain
    }

    #[must_use]
    pub fn decide(&self, text: &str) -> RouteDecision {
        let scores = self.classifier.scores(text);
        let category = self.classifier.classify(text);
        let provider = self.route(category).to_owned();
        tracing::info!(%category, %provider, "routing decision");
        RouteDecision {
            category,
            provider,
            scores,
        }
    }

    /// The mapped provider for `category` when it differs from `current`.
    #[must_use]
    pub fn suggest_override(&self, current: &str, category: TaskCategory) -> Option<&str> {
        let suggested = self.route(category);
        (suggested != current).then_some(suggested)
    }
}
