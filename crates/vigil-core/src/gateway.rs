//! Query-intent gateway: routes natural-language input either to an LLM
//! provider (with caching and conversation context) or, for recognised
//! commands, through the privilege-aware security gate to an executor.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use vigil_llm::{LlmError, ProviderClient, ProviderRouter, RouteDecision, TaskCategory};
use vigil_memory::{CacheStats, ConversationContext, ConversationTurn, ResponseCache};
use vigil_tools::{
    ActivationParse, CommandExecutor, CommandIntent, CommandIntentParser, CommandSecurityGate,
    PrivilegeSessionManager, SecurityInfo, SessionError, SessionStatus,
};

use crate::config::Config;
use crate::error::GatewayError;

const STATUS_PHRASES: &[&str] = &["system status", "show status"];

/// Per-call switches layered on top of the configured cache/context toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub use_cache: bool,
    pub include_context: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            include_context: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnswer {
    pub text: String,
    /// Provider that actually produced the answer.
    pub provider: String,
    pub category: TaskCategory,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayReply {
    Answer(QueryAnswer),
    Executed {
        intent: CommandIntent,
        output: String,
        privileged: bool,
    },
    SessionActivated {
        message: String,
        duration_secs: u64,
    },
    Status(SessionStatus),
}

impl fmt::Display for GatewayReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answer(answer) => f.write_str(&answer.text),
            Self::Executed { output, .. } => f.write_str(output),
            Self::SessionActivated { message, .. } => f.write_str(message),
            Self::Status(status) => write!(f, "{status}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
    pub cache_enabled: bool,
    pub cache: CacheStats,
    pub context_enabled: bool,
    pub history_len: usize,
    pub session: SessionStatus,
}

/// Orchestrates classification, routing, caching, context, and the command gate.
///
/// Every stateful component carries its own lock, so a gateway behind an
/// `Arc` can serve concurrent callers.
pub struct QueryGateway<P, E> {
    router: ProviderRouter,
    cache: ResponseCache<QueryAnswer>,
    context: ConversationContext,
    parser: CommandIntentParser,
    session: Arc<PrivilegeSessionManager>,
    gate: CommandSecurityGate,
    provider: P,
    executor: E,
    cache_enabled: bool,
    context_enabled: bool,
}

impl<P, E> fmt::Debug for QueryGateway<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryGateway")
            .field("router", &self.router)
            .field("cache_enabled", &self.cache_enabled)
            .field("context_enabled", &self.context_enabled)
            .finish_non_exhaustive()
    }
}

impl<P: ProviderClient, E: CommandExecutor> QueryGateway<P, E> {
    /// Build a gateway from a validated configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` (or a wrapped component error) when the
    /// configuration is unusable.
    pub fn new(config: &Config, provider: P, executor: E) -> Result<Self, GatewayError> {
        config.validate()?;
        let router = config.routing.router()?;
        let session = Arc::new(PrivilegeSessionManager::new(&config.security)?);
        let gate = CommandSecurityGate::new(Arc::clone(&session), &config.security, config.features);
        tracing::info!(
            default_provider = router.default_provider(),
            smart_routing = router.smart_routing(),
            cache_capacity = config.cache.capacity,
            max_turns = config.context.max_turns,
            "query gateway ready"
        );
        Ok(Self {
            router,
            cache: ResponseCache::new(
                config.cache.capacity,
                Duration::from_secs(config.cache.ttl_secs),
            ),
            context: ConversationContext::new(config.context.max_turns),
            parser: CommandIntentParser::new(),
            session,
            gate,
            provider,
            executor,
            cache_enabled: config.cache.enabled,
            context_enabled: config.context.enabled,
        })
    }

    /// Dispatch free text: activation phrase, status phrase, command intent,
    /// and otherwise an AI query.
    ///
    /// # Errors
    ///
    /// Propagates activation, authorization, execution, and provider failures.
    pub async fn handle(&self, text: &str) -> Result<GatewayReply, GatewayError> {
        match self.session.parse_activation(text) {
            ActivationParse::Granted { duration_secs, .. } => {
                let message = self.session.activate(duration_secs)?;
                return Ok(GatewayReply::SessionActivated {
                    message,
                    duration_secs,
                });
            }
            ActivationParse::Rejected { reason } => {
                tracing::warn!("activation rejected: {reason}");
                return Err(GatewayError::ActivationRejected(reason));
            }
            ActivationParse::NotTrigger => {}
        }

        let lower = text.trim().to_lowercase();
        if STATUS_PHRASES.iter().any(|p| lower.contains(p)) {
            return Ok(GatewayReply::Status(self.session.status()));
        }

        if let Some(intent) = self.parser.parse(text) {
            return self.execute(intent).await;
        }

        self.query(text, QueryOptions::default())
            .await
            .map(GatewayReply::Answer)
    }

    /// Answer `text` with the routed provider, walking its fallback chain.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::AllProvidersFailed` once every provider in the chain
    /// has failed.
    pub async fn query(&self, text: &str, opts: QueryOptions) -> Result<QueryAnswer, GatewayError> {
        let use_cache = self.cache_enabled && opts.use_cache;
        if use_cache && let Some(mut hit) = self.cache.get(text) {
            hit.cached = true;
            return Ok(hit);
        }

        let decision = self.router.decide(text);
        if let Some(better) = self.router.suggest_override(&decision.provider, decision.category) {
            tracing::debug!(suggested = better, "routing override available");
        }
        let prompt = if self.context_enabled && opts.include_context {
            self.context.augment(text)
        } else {
            text.to_owned()
        };

        let chain = self.router.full_chain(&decision.provider);
        let mut tried: HashSet<&str> = HashSet::new();
        let mut order: Vec<String> = Vec::new();
        for name in &chain {
            if !tried.insert(name.as_str()) {
                continue;
            }
            order.push(name.clone());
            match self.provider.call(name, &prompt).await {
                Ok(response) => {
                    if name != &decision.provider {
                        tracing::info!(primary = %decision.provider, fallback = %name, "answered by fallback provider");
                    }
                    let answer = QueryAnswer {
                        text: response,
                        provider: name.clone(),
                        category: decision.category,
                        cached: false,
                    };
                    if use_cache {
                        self.cache.set(text, answer.clone());
                    }
                    if self.context_enabled {
                        self.context.add_turn(text, answer.text.clone());
                    }
                    return Ok(answer);
                }
                Err(e) => {
                    tracing::warn!("provider {name} failed: {e:#}, trying next");
                }
            }
        }

        Err(LlmError::AllProvidersFailed { tried: order }.into())
    }

    /// Authorize `intent` and hand it to the executor.
    ///
    /// The session is read during authorization only; a window that lapses
    /// before the executor starts does not stop the command.
    ///
    /// # Errors
    ///
    /// Returns the gate's denial or the executor's failure.
    pub async fn execute(&self, intent: CommandIntent) -> Result<GatewayReply, GatewayError> {
        let auth = self.gate.authorize(&intent)?;
        tracing::info!(%intent, reason = %auth, "command authorized");
        let output = self.executor.run(&intent).await?;
        Ok(GatewayReply::Executed {
            intent,
            output,
            privileged: auth.privileged,
        })
    }

    #[must_use]
    pub fn decide(&self, text: &str) -> RouteDecision {
        self.router.decide(text)
    }

    #[must_use]
    pub fn router(&self) -> &ProviderRouter {
        &self.router
    }

    #[must_use]
    pub fn parse_intent(&self, text: &str) -> Option<CommandIntent> {
        self.parser.parse(text)
    }

    /// # Errors
    ///
    /// See [`PrivilegeSessionManager::activate`].
    pub fn activate(&self, duration_secs: u64) -> Result<String, SessionError> {
        self.session.activate(duration_secs)
    }

    pub fn end_session(&self) {
        self.session.deactivate();
    }

    #[must_use]
    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    #[must_use]
    pub fn security_info(&self) -> SecurityInfo {
        self.session.info()
    }

    /// # Errors
    ///
    /// See [`PrivilegeSessionManager::set_keyword`].
    pub fn set_keyword(&self, keyword: &str) -> Result<(), SessionError> {
        self.session.set_keyword(keyword)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn clear_history(&self) {
        self.context.clear();
    }

    #[must_use]
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.context.history()
    }

    pub fn set_preference(&self, key: &str, value: &str) {
        self.context.set_preference(key, value);
    }

    #[must_use]
    pub fn preference(&self, key: &str) -> Option<String> {
        self.context.preference(key)
    }

    pub fn remove_preference(&self, key: &str) -> Option<String> {
        self.context.remove_preference(key)
    }

    #[must_use]
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            cache_enabled: self.cache_enabled,
            cache: self.cache.stats(),
            context_enabled: self.context_enabled,
            history_len: self.context.len(),
            session: self.session.status(),
        }
    }
}
