use std::str::FromStr;

use super::Config;

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_routing();
        self.apply_env_overrides_memory();
        self.apply_env_overrides_security();
    }

    fn apply_env_overrides_routing(&mut self) {
        if let Some(enabled) = parsed::<bool>("VIGIL_SMART_ROUTING") {
            self.routing.smart_routing = enabled;
        }
        if let Ok(v) = std::env::var("VIGIL_DEFAULT_PROVIDER") {
            self.routing.default_provider = v;
        }
    }

    fn apply_env_overrides_memory(&mut self) {
        if let Some(enabled) = parsed::<bool>("VIGIL_CACHE_ENABLED") {
            self.cache.enabled = enabled;
        }
        if let Some(capacity) = parsed::<usize>("VIGIL_CACHE_CAPACITY") {
            self.cache.capacity = capacity;
        }
        if let Some(ttl) = parsed::<u64>("VIGIL_CACHE_TTL_SECS") {
            self.cache.ttl_secs = ttl;
        }
        if let Some(enabled) = parsed::<bool>("VIGIL_CONTEXT_ENABLED") {
            self.context.enabled = enabled;
        }
        if let Some(turns) = parsed::<usize>("VIGIL_CONTEXT_MAX_TURNS") {
            self.context.max_turns = turns;
        }
    }

    fn apply_env_overrides_security(&mut self) {
        if let Ok(v) = std::env::var("VIGIL_SECURITY_KEYWORD") {
            self.security.keyword = v;
        }
        if let Some(secs) = parsed::<u64>("VIGIL_SECURITY_DURATION_SECS") {
            self.security.default_duration_secs = secs;
        }
        if let Some(enabled) = parsed::<bool>("VIGIL_SECURITY_ALLOW_TIMED") {
            self.security.allow_timed = enabled;
        }
        if let Some(enabled) = parsed::<bool>("VIGIL_SECURITY_ALLOW_CUSTOM_KEYWORD") {
            self.security.allow_custom_keyword = enabled;
        }
        if let Ok(v) = std::env::var("VIGIL_SECURITY_DANGEROUS_PATTERNS") {
            self.security.dangerous_patterns = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(enabled) = parsed::<bool>("VIGIL_FEATURES_SHELL") {
            self.features.shell = enabled;
        }
        if let Some(enabled) = parsed::<bool>("VIGIL_FEATURES_FILE_EDITING") {
            self.features.file_editing = enabled;
        }
        if let Some(enabled) = parsed::<bool>("VIGIL_FEATURES_DOWNLOADS") {
            self.features.downloads = enabled;
        }
        if let Some(enabled) = parsed::<bool>("VIGIL_FEATURES_GUI_AUTOMATION") {
            self.features.gui_automation = enabled;
        }
    }
}
