use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 17] = [
    "VIGIL_SMART_ROUTING",
    "VIGIL_DEFAULT_PROVIDER",
    "VIGIL_CACHE_ENABLED",
    "VIGIL_CACHE_CAPACITY",
    "VIGIL_CACHE_TTL_SECS",
    "VIGIL_CONTEXT_ENABLED",
    "VIGIL_CONTEXT_MAX_TURNS",
    "VIGIL_SECURITY_KEYWORD",
    "VIGIL_SECURITY_DURATION_SECS",
    "VIGIL_SECURITY_ALLOW_TIMED",
    "VIGIL_SECURITY_ALLOW_CUSTOM_KEYWORD",
    "VIGIL_SECURITY_DANGEROUS_PATTERNS",
    "VIGIL_FEATURES_SHELL",
    "VIGIL_FEATURES_FILE_EDITING",
    "VIGIL_FEATURES_DOWNLOADS",
    "VIGIL_FEATURES_GUI_AUTOMATION",
    "VIGIL_CONFIG",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert!(config.routing.smart_routing);
    assert_eq!(config.routing.default_provider, "gemini");
    assert_eq!(config.routing.providers["code"], "openai");
    assert_eq!(config.routing.providers["math"], "deepseek");
    assert!(config.cache.enabled);
    assert_eq!(config.cache.capacity, 100);
    assert_eq!(config.cache.ttl_secs, 3600);
    assert_eq!(config.context.max_turns, 10);
    assert_eq!(config.security.keyword, "sudo code");
    assert_eq!(config.security.default_duration_secs, 300);
    assert!(config.features.shell);
    config.validate().unwrap();
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.cache.capacity, 100);
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[routing]
default_provider = "custom"

[routing.providers]
code = "deepseek"

[routing.extra_patterns]
code = ["\\bcargo\\b"]

[cache]
capacity = 5
ttl_secs = 60

[context]
enabled = false

[security]
keyword = "open sesame"
default_duration_secs = 120

[features]
downloads = false
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.routing.default_provider, "custom");
    assert_eq!(config.routing.providers.len(), 1);
    assert_eq!(config.cache.capacity, 5);
    assert_eq!(config.cache.ttl_secs, 60);
    assert!(config.cache.enabled);
    assert!(!config.context.enabled);
    assert_eq!(config.security.keyword, "open sesame");
    assert!(!config.features.downloads);
    config.validate().unwrap();

    let router = config.routing.router().unwrap();
    assert_eq!(router.route(TaskCategory::Code), "deepseek");
    assert_eq!(router.route(TaskCategory::Math), "custom");
    assert_eq!(router.decide("cargo build").category, TaskCategory::Code);
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[cache\ncapacity = ").unwrap();
    clear_env();
    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    unsafe {
        std::env::set_var("VIGIL_SMART_ROUTING", "false");
        std::env::set_var("VIGIL_DEFAULT_PROVIDER", "openai");
        std::env::set_var("VIGIL_CACHE_CAPACITY", "7");
        std::env::set_var("VIGIL_CONTEXT_MAX_TURNS", "3");
        std::env::set_var("VIGIL_SECURITY_DURATION_SECS", "60");
        std::env::set_var("VIGIL_SECURITY_DANGEROUS_PATTERNS", "rm -rf, drop table ,");
        std::env::set_var("VIGIL_FEATURES_SHELL", "false");
    }
    let mut config = Config::default();
    config.apply_env_overrides();
    clear_env();

    assert!(!config.routing.smart_routing);
    assert_eq!(config.routing.default_provider, "openai");
    assert_eq!(config.cache.capacity, 7);
    assert_eq!(config.context.max_turns, 3);
    assert_eq!(config.security.default_duration_secs, 60);
    assert_eq!(config.security.dangerous_patterns, vec!["rm -rf", "drop table"]);
    assert!(!config.features.shell);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("VIGIL_CACHE_CAPACITY", "lots");
        std::env::set_var("VIGIL_CACHE_ENABLED", "maybe");
    }
    let mut config = Config::default();
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.cache.capacity, 100);
    assert!(config.cache.enabled);
}

#[test]
fn validate_rejects_bad_duration() {
    for secs in [0, 3601] {
        let mut config = Config::default();
        config.security.default_duration_secs = secs;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)), "{secs}");
        assert!(err.to_string().contains("default_duration_secs"));
    }
}

#[test]
fn validate_bounds_cache_ttl() {
    let mut config = Config::default();
    config.cache.ttl_secs = MAX_CACHE_TTL_SECS;
    config.validate().unwrap();

    config.cache.ttl_secs = u64::MAX;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("cache.ttl_secs"));
}

#[test]
fn validate_rejects_zero_bounds_and_empty_names() {
    let mut config = Config::default();
    config.cache.capacity = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.context.max_turns = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.security.keyword = "  ".into();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.routing.default_provider = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_unknown_category_and_bad_pattern() {
    let mut config = Config::default();
    config
        .routing
        .providers
        .insert("poetry".into(), "openai".into());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("poetry"));

    let mut config = Config::default();
    config
        .routing
        .extra_patterns
        .insert("code".into(), vec!["(unclosed".into()]);
    assert!(matches!(
        config.validate(),
        Err(GatewayError::Llm(vigil_llm::LlmError::InvalidPattern { .. }))
    ));
}

#[test]
fn default_toml_file_parses() {
    let content = include_str!("../../../../config/default.toml");
    let config: Config = toml::from_str(content).unwrap();
    config.validate().unwrap();
    assert_eq!(config.routing.providers.len(), 6);
}
