use serde::Deserialize;

pub const DEFAULT_KEYWORD: &str = "sudo code";
pub const DEFAULT_DURATION_SECS: u64 = 300;
pub const MAX_DURATION_SECS: u64 = 3600;

pub const DEFAULT_DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf",
    "dd if=",
    "mkfs",
    "fdisk",
    ":(){:|:&};:",
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
    "kill -9",
    "pkill -9",
    "chmod 777",
    "chown",
    "usermod",
    "userdel",
    "format c:",
];

fn default_true() -> bool {
    true
}

fn default_keyword() -> String {
    DEFAULT_KEYWORD.to_owned()
}

fn default_duration_secs() -> u64 {
    DEFAULT_DURATION_SECS
}

fn default_dangerous_patterns() -> Vec<String> {
    DEFAULT_DANGEROUS_PATTERNS
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

/// Privilege keyword, session window bounds, and the dangerous-pattern list.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_keyword")]
    pub keyword: String,
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u64,
    #[serde(default = "default_true")]
    pub allow_timed: bool,
    #[serde(default = "default_true")]
    pub allow_custom_keyword: bool,
    #[serde(default = "default_dangerous_patterns")]
    pub dangerous_patterns: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            keyword: default_keyword(),
            default_duration_secs: default_duration_secs(),
            allow_timed: true,
            allow_custom_keyword: true,
            dangerous_patterns: default_dangerous_patterns(),
        }
    }
}

/// Per-intent-family switches checked before any command runs.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_true")]
    pub shell: bool,
    #[serde(default = "default_true")]
    pub file_editing: bool,
    #[serde(default = "default_true")]
    pub downloads: bool,
    #[serde(default = "default_true")]
    pub gui_automation: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            shell: true,
            file_editing: true,
            downloads: true,
            gui_automation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default)]
        security: SecurityConfig,
        #[serde(default)]
        features: FeaturesConfig,
    }

    #[test]
    fn deserialize_security_section() {
        let toml_str = r#"
            [security]
            keyword = "open sesame"
            default_duration_secs = 120
            allow_timed = false
            dangerous_patterns = ["rm -rf", "mkfs"]
        "#;

        let w: Wrapper = toml::from_str(toml_str).unwrap();
        assert_eq!(w.security.keyword, "open sesame");
        assert_eq!(w.security.default_duration_secs, 120);
        assert!(!w.security.allow_timed);
        assert!(w.security.allow_custom_keyword);
        assert_eq!(w.security.dangerous_patterns, vec!["rm -rf", "mkfs"]);
    }

    #[test]
    fn empty_input_uses_defaults() {
        let w: Wrapper = toml::from_str("").unwrap();
        assert_eq!(w.security.keyword, DEFAULT_KEYWORD);
        assert_eq!(w.security.default_duration_secs, 300);
        assert_eq!(
            w.security.dangerous_patterns.len(),
            DEFAULT_DANGEROUS_PATTERNS.len()
        );
        assert!(w.features.shell && w.features.downloads);
    }

    #[test]
    fn partial_features_section() {
        let w: Wrapper = toml::from_str("[features]\ndownloads = false\n").unwrap();
        assert!(!w.features.downloads);
        assert!(w.features.shell);
        assert!(w.features.file_editing);
        assert!(w.features.gui_automation);
    }
}
