//! Pre-execution authorization for parsed command intents.
//!
//! [`CommandSecurityGate::authorize`] reads the privilege session once and
//! returns. The executor runs afterwards, so a session can lapse between the
//! check and the command actually starting. Callers that need a tighter bound
//! should execute immediately after authorizing or hold a token redeemable for
//! exactly one execution.

use std::fmt;
use std::sync::Arc;

use crate::config::{FeaturesConfig, SecurityConfig};
use crate::error::ToolError;
use crate::intent::{CommandIntent, IntentType};
use crate::session::PrivilegeSessionManager;

/// An allowed decision and why it was allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Whether the decision relied on an active privilege session.
    pub privileged: bool,
    pub reason: String,
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Last path segment of `url`, ignoring any query or fragment.
#[must_use]
pub fn download_filename(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => "download",
    }
}

/// # Errors
///
/// Returns `ToolError::Validation` for non-HTTP URLs or unsafe filenames.
pub fn validate_download(url: &str) -> Result<(), ToolError> {
    let lower = url.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(ToolError::Validation(
            "URL must start with http:// or https://".into(),
        ));
    }
    let name = download_filename(url);
    if name == ".."
        || name == "."
        || name.contains(['/', '\\', '\0', '\n', '\r'])
    {
        return Err(ToolError::Validation(format!("unsafe filename {name:?}")));
    }
    Ok(())
}

/// Feature-flag, danger-pattern, and payload checks applied before execution.
#[derive(Debug, Clone)]
pub struct CommandSecurityGate {
    session: Arc<PrivilegeSessionManager>,
    dangerous_patterns: Vec<String>,
    features: FeaturesConfig,
}

impl CommandSecurityGate {
    #[must_use]
    pub fn new(
        session: Arc<PrivilegeSessionManager>,
        security: &SecurityConfig,
        features: FeaturesConfig,
    ) -> Self {
        let mut dangerous_patterns: Vec<String> = Vec::new();
        for pattern in &security.dangerous_patterns {
            let lower = pattern.trim().to_lowercase();
            if !lower.is_empty() && !dangerous_patterns.contains(&lower) {
                dangerous_patterns.push(lower);
            }
        }
        Self {
            session,
            dangerous_patterns,
            features,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<PrivilegeSessionManager> {
        &self.session
    }

    #[must_use]
    pub fn dangerous_patterns(&self) -> &[String] {
        &self.dangerous_patterns
    }

    /// First dangerous pattern contained in `command`, compared case-insensitively.
    #[must_use]
    pub fn find_dangerous_pattern(&self, command: &str) -> Option<&str> {
        let normalized = command.to_lowercase();
        self.dangerous_patterns
            .iter()
            .find(|p| normalized.contains(p.as_str()))
            .map(String::as_str)
    }

    fn check_feature(&self, intent_type: IntentType) -> Result<(), ToolError> {
        let (enabled, name) = match intent_type {
            IntentType::Shell => (self.features.shell, "shell commands"),
            IntentType::File => (self.features.file_editing, "file editing"),
            IntentType::Download => (self.features.downloads, "downloads"),
            IntentType::App | IntentType::Gui => {
                (self.features.gui_automation, "GUI automation")
            }
        };
        if enabled {
            Ok(())
        } else {
            Err(ToolError::FeatureDisabled(name))
        }
    }

    /// Decide whether `intent` may run now.
    ///
    /// # Errors
    ///
    /// Returns `FeatureDisabled` when the intent's feature is off, `Blocked`
    /// for a dangerous shell command outside a privilege session, and
    /// `Validation` for empty commands or unsafe download targets.
    pub fn authorize(&self, intent: &CommandIntent) -> Result<Authorization, ToolError> {
        if let Err(e) = self.check_feature(intent.intent_type()) {
            tracing::warn!(%intent, "denied: {e}");
            return Err(e);
        }
        match intent.intent_type() {
            IntentType::Shell => self.authorize_shell(intent.action()),
            IntentType::Download => {
                let url = intent
                    .param("url")
                    .ok_or_else(|| ToolError::Validation("no URL specified".into()))?;
                validate_download(url)?;
                Ok(Authorization {
                    privileged: false,
                    reason: "download target is valid".into(),
                })
            }
            IntentType::File | IntentType::App | IntentType::Gui => Ok(Authorization {
                privileged: false,
                reason: format!("{} intents are enabled", intent.intent_type()),
            }),
        }
    }

    fn authorize_shell(&self, command: &str) -> Result<Authorization, ToolError> {
        if command.trim().is_empty() {
            return Err(ToolError::Validation("empty command".into()));
        }
        let Some(pattern) = self.find_dangerous_pattern(command) else {
            return Ok(Authorization {
                privileged: false,
                reason: "command is safe".into(),
            });
        };
        if self.session.is_active() {
            tracing::warn!(command, pattern, "dangerous command allowed under privilege mode");
            Ok(Authorization {
                privileged: true,
                reason: format!("allowed under privilege mode (matched '{pattern}')"),
            })
        } else {
            tracing::warn!(command, pattern, "dangerous command blocked");
            Err(ToolError::Blocked {
                pattern: pattern.to_owned(),
                command: command.to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;

    fn gate_with(features: FeaturesConfig) -> CommandSecurityGate {
        let security = SecurityConfig::default();
        let session = Arc::new(PrivilegeSessionManager::new(&security).unwrap());
        CommandSecurityGate::new(session, &security, features)
    }

    fn gate() -> CommandSecurityGate {
        gate_with(FeaturesConfig::default())
    }

    fn download(url: &str) -> CommandIntent {
        let mut params = BTreeMap::new();
        params.insert("url".to_owned(), url.to_owned());
        CommandIntent::new(IntentType::Download, "fetch", params)
    }

    #[test]
    fn safe_shell_allowed() {
        let auth = gate().authorize(&CommandIntent::shell("ls -la")).unwrap();
        assert!(!auth.privileged);
    }

    #[test]
    fn dangerous_shell_blocked_without_session() {
        let err = gate()
            .authorize(&CommandIntent::shell("RM -RF /tmp/build"))
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::Blocked {
                pattern: "rm -rf".into(),
                command: "RM -RF /tmp/build".into(),
            }
        );
        assert!(err.to_string().contains("'rm -rf'"));
    }

    #[test]
    fn dangerous_shell_allowed_with_session() {
        let g = gate();
        g.session().activate(60).unwrap();
        let auth = g.authorize(&CommandIntent::shell("rm -rf /tmp/build")).unwrap();
        assert!(auth.privileged);
        assert!(auth.to_string().contains("rm -rf"));
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_again_after_session_expires() {
        let g = gate();
        g.session().activate(10).unwrap();
        assert!(g.authorize(&CommandIntent::shell("reboot")).is_ok());
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(matches!(
            g.authorize(&CommandIntent::shell("reboot")),
            Err(ToolError::Blocked { .. })
        ));
    }

    #[test]
    fn substring_match_is_coarse() {
        // "chown" inside a longer word still matches.
        let g = gate();
        assert!(g.find_dangerous_pattern("echo rechowned").is_some());
        assert!(g.find_dangerous_pattern("echo hello").is_none());
    }

    #[test]
    fn empty_shell_command_denied() {
        assert_eq!(
            gate().authorize(&CommandIntent::shell("   ")).unwrap_err(),
            ToolError::Validation("empty command".into())
        );
    }

    #[test]
    fn feature_flags_deny() {
        let g = gate_with(FeaturesConfig {
            shell: false,
            downloads: false,
            ..FeaturesConfig::default()
        });
        assert_eq!(
            g.authorize(&CommandIntent::shell("ls")).unwrap_err(),
            ToolError::FeatureDisabled("shell commands")
        );
        assert_eq!(
            g.authorize(&download("https://x.org/a.zip")).unwrap_err(),
            ToolError::FeatureDisabled("downloads")
        );
        let app = CommandIntent::new(IntentType::App, "open", BTreeMap::new());
        assert!(g.authorize(&app).is_ok());
    }

    #[test]
    fn feature_flag_checked_before_danger() {
        let g = gate_with(FeaturesConfig {
            shell: false,
            ..FeaturesConfig::default()
        });
        assert!(matches!(
            g.authorize(&CommandIntent::shell("rm -rf /")),
            Err(ToolError::FeatureDisabled(_))
        ));
    }

    #[test]
    fn non_shell_skips_danger_patterns() {
        let mut params = BTreeMap::new();
        params.insert("text".to_owned(), "rm -rf /".to_owned());
        let typed = CommandIntent::new(IntentType::Gui, "type", params);
        assert!(gate().authorize(&typed).is_ok());
    }

    #[test]
    fn download_validation() {
        let g = gate();
        assert!(g.authorize(&download("https://example.com/a.pdf")).is_ok());
        assert!(matches!(
            g.authorize(&download("ftp://example.com/a.pdf")),
            Err(ToolError::Validation(_))
        ));
        assert!(matches!(
            g.authorize(&download("https://example.com/..")),
            Err(ToolError::Validation(_))
        ));
        assert!(matches!(
            g.authorize(&download("https://example.com/a\\b.exe")),
            Err(ToolError::Validation(_))
        ));
        let missing = CommandIntent::new(IntentType::Download, "fetch", BTreeMap::new());
        assert!(matches!(
            g.authorize(&missing),
            Err(ToolError::Validation(_))
        ));
    }

    #[test]
    fn download_filename_defaults() {
        assert_eq!(download_filename("https://x.org/a.zip?x=1"), "a.zip");
        assert_eq!(download_filename("https://x.org/"), "download");
    }

    #[test]
    fn custom_patterns_are_lowercased_and_deduplicated() {
        let security = SecurityConfig {
            dangerous_patterns: vec!["DROP TABLE".into(), "drop table".into(), "  ".into()],
            ..SecurityConfig::default()
        };
        let session = Arc::new(PrivilegeSessionManager::new(&security).unwrap());
        let g = CommandSecurityGate::new(session, &security, FeaturesConfig::default());
        assert_eq!(g.dangerous_patterns(), ["drop table"]);
        assert!(g.authorize(&CommandIntent::shell("psql -c 'drop table x'")).is_err());
        assert!(g.authorize(&CommandIntent::shell("rm -rf /")).is_ok());
    }
}
