use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    Shell,
    File,
    Download,
    App,
    Gui,
}

impl IntentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::File => "file",
            Self::Download => "download",
            Self::App => "app",
            Self::Gui => "gui",
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured decoding of a free-text command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandIntent {
    intent_type: IntentType,
    action: String,
    parameters: BTreeMap<String, String>,
}

impl CommandIntent {
    #[must_use]
    pub fn new(
        intent_type: IntentType,
        action: impl Into<String>,
        parameters: BTreeMap<String, String>,
    ) -> Self {
        Self {
            intent_type,
            action: action.into(),
            parameters,
        }
    }

    /// Shell intent whose action is the command line itself.
    #[must_use]
    pub fn shell(command: impl Into<String>) -> Self {
        Self::new(IntentType::Shell, command, BTreeMap::new())
    }

    fn with_param(intent_type: IntentType, action: &str, key: &str, value: &str) -> Self {
        let mut parameters = BTreeMap::new();
        parameters.insert(key.to_owned(), value.to_owned());
        Self::new(intent_type, action, parameters)
    }

    #[must_use]
    pub fn intent_type(&self) -> IntentType {
        self.intent_type
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

impl fmt::Display for CommandIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.intent_type, self.action)?;
        for (k, v) in &self.parameters {
            write!(f, " {k}={v:?}")?;
        }
        Ok(())
    }
}

const SHELL_PREFIXES: &[&str] = &["run ", "execute ", "shell "];

// Quoted-or-bare argument: "x", 'x', or the rest of the line.
const ARG: &str = r#"(?:"([^"]+)"|'([^']+)'|([^"'\s][^"']*))"#;

static FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(edit|open)\s+(?:the\s+)?(?:file\s+)?{ARG}")).unwrap()
});
static FILE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bfile\b").unwrap());
static DOWNLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdownload\s+(?:from\s+)?(\S+)").unwrap());
static APP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b(?:open|launch|start)\s+{ARG}")).unwrap());
static CLICK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bclick\s+(?:on\s+)?([^,]+)").unwrap());
static SCROLL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bscroll\b").unwrap());
static UP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bup\b").unwrap());
static DOWN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bdown\b").unwrap());
static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\btype\s+{ARG}")).unwrap());

/// First non-empty group among `groups`, trimmed.
fn first_group<'t>(caps: &Captures<'t>, groups: &[usize]) -> Option<&'t str> {
    groups
        .iter()
        .filter_map(|&i| caps.get(i))
        .map(|m| m.as_str().trim())
        .find(|s| !s.is_empty())
}

/// Ordered template matcher turning free text into a [`CommandIntent`].
///
/// Templates are tried in fixed precedence: shell, file, download, app, gui.
/// A template whose required capture is missing is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandIntentParser;

impl CommandIntentParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn parse(&self, text: &str) -> Option<CommandIntent> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let intent = Self::parse_shell(text)
            .or_else(|| Self::parse_file(text))
            .or_else(|| Self::parse_download(text))
            .or_else(|| Self::parse_app(text))
            .or_else(|| Self::parse_gui(text));
        if let Some(ref intent) = intent {
            tracing::debug!(%intent, "parsed command intent");
        }
        intent
    }

    fn parse_shell(text: &str) -> Option<CommandIntent> {
        SHELL_PREFIXES.iter().find_map(|prefix| {
            let head = text.get(..prefix.len())?;
            if !head.eq_ignore_ascii_case(prefix) {
                return None;
            }
            let command = text[prefix.len()..].trim();
            (!command.is_empty()).then(|| CommandIntent::shell(command))
        })
    }

    fn parse_file(text: &str) -> Option<CommandIntent> {
        if !FILE_WORD_RE.is_match(text) {
            return None;
        }
        let caps = FILE_RE.captures(text)?;
        let filename = first_group(&caps, &[2, 3, 4])?;
        if filename.eq_ignore_ascii_case("file") {
            return None;
        }
        let action = if caps[1].eq_ignore_ascii_case("edit") {
            "edit"
        } else {
            "read"
        };
        Some(CommandIntent::with_param(
            IntentType::File,
            action,
            "filename",
            filename,
        ))
    }

    fn parse_download(text: &str) -> Option<CommandIntent> {
        let caps = DOWNLOAD_RE.captures(text)?;
        Some(CommandIntent::with_param(
            IntentType::Download,
            "fetch",
            "url",
            &caps[1],
        ))
    }

    fn parse_app(text: &str) -> Option<CommandIntent> {
        let caps = APP_RE.captures(text)?;
        let app = first_group(&caps, &[1, 2, 3])?;
        Some(CommandIntent::with_param(IntentType::App, "open", "app", app))
    }

    fn parse_gui(text: &str) -> Option<CommandIntent> {
        if let Some(caps) = CLICK_RE.captures(text)
            && let Some(target) = first_group(&caps, &[1])
        {
            return Some(CommandIntent::with_param(
                IntentType::Gui,
                "click",
                "target",
                target,
            ));
        }
        if SCROLL_RE.is_match(text) {
            let direction = if DOWN_RE.is_match(text) {
                "down"
            } else if UP_RE.is_match(text) {
                "up"
            } else {
                "down"
            };
            return Some(CommandIntent::with_param(
                IntentType::Gui,
                "scroll",
                "direction",
                direction,
            ));
        }
        let caps = TYPE_RE.captures(text)?;
        let typed = first_group(&caps, &[1, 2, 3])?;
        Some(CommandIntent::with_param(IntentType::Gui, "type", "text", typed))
    }
}
