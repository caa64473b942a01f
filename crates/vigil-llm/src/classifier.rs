use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Coarse task bucket used to pick a provider.
///
/// Declaration order is significant: it breaks ties between categories that
/// match the same number of patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Research,
    Code,
    Math,
    Creative,
    Factual,
    System,
    General,
}

impl TaskCategory {
    pub const ALL: [Self; 7] = [
        Self::Research,
        Self::Code,
        Self::Math,
        Self::Creative,
        Self::Factual,
        Self::System,
        Self::General,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Code => "code",
            Self::Math => "math",
            Self::Creative => "creative",
            Self::Factual => "factual",
            Self::System => "system",
            Self::General => "general",
        }
    }

    /// Lenient parse: unknown names map to `General`.
    #[must_use]
    pub fn parse_str(s: &str) -> Self {
        s.parse().unwrap_or(Self::General)
    }
}

impl std::str::FromStr for TaskCategory {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| LlmError::Other(format!("unknown task category: {s}")))
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PATTERN_TABLE: &[(TaskCategory, &[&str])] = &[
    (
        TaskCategory::Research,
        &[
            r"\b(research|find|search|look up|investigate|explore|discover|learn about)\b",
            r"\bwhat'?s the latest\b|\b(recent|current|up to date)\b",
            r"\b(tell me about|information about|facts about)\b",
        ],
    ),
    (
        TaskCategory::Code,
        &[
            r"\b(code|write|implement|function|class|script|program|snippet)\b",
            r"\b(python|javascript|typescript|java|rust|golang|sql)\b|c\+\+",
            r"\bsolve\b.*\bproblem\b|\balgorithm|\bdata structure",
        ],
    ),
    (
        TaskCategory::Math,
        &[
            r"\b(calculate|solve|equation|integral|derivative|matrix|algebra|geometry)\b",
            r"\b(math|formula|proof|theorem|logic|reasoning)\b",
            r"\d+\s*[-+*/^]\s*\d+|\bcalculus\b|\blinear algebra\b",
        ],
    ),
    (
        TaskCategory::Creative,
        &[
            r"\b(write|story|poem|song|creative|fiction|imagine|invent)\b",
            r"\b(description|narrative|dialogue|script|play)\b",
            r"\bmake\b.*\bfunny\b|\b(joke|pun|humorous)\b",
        ],
    ),
    (
        TaskCategory::Factual,
        &[
            r"\b(fact|true|history|biography|definition|who|explain)\b|\bwhat is\b|\bwhat's\b",
            r"\b(when|where|how many|population|capital|president)\b",
            r"\b(definition of|meaning of|do you know)\b",
        ],
    ),
    (
        TaskCategory::System,
        &[
            r"\b(system|command|shell|terminal|execute|run|install|configure)\b",
            r"\b(sudo|root|permission|access|secure|security|firewall|ssh)\b",
            r"\b(linux|ubuntu|debian|fedora|arch)\b",
        ],
    ),
];

fn compile(pattern: &str) -> Result<Regex, LlmError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| LlmError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })
}

static BUILTIN_PATTERNS: LazyLock<Vec<(TaskCategory, Vec<Regex>)>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|(category, patterns)| {
            let compiled = patterns.iter().map(|p| compile(p).unwrap()).collect();
            (*category, compiled)
        })
        .collect()
});

/// Pattern-scoring classifier over a fixed, ordered category table.
///
/// Each category scores one point per pattern that matches anywhere in the
/// input. The highest score wins, ties go to the category declared first, and
/// an all-zero score yields [`TaskCategory::General`].
#[derive(Debug, Clone, Default)]
pub struct TaskClassifier {
    extra: Vec<(TaskCategory, Vec<Regex>)>,
}

impl TaskClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append user-supplied patterns to a category's built-in list.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidPattern` if any pattern fails to compile.
    pub fn with_extra_patterns(
        mut self,
        category: TaskCategory,
        patterns: &[String],
    ) -> Result<Self, LlmError> {
        let compiled = patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some((_, existing)) = self.extra.iter_mut().find(|(c, _)| *c == category) {
            existing.extend(compiled);
        } else {
            self.extra.push((category, compiled));
        }
        Ok(self)
    }

    /// Per-category match counts in declaration order. `General` is omitted.
    #[must_use]
    pub fn scores(&self, text: &str) -> Vec<(TaskCategory, usize)> {
        BUILTIN_PATTERNS
            .iter()
            .map(|(category, patterns)| {
                let builtin = patterns.iter().filter(|re| re.is_match(text)).count();
                let extra = self
                    .extra
                    .iter()
                    .filter(|(c, _)| c == category)
                    .flat_map(|(_, res)| res.iter())
                    .filter(|re| re.is_match(text))
                    .count();
                (*category, builtin + extra)
            })
            .collect()
    }

    #[must_use]
    pub fn classify(&self, text: &str) -> TaskCategory {
        let scores = self.scores(text);
        let mut best = (TaskCategory::General, 0);
        for (category, score) in scores {
            if score > best.1 {
                best = (category, score);
            }
        }
        tracing::debug!(category = %best.0, score = best.1, "classified task");
        best.0
    }
}
