use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::{MAX_DURATION_SECS, SecurityConfig};
use crate::error::SessionError;

const MIN_KEYWORD_LEN: usize = 3;

/// Human-readable window length: seconds below a minute, minutes below an hour.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{} hour(s)", secs / 3600)
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', '!', ','])
        .to_lowercase()
}

/// Optionally signed run of ASCII digits.
fn is_integer_token(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Result of inspecting input for an activation phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationParse {
    Granted { duration_secs: u64, reason: String },
    Rejected { reason: String },
    NotTrigger,
}

impl ActivationParse {
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Granted window length, 0 otherwise.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        match self {
            Self::Granted { duration_secs, .. } => *duration_secs,
            _ => 0,
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Granted { reason, .. } | Self::Rejected { reason } => Some(reason.as_str()),
            Self::NotTrigger => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionStatus {
    Inactive,
    Expired,
    Active { remaining_secs: u64 },
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => f.write_str("privilege mode: INACTIVE"),
            Self::Expired => f.write_str("privilege mode: EXPIRED"),
            Self::Active { remaining_secs } => {
                let r = *remaining_secs;
                if r < 60 {
                    write!(f, "privilege mode: ACTIVE ({r}s remaining)")
                } else if r < 3600 {
                    write!(f, "privilege mode: ACTIVE ({}m remaining)", r / 60)
                } else {
                    write!(f, "privilege mode: ACTIVE ({}h remaining)", r / 3600)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityInfo {
    pub keyword: String,
    pub default_duration_secs: u64,
    pub max_duration_secs: u64,
    pub allow_timed: bool,
    pub allow_custom_keyword: bool,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy)]
struct PrivilegeSession {
    started_at: Instant,
    duration: Duration,
}

impl PrivilegeSession {
    fn end_time(&self) -> Instant {
        self.started_at + self.duration
    }
}

#[derive(Debug)]
struct SessionState {
    keyword: String,
    session: Option<PrivilegeSession>,
    lapsed: bool,
}

impl SessionState {
    /// Drop the session if `now` is past its end time.
    fn expire(&mut self, now: Instant) {
        if let Some(session) = self.session
            && now > session.end_time()
        {
            self.session = None;
            self.lapsed = true;
            tracing::info!("privilege session expired");
        }
    }

    /// Whole seconds left, rounded up. A live session always reports at least one.
    fn remaining_secs(&self, now: Instant) -> Option<u64> {
        self.session.map(|s| {
            let left = s.end_time().saturating_duration_since(now);
            (left.as_secs() + u64::from(left.subsec_nanos() > 0)).max(1)
        })
    }
}

/// Keyword-activated, time-boxed privilege window.
///
/// At most one session exists. Activation while a session is valid fails
/// and leaves it untouched; expiry is evaluated lazily on every read.
#[derive(Debug)]
pub struct PrivilegeSessionManager {
    state: Mutex<SessionState>,
    default_duration_secs: u64,
    allow_timed: bool,
    allow_custom_keyword: bool,
}

impl PrivilegeSessionManager {
    /// # Errors
    ///
    /// Returns `InvalidDuration` if the default window is outside 1..=3600 seconds
    /// and `InvalidKeyword` if the keyword is too short.
    pub fn new(config: &SecurityConfig) -> Result<Self, SessionError> {
        let secs = config.default_duration_secs;
        if secs == 0 || secs > MAX_DURATION_SECS {
            return Err(SessionError::InvalidDuration {
                secs: i64::try_from(secs).unwrap_or(i64::MAX),
            });
        }
        let keyword = normalize(&config.keyword);
        if keyword.chars().count() < MIN_KEYWORD_LEN {
            return Err(SessionError::InvalidKeyword(config.keyword.clone()));
        }
        Ok(Self {
            state: Mutex::new(SessionState {
                keyword,
                session: None,
                lapsed: false,
            }),
            default_duration_secs: secs,
            allow_timed: config.allow_timed,
            allow_custom_keyword: config.allow_custom_keyword,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn keyword(&self) -> String {
        self.lock().keyword.clone()
    }

    #[must_use]
    pub fn default_duration_secs(&self) -> u64 {
        self.default_duration_secs
    }

    /// Recognise `<keyword>` or `<keyword> <seconds>`.
    ///
    /// The bare keyword grants the default window. A numeric suffix grants that
    /// many seconds when it lies in 1..=3600 and is rejected otherwise.
    #[must_use]
    pub fn parse_activation(&self, text: &str) -> ActivationParse {
        let input = normalize(text);
        let keyword = self.keyword();
        if input == keyword {
            return ActivationParse::Granted {
                duration_secs: self.default_duration_secs,
                reason: "default privilege window".to_owned(),
            };
        }
        let Some(rest) = input
            .strip_prefix(keyword.as_str())
            .and_then(|r| r.strip_prefix(' '))
        else {
            return ActivationParse::NotTrigger;
        };
        let token = rest.split(' ').next().unwrap_or_default();
        if !is_integer_token(token) {
            return ActivationParse::NotTrigger;
        }
        if !self.allow_timed {
            return ActivationParse::Rejected {
                reason: "timed activation is disabled".to_owned(),
            };
        }
        // Integers too large for u64 land in the rejection arm.
        match token.parse::<u64>() {
            Ok(secs) if secs > 0 && secs <= MAX_DURATION_SECS => ActivationParse::Granted {
                duration_secs: secs,
                reason: format!("privilege window of {secs}s"),
            },
            _ => {
                tracing::warn!(token, "rejected activation duration");
                ActivationParse::Rejected {
                    reason: format!("invalid time {token}s (max {MAX_DURATION_SECS}s)"),
                }
            }
        }
    }

    /// Open a privilege window of `duration_secs`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDuration` outside 1..=3600 and `AlreadyActive` while a
    /// session is still valid.
    pub fn activate(&self, duration_secs: u64) -> Result<String, SessionError> {
        if duration_secs == 0 || duration_secs > MAX_DURATION_SECS {
            return Err(SessionError::InvalidDuration {
                secs: i64::try_from(duration_secs).unwrap_or(i64::MAX),
            });
        }
        let now = Instant::now();
        let mut state = self.lock();
        state.expire(now);
        if let Some(remaining_secs) = state.remaining_secs(now) {
            tracing::warn!(remaining_secs, "privilege session already active");
            return Err(SessionError::AlreadyActive { remaining_secs });
        }
        state.session = Some(PrivilegeSession {
            started_at: now,
            duration: Duration::from_secs(duration_secs),
        });
        state.lapsed = false;
        let human = format_duration(duration_secs);
        tracing::info!(duration_secs, "privilege session activated");
        Ok(format!("Privilege mode activated for {human}"))
    }

    /// # Errors
    ///
    /// See [`Self::activate`].
    pub fn activate_default(&self) -> Result<String, SessionError> {
        self.activate(self.default_duration_secs)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        let mut state = self.lock();
        state.expire(Instant::now());
        state.session.is_some()
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u64 {
        let now = Instant::now();
        let mut state = self.lock();
        state.expire(now);
        state.remaining_secs(now).unwrap_or(0)
    }

    /// End the current window early. No-op when inactive.
    pub fn deactivate(&self) {
        let mut state = self.lock();
        if state.session.take().is_some() {
            tracing::info!("privilege session deactivated");
        }
        state.lapsed = false;
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        let now = Instant::now();
        let mut state = self.lock();
        state.expire(now);
        match state.remaining_secs(now) {
            Some(remaining_secs) => SessionStatus::Active { remaining_secs },
            None if state.lapsed => SessionStatus::Expired,
            None => SessionStatus::Inactive,
        }
    }

    /// Replace the activation keyword.
    ///
    /// # Errors
    ///
    /// Returns `CustomKeywordDisabled` when customisation is off and
    /// `InvalidKeyword` for keywords shorter than three characters.
    pub fn set_keyword(&self, keyword: &str) -> Result<(), SessionError> {
        if !self.allow_custom_keyword {
            return Err(SessionError::CustomKeywordDisabled);
        }
        let normalized = normalize(keyword);
        if normalized.chars().count() < MIN_KEYWORD_LEN {
            return Err(SessionError::InvalidKeyword(keyword.to_owned()));
        }
        tracing::info!(keyword = %normalized, "activation keyword changed");
        self.lock().keyword = normalized;
        Ok(())
    }

    #[must_use]
    pub fn info(&self) -> SecurityInfo {
        SecurityInfo {
            keyword: self.keyword(),
            default_duration_secs: self.default_duration_secs,
            max_duration_secs: MAX_DURATION_SECS,
            allow_timed: self.allow_timed,
            allow_custom_keyword: self.allow_custom_keyword,
            status: self.status(),
        }
    }
}
