//! Alert trigger reasons.
//!
//! Reasons travel as stable string codes; mapping a code to a translated,
//! human-readable string is the consuming UI's job, not the pipeline's.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum AlertReason {
    /// The configured danger phrase was heard by the voice monitor.
    PhraseDetected,
    /// The voice monitor classified the audio as distress.
    DistressDetected,
    /// The user pressed the emergency button.
    Manual,
    /// An armed safety timer ran out without being cancelled.
    TimerExpired,
    /// Free-text reason supplied by the caller.
    Other(String),
}

impl AlertReason {
    pub fn code(&self) -> &str {
        match self {
            Self::PhraseDetected => "phrase_detected",
            Self::DistressDetected => "distress_detected",
            Self::Manual => "manual",
            Self::TimerExpired => "timer_expired",
            Self::Other(text) => text,
        }
    }
}

impl From<String> for AlertReason {
    fn from(s: String) -> Self {
        match s.as_str() {
            "phrase_detected" => Self::PhraseDetected,
            "distress_detected" => Self::DistressDetected,
            "manual" => Self::Manual,
            "timer_expired" => Self::TimerExpired,
            _ => Self::Other(s),
        }
    }
}

impl From<AlertReason> for String {
    fn from(r: AlertReason) -> Self {
        r.code().to_string()
    }
}

impl std::fmt::Display for AlertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
