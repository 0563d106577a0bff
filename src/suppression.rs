//! Content, level and quiet-hours suppression policy.
//!
//! Pure decision logic: given a message, a level and a configuration
//! snapshot, decide whether the desktop, sound and voice channels may
//! fire. Content rules come first so internal retry/error text can never
//! reach the user, whatever the configuration says. Logging is not gated
//! here; the manager always logs before consulting this policy.

use std::fmt;

use chrono::NaiveTime;

use crate::config::{NotifyConfig, QuietHours};
use crate::request::Level;

/// Retry prompts the assistant produces itself. Never shown or spoken.
const SUPPRESSED_MESSAGES: [&str; 4] = [
    "متاسفم، متوجه نشدم.",
    "زمان دریافت فرمان به پایان رسید. لطفا دوباره تلاش کنید.",
    "متاسفم، متوجه نشدم. لطفا دوباره بگویید.",
    "متاسفم، متوجه نشدم، لطفا دوباره بگویید",
];

/// Substrings marking a message as error output (Persian and English).
const ERROR_INDICATORS: [&str; 5] = ["خطا", "خطا در", "exception", "traceback", "error"];

/// Why a notification was kept off the visible/audible channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    ApologyPhrase,
    ErrorText,
    LevelDisabled,
    QuietHours,
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::ApologyPhrase => "apology phrase",
            Self::ErrorText => "error text",
            Self::LevelDisabled => "level disabled",
            Self::QuietHours => "quiet hours",
        };
        f.write_str(reason)
    }
}

pub fn is_error_text(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ERROR_INDICATORS.iter().any(|ind| lowered.contains(ind))
}

/// Evaluate the rules in order; the first match wins and suppresses all
/// channels. `None` means emission proceeds.
pub fn evaluate(
    message: &str,
    level: Level,
    bypass_quiet: bool,
    config: &NotifyConfig,
    now: NaiveTime,
) -> Option<Suppression> {
    if SUPPRESSED_MESSAGES.contains(&message.trim()) {
        return Some(Suppression::ApologyPhrase);
    }
    if is_error_text(message) {
        return Some(Suppression::ErrorText);
    }
    if !config.levels.enabled(level) {
        return Some(Suppression::LevelDisabled);
    }
    if !bypass_quiet && in_quiet_hours(&config.quiet_hours, now) {
        return Some(Suppression::QuietHours);
    }
    None
}

/// Whether `now` falls inside the window. A window whose start is later
/// than its end covers the overnight span. Missing or unparseable bounds
/// disable the window.
pub fn in_quiet_hours(window: &QuietHours, now: NaiveTime) -> bool {
    let (Some(start), Some(end)) = (parse_time(&window.start), parse_time(&window.end)) else {
        return false;
    };
    if start < end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    if value.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}
