use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::domain::InterviewMode;

/// What to do when an interview is scheduled without a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewDatePolicy {
    /// Record the interview at the time of the transition.
    DefaultToNow,
    /// Reject the transition as a validation error.
    Require,
}

impl InterviewDatePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default_to_now" | "now" => Some(Self::DefaultToNow),
            "require" | "required" => Some(Self::Require),
            _ => None,
        }
    }
}

/// Explicit defaults applied by the lifecycle engine and dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    pub interview_date_policy: InterviewDatePolicy,
    pub default_interview_mode: InterviewMode,
    /// Trailing window, in days, for the "this week" dashboard deltas.
    pub delta_window_days: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            interview_date_policy: InterviewDatePolicy::DefaultToNow,
            default_interview_mode: InterviewMode::Online,
            delta_window_days: 7,
        }
    }
}

impl LifecycleConfig {
    pub fn delta_window(&self) -> Duration {
        Duration::days(i64::from(self.delta_window_days))
    }
}
