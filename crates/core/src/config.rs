//! Run configuration: scheduler timing, window size, and variations.
//!
//! All values are plain data passed into the scheduler constructor.
//! Defaults match the production settings of the draft generation run;
//! callers override them per run via [`RunRequest`] or the environment.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;

/// Default maximum number of jobs outstanding at the external API.
pub const DEFAULT_WINDOW_SIZE: usize = 5;
/// Default pause before each sweep of the active set.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
/// Default pause after each individual poll call within a sweep.
pub const DEFAULT_POLL_PACING_MS: u64 = 500;
/// Default pause after each submission attempt.
pub const DEFAULT_SUBMIT_PACING_MS: u64 = 500;
/// Default poll-attempt ceiling (~3 minutes at the default cadence).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;
/// Default number of variations generated per record.
pub const DEFAULT_VARIATIONS_PER_RECORD: u32 = 3;
/// Consecutive poll-call errors tolerated before a task is failed.
pub const TRANSIENT_FAILURE_LIMIT: u32 = 3;

// ---------------------------------------------------------------------------
// SchedulerConfig
// ---------------------------------------------------------------------------

/// Tunable parameters for the bounded-window polling scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct SchedulerConfig {
    /// Maximum number of simultaneously active tasks (W).
    #[validate(range(min = 1, message = "window size must be at least 1"))]
    pub window_size: usize,
    /// Pause before each sweep of the active set (I).
    pub poll_interval: Duration,
    /// Pause after each individual poll call (D).
    pub poll_pacing: Duration,
    /// Pause after each submission attempt, success or failure (C).
    pub submit_pacing: Duration,
    /// Poll attempts after which an active task is retired as timed out (M).
    #[validate(range(min = 1, message = "max poll attempts must be at least 1"))]
    pub max_poll_attempts: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_pacing: Duration::from_millis(DEFAULT_POLL_PACING_MS),
            submit_pacing: Duration::from_millis(DEFAULT_SUBMIT_PACING_MS),
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl SchedulerConfig {
    /// A configuration with every pause set to zero.
    ///
    /// Useful for tests and for replaying against fast local fakes.
    pub fn immediate(window_size: usize, max_poll_attempts: u32) -> Self {
        Self {
            window_size,
            poll_interval: Duration::ZERO,
            poll_pacing: Duration::ZERO,
            submit_pacing: Duration::ZERO,
            max_poll_attempts,
        }
    }
}

// ---------------------------------------------------------------------------
// RunSettings
// ---------------------------------------------------------------------------

/// Everything a single draft generation run needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct RunSettings {
    #[validate(nested)]
    pub scheduler: SchedulerConfig,
    /// Number of tasks (variations) generated per record (N).
    #[validate(range(
        min = 1,
        max = 10,
        message = "variations per record must be between 1 and 10"
    ))]
    pub variations_per_record: u32,
    /// Match output dimensions to the reference image's aspect ratio.
    pub follow_reference_ratio: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            variations_per_record: DEFAULT_VARIATIONS_PER_RECORD,
            follow_reference_ratio: false,
        }
    }
}

impl RunSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `QUEUE_SIZE`              | `5`     |
    /// | `STATUS_CHECK_INTERVAL_MS`| `3000`  |
    /// | `STATUS_CHECK_DELAY_MS`   | `500`   |
    /// | `TASK_CREATION_DELAY_MS`  | `500`   |
    /// | `MAX_STATUS_CHECKS`       | `60`    |
    /// | `VARIATIONS_PER_RECORD`   | `3`     |
    /// | `FOLLOW_REFERENCE_RATIO`  | `false` |
    pub fn from_env() -> Result<Self, CoreError> {
        let scheduler = SchedulerConfig {
            window_size: env_or("QUEUE_SIZE", DEFAULT_WINDOW_SIZE)?,
            poll_interval: Duration::from_millis(env_or(
                "STATUS_CHECK_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            poll_pacing: Duration::from_millis(env_or(
                "STATUS_CHECK_DELAY_MS",
                DEFAULT_POLL_PACING_MS,
            )?),
            submit_pacing: Duration::from_millis(env_or(
                "TASK_CREATION_DELAY_MS",
                DEFAULT_SUBMIT_PACING_MS,
            )?),
            max_poll_attempts: env_or("MAX_STATUS_CHECKS", DEFAULT_MAX_POLL_ATTEMPTS)?,
        };

        let settings = Self {
            scheduler,
            variations_per_record: env_or("VARIATIONS_PER_RECORD", DEFAULT_VARIATIONS_PER_RECORD)?,
            follow_reference_ratio: env_or("FOLLOW_REFERENCE_RATIO", false)?,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Read and parse an environment variable, falling back to `default`
/// when it is unset.
fn env_or<T>(key: &'static str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| CoreError::Config {
            key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// RunRequest
// ---------------------------------------------------------------------------

/// Optional per-run timing overrides, in milliseconds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingOverrides {
    pub status_check_interval: Option<u64>,
    pub status_check_delay: Option<u64>,
    pub max_status_checks: Option<u32>,
    pub task_creation_delay: Option<u64>,
}

/// Caller-supplied run request, as posted by the dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub queue_size: Option<usize>,
    pub follow_reference_ratio: Option<bool>,
    pub variations_per_record: Option<u32>,
    pub timing_settings: Option<TimingOverrides>,
}

impl RunRequest {
    /// Apply the overrides on top of `base` and validate the result.
    pub fn apply_to(&self, base: RunSettings) -> Result<RunSettings, CoreError> {
        let mut settings = base;
        if let Some(size) = self.queue_size {
            settings.scheduler.window_size = size;
        }
        if let Some(follow) = self.follow_reference_ratio {
            settings.follow_reference_ratio = follow;
        }
        if let Some(n) = self.variations_per_record {
            settings.variations_per_record = n;
        }
        if let Some(timing) = &self.timing_settings {
            let s = &mut settings.scheduler;
            if let Some(ms) = timing.status_check_interval {
                s.poll_interval = Duration::from_millis(ms);
            }
            if let Some(ms) = timing.status_check_delay {
                s.poll_pacing = Duration::from_millis(ms);
            }
            if let Some(max) = timing.max_status_checks {
                s.max_poll_attempts = max;
            }
            if let Some(ms) = timing.task_creation_delay {
                s.submit_pacing = Duration::from_millis(ms);
            }
        }
        settings.validate()?;
        Ok(settings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
