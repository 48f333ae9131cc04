//! Runtime configuration.
//!
//! A [`Config`] is built once, either in code or from environment variables,
//! and handed to the jobs and reports through the
//! [`AppContext`](crate::AppContext).

use crate::errors::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Days before the end date at which an expiration notice is sent.
pub const DEFAULT_EXPIRING_MILESTONES: [i64; 5] = [30, 15, 7, 3, 1];
/// How far ahead the expiring check looks.
pub const DEFAULT_LOOKAHEAD_DAYS: u64 = 30;
/// An overdue notice is sent every this many days.
pub const DEFAULT_OVERDUE_INTERVAL_DAYS: i64 = 7;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_JITTER: Duration = Duration::from_secs(60);

/// How the checks decide whether a milestone has to be notified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MilestonePolicy {
    /// Notify only when the day delta equals a milestone. Nothing is
    /// persisted: a skipped run misses the milestone and a second run on the
    /// same day notifies again.
    #[default]
    Exact,
    /// Notify the most recently crossed milestone unless the ledger already
    /// records it, then record it.
    Ledger,
}

impl FromStr for MilestonePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "ledger" => Ok(Self::Ledger),
            other => Err(format!("unknown policy `{other}`, expected `exact` or `ledger`")),
        }
    }
}

/// Settings of the notification checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Milestones of the expiring check, in days before the end date
    pub expiring_milestones: Vec<i64>,
    /// Size of the expiring window, in days from today
    pub lookahead_days: u64,
    /// Period of the overdue notices, in days
    pub overdue_interval_days: i64,
    /// Milestone selection and de-duplication strategy
    pub policy: MilestonePolicy,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            expiring_milestones: DEFAULT_EXPIRING_MILESTONES.to_vec(),
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            overdue_interval_days: DEFAULT_OVERDUE_INTERVAL_DAYS,
            policy: MilestonePolicy::default(),
        }
    }
}

impl NotificationConfig {
    /// Set the expiring milestones.
    pub fn expiring_milestones(mut self, milestones: impl Into<Vec<i64>>) -> Self {
        self.expiring_milestones = milestones.into();
        self
    }

    /// Set the size of the expiring window.
    pub fn lookahead_days(mut self, days: u64) -> Self {
        self.lookahead_days = days;
        self
    }

    /// Set the period of the overdue notices.
    pub fn overdue_interval_days(mut self, days: i64) -> Self {
        self.overdue_interval_days = days;
        self
    }

    /// Set the milestone policy.
    pub fn policy(mut self, policy: MilestonePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.expiring_milestones.is_empty() {
            return Err(ConfigError::Inconsistent("at least one expiring milestone is required"));
        }
        if self.expiring_milestones.iter().any(|m| *m <= 0) {
            return Err(ConfigError::Inconsistent("expiring milestones must be positive"));
        }
        if self.overdue_interval_days <= 0 {
            return Err(ConfigError::Inconsistent("overdue interval must be positive"));
        }
        if self.lookahead_days == 0 {
            return Err(ConfigError::Inconsistent("look-ahead must be at least one day"));
        }
        // A milestone past the window never matches a fetched contract.
        if self
            .expiring_milestones
            .iter()
            .any(|m| m.unsigned_abs() > self.lookahead_days)
        {
            return Err(ConfigError::Inconsistent(
                "expiring milestones must not exceed the look-ahead",
            ));
        }
        Ok(())
    }
}

/// Settings of the periodic scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between two passes
    pub poll_interval: Duration,
    /// Upper bound of the random delay added to each interval
    pub jitter: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl SchedulerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Inconsistent("scheduler interval must be positive"));
        }
        Ok(())
    }
}

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// The color as a `0xRRGGBB` integer.
    pub fn to_u32(self) -> u32 {
        (u32::from(self.0) << 16) | (u32::from(self.1) << 8) | u32::from(self.2)
    }

    /// Components scaled to `0.0..=1.0`.
    pub fn to_unit(self) -> [f32; 3] {
        [
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        ]
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("expected six hex digits".into());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
        let [_, r, g, b] = value.to_be_bytes();
        Ok(Self(r, g, b))
    }
}

/// Fixed branding applied to every report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    /// Company name printed in headers
    pub company_name: String,
    /// Optional JPEG logo drawn in the PDF header
    pub logo_path: Option<PathBuf>,
    /// Header band and title color
    pub primary_color: Rgb,
    /// Shading of every other table row
    pub stripe_color: Rgb,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            company_name: "Back Office".into(),
            logo_path: None,
            primary_color: Rgb(0x1F, 0x4E, 0x78),
            stripe_color: Rgb(0xF2, 0xF2, 0xF2),
        }
    }
}

/// Full runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Notification checks
    pub notifications: NotificationConfig,
    /// Periodic scheduler
    pub scheduler: SchedulerConfig,
    /// Report branding
    pub branding: Branding,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("NOTIFICATION_MILESTONES") {
            config.notifications.expiring_milestones = raw
                .split(',')
                .map(|part| parse("NOTIFICATION_MILESTONES", part.trim()))
                .collect::<Result<_, _>>()?;
        }
        if let Some(raw) = lookup("NOTIFICATION_LOOKAHEAD_DAYS") {
            config.notifications.lookahead_days = parse("NOTIFICATION_LOOKAHEAD_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("NOTIFICATION_OVERDUE_INTERVAL_DAYS") {
            config.notifications.overdue_interval_days =
                parse("NOTIFICATION_OVERDUE_INTERVAL_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("NOTIFICATION_POLICY") {
            config.notifications.policy = parse("NOTIFICATION_POLICY", &raw)?;
        }
        if let Some(raw) = lookup("SCHEDULER_INTERVAL_SECS") {
            config.scheduler.poll_interval =
                Duration::from_secs(parse("SCHEDULER_INTERVAL_SECS", &raw)?);
        }
        if let Some(raw) = lookup("SCHEDULER_JITTER_SECS") {
            config.scheduler.jitter = Duration::from_secs(parse("SCHEDULER_JITTER_SECS", &raw)?);
        }
        if let Some(raw) = lookup("REPORT_COMPANY_NAME") {
            config.branding.company_name = raw;
        }
        if let Some(raw) = lookup("REPORT_LOGO_PATH") {
            config.branding.logo_path = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("REPORT_PRIMARY_COLOR") {
            config.branding.primary_color = parse("REPORT_PRIMARY_COLOR", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be expressed by the types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.notifications.validate()?;
        self.scheduler.validate()
    }
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
