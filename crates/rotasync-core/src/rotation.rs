use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationRole {
    Primary,
    Secondary,
}

impl RotationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// A provider schedule we follow. The identifier is a schedule ID for
/// PagerDuty and a schedule name for Opsgenie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    schedule: String,
    role: RotationRole,
}

impl Rotation {
    pub fn new(schedule: impl Into<String>, role: RotationRole) -> Result<Self, DomainError> {
        let schedule = schedule.into().trim().to_string();
        if schedule.is_empty() {
            return Err(DomainError::EmptyRotationId);
        }
        Ok(Self { schedule, role })
    }

    pub fn schedule(&self) -> &str {
        &self.schedule
    }

    pub fn role(&self) -> RotationRole {
        self.role
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    Now,
    Later,
}

impl Horizon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Now => "now",
            Self::Later => "later",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCallAssignment {
    pub role: RotationRole,
    pub horizon: Horizon,
    pub at: DateTime<Utc>,
    pub username: String,
}

/// The four lookups a run performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCallSnapshot {
    pub primary_now: OnCallAssignment,
    pub secondary_now: OnCallAssignment,
    pub primary_later: OnCallAssignment,
    pub secondary_later: OnCallAssignment,
}

impl OnCallSnapshot {
    /// Target membership of the on-call group.
    pub fn on_call_members(&self) -> Vec<String> {
        vec![
            self.primary_now.username.clone(),
            self.secondary_now.username.clone(),
        ]
    }

    /// Ordered pair fed to support selection.
    pub fn support_candidates(&self) -> [String; 2] {
        [
            self.secondary_now.username.clone(),
            self.secondary_later.username.clone(),
        ]
    }
}

/// Largest look-ahead (or look-behind) accepted for "later" lookups: one year.
pub const MAX_HOUR_SHIFT: i64 = 24 * 366;

/// The instant used for "later" lookups.
pub fn later_instant(now: DateTime<Utc>, hour_shift: i64) -> Result<DateTime<Utc>, DomainError> {
    if hour_shift.unsigned_abs() > MAX_HOUR_SHIFT.unsigned_abs() {
        return Err(DomainError::HourShiftOutOfRange(hour_shift));
    }
    TimeDelta::try_hours(hour_shift)
        .and_then(|shift| now.checked_add_signed(shift))
        .ok_or(DomainError::HourShiftOutOfRange(hour_shift))
}
