//! SLA classification for the live queue and retrospective compliance for closed requests
//!
//! Two separate entry points: [`evaluate_sla`] for active requests and
//! [`met_sla`] for completed ones. `None` from either means the SLA concept
//! does not apply to that request; it is never an error.
use super::request::{Priority, Status, TimeStamp};
use chrono::Utc;

/// Resolution targets in hours by priority.
const SLA_TARGETS: [(Priority, u32); 3] = [
    (Priority::Low, 120),   // 5 days
    (Priority::Medium, 72), // 3 days
    (Priority::High, 48),   // 2 days
];

/// Fraction of the window below which an active request is at risk.
const AT_RISK_FRACTION: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlaState {
    OnTime,
    AtRisk,
    Overdue,
}

impl SlaState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaState::OnTime => "on_time",
            SlaState::AtRisk => "at_risk",
            SlaState::Overdue => "overdue",
        }
    }
}

/// Live SLA numbers for an active request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlaSnapshot {
    pub state: SlaState,
    pub target_hours: u32,
    pub age_hours: f64,
    /// Negative once the request is overdue.
    pub remaining_hours: f64,
}

impl SlaSnapshot {
    pub fn breached(&self) -> bool {
        self.state == SlaState::Overdue
    }

    /// Whole hours left, floored at zero, for badges.
    pub fn display_remaining_hours(&self) -> u32 {
        if self.remaining_hours <= 0.0 {
            0
        } else {
            self.remaining_hours.trunc() as u32
        }
    }
}

pub fn target_hours(priority: Priority) -> Option<u32> {
    SLA_TARGETS
        .iter()
        .find(|(p, _)| *p == priority)
        .map(|(_, hours)| *hours)
}

/// Classifies remaining time against a target.
///
/// `remaining < 0` is overdue; `0 <= remaining < 25%` of the target is at
/// risk, so exactly zero remaining is at risk and exactly 25% is on time.
pub fn classify(target_hours: u32, age_hours: f64) -> SlaState {
    let target = f64::from(target_hours);
    let remaining = target - age_hours;

    if remaining < 0.0 {
        SlaState::Overdue
    } else if remaining < AT_RISK_FRACTION * target {
        SlaState::AtRisk
    } else {
        SlaState::OnTime
    }
}

pub fn sla_snapshot(
    status: Status,
    priority: Priority,
    created_at: &TimeStamp<Utc>,
    now: &TimeStamp<Utc>,
) -> Option<SlaSnapshot> {
    if !status.is_sla_tracked() {
        return None;
    }
    let target = target_hours(priority)?;
    let age_hours = created_at.hours_until(now);
    // created after `now` is malformed data, as in met_sla
    if age_hours < 0.0 {
        return None;
    }

    Some(SlaSnapshot {
        state: classify(target, age_hours),
        target_hours: target,
        age_hours,
        remaining_hours: f64::from(target) - age_hours,
    })
}

/// `None` for statuses without a running clock and for a `created_at` later than `now`.
pub fn evaluate_sla(
    status: Status,
    priority: Priority,
    created_at: &TimeStamp<Utc>,
    now: &TimeStamp<Utc>,
) -> Option<SlaState> {
    sla_snapshot(status, priority, created_at, now).map(|snapshot| snapshot.state)
}

/// Whether a completed request was resolved within its window.
///
/// `None` unless the request is completed and both timestamps are present.
/// A review time earlier than creation is treated as malformed.
pub fn met_sla(
    status: Status,
    priority: Priority,
    created_at: Option<&TimeStamp<Utc>>,
    reviewed_at: Option<&TimeStamp<Utc>>,
) -> Option<bool> {
    if status != Status::Completed {
        return None;
    }
    let (created_at, reviewed_at) = (created_at?, reviewed_at?);
    let target = target_hours(priority)?;
    let resolution_hours = created_at.hours_until(reviewed_at);
    if resolution_hours < 0.0 {
        return None;
    }

    Some(resolution_hours <= f64::from(target))
}

/// Text form of [`evaluate_sla`] for rows that have not been parsed yet.
pub fn evaluate_sla_str(
    status: &str,
    priority: &str,
    created_at: &str,
    now: &TimeStamp<Utc>,
) -> Option<SlaState> {
    let status = status.parse().ok()?;
    let priority = priority.parse().ok()?;
    let created_at = TimeStamp::parse(created_at)?;

    evaluate_sla(status, priority, &created_at, now)
}

/// Text form of [`met_sla`]. Missing or unparsable timestamps yield `None`.
pub fn met_sla_str(
    status: &str,
    priority: &str,
    created_at: Option<&str>,
    reviewed_at: Option<&str>,
) -> Option<bool> {
    let status = status.parse().ok()?;
    let priority = priority.parse().ok()?;
    let created_at = TimeStamp::parse(created_at?)?;
    let reviewed_at = TimeStamp::parse(reviewed_at?)?;

    met_sla(status, priority, Some(&created_at), Some(&reviewed_at))
}
