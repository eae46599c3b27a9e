//! Dashboard and analytics aggregations over request listings
//!
//! Everything here is a pure function of the requests handed in and the
//! `now` used for ages, so the same listing always renders the same numbers.
use super::request::{Category, Request, Status, TimeStamp};
use super::sla::{SlaState, evaluate_sla, met_sla};
use chrono::Utc;
use std::collections::BTreeMap;

pub const HEALTHY_QUEUE_INSIGHT: &str = "Queue looks healthy. No category is significantly delayed.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlaSummary {
    pub on_time: usize,
    pub at_risk: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceReport {
    pub evaluated: usize,
    pub met: usize,
}

impl ComplianceReport {
    /// Share of evaluated requests that met their SLA, `None` when nothing was evaluated.
    pub fn rate(&self) -> Option<f64> {
        (self.evaluated > 0).then(|| self.met as f64 / self.evaluated as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminMetrics {
    pub pending_count: usize,
    pub new_today: usize,
    pub avg_approval_hours: Option<f64>,
    pub queue: Vec<Request>,
    pub insight: String,
    pub sla: SlaSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserMetrics {
    pub active_count: usize,
    pub recent: Vec<Request>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileStats {
    pub total_requests: usize,
    pub avg_completion_days: Option<f64>,
    pub most_common_category: Option<Category>,
}

// admin queue ordering
fn queue_rank(status: Status) -> u8 {
    match status {
        Status::Pending => 1,
        Status::Approved => 2,
        Status::InProgress => 3,
        Status::Completed => 4,
        Status::Denied => 5,
        Status::Cancelled => 6,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn sla_summary(requests: &[Request], now: &TimeStamp<Utc>) -> SlaSummary {
    let mut summary = SlaSummary::default();
    for r in requests {
        match evaluate_sla(r.status(), r.priority(), r.created_at(), now) {
            Some(SlaState::OnTime) => summary.on_time += 1,
            Some(SlaState::AtRisk) => summary.at_risk += 1,
            Some(SlaState::Overdue) => summary.overdue += 1,
            None => {}
        }
    }
    summary
}

pub fn compliance_report(requests: &[Request]) -> ComplianceReport {
    let mut report = ComplianceReport::default();
    for r in requests {
        if let Some(met) = met_sla(
            r.status(),
            r.priority(),
            Some(r.created_at()),
            r.reviewed_at(),
        ) {
            report.evaluated += 1;
            if met {
                report.met += 1;
            }
        }
    }
    report
}

/// Category whose pending requests have waited longest on average.
fn slowest_pending_category(requests: &[Request], now: &TimeStamp<Utc>) -> Option<Category> {
    let mut ages: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
    for r in requests.iter().filter(|r| r.status() == Status::Pending) {
        let entry = ages.entry(r.category()).or_insert((0.0, 0));
        entry.0 += r.created_at().hours_until(now);
        entry.1 += 1;
    }

    let mut slowest: Option<(Category, f64)> = None;
    for (category, (total, count)) in ages {
        let avg = total / count as f64;
        if slowest.is_none_or(|(_, best)| avg > best) {
            slowest = Some((category, avg));
        }
    }
    slowest.map(|(category, _)| category)
}

pub fn admin_metrics(requests: &[Request], now: &TimeStamp<Utc>, queue_limit: usize) -> AdminMetrics {
    let today = now.to_datetime_utc().date_naive();

    let pending_count = requests
        .iter()
        .filter(|r| r.status() == Status::Pending)
        .count();
    let new_today = requests
        .iter()
        .filter(|r| r.created_at().to_datetime_utc().date_naive() == today)
        .count();
    // approval time is only meaningful while reviewed_at still marks the approval
    let avg_approval_hours = mean(
        requests
            .iter()
            .filter(|r| matches!(r.status(), Status::Approved | Status::InProgress))
            .filter_map(|r| r.reviewed_at().map(|at| r.created_at().hours_until(at))),
    );

    let mut queue: Vec<Request> = requests
        .iter()
        .filter(|r| r.status() != Status::Cancelled)
        .cloned()
        .collect();
    queue.sort_by(|a, b| {
        queue_rank(a.status())
            .cmp(&queue_rank(b.status()))
            .then_with(|| b.created_at().cmp(a.created_at()))
    });
    queue.truncate(queue_limit);

    let insight = match slowest_pending_category(requests, now) {
        Some(category) => format!("{category} requests are waiting the longest on average right now."),
        None => HEALTHY_QUEUE_INSIGHT.to_string(),
    };

    AdminMetrics {
        pending_count,
        new_today,
        avg_approval_hours,
        queue,
        insight,
        sla: sla_summary(requests, now),
    }
}

pub fn user_metrics(requests: &[Request], requester_id: &str, recent_limit: usize) -> UserMetrics {
    let mut mine: Vec<Request> = requests
        .iter()
        .filter(|r| r.requester_id() == requester_id)
        .cloned()
        .collect();
    let active_count = mine
        .iter()
        .filter(|r| matches!(r.status(), Status::Pending | Status::Approved | Status::InProgress))
        .count();

    mine.sort_by(|a, b| b.created_at().cmp(a.created_at()));
    mine.truncate(recent_limit);

    UserMetrics {
        active_count,
        recent: mine,
    }
}

pub fn profile_stats(requests: &[Request], requester_id: &str) -> ProfileStats {
    let mine: Vec<&Request> = requests
        .iter()
        .filter(|r| r.requester_id() == requester_id)
        .collect();

    let avg_completion_days = mean(
        mine.iter()
            .filter(|r| r.status() == Status::Completed)
            .filter_map(|r| r.reviewed_at().map(|at| r.created_at().hours_until(at) / 24.0)),
    );

    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for r in &mine {
        *counts.entry(r.category()).or_default() += 1;
    }
    // ties go to the category listed first
    let most_common_category = counts
        .into_iter()
        .fold(None, |best: Option<(Category, usize)>, (category, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((category, count)),
        })
        .map(|(category, _)| category);

    ProfileStats {
        total_requests: mine.len(),
        avg_completion_days,
        most_common_category,
    }
}
