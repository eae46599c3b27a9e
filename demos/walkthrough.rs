//! Walks a few requests through the tracker and prints the admin dashboard.
//!
//! Run with `RUST_LOG=debug` to see the service log lines. The store location
//! comes from `TRACKER_DB_PATH` (a temp dir by default).

use request_tracker::{
    config::TrackerConfig,
    dashboard,
    request::{Category, Priority, RequestDraft, TimeStamp},
    service::RequestService,
    sla,
    transition::{Actor, AdminAction},
    utils,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let temp_dir = tempfile::tempdir()?;
    let mut config = TrackerConfig::from_env()?;
    if std::env::var("TRACKER_DB_PATH").is_err() {
        config.db_path = temp_dir.path().join("walkthrough.db");
    }
    let service = RequestService::open(&config)?;

    let employee = Actor::requester(utils::new_uuid_to_bech32("user_")?);
    let admin = Actor::admin(utils::new_uuid_to_bech32("user_")?);

    let vpn = service.submit_request(
        RequestDraft::new()
            .set_request_type("VPN Access")
            .set_category(Category::Access)
            .set_priority(Priority::High),
        &employee,
    )?;
    let laptop = service.submit_request(
        RequestDraft::new()
            .set_request_type("Laptop replacement")
            .set_category(Category::Hardware)
            .set_department("Finance"),
        &employee,
    )?;

    service.review_request(vpn.id(), &admin, AdminAction::Approve, Some("Granted for Q3".into()))?;
    service.review_request(vpn.id(), &admin, AdminAction::Complete, None)?;

    // completing a pending request is rejected before anything is written
    if let Err(err) = service.review_request(laptop.id(), &admin, AdminAction::Complete, None) {
        println!("rejected: {err}");
    }

    let now = TimeStamp::new();
    let requests = service.list_requests()?;
    let metrics = dashboard::admin_metrics(&requests, &now, config.queue_limit);

    println!("pending: {}  new today: {}", metrics.pending_count, metrics.new_today);
    println!("{}", metrics.insight);
    for request in &metrics.queue {
        let badge = sla::sla_snapshot(request.status(), request.priority(), request.created_at(), &now)
            .map(|s| format!("{} ({}h left)", s.state.as_str(), s.display_remaining_hours()))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<20} {:<12} {:<8} {:<12} {}",
            request.request_type(),
            request.category(),
            request.priority(),
            request.status(),
            badge
        );
    }

    let report = dashboard::compliance_report(&requests);
    if let Some(rate) = report.rate() {
        println!("SLA compliance: {:.0}% of {} completed", rate * 100.0, report.evaluated);
    }

    let history = service.load_request_context(vpn.id())?;
    history.verify_history()?;
    for record in &history.history {
        println!("{} -> {} by {} ({})", record.from, record.to, record.actor_id, record.role);
    }

    Ok(())
}
