#![allow(unused_imports)]

use anyhow::Context;
use sled::open;
use std::sync::Arc;
use request_tracker::{
    config::TrackerConfig,
    dashboard,
    error::{TransitionError, ValidationError},
    request::{Category, Priority, RequestDraft, Status, TimeStamp},
    service::RequestService,
    transition::{Actor, AdminAction},
    utils,
};

use tempfile::tempdir; // Use for test db cleanup.

// Sled uses file-based locking to prevent concurrent access, so each test
// opens its own database under a temp dir that is removed on drop.
fn service_in(dir: &tempfile::TempDir, name: &str) -> anyhow::Result<RequestService> {
    let db = open(dir.path().join(name))?;
    Ok(RequestService::new(Arc::new(db)))
}

fn vpn_draft() -> RequestDraft {
    RequestDraft::new()
        .set_request_type("VPN Access")
        .set_category(Category::Access)
        .set_priority(Priority::High)
}

#[test]
fn submit_approve_and_complete_request() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_in(&temp_dir, "submit_approve_complete.db")?;

    let requester = Actor::requester(utils::new_uuid_to_bech32("user_")?);
    let admin = Actor::admin(utils::new_uuid_to_bech32("user_")?);

    let ctx = service
        .submit_request(vpn_draft(), &requester)
        .context("Request Failed on Submit: ")?;
    assert_eq!(ctx.current_state(), Status::Pending);

    // approve goes straight to in progress
    let ctx = service
        .review_request(ctx.id(), &admin, AdminAction::Approve, Some("granted".into()))
        .context("Request Failed on Approval: ")?;
    assert_eq!(ctx.current_state(), Status::InProgress);
    assert_eq!(ctx.request.reviewed_by(), Some(admin.id.as_str()));
    assert_eq!(ctx.request.admin_review_notes(), Some("granted"));

    let ctx = service
        .review_request(ctx.id(), &admin, AdminAction::Complete, None)
        .context("Request Failed on Completion: ")?;
    assert_eq!(ctx.current_state(), Status::Completed);

    let stored = service.load_request_context(ctx.id())?;
    assert_eq!(stored, ctx);
    assert_eq!(stored.history.len(), 2);
    stored.verify_history()?;

    Ok(())
}

#[test]
fn invalid_transition_is_a_conflict_and_writes_nothing() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_in(&temp_dir, "invalid_transition.db")?;

    let requester = Actor::requester("user_a");
    let admin = Actor::admin("admin_1");

    let ctx = service.submit_request(vpn_draft(), &requester)?;
    let before = service.load_request_context(ctx.id())?;

    let err = service
        .review_request(ctx.id(), &admin, AdminAction::Complete, None)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<TransitionError>(),
        Some(&TransitionError::NotAllowed {
            from: Status::Pending,
            to: Status::Completed,
            role: request_tracker::request::Role::Admin,
        })
    );

    assert_eq!(service.load_request_context(ctx.id())?, before);

    Ok(())
}

#[test]
fn requester_cancels_own_request_only() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_in(&temp_dir, "cancel.db")?;

    let owner = Actor::requester("user_a");
    let other = Actor::requester("user_b");

    let ctx = service.submit_request(vpn_draft(), &owner)?;

    let err = service.cancel_request(ctx.id(), &other).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransitionError>(),
        Some(TransitionError::Forbidden { .. })
    ));

    let ctx = service.cancel_request(ctx.id(), &owner)?;
    assert_eq!(ctx.current_state(), Status::Cancelled);
    assert!(ctx.request.reviewed_at().is_none());

    // cancelled is terminal
    let err = service.cancel_request(ctx.id(), &owner).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransitionError>(),
        Some(TransitionError::NotAllowed { .. })
    ));

    Ok(())
}

#[test]
fn requester_can_cancel_work_in_progress() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_in(&temp_dir, "cancel_in_progress.db")?;

    let owner = Actor::requester("user_a");
    let admin = Actor::admin("admin_1");

    let ctx = service.submit_request(vpn_draft(), &owner)?;
    let ctx = service.review_request(ctx.id(), &admin, AdminAction::Approve, None)?;
    let ctx = service.cancel_request(ctx.id(), &owner)?;

    assert_eq!(ctx.current_state(), Status::Cancelled);
    // the admin's earlier review stays on the record
    assert_eq!(ctx.request.reviewed_by(), Some("admin_1"));
    ctx.verify_history()?;

    Ok(())
}

#[test]
fn role_checks_at_the_service_boundary() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_in(&temp_dir, "roles.db")?;

    let owner = Actor::requester("user_a");
    let admin = Actor::admin("admin_1");

    // admins do not submit requests
    let err = service.submit_request(vpn_draft(), &admin).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransitionError>(),
        Some(TransitionError::Forbidden { .. })
    ));

    // requesters do not review
    let ctx = service.submit_request(vpn_draft(), &owner)?;
    let err = service
        .review_request(ctx.id(), &owner, AdminAction::Approve, None)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransitionError>(),
        Some(TransitionError::Forbidden { .. })
    ));
    assert_eq!(service.get_request(ctx.id())?.status(), Status::Pending);

    Ok(())
}

#[test]
fn legacy_approved_path_through_generic_transition() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_in(&temp_dir, "legacy.db")?;

    let owner = Actor::requester("user_a");
    let admin = Actor::admin("admin_1");

    let ctx = service.submit_request(vpn_draft(), &owner)?;
    let ctx = service.transition_request(ctx.id(), &admin, Status::Approved, None)?;
    assert_eq!(ctx.current_state(), Status::Approved);

    // deny is not available from the legacy status
    assert!(
        service
            .review_request(ctx.id(), &admin, AdminAction::Deny, None)
            .is_err()
    );

    let ctx = service.transition_request(ctx.id(), &admin, Status::InProgress, None)?;
    let ctx = service.review_request(ctx.id(), &admin, AdminAction::Deny, Some("no budget".into()))?;
    assert_eq!(ctx.current_state(), Status::Denied);
    ctx.verify_history()?;

    Ok(())
}

#[test]
fn invalid_drafts_and_unknown_ids() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_in(&temp_dir, "invalid.db")?;
    let owner = Actor::requester("user_a");

    let err = service
        .submit_request(
            RequestDraft::new()
                .set_request_type("Coffee machine")
                .set_category_name("Kitchen"),
            &owner,
        )
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::InvalidCategory("Kitchen".into()))
    );
    assert!(service.list_requests()?.is_empty());

    let err = service.cancel_request("req_missing", &owner).unwrap_err();
    assert_eq!(
        err.downcast_ref::<TransitionError>(),
        Some(&TransitionError::NotFound("req_missing".into()))
    );

    Ok(())
}

#[test]
fn dashboards_over_stored_requests() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let config = TrackerConfig {
        db_path: temp_dir.path().join("dashboard.db"),
        ..TrackerConfig::default()
    };
    let service = RequestService::open(&config)?;

    let alice = Actor::requester("user_a");
    let bob = Actor::requester("user_b");
    let admin = Actor::admin("admin_1");

    let a1 = service.submit_request(vpn_draft(), &alice)?;
    let _a2 = service.submit_request(
        RequestDraft::new()
            .set_request_type("Monitor")
            .set_category(Category::Hardware)
            .set_priority(Priority::Low),
        &alice,
    )?;
    let b1 = service.submit_request(
        RequestDraft::new()
            .set_request_type("Offboard contractor")
            .set_category(Category::Offboarding),
        &bob,
    )?;
    service.review_request(a1.id(), &admin, AdminAction::Approve, None)?;
    service.review_request(a1.id(), &admin, AdminAction::Complete, None)?;
    service.cancel_request(b1.id(), &bob)?;

    let requests = service.list_requests()?;
    assert_eq!(requests.len(), 3);
    assert_eq!(service.requests_for("user_a")?.len(), 2);

    let now = TimeStamp::new();
    let admin_view = dashboard::admin_metrics(&requests, &now, config.queue_limit);
    assert_eq!(admin_view.pending_count, 1);
    assert_eq!(admin_view.queue.len(), 2);
    assert_eq!(admin_view.sla.on_time, 1);
    assert_eq!(
        admin_view.insight,
        "Hardware requests are waiting the longest on average right now."
    );

    let report = dashboard::compliance_report(&requests);
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.rate(), Some(1.0));

    let alice_view = dashboard::user_metrics(&requests, &alice.id, config.recent_limit);
    assert_eq!(alice_view.active_count, 1);

    Ok(())
}
