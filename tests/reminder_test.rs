//! Reminder sweep tests

mod helpers;

use chrono::{Duration, Utc};
use helpers::*;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;
use volunteer_hub::models::{ReviewDecision, UpdateEventRequest};

#[tokio::test]
async fn test_sweep_reminds_approved_participants_once() {
    let ctx = TestContext::new();
    let manager = ctx.manager("Mai").await;
    let approved = ctx.volunteer("Tuan").await;
    let pending = ctx.volunteer("Hoa").await;
    ctx.subscribe(&approved).await;
    ctx.subscribe(&pending).await;

    let soon = ctx.create_event_from(&manager, event_request_at(Utc::now() + Duration::hours(5), 10)).await;
    let later = ctx.create_event_from(&manager, event_request_at(Utc::now() + Duration::days(3), 10)).await;
    for event_id in [soon.id, later.id] {
        ctx.services.participation.register(&actor(&approved), event_id).await.unwrap();
        ctx.services
            .participation
            .review(&actor(&manager), event_id, approved.id, ReviewDecision::Approve)
            .await
            .unwrap();
    }
    ctx.services.participation.register(&actor(&pending), soon.id).await.unwrap();

    let report = assert_ok!(ctx.services.reminders.sweep(Utc::now()).await);
    assert_eq!(report.events, 1);
    assert_eq!(report.failed_events, 0);
    assert_eq!(report.push.sent, 1);

    let pushed = ctx.push.delivered_to(approved.id);
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].payload.title, format!("Starting soon: {}", soon.title));
    assert!(pushed[0].payload.body.contains("starts in 5 hours"));
    assert_eq!(pushed[0].payload.url.as_deref(), Some(format!("/events/{}", soon.id).as_str()));
    assert!(ctx.push.delivered_to(pending.id).is_empty());
    assert!(ctx.event(soon.id).await.reminder_sent);
    assert!(!ctx.event(later.id).await.reminder_sent);

    let again = assert_ok!(ctx.services.reminders.sweep(Utc::now()).await);
    assert_eq!(again.events, 0);
    assert_eq!(ctx.push.delivered().len(), 1);
}

#[tokio::test]
async fn test_rescheduling_rearms_reminder() {
    let ctx = TestContext::new();
    let manager = ctx.manager("Lan").await;
    let event = ctx.create_event_from(&manager, event_request_at(Utc::now() + Duration::hours(2), 10)).await;

    let report = assert_ok!(ctx.services.reminders.sweep(Utc::now()).await);
    assert_eq!(report.events, 1);
    assert!(ctx.event(event.id).await.reminder_sent);

    let update = UpdateEventRequest {
        event_date: Some(Utc::now() + Duration::hours(10)),
        ..Default::default()
    };
    ctx.services.events.update(&actor(&manager), event.id, update).await.unwrap();
    assert!(!ctx.event(event.id).await.reminder_sent);

    let report = assert_ok!(ctx.services.reminders.sweep(Utc::now()).await);
    assert_eq!(report.events, 1);
}

#[tokio::test]
async fn test_reminder_text() {
    let ctx = TestContext::new();
    let manager = ctx.manager("Quang").await;
    let now = Utc::now();
    let event = ctx.create_event_from(&manager, event_request_at(now + Duration::minutes(40), 10)).await;

    let (title, body) = ctx.services.reminders.reminder_text(&event, now);
    assert_eq!(title, "Starting soon: Riverside cleanup");
    assert_eq!(body, "\"Riverside cleanup\" starts within the hour at Long Bien.");

    let (_, body) = ctx.services.reminders.reminder_text(&event, now - Duration::hours(2));
    assert_eq!(body, "\"Riverside cleanup\" starts in 3 hours at Long Bien.");
}

#[tokio::test]
async fn test_overlapping_sweeps_are_skipped() {
    let ctx = TestContext::new();
    let reminders = &ctx.services.reminders;

    let guard = reminders.begin().expect("first sweep should claim the flag");
    assert!(reminders.begin().is_none());
    assert!(reminders.try_sweep(Utc::now()).await.is_none());

    drop(guard);
    let report = reminders.try_sweep(Utc::now()).await;
    assert!(matches!(report, Some(Ok(_))));
    assert!(reminders.begin().is_some());
}

#[tokio::test]
async fn test_failing_event_does_not_abort_sweep() {
    let ctx = TestContext::new();
    let manager = ctx.manager("Vy").await;
    let volunteer = ctx.volunteer("Long").await;
    ctx.subscribe(&volunteer).await;

    let broken = ctx.create_event_from(&manager, event_request_at(Utc::now() + Duration::hours(3), 10)).await;
    let healthy = ctx.create_event_from(&manager, event_request_at(Utc::now() + Duration::hours(4), 10)).await;
    ctx.services.participation.register(&actor(&volunteer), healthy.id).await.unwrap();
    ctx.services
        .participation
        .review(&actor(&manager), healthy.id, volunteer.id, ReviewDecision::Approve)
        .await
        .unwrap();
    ctx.faults.break_event(broken.id);

    let report = assert_ok!(ctx.services.reminders.sweep(Utc::now()).await);
    assert_eq!(report.events, 1);
    assert_eq!(report.failed_events, 1);
    assert_eq!(report.push.sent, 1);
    assert_eq!(ctx.push.delivered_to(volunteer.id)[0].payload.url.as_deref(), Some(format!("/events/{}", healthy.id).as_str()));
    assert!(ctx.event(healthy.id).await.reminder_sent);
    assert!(!ctx.event(broken.id).await.reminder_sent);
}

#[tokio::test]
async fn test_shutdown_waits_for_running_sweep() {
    let ctx = TestContext::new();
    let manager = ctx.manager("Hung").await;
    let event = ctx.create_event_from(&manager, event_request_at(Utc::now() + Duration::hours(2), 10)).await;
    ctx.faults.stall_reminder_query(std::time::Duration::from_millis(300));

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(ctx.services.reminders.clone().run(std::time::Duration::from_secs(3600), cancel.clone()));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cancel.cancel();

    assert_ok!(sweeper.await);
    assert!(ctx.event(event.id).await.reminder_sent);
}
