//! Scheduled "starting soon" reminders
//!
//! Each sweep pushes a reminder to the approved participants of every
//! upcoming event starting within the configured window, then flags the
//! event so it is reminded once. Delivery happens before the flag is
//! written, so a crash in between repeats the reminder on the next sweep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use crate::config::ReminderConfig;
use crate::database::EventStore;
use crate::i18n::{I18n, TranslationParams};
use crate::models::{Event, ParticipantStatus};
use crate::services::push::{PushReport, PushService};
use crate::utils::errors::Result;
use crate::utils::helpers::{event_link, hours_until};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub events: usize,
    pub failed_events: usize,
    pub push: PushReport,
}

#[derive(Clone)]
pub struct ReminderService {
    events: Arc<dyn EventStore>,
    push: PushService,
    i18n: Arc<I18n>,
    window: chrono::Duration,
    running: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the sweep ends, however it ends
pub struct SweepGuard {
    running: Arc<AtomicBool>,
}

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl ReminderService {
    pub fn new(events: Arc<dyn EventStore>, push: PushService, i18n: Arc<I18n>, config: &ReminderConfig) -> Self {
        Self {
            events,
            push,
            i18n,
            window: chrono::Duration::hours(config.window_hours),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claim the in-flight flag; `None` while another sweep runs
    pub fn begin(&self) -> Option<SweepGuard> {
        if self.running.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(SweepGuard { running: self.running.clone() })
    }

    /// Sweep unless one is already running
    pub async fn try_sweep(&self, now: DateTime<Utc>) -> Option<Result<SweepReport>> {
        let Some(_guard) = self.begin() else {
            warn!("Previous reminder sweep still running, skipping");
            return None;
        };
        Some(self.sweep(now).await)
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let due = self.events.events_due_for_reminder(now, now + self.window).await?;
        let mut report = SweepReport::default();

        for event in due {
            match self.remind(&event, now).await {
                Ok(push) => {
                    report.events += 1;
                    report.push += push;
                }
                Err(e) => {
                    report.failed_events += 1;
                    error!(event_id = event.id, error = %e, "Failed to send event reminder");
                }
            }
        }

        info!(
            events = report.events,
            failed_events = report.failed_events,
            sent = report.push.sent,
            "Reminder sweep finished"
        );
        Ok(report)
    }

    async fn remind(&self, event: &Event, now: DateTime<Utc>) -> Result<PushReport> {
        let recipients: Vec<i64> = self
            .events
            .participants(event.id)
            .await?
            .into_iter()
            .filter(|p| p.status == ParticipantStatus::Approved)
            .map(|p| p.user_id)
            .collect();

        let (title, body) = self.reminder_text(event, now);
        let report = self.push.send_to_many(&recipients, &title, &body, Some(&event_link(event.id))).await;
        debug!(event_id = event.id, recipients = recipients.len(), "Reminder pushed");

        self.events.mark_reminder_sent(event.id).await?;
        Ok(report)
    }

    /// Title and body in the default language
    pub fn reminder_text(&self, event: &Event, now: DateTime<Utc>) -> (String, String) {
        let lang = self.i18n.default_language();
        let mut params = TranslationParams::new();
        params.insert("event_title".to_string(), event.title.clone());
        params.insert("location".to_string(), event.location.clone());

        let title = self.i18n.t("reminders.title", lang, Some(&params));
        let hours = hours_until(now, event.event_date);
        let body = if hours <= 1 {
            self.i18n.t("reminders.within_hour", lang, Some(&params))
        } else {
            self.i18n.tp("reminders.starts_in", lang, hours, Some(&params))
        };
        (title, body)
    }

    /// Sweep on a fixed interval until cancelled, then wait for the sweep in flight
    pub async fn run(self, interval: Duration, cancel: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "Reminder sweep started");
        let mut ticker = tokio::time::interval(interval);
        let sweeps = TaskTracker::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Reminder sweep stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let service = self.clone();
                    sweeps.spawn(async move {
                        if let Some(Err(e)) = service.try_sweep(Utc::now()).await {
                            error!(error = %e, "Reminder sweep failed");
                        }
                    });
                }
            }
        }

        sweeps.close();
        sweeps.wait().await;
        debug!("Reminder sweep stopped");
    }
}
