//! Batch jobs over the whole client base: court-date reminders and the
//! missed check-in scan. Both run on demand from admin endpoints; the
//! reminder sweep can also run on a timer.

use chrono::Utc;
use serde_json::json;
use sqlx::{Pool, Postgres};
use std::time::Duration;

use shared_types::{
    is_check_in_overdue, plan_reminders, reminder_message, AppError, MissedCheckInScanResponse,
    ReminderPlan, ReminderRunResponse,
};

use crate::error_convert::SqlxErrorExt;
use crate::repo;
use crate::repo::court_date::ReminderCandidate;

pub fn reminder_title(offset_days: i32) -> String {
    match offset_days {
        0 => "Court date today".to_string(),
        1 => "Court date tomorrow".to_string(),
        n => format!("Court date in {n} days"),
    }
}

/// Send due court-date reminders.
///
/// Each (court date, offset) pair is recorded once. When several offsets
/// fall due together only the nearest one produces a notification. A court
/// date whose delivery fails is logged and left unrecorded for the next
/// sweep; the rest still go out.
pub async fn run_reminder_sweep(pool: &Pool<Postgres>) -> Result<ReminderRunResponse, AppError> {
    let config = repo::company_config::get(pool).await?;
    let Some(horizon) = config.reminder_days.iter().copied().max() else {
        return Ok(ReminderRunResponse {
            court_dates_checked: 0,
            reminders_sent: 0,
        });
    };

    let candidates = repo::court_date::reminder_candidates(pool, horizon).await?;
    let now = Utc::now();
    let mut reminders_sent = 0;

    for candidate in &candidates {
        let plan = plan_reminders(
            candidate.court_date.scheduled_at,
            now,
            &config.reminder_days,
            &candidate.sent_offsets,
        );
        if plan.record_offsets.is_empty() {
            continue;
        }

        match deliver_reminder(pool, candidate, &plan).await {
            Ok(true) => reminders_sent += 1,
            Ok(false) => {}
            Err(e) => tracing::error!(
                court_date_id = %candidate.court_date.id,
                error = %e,
                "Failed to send court date reminder"
            ),
        }
    }

    tracing::info!(
        court_dates_checked = candidates.len(),
        reminders_sent,
        "Court date reminder sweep finished"
    );

    Ok(ReminderRunResponse {
        court_dates_checked: candidates.len() as i64,
        reminders_sent,
    })
}

/// Record the due offsets and notify the client in one transaction.
/// Returns whether a notification went out.
async fn deliver_reminder(
    pool: &Pool<Postgres>,
    candidate: &ReminderCandidate,
    plan: &ReminderPlan,
) -> Result<bool, AppError> {
    let court_date = &candidate.court_date;
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let recorded =
        repo::court_date::record_reminders(&mut *tx, court_date.id, &plan.record_offsets).await?;
    if recorded == 0 {
        return Ok(false);
    }

    let sent = match (plan.notify_offset, candidate.client_user_id) {
        (Some(offset), Some(user_id)) => {
            repo::notification::create(
                &mut *tx,
                user_id,
                "court_reminder",
                &reminder_title(offset),
                &reminder_message(court_date),
            )
            .await?;
            true
        }
        _ => {
            tracing::debug!(
                court_date_id = %court_date.id,
                "Reminder recorded without a linked client account"
            );
            false
        }
    };

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(sent)
}

/// Open a `missed_check_in` alert for every active client whose latest
/// check-in (or creation time) is older than the configured interval,
/// unless one is already unresolved.
pub async fn scan_missed_check_ins(
    pool: &Pool<Postgres>,
) -> Result<MissedCheckInScanResponse, AppError> {
    let config = repo::company_config::get(pool).await?;
    let candidates = repo::alert::missed_check_in_candidates(pool).await?;
    let now = Utc::now();
    let mut alerts_created = 0;

    for c in &candidates {
        if c.has_unresolved_alert
            || !is_check_in_overdue(
                c.last_check_in_at,
                c.created_at,
                config.check_in_interval_hours,
                now,
            )
        {
            continue;
        }

        let message = format!(
            "{} {} has not checked in within {} hours",
            c.first_name, c.last_name, config.check_in_interval_hours
        );
        let created = repo::alert::create(
            pool,
            repo::alert::NewAlert {
                client_id: Some(c.client_id),
                alert_type: "missed_check_in",
                severity: "medium",
                message: &message,
                details: json!({
                    "last_check_in_at": c.last_check_in_at.map(|t| t.to_rfc3339()),
                    "check_in_interval_hours": config.check_in_interval_hours,
                }),
            },
        )
        .await;
        match created {
            Ok(_) => alerts_created += 1,
            Err(e) => tracing::error!(
                client_id = %c.client_id,
                error = %e,
                "Failed to open missed check-in alert"
            ),
        }
    }

    tracing::info!(
        clients_checked = candidates.len(),
        alerts_created,
        "Missed check-in scan finished"
    );

    Ok(MissedCheckInScanResponse {
        clients_checked: candidates.len() as i64,
        alerts_created,
    })
}

/// Run the reminder sweep every `period` until the process exits.
pub fn spawn_reminder_loop(pool: Pool<Postgres>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = run_reminder_sweep(&pool).await {
                tracing::error!(error = %e, "Scheduled reminder sweep failed");
            }
        }
    })
}
