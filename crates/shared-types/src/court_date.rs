use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled court appearance for a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CourtDate {
    pub id: Uuid,
    pub client_id: Uuid,
    pub court_name: String,
    pub case_number: Option<String>,
    /// Free text, e.g. "Arraignment", "Pretrial", "Sentencing".
    pub hearing_type: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub location: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const COURT_DATE_STATUSES: &[&str] =
    &["scheduled", "attended", "missed", "rescheduled", "cancelled"];

pub fn is_valid_court_date_status(s: &str) -> bool {
    COURT_DATE_STATUSES.contains(&s)
}

// ── Reminder scheduling ─────────────────────────────────────────────

/// Which reminder offsets (in days before the hearing) are due now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderPlan {
    /// Offset whose notification should be sent; the tightest due offset.
    pub notify_offset: Option<i32>,
    /// Every due offset, all of which are marked as sent.
    pub record_offsets: Vec<i32>,
}

/// Work out which reminder offsets fire for a hearing.
///
/// An offset of `d` days is due once the hearing's calendar date is at
/// most `d` days after today and the hearing has not started yet. Offsets
/// already in `sent` never fire again. When several offsets become due
/// at once (a hearing created close to its date, or a sweep that did not
/// run for a while) the client gets a single notification for the
/// nearest one.
pub fn plan_reminders(
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
    reminder_days: &[i32],
    sent: &[i32],
) -> ReminderPlan {
    if scheduled_at <= now {
        return ReminderPlan::default();
    }
    let days_until = (scheduled_at.date_naive() - now.date_naive()).num_days();

    let mut due: Vec<i32> = reminder_days
        .iter()
        .copied()
        .filter(|d| *d >= 0 && days_until <= *d as i64 && !sent.contains(d))
        .collect();
    due.sort_unstable_by(|a, b| b.cmp(a));
    due.dedup();

    ReminderPlan {
        notify_offset: due.last().copied(),
        record_offsets: due,
    }
}

/// Notification text for a court reminder.
pub fn reminder_message(court_date: &CourtDate) -> String {
    let hearing = court_date.hearing_type.as_deref().unwrap_or("Court appearance");
    let mut msg = format!(
        "{} at {} on {}",
        hearing,
        court_date.court_name,
        court_date.scheduled_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(location) = &court_date.location {
        msg.push_str(&format!(" ({})", location));
    }
    msg
}

// ── API response ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourtDateResponse {
    pub id: String,
    pub client_id: String,
    pub court_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hearing_type: Option<String>,
    pub scheduled_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CourtDate> for CourtDateResponse {
    fn from(c: CourtDate) -> Self {
        Self {
            id: c.id.to_string(),
            client_id: c.client_id.to_string(),
            court_name: c.court_name,
            case_number: c.case_number,
            hearing_type: c.hearing_type,
            scheduled_at: c.scheduled_at.to_rfc3339(),
            location: c.location,
            status: c.status,
            notes: c.notes,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct CreateCourtDateRequest {
    pub client_id: Uuid,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "Court name is required"))
    )]
    pub court_name: String,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub hearing_type: Option<String>,
    /// Must be in the future.
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update. Moving `scheduled_at` does not re-validate it against
/// the current time so past hearings can be corrected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct UpdateCourtDateRequest {
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "Court name cannot be empty"))
    )]
    pub court_name: Option<String>,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub hearing_type: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCourtDateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CourtDateListParams {
    pub client_id: Option<String>,
    pub status: Option<String>,
    /// Only hearings scheduled between now and this many days ahead.
    pub upcoming_days: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Outcome of a reminder sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReminderRunResponse {
    pub court_dates_checked: i64,
    pub reminders_sent: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn nothing_due_far_ahead() {
        let now = noon(2024, 5, 1);
        let plan = plan_reminders(now + Duration::days(30), now, &[7, 3, 1], &[]);
        assert_eq!(plan, ReminderPlan::default());
    }

    #[test]
    fn single_offset_due() {
        let now = noon(2024, 5, 1);
        let plan = plan_reminders(noon(2024, 5, 8), now, &[7, 3, 1], &[]);
        assert_eq!(plan.notify_offset, Some(7));
        assert_eq!(plan.record_offsets, vec![7]);
    }

    #[test]
    fn sent_offsets_are_skipped() {
        let now = noon(2024, 5, 5);
        let plan = plan_reminders(noon(2024, 5, 8), now, &[7, 3, 1], &[7]);
        assert_eq!(plan.notify_offset, Some(3));
        assert_eq!(plan.record_offsets, vec![3]);

        let plan = plan_reminders(noon(2024, 5, 8), now, &[7, 3, 1], &[7, 3]);
        assert_eq!(plan, ReminderPlan::default());
    }

    #[test]
    fn catch_up_collapses_into_nearest_offset() {
        let now = noon(2024, 5, 7);
        let plan = plan_reminders(noon(2024, 5, 8), now, &[7, 3, 1], &[]);
        assert_eq!(plan.notify_offset, Some(1));
        assert_eq!(plan.record_offsets, vec![7, 3, 1]);
    }

    #[test]
    fn zero_offset_fires_on_hearing_day() {
        let now = Utc.with_ymd_and_hms(2024, 5, 8, 7, 0, 0).unwrap();
        let plan = plan_reminders(noon(2024, 5, 8), now, &[0], &[]);
        assert_eq!(plan.notify_offset, Some(0));
    }

    #[test]
    fn past_hearings_never_remind() {
        let now = noon(2024, 5, 9);
        let plan = plan_reminders(noon(2024, 5, 8), now, &[7, 3, 1, 0], &[]);
        assert_eq!(plan, ReminderPlan::default());
    }

    #[test]
    fn message_includes_location() {
        let cd = CourtDate {
            id: Uuid::nil(),
            client_id: Uuid::nil(),
            court_name: "Harris County District Court".into(),
            case_number: None,
            hearing_type: Some("Arraignment".into()),
            scheduled_at: noon(2024, 5, 8),
            location: Some("Courtroom 4B".into()),
            status: "scheduled".into(),
            notes: None,
            created_at: noon(2024, 4, 1),
            updated_at: noon(2024, 4, 1),
        };
        assert_eq!(
            reminder_message(&cd),
            "Arraignment at Harris County District Court on 2024-05-08 12:00 UTC (Courtroom 4B)"
        );
    }
}
