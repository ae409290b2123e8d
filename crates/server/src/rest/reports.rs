use axum::extract::State;

use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_check_in_overdue, AppError, ClientCompliance, ClientComplianceRow, ComplianceReport,
    DashboardReport, PaymentReport, PaymentReportParams,
};

use crate::extract::{Json, Query};
use crate::auth::extractors::AdminRequired;

/// Default report window, in days, ending today.
const DEFAULT_WINDOW_DAYS: u64 = 30;

/// Resolve the inclusive `[from, to]` date range, defaulting to the last
/// 30 days ending `today`.
fn report_window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let to = to.unwrap_or(today);
    let from = match from {
        Some(from) => from,
        None => to
            .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS - 1))
            .unwrap_or(NaiveDate::MIN),
    };
    if from > to {
        return Err(AppError::invalid_field("from", "from must not be after to"));
    }
    Ok((from, to))
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn compliance_entry(row: ClientComplianceRow, interval_hours: i32, now: DateTime<Utc>) -> ClientCompliance {
    ClientCompliance {
        client_id: row.client_id.to_string(),
        name: format!("{} {}", row.first_name, row.last_name),
        last_check_in_at: row.last_check_in_at.map(|t| t.to_rfc3339()),
        check_in_overdue: is_check_in_overdue(row.last_check_in_at, row.created_at, interval_hours, now),
        violation_count: row.violation_count,
        next_court_date: row.next_court_date.map(|t| t.to_rfc3339()),
    }
}

/// GET /api/reports/dashboard
#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    responses(
        (status = 200, description = "Office-wide counters", body = DashboardReport),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "reports"
)]
#[tracing::instrument(skip(pool))]
pub async fn dashboard(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
) -> Result<Json<DashboardReport>, AppError> {
    Ok(Json(crate::repo::report::dashboard(&pool).await?))
}

/// GET /api/reports/payments
#[utoipa::path(
    get,
    path = "/api/reports/payments",
    params(PaymentReportParams),
    responses(
        (status = 200, description = "Payment totals by status and method", body = PaymentReport),
        (status = 400, description = "Invalid date range", body = AppError)
    ),
    tag = "reports"
)]
#[tracing::instrument(skip(pool))]
pub async fn payment_report(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Query(params): Query<PaymentReportParams>,
) -> Result<Json<PaymentReport>, AppError> {
    let (from, to) = report_window(params.from, params.to, Utc::now().date_naive())?;
    let start = start_of(from);
    let end = to
        .checked_add_days(Days::new(1))
        .map(start_of)
        .unwrap_or_else(|| start_of(NaiveDate::MAX));

    let by_status = crate::repo::report::payments_by_status(&pool, start, end).await?;
    let by_method = crate::repo::report::payments_by_method(&pool, start, end).await?;
    let collected_cents = by_status
        .iter()
        .find(|b| b.key == "completed")
        .map(|b| b.amount_cents)
        .unwrap_or(0);

    Ok(Json(PaymentReport {
        from: from.to_string(),
        to: to.to_string(),
        by_status,
        by_method,
        collected_cents,
    }))
}

/// GET /api/reports/compliance
#[utoipa::path(
    get,
    path = "/api/reports/compliance",
    responses(
        (status = 200, description = "Per-client check-in and court compliance", body = ComplianceReport),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "reports"
)]
#[tracing::instrument(skip(pool))]
pub async fn compliance_report(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
) -> Result<Json<ComplianceReport>, AppError> {
    let config = crate::repo::company_config::get(&pool).await?;
    let rows = crate::repo::report::compliance_rows(&pool).await?;
    let now = Utc::now();

    let clients: Vec<ClientCompliance> = rows
        .into_iter()
        .map(|row| compliance_entry(row, config.check_in_interval_hours, now))
        .collect();
    let overdue_count = clients.iter().filter(|c| c.check_in_overdue).count() as i64;

    Ok(Json(ComplianceReport {
        generated_at: now.to_rfc3339(),
        check_in_interval_hours: config.check_in_interval_hours,
        overdue_count,
        clients,
    }))
}
