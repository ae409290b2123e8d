use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A payment made against a client's bond premium.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub amount_cents: i64,
    pub method: String,
    pub status: String,
    pub receipt_number: String,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub recorded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Payment validation constants ────────────────────────────────────

pub const PAYMENT_METHODS: &[&str] = &["cash", "card", "check", "bank_transfer", "money_order"];

pub const PAYMENT_STATUSES: &[&str] = &["pending", "completed", "failed", "refunded"];

pub fn is_valid_payment_method(s: &str) -> bool {
    PAYMENT_METHODS.contains(&s)
}

pub fn is_valid_payment_status(s: &str) -> bool {
    PAYMENT_STATUSES.contains(&s)
}

/// Whether a payment may move from `from` to `to`.
///
/// pending -> completed | failed, completed -> refunded. Failed and
/// refunded payments are final.
pub fn can_transition_payment(from: &str, to: &str) -> bool {
    matches!(
        (from, to),
        ("pending", "completed") | ("pending", "failed") | ("completed", "refunded")
    )
}

/// Receipt numbers look like `PMT-20240314-4F7A9C`.
pub fn format_receipt_number(date: NaiveDate, suffix: &str) -> String {
    format!("PMT-{}-{}", date.format("%Y%m%d"), suffix.to_uppercase())
}

// ── Payment API response ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentResponse {
    pub id: String,
    pub client_id: String,
    pub amount_cents: i64,
    pub method: String,
    pub status: String,
    pub receipt_number: String,
    pub paid_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<i64>,
    pub created_at: String,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id.to_string(),
            client_id: p.client_id.to_string(),
            amount_cents: p.amount_cents,
            method: p.method,
            status: p.status,
            receipt_number: p.receipt_number,
            paid_at: p.paid_at.to_rfc3339(),
            notes: p.notes,
            recorded_by: p.recorded_by,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

// ── Payment request types ───────────────────────────────────────────

/// Request from staff to record a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct CreatePaymentRequest {
    pub client_id: Uuid,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 1, message = "Amount must be greater than zero"))
    )]
    pub amount_cents: i64,
    pub method: String,
    /// Defaults to `completed`.
    #[serde(default)]
    pub status: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 1000, message = "Notes must be at most 1000 characters"))
    )]
    pub notes: Option<String>,
}

/// Request from a client to submit a payment for their own bond.
/// Always recorded as `pending` until staff confirm it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct SubmitPaymentRequest {
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 1, message = "Amount must be greater than zero"))
    )]
    pub amount_cents: i64,
    pub method: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 1000, message = "Notes must be at most 1000 characters"))
    )]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdatePaymentStatusRequest {
    pub status: String,
}

/// Query parameters for payment listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PaymentListParams {
    pub client_id: Option<String>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// ── Balance summary ─────────────────────────────────────────────────

/// Per-status payment sums for one client, as read from the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct PaymentTotals {
    pub completed_cents: i64,
    pub refunded_cents: i64,
    pub pending_cents: i64,
    pub payment_count: i64,
}

/// A client's premium versus what has been paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentSummary {
    pub client_id: String,
    pub premium_cents: i64,
    pub total_paid_cents: i64,
    pub total_refunded_cents: i64,
    pub pending_cents: i64,
    pub balance_cents: i64,
    pub payment_count: i64,
}

impl PaymentSummary {
    /// Only completed payments reduce the balance. Refunded payments were
    /// completed once and no longer count. The balance never goes negative.
    pub fn compute(client_id: Uuid, premium_cents: i64, totals: PaymentTotals) -> Self {
        Self {
            client_id: client_id.to_string(),
            premium_cents,
            total_paid_cents: totals.completed_cents,
            total_refunded_cents: totals.refunded_cents,
            pending_cents: totals.pending_cents,
            balance_cents: (premium_cents - totals.completed_cents).max(0),
            payment_count: totals.payment_count,
        }
    }
}
