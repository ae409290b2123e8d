use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bonded client of the agency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Client {
    pub id: Uuid,
    /// Login account linked to this client, if the client uses the portal.
    pub user_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub case_number: Option<String>,
    pub bond_amount_cents: i64,
    pub premium_cents: i64,
    /// One of [`CLIENT_STATUSES`].
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Client validation constants ─────────────────────────────────────

/// Valid client status values matching the DB CHECK constraint.
pub const CLIENT_STATUSES: &[&str] = &["active", "inactive", "revoked", "discharged"];

/// Check whether a client status string is valid.
pub fn is_valid_client_status(s: &str) -> bool {
    CLIENT_STATUSES.contains(&s)
}

// ── Client API response ─────────────────────────────────────────────

/// API response shape for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    pub bond_amount_cents: i64,
    pub premium_cents: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Client> for ClientResponse {
    fn from(c: Client) -> Self {
        let full_name = format!("{} {}", c.first_name, c.last_name);
        Self {
            id: c.id.to_string(),
            user_id: c.user_id,
            first_name: c.first_name,
            last_name: c.last_name,
            full_name,
            email: c.email,
            phone: c.phone,
            date_of_birth: c.date_of_birth.map(|d| d.to_string()),
            address: c.address,
            case_number: c.case_number,
            bond_amount_cents: c.bond_amount_cents,
            premium_cents: c.premium_cents,
            status: c.status,
            notes: c.notes,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

// ── Client request types ────────────────────────────────────────────

/// Request to create a new client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct CreateClientRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 100, message = "First name is required"))
    )]
    pub first_name: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 100, message = "Last name is required"))
    )]
    pub last_name: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "Email must be a valid address"))
    )]
    pub email: Option<String>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 32, message = "Phone must be at most 32 characters"))
    )]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub case_number: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 0, message = "Bond amount cannot be negative"))
    )]
    pub bond_amount_cents: i64,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 0, message = "Premium cannot be negative"))
    )]
    pub premium_cents: i64,
    /// Defaults to `active`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Request to update a client. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct UpdateClientRequest {
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 100, message = "First name cannot be empty"))
    )]
    pub first_name: Option<String>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 100, message = "Last name cannot be empty"))
    )]
    pub last_name: Option<String>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "Email must be a valid address"))
    )]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 0, message = "Bond amount cannot be negative"))
    )]
    pub bond_amount_cents: Option<i64>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 0, message = "Premium cannot be negative"))
    )]
    pub premium_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Request to change a client's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateClientStatusRequest {
    pub status: String,
}

/// Query parameters for client listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ClientListParams {
    /// Matches first/last name, email, phone or case number.
    pub q: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
