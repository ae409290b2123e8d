use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which policy document is being acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDocument {
    Privacy,
    Terms,
}

impl PolicyDocument {
    /// Table holding acknowledgments of this document.
    pub fn table(&self) -> &'static str {
        match self {
            PolicyDocument::Privacy => "privacy_acknowledgments",
            PolicyDocument::Terms => "terms_acknowledgments",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyDocument::Privacy => "privacy",
            PolicyDocument::Terms => "terms",
        }
    }
}

/// A user's acceptance of one version of the privacy policy or terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Acknowledgment {
    pub id: Uuid,
    pub user_id: i64,
    pub version: String,
    pub ip_address: Option<String>,
    pub acknowledged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AcknowledgmentResponse {
    pub document: String,
    pub version: String,
    pub acknowledged_at: String,
}

impl AcknowledgmentResponse {
    pub fn new(document: PolicyDocument, ack: Acknowledgment) -> Self {
        Self {
            document: document.as_str().to_string(),
            version: ack.version,
            acknowledged_at: ack.acknowledged_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct AcknowledgeRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 32, message = "Version is required"))
    )]
    pub version: String,
}

/// Current policy versions and whether the caller has accepted them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AcknowledgmentStatus {
    pub privacy_policy_version: String,
    pub privacy_acknowledged: bool,
    pub terms_version: String,
    pub terms_acknowledged: bool,
}

impl AcknowledgmentStatus {
    pub fn all_acknowledged(&self) -> bool {
        self.privacy_acknowledged && self.terms_acknowledged
    }
}
