use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use shared_types::ContactSubmission;

const DEFAULT_TABLE: &str = "contact_submissions";

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Supabase returned {0}: {1}")]
    Api(u16, String),
}

#[derive(Debug, Serialize)]
struct ForwardedRow<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    message: &'a str,
    submitted_at: String,
    source_id: String,
}

/// Copies contact submissions into a table on a hosted Supabase project
/// through its REST interface.
#[derive(Clone)]
pub struct ContactForwarder {
    http_client: reqwest::Client,
    endpoint: String,
    anon_key: String,
}

impl ContactForwarder {
    pub fn new(base_url: &str, anon_key: impl Into<String>, table: &str) -> Result<Self, ForwardError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ForwardError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            anon_key: anon_key.into(),
        })
    }

    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY` and optionally
    /// `SUPABASE_CONTACT_TABLE`. `None` when not configured.
    pub fn from_env() -> Option<Self> {
        let url = crate::config::env_non_empty("SUPABASE_URL")?;
        let key = crate::config::env_non_empty("SUPABASE_ANON_KEY")?;
        let table = crate::config::env_non_empty("SUPABASE_CONTACT_TABLE")
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        match Self::new(&url, key, &table) {
            Ok(f) => Some(f),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build contact forwarder");
                None
            }
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn forward(&self, submission: &ContactSubmission) -> Result<(), ForwardError> {
        let row = ForwardedRow {
            name: &submission.name,
            email: &submission.email,
            phone: submission.phone.as_deref(),
            message: &submission.message,
            submitted_at: submission.created_at.to_rfc3339(),
            source_id: submission.id.to_string(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| ForwardError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForwardError::Api(status.as_u16(), body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_rest_path() {
        let f = ContactForwarder::new("https://abc.supabase.co/", "anon", "leads").unwrap();
        assert_eq!(f.endpoint(), "https://abc.supabase.co/rest/v1/leads");
    }
}
