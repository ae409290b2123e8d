use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, page_offset, AppError, ContactListParams, ContactRequest,
    ContactSubmission, ContactSubmissionResponse, PaginatedResponse,
};

use crate::extract::{Json, Query};
use crate::auth::extractors::{AdminRequired, MaybeAuth};
use crate::contact_forward::ContactForwarder;
use crate::error_convert::ValidateRequest;
use crate::rate_limit::client_ip;
use crate::repo::audit::{self, AuditEntry};

/// Forward in the background and flag the row once the upstream accepts it.
fn spawn_forward(pool: Pool<Postgres>, forwarder: ContactForwarder, submission: ContactSubmission) {
    tokio::spawn(async move {
        match forwarder.forward(&submission).await {
            Ok(()) => {
                if let Err(e) = crate::repo::contact::mark_forwarded(&pool, submission.id).await {
                    tracing::warn!(submission_id = %submission.id, error = %e, "Failed to mark submission forwarded");
                }
            }
            Err(e) => {
                tracing::warn!(submission_id = %submission.id, error = %e, "Contact forward failed");
            }
        }
    });
}

/// POST /api/contact
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message received", body = ContactSubmissionResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 429, description = "Rate limited", body = AppError)
    ),
    tag = "contact"
)]
#[tracing::instrument(skip_all)]
pub async fn submit_contact(
    State(pool): State<Pool<Postgres>>,
    State(contact): State<Option<ContactForwarder>>,
    auth: MaybeAuth,
    headers: HeaderMap,
    Json(body): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactSubmissionResponse>), AppError> {
    body.validate_request()?;

    let submission = crate::repo::contact::create(&pool, &body).await?;

    audit::record(
        &pool,
        AuditEntry::new(auth.0.map(|c| c.sub), "contact.submit", "contact_submission")
            .entity(submission.id)
            .ip(client_ip(&headers)),
    )
    .await;

    if let Some(forwarder) = contact {
        spawn_forward(pool.clone(), forwarder, submission.clone());
    }

    Ok((
        StatusCode::CREATED,
        Json(ContactSubmissionResponse::from(submission)),
    ))
}

/// GET /api/contact
#[utoipa::path(
    get,
    path = "/api/contact",
    params(ContactListParams),
    responses(
        (status = 200, description = "Contact submissions, newest first", body = PaginatedResponse<ContactSubmissionResponse>),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "contact"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_contact_submissions(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Query(params): Query<ContactListParams>,
) -> Result<Json<PaginatedResponse<ContactSubmissionResponse>>, AppError> {
    let (page, limit) = normalize_pagination(params.page, params.limit);
    let (items, total) =
        crate::repo::contact::list(&pool, page_offset(page, limit), limit).await?;

    Ok(Json(
        PaginatedResponse::new(items, page, limit, total).map(ContactSubmissionResponse::from),
    ))
}
