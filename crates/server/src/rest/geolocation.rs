use axum::extract::State;
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, GeoPoint, GeolocationCheckRequest, GeolocationCheckResponse, JurisdictionBounds,
};

use crate::extract::Json;
use crate::auth::extractors::AuthRequired;

/// POST /api/geolocation/check
///
/// Evaluates a point against the configured jurisdiction. Nothing is stored.
#[utoipa::path(
    post,
    path = "/api/geolocation/check",
    request_body = GeolocationCheckRequest,
    responses(
        (status = 200, description = "Jurisdiction evaluation", body = GeolocationCheckResponse),
        (status = 400, description = "Coordinates out of range", body = AppError)
    ),
    tag = "geolocation"
)]
#[tracing::instrument(skip(pool, _auth))]
pub async fn check_location(
    State(pool): State<Pool<Postgres>>,
    _auth: AuthRequired,
    Json(body): Json<GeolocationCheckRequest>,
) -> Result<Json<GeolocationCheckResponse>, AppError> {
    let point = GeoPoint::new(body.latitude, body.longitude)?;
    let bounds = crate::repo::company_config::get(&pool).await?.bounds();

    Ok(Json(GeolocationCheckResponse {
        point,
        within_jurisdiction: JurisdictionBounds::check(bounds.as_ref(), &point),
        bounds,
    }))
}
