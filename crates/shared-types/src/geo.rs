use serde::{Deserialize, Serialize};

use crate::AppError;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AppError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::invalid_field(
                "latitude",
                "latitude must be between -90 and 90",
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::invalid_field(
                "longitude",
                "longitude must be between -180 and 180",
            ));
        }
        Ok(Self { latitude, longitude })
    }

    /// Coordinates must come as a pair. Returns `Ok(None)` when both are absent.
    pub fn from_optional(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, AppError> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).map(Some),
            (None, None) => Ok(None),
            (Some(_), None) => Err(AppError::invalid_field(
                "longitude",
                "longitude is required when latitude is provided",
            )),
            (None, Some(_)) => Err(AppError::invalid_field(
                "latitude",
                "latitude is required when longitude is provided",
            )),
        }
    }
}

/// The rectangular area a client must stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JurisdictionBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl JurisdictionBounds {
    /// Edges count as inside.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.min_latitude
            && point.latitude <= self.max_latitude
            && point.longitude >= self.min_longitude
            && point.longitude <= self.max_longitude
    }

    /// Assemble bounds from the four nullable configuration columns.
    ///
    /// All four must be set or all four absent; each minimum must be
    /// strictly below its maximum.
    pub fn from_parts(
        min_latitude: Option<f64>,
        max_latitude: Option<f64>,
        min_longitude: Option<f64>,
        max_longitude: Option<f64>,
    ) -> Result<Option<Self>, AppError> {
        match (min_latitude, max_latitude, min_longitude, max_longitude) {
            (None, None, None, None) => Ok(None),
            (Some(min_lat), Some(max_lat), Some(min_lng), Some(max_lng)) => {
                let low = GeoPoint::new(min_lat, min_lng)?;
                let high = GeoPoint::new(max_lat, max_lng)?;
                if low.latitude >= high.latitude {
                    return Err(AppError::invalid_field(
                        "min_latitude",
                        "min_latitude must be less than max_latitude",
                    ));
                }
                if low.longitude >= high.longitude {
                    return Err(AppError::invalid_field(
                        "min_longitude",
                        "min_longitude must be less than max_longitude",
                    ));
                }
                Ok(Some(Self {
                    min_latitude: min_lat,
                    max_latitude: max_lat,
                    min_longitude: min_lng,
                    max_longitude: max_lng,
                }))
            }
            _ => Err(AppError::invalid_field(
                "jurisdiction",
                "all four jurisdiction bounds must be provided together",
            )),
        }
    }

    /// `None` when no jurisdiction is configured.
    pub fn check(bounds: Option<&Self>, point: &GeoPoint) -> Option<bool> {
        bounds.map(|b| b.contains(point))
    }
}

/// Request body for an ad-hoc jurisdiction check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeolocationCheckRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeolocationCheckResponse {
    pub point: GeoPoint,
    /// `null` when the company has not configured a jurisdiction.
    pub within_jurisdiction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<JurisdictionBounds>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppErrorKind;

    fn county() -> JurisdictionBounds {
        JurisdictionBounds {
            min_latitude: 29.5,
            max_latitude: 30.2,
            min_longitude: -95.9,
            max_longitude: -95.0,
        }
    }

    #[test]
    fn point_inside_bounds() {
        let p = GeoPoint::new(29.76, -95.37).unwrap();
        assert!(county().contains(&p));
    }

    #[test]
    fn point_outside_bounds() {
        let north = GeoPoint::new(31.0, -95.37).unwrap();
        let west = GeoPoint::new(29.76, -96.5).unwrap();
        assert!(!county().contains(&north));
        assert!(!county().contains(&west));
    }

    #[test]
    fn edges_are_inclusive() {
        let b = county();
        let corner = GeoPoint::new(b.min_latitude, b.max_longitude).unwrap();
        let edge = GeoPoint::new(b.max_latitude, -95.5).unwrap();
        assert!(b.contains(&corner));
        assert!(b.contains(&edge));
    }

    #[test]
    fn check_without_bounds_is_unknown() {
        let p = GeoPoint::new(0.0, 0.0).unwrap();
        assert_eq!(JurisdictionBounds::check(None, &p), None);
        assert_eq!(JurisdictionBounds::check(Some(&county()), &p), Some(false));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = GeoPoint::new(91.0, 0.0).unwrap_err();
        assert_eq!(err.kind, AppErrorKind::ValidationError);
        assert!(err.field_errors.contains_key("latitude"));

        let err = GeoPoint::new(0.0, -180.5).unwrap_err();
        assert!(err.field_errors.contains_key("longitude"));

        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn coordinates_must_be_paired() {
        assert_eq!(GeoPoint::from_optional(None, None).unwrap(), None);
        assert!(GeoPoint::from_optional(Some(10.0), Some(20.0)).unwrap().is_some());
        let err = GeoPoint::from_optional(Some(10.0), None).unwrap_err();
        assert!(err.field_errors.contains_key("longitude"));
        let err = GeoPoint::from_optional(None, Some(10.0)).unwrap_err();
        assert!(err.field_errors.contains_key("latitude"));
    }

    #[test]
    fn bounds_all_or_nothing() {
        assert_eq!(JurisdictionBounds::from_parts(None, None, None, None).unwrap(), None);
        let err = JurisdictionBounds::from_parts(Some(1.0), Some(2.0), None, None).unwrap_err();
        assert!(err.field_errors.contains_key("jurisdiction"));
    }

    #[test]
    fn bounds_min_below_max() {
        let err =
            JurisdictionBounds::from_parts(Some(30.0), Some(29.0), Some(-96.0), Some(-95.0))
                .unwrap_err();
        assert!(err.field_errors.contains_key("min_latitude"));
        let err =
            JurisdictionBounds::from_parts(Some(29.0), Some(30.0), Some(-95.0), Some(-95.0))
                .unwrap_err();
        assert!(err.field_errors.contains_key("min_longitude"));
        let ok = JurisdictionBounds::from_parts(Some(29.5), Some(30.2), Some(-95.9), Some(-95.0))
            .unwrap();
        assert_eq!(ok, Some(county()));
    }
}
