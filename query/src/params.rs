//! Query construction from typed values or raw HTTP parameters.

use serde::Deserialize;

use groundtruth_store::{GeoFilter, ReportFilter};
use groundtruth_types::{GeoPoint, ReportStatus, ValidationError};

/// Radius applied when a proximity query does not name one: 5 km.
pub const DEFAULT_RADIUS_METERS: f64 = 5_000.0;

/// Restrict results to a circle on the Earth's surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearQuery {
    center: GeoPoint,
    radius_meters: f64,
}

impl NearQuery {
    /// `radius_meters` defaults to [`DEFAULT_RADIUS_METERS`]; an explicit
    /// radius must be a positive, finite number of meters.
    pub fn new(center: GeoPoint, radius_meters: Option<f64>) -> Result<Self, ValidationError> {
        let radius_meters = match radius_meters {
            None => DEFAULT_RADIUS_METERS,
            Some(r) if r.is_finite() && r > 0.0 => r,
            Some(r) => return Err(ValidationError::InvalidRadius(r)),
        };
        Ok(Self {
            center,
            radius_meters,
        })
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }
}

/// A report query. The empty query returns every report.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
    pub near: Option<NearQuery>,
}

impl ReportQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ReportStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn near(mut self, near: NearQuery) -> Self {
        self.near = Some(near);
        self
    }

    /// Build a query from raw request parameters.
    ///
    /// Proximity applies only when both `lat` and `long` are given. A
    /// missing, non-numeric or non-positive `radius` falls back to
    /// [`DEFAULT_RADIUS_METERS`]. Blank values count as absent.
    pub fn from_params(params: &QueryParams) -> Result<Self, ValidationError> {
        let status = match present(&params.status) {
            Some(s) => Some(s.parse::<ReportStatus>()?),
            None => None,
        };

        let near = match (present(&params.lat), present(&params.long)) {
            (Some(lat), Some(long)) => {
                let center = GeoPoint::new(number("lat", lat)?, number("long", long)?)?;
                let radius = present(&params.radius)
                    .and_then(|r| r.parse::<f64>().ok())
                    .filter(|r| r.is_finite() && *r > 0.0);
                Some(NearQuery::new(center, radius)?)
            }
            _ => None,
        };

        Ok(Self { status, near })
    }

    pub fn to_filter(&self) -> ReportFilter {
        ReportFilter {
            status: self.status,
            near: self.near.map(|n| GeoFilter {
                center: n.center,
                radius_meters: n.radius_meters,
            }),
        }
    }
}

/// Query-string parameters of `GET /reports`, as received.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryParams {
    pub status: Option<String>,
    pub lat: Option<String>,
    pub long: Option<String>,
    pub radius: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}
