//! Report filters shared by every backend.

use serde::{Deserialize, Serialize};

use groundtruth_types::{GeoPoint, Report, ReportStatus};

/// Restrict results to reports within `radius_meters` of `center`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoFilter {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl GeoFilter {
    pub fn matches(&self, report: &Report) -> bool {
        report.location.within(&self.center, self.radius_meters)
    }
}

/// Composable report filter. An empty filter matches everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub near: Option<GeoFilter>,
}

impl ReportFilter {
    pub fn matches(&self, report: &Report) -> bool {
        if let Some(status) = self.status {
            if report.status != status {
                return false;
            }
        }
        match &self.near {
            Some(geo) => geo.matches(report),
            None => true,
        }
    }
}

/// Order reports newest first. Equal timestamps keep insertion order
/// reversed (later insert first), using the store-assigned id.
pub fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
}
