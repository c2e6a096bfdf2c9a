use crate::analyzers::aggregate::{
    aggregate_by_infraction, aggregate_by_location, aggregate_by_period,
    aggregate_by_vehicle_in_year, aggregate_by_weekday,
};
use crate::analyzers::types::{DashboardReport, PeriodUnit};
use crate::metrics::{compute_metrics_at, local_today};
use crate::record::FineRecord;
use crate::services::geocode::{Geocoder, geolocate};
use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info};

/// Computes metrics and every rollup over `records`, as of today on the
/// local calendar.
pub fn build_report(records: &[FineRecord], unit: PeriodUnit) -> DashboardReport {
    build_report_at(records, unit, local_today())
}

/// Same as [`build_report`] with `today` fixing the current month and year.
///
/// Each rollup is an independent read of `records`.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn build_report_at(
    records: &[FineRecord],
    unit: PeriodUnit,
    today: NaiveDate,
) -> DashboardReport {
    let metrics = compute_metrics_at(records, today);
    debug!(?metrics, "Metrics computed");

    let report = DashboardReport {
        generated_at: Utc::now(),
        metrics,
        vehicles: aggregate_by_vehicle_in_year(records, today.year()),
        infractions: aggregate_by_infraction(records),
        locations: aggregate_by_location(records),
        period_unit: unit,
        periods: aggregate_by_period(records, unit),
        weekdays: aggregate_by_weekday(records),
        geolocated: None,
    };

    info!(
        vehicles = report.vehicles.len(),
        infractions = report.infractions.len(),
        locations = report.locations.len(),
        periods = report.periods.len(),
        "Report built"
    );
    report
}

impl DashboardReport {
    /// Attach map positions for every location the geocoder knows.
    pub fn with_geolocation(mut self, geocoder: &impl Geocoder) -> Self {
        self.geolocated = Some(geolocate(&self.locations, geocoder));
        self
    }
}
