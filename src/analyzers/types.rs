//! Data types produced by the aggregation engine.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Serialize, Serializer};

use crate::metrics::Metrics;

/// Fines per vehicle plate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRollup {
    pub plate: String,
    pub count: usize,
    pub total: f64,
}

/// Occurrences per (code, description) classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfractionRollup {
    pub code: String,
    pub description: String,
    pub count: usize,
}

/// Fines per infraction site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRollup {
    pub location: String,
    pub count: usize,
    pub total: f64,
}

/// Calendar bucket width for period series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    /// Monday-based weeks.
    Week,
    Month,
}

/// One bucket of a dense period series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBucket {
    pub period_start: NaiveDate,
    pub count: usize,
    pub total: f64,
}

/// Fines per day of the week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayCount {
    #[serde(serialize_with = "weekday_name")]
    pub weekday: Weekday,
    pub count: usize,
}

fn weekday_name<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A location rollup with its map position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedRollup {
    #[serde(flatten)]
    pub rollup: LocationRollup,
    pub coordinates: Coordinates,
}

/// Everything the dashboard renders, computed from one canonical record set.
#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub metrics: Metrics,
    pub vehicles: Vec<VehicleRollup>,
    pub infractions: Vec<InfractionRollup>,
    pub locations: Vec<LocationRollup>,
    pub period_unit: PeriodUnit,
    pub periods: Vec<PeriodBucket>,
    pub weekdays: Vec<WeekdayCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocated: Option<Vec<LocatedRollup>>,
}
