use crate::analyzers::types::{
    InfractionRollup, LocationRollup, PeriodBucket, PeriodUnit, VehicleRollup, WeekdayCount,
};
use crate::metrics::local_today;
use crate::record::FineRecord;
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Running count and amount for one group.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    count: usize,
    total: f64,
}

impl Tally {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.total += amount;
    }
}

/// Larger first. Totals are always finite, so `total_cmp` agrees with `>`.
fn desc_f64(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Fines per plate for the current local calendar year.
pub fn aggregate_by_vehicle(records: &[FineRecord]) -> Vec<VehicleRollup> {
    aggregate_by_vehicle_in_year(records, local_today().year())
}

/// Fines per plate whose infraction happened in `year`, most fined first.
///
/// Ordered by count, then total, both descending, then by plate. Records
/// without a plate or an infraction date are skipped.
pub fn aggregate_by_vehicle_in_year(records: &[FineRecord], year: i32) -> Vec<VehicleRollup> {
    let mut groups: HashMap<&str, Tally> = HashMap::new();

    for record in records {
        let Some(plate) = record.vehicle_plate.as_deref() else {
            continue;
        };
        if record.infraction_date.is_none_or(|d| d.year() != year) {
            continue;
        }
        groups.entry(plate).or_default().add(record.amount_due);
    }

    let mut rollups: Vec<VehicleRollup> = groups
        .into_iter()
        .map(|(plate, tally)| VehicleRollup {
            plate: plate.to_string(),
            count: tally.count,
            total: tally.total,
        })
        .collect();

    rollups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| desc_f64(a.total, b.total))
            .then_with(|| a.plate.cmp(&b.plate))
    });
    rollups
}

/// Occurrences per (code, description), most frequent first.
///
/// The full ordering is returned; truncation is up to the caller. Records
/// without a code are skipped and a missing description groups as `""`.
pub fn aggregate_by_infraction(records: &[FineRecord]) -> Vec<InfractionRollup> {
    let mut groups: HashMap<(&str, &str), usize> = HashMap::new();

    for record in records {
        let Some(code) = record.infraction_code.as_deref() else {
            continue;
        };
        let description = record.infraction_description.as_deref().unwrap_or("");
        *groups.entry((code, description)).or_default() += 1;
    }

    let mut rollups: Vec<InfractionRollup> = groups
        .into_iter()
        .map(|((code, description), count)| InfractionRollup {
            code: code.to_string(),
            description: description.to_string(),
            count,
        })
        .collect();

    rollups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.description.cmp(&b.description))
    });
    rollups
}

/// Fines per location, largest total first.
pub fn aggregate_by_location(records: &[FineRecord]) -> Vec<LocationRollup> {
    let mut groups: HashMap<&str, Tally> = HashMap::new();

    for record in records {
        groups
            .entry(record.location.as_str())
            .or_default()
            .add(record.amount_due);
    }

    let mut rollups: Vec<LocationRollup> = groups
        .into_iter()
        .map(|(location, tally)| LocationRollup {
            location: location.to_string(),
            count: tally.count,
            total: tally.total,
        })
        .collect();

    rollups.sort_by(|a, b| {
        desc_f64(a.total, b.total)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.location.cmp(&b.location))
    });
    rollups
}

/// First day of the week (Monday) or month containing `date`.
pub fn period_start(date: NaiveDate, unit: PeriodUnit) -> NaiveDate {
    match unit {
        PeriodUnit::Week => date - Days::new(u64::from(date.weekday().num_days_from_monday())),
        PeriodUnit::Month => date.with_day(1).unwrap_or(date),
    }
}

fn next_period(start: NaiveDate, unit: PeriodUnit) -> Option<NaiveDate> {
    match unit {
        PeriodUnit::Week => start.checked_add_days(Days::new(7)),
        PeriodUnit::Month => start.checked_add_months(Months::new(1)),
    }
}

/// Dense series spanning the earliest to the latest infraction date.
/// Empty when no record has an infraction date.
pub fn aggregate_by_period(records: &[FineRecord], unit: PeriodUnit) -> Vec<PeriodBucket> {
    let dates = records.iter().filter_map(|r| r.infraction_date);
    let (Some(start), Some(end)) = (dates.clone().min(), dates.max()) else {
        return Vec::new();
    };
    aggregate_by_period_in_range(records, unit, start, end)
}

/// One bucket for every week or month touching `start..=end`, zero-filled.
///
/// Records with an infraction date outside the range, or none at all, are
/// ignored.
pub fn aggregate_by_period_in_range(
    records: &[FineRecord],
    unit: PeriodUnit,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<PeriodBucket> {
    if start > end {
        return Vec::new();
    }

    let mut buckets: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    let last = period_start(end, unit);
    let mut cursor = Some(period_start(start, unit));
    while let Some(bucket) = cursor.filter(|b| *b <= last) {
        buckets.insert(bucket, Tally::default());
        cursor = next_period(bucket, unit);
    }

    for record in records {
        let Some(date) = record.infraction_date else {
            continue;
        };
        if date < start || date > end {
            continue;
        }
        if let Some(tally) = buckets.get_mut(&period_start(date, unit)) {
            tally.add(record.amount_due);
        }
    }

    buckets
        .into_iter()
        .map(|(period_start, tally)| PeriodBucket {
            period_start,
            count: tally.count,
            total: tally.total,
        })
        .collect()
}

/// Seven entries, Monday through Sunday, zero where nothing happened.
pub fn aggregate_by_weekday(records: &[FineRecord]) -> Vec<WeekdayCount> {
    let mut counts = [0usize; 7];
    for date in records.iter().filter_map(|r| r.infraction_date) {
        counts[date.weekday().num_days_from_monday() as usize] += 1;
    }

    let mut weekday = Weekday::Mon;
    counts
        .iter()
        .map(|&count| {
            let entry = WeekdayCount { weekday, count };
            weekday = weekday.succ();
            entry
        })
        .collect()
}

/// Keeps the first `n` entries of an ordered rollup.
pub fn top_n<T>(mut rollups: Vec<T>, n: usize) -> Vec<T> {
    rollups.truncate(n);
    rollups
}
