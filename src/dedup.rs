//! Collapses repeated snapshots of the same citation into one record.

use std::collections::HashMap;

use crate::record::FineRecord;

/// Keeps one record per `citation_id`.
///
/// The record with the latest `query_date` wins. A missing query date ranks
/// below any present one, and ties go to the record seen last. Output keeps
/// the input position of each winner.
pub fn deduplicate(records: Vec<FineRecord>) -> Vec<FineRecord> {
    let mut winners: HashMap<&str, usize> = HashMap::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        winners
            .entry(record.citation_id.as_str())
            .and_modify(|best| {
                if record.query_date >= records[*best].query_date {
                    *best = idx;
                }
            })
            .or_insert(idx);
    }

    let mut keep = vec![false; records.len()];
    for idx in winners.into_values() {
        keep[idx] = true;
    }

    records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PaymentStatus;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn record(id: &str, query: Option<(i32, u32, u32)>, status: PaymentStatus) -> FineRecord {
        FineRecord {
            citation_id: id.to_string(),
            infraction_date: None,
            query_date: query.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            amount_due: 0.0,
            payment_status: status,
            location: "Unknown".to_string(),
            vehicle_plate: None,
            infraction_code: None,
            infraction_description: None,
            original_amount: None,
        }
    }

    #[test]
    fn test_latest_query_date_wins() {
        let out = deduplicate(vec![
            record("A1", Some((2024, 2, 1)), PaymentStatus::Paid),
            record("A1", Some((2024, 1, 1)), PaymentStatus::Unpaid),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_tie_goes_to_last_in_input() {
        let out = deduplicate(vec![
            record("A1", Some((2024, 1, 1)), PaymentStatus::Unpaid),
            record("A1", Some((2024, 1, 1)), PaymentStatus::Paid),
        ]);
        assert_eq!(out[0].payment_status, PaymentStatus::Paid);

        let out = deduplicate(vec![
            record("A1", None, PaymentStatus::Unpaid),
            record("A1", None, PaymentStatus::Paid),
        ]);
        assert_eq!(out[0].payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_missing_query_date_ranks_lowest() {
        let out = deduplicate(vec![
            record("A1", Some((2024, 2, 1)), PaymentStatus::Paid),
            record("A1", None, PaymentStatus::Unpaid),
            record("A1", Some((2024, 1, 1)), PaymentStatus::Unpaid),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_citations_are_unique_and_order_follows_winners() {
        let out = deduplicate(vec![
            record("A1", Some((2024, 1, 1)), PaymentStatus::Unpaid),
            record("B2", Some((2024, 1, 15)), PaymentStatus::Unpaid),
            record("A1", Some((2024, 2, 1)), PaymentStatus::Paid),
            record("C3", None, PaymentStatus::Unpaid),
        ]);
        let ids: Vec<_> = out.iter().map(|r| r.citation_id.as_str()).collect();
        assert_eq!(ids, vec!["B2", "A1", "C3"]);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(Vec::new()).is_empty());
    }
}
