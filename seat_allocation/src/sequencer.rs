use std::cmp::Ordering;

use log::debug;

use crate::config::*;

// Present values come first, missing ones trail.
fn cmp_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts the rows by key, then by timestamp.
///
/// Missing timestamps sort after all the present ones. The sort is stable:
/// rows with the same key and timestamp keep their relative order.
pub fn sort_by_keys<T, K, TS, FK, FT>(mut rows: Vec<T>, key: FK, time: FT) -> Vec<T>
where
    K: Ord,
    TS: Ord,
    FK: Fn(&T) -> K,
    FT: Fn(&T) -> Option<TS>,
{
    rows.sort_by(|a, b| {
        key(a)
            .cmp(&key(b))
            .then_with(|| cmp_nulls_last(&time(a), &time(b)))
    });
    rows
}

/// Sorts the applicants by identifier and submission time, and numbers
/// them from `roll_start` in that order.
pub fn assign_roll_numbers(applicants: Vec<Applicant>, roll_start: u64) -> Vec<RolledApplicant> {
    let sorted = sort_by_keys(applicants, |a| a.id.clone(), |a| a.submitted_at);
    sorted
        .into_iter()
        .enumerate()
        .map(|(pos, applicant)| {
            let roll_number = roll_start + pos as u64;
            debug!(
                "assign_roll_numbers: {} -> applicant {} (row {})",
                roll_number, applicant.id, applicant.source_row
            );
            RolledApplicant {
                roll_number,
                applicant,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> Option<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 3, day).and_then(|d| d.and_hms_opt(10, 0, 0))
    }

    fn applicant(id: ApplicantId, day: Option<u32>, source_row: usize) -> Applicant {
        Applicant {
            id,
            name: None,
            submitted_at: day.and_then(ts),
            preferences: vec![],
            source_row,
        }
    }

    #[test]
    fn sorts_by_id_then_time() {
        let rolled = assign_roll_numbers(
            vec![
                applicant(ApplicantId::number(102), Some(2), 0),
                applicant(ApplicantId::number(101), Some(1), 1),
                applicant(ApplicantId::number(101), Some(3), 2),
            ],
            DEFAULT_ROLL_START,
        );
        let rows: Vec<(u64, usize)> = rolled
            .iter()
            .map(|r| (r.roll_number, r.applicant.source_row))
            .collect();
        assert_eq!(rows, vec![(7100001, 1), (7100002, 2), (7100003, 0)]);
    }

    #[test]
    fn missing_times_sort_last() {
        let rolled = assign_roll_numbers(
            vec![
                applicant(ApplicantId::number(5), None, 0),
                applicant(ApplicantId::number(5), Some(9), 1),
                applicant(ApplicantId::number(5), Some(4), 2),
            ],
            1,
        );
        let rows: Vec<usize> = rolled.iter().map(|r| r.applicant.source_row).collect();
        assert_eq!(rows, vec![2, 1, 0]);
    }

    #[test]
    fn identical_keys_keep_input_order() {
        let input: Vec<Applicant> = (0..20)
            .map(|idx| applicant(ApplicantId::Text("A".to_string()), Some(7), idx))
            .chain((20..25).map(|idx| applicant(ApplicantId::Text("A".to_string()), None, idx)))
            .collect();
        let rolled = assign_roll_numbers(input, 1);
        let rows: Vec<usize> = rolled.iter().map(|r| r.applicant.source_row).collect();
        assert_eq!(rows, (0..25).collect::<Vec<usize>>());
    }

    #[test]
    fn numbers_before_text_before_missing() {
        let rolled = assign_roll_numbers(
            vec![
                applicant(ApplicantId::Missing, Some(1), 0),
                applicant(ApplicantId::Text("A7".to_string()), Some(1), 1),
                applicant(ApplicantId::number(99), Some(1), 2),
                applicant(ApplicantId::number(102), Some(1), 3),
            ],
            1,
        );
        let rows: Vec<usize> = rolled.iter().map(|r| r.applicant.source_row).collect();
        assert_eq!(rows, vec![2, 3, 1, 0]);
    }

    #[test]
    fn roll_numbers_are_contiguous() {
        let input: Vec<Applicant> = (0..50)
            .map(|idx| applicant(ApplicantId::number((idx * 7919 % 31) as i64), Some(1), idx))
            .collect();
        let rolled = assign_roll_numbers(input, 42);
        let rolls: Vec<u64> = rolled.iter().map(|r| r.roll_number).collect();
        assert_eq!(rolls, (42..92).collect::<Vec<u64>>());
    }

    #[test]
    fn generic_sort() {
        let rows = vec![("b", Some(1)), ("a", None), ("a", Some(2)), ("b", None)];
        let sorted = sort_by_keys(rows, |r| r.0, |r| r.1);
        assert_eq!(
            sorted,
            vec![("a", Some(2)), ("a", None), ("b", Some(1)), ("b", None)]
        );
    }
}
