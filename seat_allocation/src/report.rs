// Derived views over a finished allotment. Nothing in here changes the
// applicants or the pool.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::config::*;

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64) * 100.0 / (total as f64)
    }
}

// Buckets in basis order, then the "Not Allotted" bucket if requested.
fn preference_stats(
    counts: &BTreeMap<AllotmentBasis, u64>,
    not_allotted: Option<u64>,
    total: u64,
) -> Vec<PreferenceStat> {
    let mut res: Vec<PreferenceStat> = counts
        .iter()
        .map(|(basis, count)| PreferenceStat {
            basis: Some(*basis),
            count: *count,
            percentage: percentage(*count, total),
        })
        .collect();
    if let Some(count) = not_allotted {
        res.push(PreferenceStat {
            basis: None,
            count,
            percentage: percentage(count, total),
        });
    }
    res
}

/// Computes all the reports for a finished allotment.
///
/// The seats taken in each venue are computed both from the pool counters and
/// from the applicants. Any disagreement is reported as an error.
pub fn summarize(
    applicants: &[AllottedApplicant],
    venues: &[VenueSnapshot],
) -> Result<AllotmentReport, AllotmentErrors> {
    let total = applicants.len() as u64;

    let mut overall: BTreeMap<AllotmentBasis, u64> = BTreeMap::new();
    let mut by_venue: HashMap<VenueId, Vec<usize>> = HashMap::new();
    let mut not_allotted: Vec<usize> = Vec::new();
    for (idx, a) in applicants.iter().enumerate() {
        match a.allocation {
            Some(alloc) => {
                *overall.entry(alloc.basis).or_insert(0) += 1;
                by_venue.entry(alloc.venue).or_default().push(idx);
            }
            None => not_allotted.push(idx),
        }
    }
    let total_not_allotted = not_allotted.len() as u64;
    let total_allotted = total - total_not_allotted;
    debug!(
        "summarize: {} applicants, {} allotted, {} not allotted",
        total, total_allotted, total_not_allotted
    );

    let preference_summary = preference_stats(&overall, Some(total_not_allotted), total);

    // Districts in the order of their first venue in the pool.
    let mut district_order: Vec<String> = Vec::new();
    let mut district_counts: HashMap<String, BTreeMap<AllotmentBasis, u64>> = HashMap::new();
    for v in venues.iter() {
        if !district_order.contains(&v.venue.district) {
            district_order.push(v.venue.district.clone());
        }
        for idx in by_venue.get(&v.id).map(|l| l.as_slice()).unwrap_or(&[]) {
            if let Some(alloc) = applicants[*idx].allocation {
                *district_counts
                    .entry(v.venue.district.clone())
                    .or_default()
                    .entry(alloc.basis)
                    .or_insert(0) += 1;
            }
        }
    }
    let district_summary: Vec<DistrictStats> = district_order
        .iter()
        .filter_map(|district| {
            district_counts.get(district).map(|counts| {
                let district_total: u64 = counts.values().sum();
                DistrictStats {
                    district: district.clone(),
                    total: district_total,
                    preferences: preference_stats(counts, None, district_total),
                }
            })
        })
        .collect();

    let mut venue_summary: Vec<VenueStats> = Vec::new();
    let mut attendance: Vec<AttendanceGroup> = Vec::new();
    for v in venues.iter() {
        let members: Vec<usize> = by_venue.get(&v.id).cloned().unwrap_or_default();
        let counted = members.len() as u32;
        let counter = v.allocated();
        if counted != counter {
            return Err(AllotmentErrors::InconsistentVenueCount {
                venue: v.venue.venue_number.clone(),
                counter,
                counted,
            });
        }
        venue_summary.push(VenueStats {
            id: v.id,
            venue: v.venue.clone(),
            raw_capacity: v.raw_capacity,
            effective_capacity: v.effective_capacity,
            allotted: counted,
            remaining: v.remaining,
        });
        if !members.is_empty() {
            attendance.push(AttendanceGroup {
                id: v.id,
                venue: v.venue.clone(),
                members,
            });
        }
    }

    // Allotments that point outside of the pool cannot be matched by the check above.
    let seated: usize = attendance.iter().map(|g| g.members.len()).sum();
    if seated as u64 != total_allotted {
        let stray = by_venue
            .keys()
            .filter(|vid| venues.iter().all(|v| v.id != **vid))
            .min()
            .cloned()
            .unwrap_or(VenueId(0));
        return Err(AllotmentErrors::InconsistentVenueCount {
            venue: format!("#{}", stray.0),
            counter: 0,
            counted: by_venue.get(&stray).map(|l| l.len() as u32).unwrap_or(0),
        });
    }

    Ok(AllotmentReport {
        total_applicants: total,
        total_allotted,
        total_not_allotted,
        total_venues: venues.len() as u64,
        total_seats: venues.iter().map(|v| v.effective_capacity as u64).sum(),
        preference_summary,
        district_summary,
        venue_summary,
        not_allotted,
        attendance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(idx: usize, district: &str, effective: u32, remaining: u32) -> VenueSnapshot {
        VenueSnapshot {
            id: VenueId(idx),
            venue: Venue {
                code: format!("C{}", idx),
                venue_number: format!("V{}", idx),
                centre_name: "Centre".to_string(),
                lab_name: format!("Lab {}", idx),
                district: district.to_string(),
            },
            raw_capacity: effective,
            effective_capacity: effective,
            remaining,
        }
    }

    fn allotted(roll_number: u64, allocation: Option<(usize, u32)>) -> AllottedApplicant {
        AllottedApplicant {
            roll_number,
            applicant: Applicant {
                id: ApplicantId::number(roll_number as i64),
                name: None,
                submitted_at: None,
                preferences: vec![],
                source_row: 0,
            },
            allocation: allocation.map(|(v, p)| Allocation {
                venue: VenueId(v),
                basis: AllotmentBasis::Preference(p),
            }),
        }
    }

    #[test]
    fn summary_percentages() {
        let venues = vec![venue(0, "D1", 2, 0), venue(1, "D2", 3, 2)];
        let applicants = vec![
            allotted(1, Some((0, 1))),
            allotted(2, Some((0, 2))),
            allotted(3, Some((1, 1))),
            allotted(4, None),
        ];
        let report = summarize(&applicants, &venues).unwrap();
        assert_eq!(report.total_applicants, 4);
        assert_eq!(report.total_allotted, 3);
        assert_eq!(report.total_seats, 5);

        let labels: Vec<(String, u64, f64)> = report
            .preference_summary
            .iter()
            .map(|s| (s.label(), s.count, s.percentage))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Preference 1".to_string(), 2, 50.0),
                ("Preference 2".to_string(), 1, 25.0),
                (NOT_ALLOTTED.to_string(), 1, 25.0),
            ]
        );

        assert_eq!(report.district_summary.len(), 2);
        let d1 = &report.district_summary[0];
        assert_eq!(d1.district, "D1");
        assert_eq!(d1.total, 2);
        assert_eq!(d1.preferences[0].percentage, 50.0);
        assert_eq!(d1.preferences[1].percentage, 50.0);
        let d2 = &report.district_summary[1];
        assert_eq!(d2.preferences.len(), 1);
        assert_eq!(d2.preferences[0].percentage, 100.0);

        assert_eq!(report.not_allotted, vec![3]);
        assert_eq!(report.attendance.len(), 2);
        assert_eq!(report.attendance[0].members, vec![0, 1]);
        assert_eq!(report.venue_summary[1].allotted, 1);
        assert_eq!(report.venue_summary[1].remaining, 2);
    }

    #[test]
    fn not_allotted_bucket_is_always_present() {
        let venues = vec![venue(0, "D1", 1, 0)];
        let applicants = vec![allotted(1, Some((0, 1)))];
        let report = summarize(&applicants, &venues).unwrap();
        let last = report.preference_summary.last().unwrap();
        assert_eq!(last.label(), NOT_ALLOTTED);
        assert_eq!(last.count, 0);
        assert_eq!(last.percentage, 0.0);
    }

    #[test]
    fn empty_venues_have_no_attendance() {
        let venues = vec![venue(0, "D1", 4, 4), venue(1, "D1", 1, 0)];
        let applicants = vec![allotted(1, Some((1, 3)))];
        let report = summarize(&applicants, &venues).unwrap();
        assert_eq!(report.venue_summary.len(), 2);
        assert_eq!(report.attendance.len(), 1);
        assert_eq!(report.attendance[0].id, VenueId(1));
    }

    #[test]
    fn counter_mismatch_is_detected() {
        let venues = vec![venue(0, "D1", 2, 0)];
        let applicants = vec![allotted(1, Some((0, 1)))];
        let err = summarize(&applicants, &venues).unwrap_err();
        assert_eq!(
            err,
            AllotmentErrors::InconsistentVenueCount {
                venue: "V0".to_string(),
                counter: 2,
                counted: 1,
            }
        );
    }

    #[test]
    fn allotment_outside_of_pool_is_detected() {
        let venues = vec![venue(0, "D1", 2, 2)];
        let applicants = vec![allotted(1, Some((4, 1)))];
        assert!(summarize(&applicants, &venues).is_err());
    }

    #[test]
    fn no_applicants() {
        let venues = vec![venue(0, "D1", 2, 2)];
        let report = summarize(&[], &venues).unwrap();
        assert_eq!(report.preference_summary.len(), 1);
        assert_eq!(report.preference_summary[0].percentage, 0.0);
        assert!(report.district_summary.is_empty());
    }
}
