mod config;
pub mod pool;
pub mod report;
pub mod sequencer;

pub mod builder;
pub mod manual;

use log::{debug, info};

pub use crate::config::*;
pub use crate::pool::CapacityPool;

/// Runs the full allotment: roll numbers, seats and reports.
///
/// Arguments:
/// * `applicants` the roster, in input order
/// * `venues` the venue/lab master table, in input order. The order matters: the
/// earliest listed venue of a district fills up first.
/// * `rules` the rules for this run
///
/// If the capacity is checked strictly and there are fewer seats than
/// applicants, nothing gets allotted and an error is returned.
pub fn run_allotment(
    applicants: Vec<Applicant>,
    venues: &[VenueRecord],
    rules: &AllotmentRules,
) -> Result<AllotmentResult, AllotmentErrors> {
    info!(
        "Processing {:?} applicants, {:?} venue rows, rules: {:?}",
        applicants.len(),
        venues.len(),
        rules
    );
    if rules.roll_start < 1 {
        return Err(AllotmentErrors::InvalidRollStart(rules.roll_start));
    }
    // The last roll number must be representable.
    let candidates = applicants.len() as u64;
    if rules
        .roll_start
        .checked_add(candidates.saturating_sub(1))
        .is_none()
    {
        return Err(AllotmentErrors::RollNumberOverflow {
            roll_start: rules.roll_start,
            candidates,
        });
    }

    let mut pool = CapacityPool::new(venues, rules.buffer_fraction);
    info!(
        "Capacity pool: {} venues, {} seats",
        pool.len(),
        pool.total_seats()
    );

    // Must happen before the pool is touched.
    if rules.is_strict() && (applicants.len() as u64) > pool.total_seats() {
        return Err(AllotmentErrors::InsufficientCapacity {
            candidates: applicants.len() as u64,
            seats: pool.total_seats(),
        });
    }

    let rolled = sequencer::assign_roll_numbers(applicants, rules.roll_start);
    let allotted = allocate(rolled, &mut pool, rules.allocation_mode);

    let venues = pool.snapshot();
    let report = report::summarize(&allotted, &venues)?;
    info!(
        "Allotted {} of {} applicants ({} not allotted)",
        report.total_allotted, report.total_applicants, report.total_not_allotted
    );
    Ok(AllotmentResult {
        applicants: allotted,
        venues,
        report,
    })
}

/// Seats the applicants, one at a time, in the order given.
///
/// This is a greedy first-fit: an applicant takes the first venue available
/// for the earliest preference that still has a seat, and is never moved
/// afterwards. Applicants processed earlier win ties.
pub fn allocate(
    applicants: Vec<RolledApplicant>,
    pool: &mut CapacityPool,
    mode: AllocationMode,
) -> Vec<AllottedApplicant> {
    let mut res: Vec<AllottedApplicant> = Vec::with_capacity(applicants.len());
    for ra in applicants {
        let allocation = match mode {
            AllocationMode::Preference => find_by_preference(&ra.applicant, pool),
            AllocationMode::RowOrder => pool.find_any_seat().map(|venue| Allocation {
                venue,
                basis: AllotmentBasis::RowOrder,
            }),
        };
        if let Some(alloc) = allocation {
            pool.allocate(alloc.venue);
        }
        debug!(
            "allocate: roll {} applicant {}: {:?}",
            ra.roll_number, ra.applicant.id, allocation
        );
        res.push(AllottedApplicant {
            roll_number: ra.roll_number,
            applicant: ra.applicant,
            allocation,
        });
    }
    res
}

fn find_by_preference(applicant: &Applicant, pool: &CapacityPool) -> Option<Allocation> {
    for (idx, pref) in applicant.preferences.iter().enumerate() {
        let district = match pref.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d,
            // Blank choices are skipped.
            _ => continue,
        };
        // An unknown district and a full district are the same thing here.
        if let Some(venue) = pool.find_seat(district) {
            return Some(Allocation {
                venue,
                basis: AllotmentBasis::Preference((idx + 1) as u32),
            });
        }
    }
    None
}
