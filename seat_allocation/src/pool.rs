use log::debug;

use crate::config::*;

#[derive(Eq, PartialEq, Debug, Clone)]
struct PoolEntry {
    venue: Venue,
    raw_capacity: u32,
    effective_capacity: u32,
    // Invariant: remaining <= effective_capacity
    remaining: u32,
}

/// The venues available for allotment, with their remaining seats.
///
/// The venues are kept in the order of the venue table. This order is the
/// tie-break between venues of the same district: the earliest listed venue
/// fills up first.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CapacityPool {
    entries: Vec<PoolEntry>,
}

/// Reads the declared capacity of a venue.
///
/// Fractional values are truncated. Returns None for anything that does not
/// give at least one seat.
pub fn parse_capacity(raw: &str) -> Option<u32> {
    let x: f64 = raw.trim().parse().ok()?;
    if !x.is_finite() {
        return None;
    }
    let x = x.floor();
    if x < 1.0 {
        return None;
    }
    Some(x.min(u32::MAX as f64) as u32)
}

impl CapacityPool {
    pub fn new(records: &[VenueRecord], buffer: BufferFraction) -> CapacityPool {
        let mut entries: Vec<PoolEntry> = Vec::new();
        for (idx, r) in records.iter().enumerate() {
            let raw_capacity = match parse_capacity(&r.capacity) {
                Some(x) => x,
                None => {
                    debug!(
                        "CapacityPool::new: row {}: skipping venue {:?} with capacity {:?}",
                        idx, r.venue_number, r.capacity
                    );
                    continue;
                }
            };
            let effective_capacity = buffer.apply(raw_capacity);
            entries.push(PoolEntry {
                venue: Venue {
                    code: r.code.clone(),
                    venue_number: r.venue_number.clone(),
                    centre_name: r.centre_name.clone(),
                    lab_name: r.lab_name.clone(),
                    district: r.district.clone(),
                },
                raw_capacity,
                effective_capacity,
                remaining: effective_capacity,
            });
        }
        CapacityPool { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sum of the effective capacities.
    pub fn total_seats(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.effective_capacity as u64)
            .sum()
    }

    pub fn venue(&self, id: VenueId) -> Option<&Venue> {
        self.entries.get(id.0).map(|e| &e.venue)
    }

    /// The first venue of the district, in table order, that still has a seat.
    pub fn find_seat(&self, district: &str) -> Option<VenueId> {
        self.entries
            .iter()
            .position(|e| e.remaining > 0 && e.venue.district == district)
            .map(VenueId)
    }

    /// The first venue, in table order, that still has a seat.
    pub fn find_any_seat(&self) -> Option<VenueId> {
        self.entries
            .iter()
            .position(|e| e.remaining > 0)
            .map(VenueId)
    }

    /// Takes one seat in the venue.
    ///
    /// Panics if the venue does not exist or is already full: callers must
    /// obtain the venue from `find_seat` or `find_any_seat` first.
    pub fn allocate(&mut self, id: VenueId) {
        let entry = &mut self.entries[id.0];
        assert!(
            entry.remaining > 0,
            "Allocating in full venue {:?}",
            entry.venue
        );
        entry.remaining -= 1;
    }

    pub fn snapshot(&self) -> Vec<VenueSnapshot> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, e)| VenueSnapshot {
                id: VenueId(idx),
                venue: e.venue.clone(),
                raw_capacity: e.raw_capacity,
                effective_capacity: e.effective_capacity,
                remaining: e.remaining,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(venue_number: &str, district: &str, capacity: &str) -> VenueRecord {
        VenueRecord {
            code: format!("C-{}", venue_number),
            venue_number: venue_number.to_string(),
            centre_name: "Centre".to_string(),
            lab_name: format!("Lab {}", venue_number),
            district: district.to_string(),
            capacity: capacity.to_string(),
        }
    }

    #[test]
    fn capacity_parsing() {
        assert_eq!(parse_capacity("30"), Some(30));
        assert_eq!(parse_capacity(" 12 "), Some(12));
        assert_eq!(parse_capacity("30.7"), Some(30));
        assert_eq!(parse_capacity("0"), None);
        assert_eq!(parse_capacity("0.5"), None);
        assert_eq!(parse_capacity("-4"), None);
        assert_eq!(parse_capacity(""), None);
        assert_eq!(parse_capacity("thirty"), None);
        assert_eq!(parse_capacity("NaN"), None);
        assert_eq!(parse_capacity("inf"), None);
    }

    #[test]
    fn buffered_capacity() {
        let half = BufferFraction::new(0.5).unwrap();
        let tenth = BufferFraction::new(0.1).unwrap();
        let pool = CapacityPool::new(&[record("1", "D1", "10")], half);
        assert_eq!(pool.snapshot()[0].effective_capacity, 5);
        assert_eq!(pool.snapshot()[0].raw_capacity, 10);
        // Never less than one seat.
        let pool = CapacityPool::new(&[record("1", "D1", "1")], tenth);
        assert_eq!(pool.snapshot()[0].effective_capacity, 1);
        assert_eq!(pool.total_seats(), 1);
    }

    #[test]
    fn invalid_buffer_fractions() {
        assert!(BufferFraction::new(0.0).is_err());
        assert!(BufferFraction::new(-0.5).is_err());
        assert!(BufferFraction::new(1.5).is_err());
        assert!(BufferFraction::new(f64::NAN).is_err());
        assert!(BufferFraction::new(1.0).is_ok());
    }

    #[test]
    fn excluded_rows() {
        let pool = CapacityPool::new(
            &[
                record("1", "D1", "0"),
                record("2", "D1", "abc"),
                record("3", "D2", "4"),
                record("4", "D2", "-2"),
            ],
            BufferFraction::FULL,
        );
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.venue(VenueId(0)).unwrap().venue_number, "3");
        assert_eq!(pool.total_seats(), 4);
    }

    #[test]
    fn find_seat_uses_table_order() {
        let mut pool = CapacityPool::new(
            &[
                record("1", "D2", "1"),
                record("2", "D1", "1"),
                record("3", "D1", "2"),
            ],
            BufferFraction::FULL,
        );
        assert_eq!(pool.find_seat("D1"), Some(VenueId(1)));
        pool.allocate(VenueId(1));
        assert_eq!(pool.find_seat("D1"), Some(VenueId(2)));
        pool.allocate(VenueId(2));
        pool.allocate(VenueId(2));
        assert_eq!(pool.find_seat("D1"), None);
        assert_eq!(pool.find_seat("D9"), None);
        assert_eq!(pool.find_any_seat(), Some(VenueId(0)));
        pool.allocate(VenueId(0));
        assert_eq!(pool.find_any_seat(), None);

        let snap = pool.snapshot();
        assert!(snap.iter().all(|v| v.remaining == 0));
        assert_eq!(snap[2].allocated(), 2);
    }

    #[test]
    #[should_panic]
    fn allocate_in_full_venue() {
        let mut pool = CapacityPool::new(&[record("1", "D1", "1")], BufferFraction::FULL);
        pool.allocate(VenueId(0));
        pool.allocate(VenueId(0));
    }
}
