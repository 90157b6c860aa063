// ********* Input data structures ***********

use chrono::NaiveDateTime;
use std::error::Error;
use std::fmt::Display;

/// The identifier of an applicant, as found in the roster.
///
/// Identifiers only need to be comparable. Numbers sort before text, and
/// missing identifiers sort after everything else.
///
/// Numbers keep the text they were read from (for example `0042`). It is what
/// gets printed, and it breaks ties between equal values such as `042` and `42`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum ApplicantId {
    Number(i64, String),
    Text(String),
    Missing,
}

impl ApplicantId {
    /// A number written without padding.
    pub fn number(n: i64) -> ApplicantId {
        ApplicantId::Number(n, n.to_string())
    }
}

impl Display for ApplicantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicantId::Number(_, raw) => write!(f, "{}", raw),
            ApplicantId::Text(s) => write!(f, "{}", s),
            ApplicantId::Missing => Ok(()),
        }
    }
}

/// An applicant, as read from the roster and before any numbering.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Applicant {
    pub id: ApplicantId,
    pub name: Option<String>,
    /// Missing or unreadable timestamps are None and sort last.
    pub submitted_at: Option<NaiveDateTime>,
    /// The districts requested by the applicant, most preferred first.
    /// Blank entries are kept as None so that the preference index stays
    /// aligned with the input columns.
    pub preferences: Vec<Option<String>>,
    /// The position of this applicant in the input table.
    pub source_row: usize,
}

/// An applicant after the roll number has been assigned.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RolledApplicant {
    pub roll_number: u64,
    pub applicant: Applicant,
}

/// A venue row, as found in the venue/lab master table.
///
/// The capacity is kept as raw text: the pool decides which rows are usable.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VenueRecord {
    pub code: String,
    pub venue_number: String,
    pub centre_name: String,
    pub lab_name: String,
    pub district: String,
    pub capacity: String,
}

// ******** Allocation data structures *********

/// The position of a venue in the capacity pool.
///
/// The position is also the tie-break order between venues of the same district.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct VenueId(pub usize);

/// The identity of a venue included in the pool.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Venue {
    pub code: String,
    pub venue_number: String,
    pub centre_name: String,
    pub lab_name: String,
    pub district: String,
}

/// How a seat was obtained.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum AllotmentBasis {
    /// The 1-based index of the preference that got the seat.
    Preference(u32),
    /// Seats handed out in venue table order, preferences ignored.
    RowOrder,
}

impl AllotmentBasis {
    pub fn label(&self) -> String {
        match self {
            AllotmentBasis::Preference(idx) => format!("Preference {}", idx),
            AllotmentBasis::RowOrder => "Row Order".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Allocation {
    pub venue: VenueId,
    pub basis: AllotmentBasis,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AllottedApplicant {
    pub roll_number: u64,
    pub applicant: Applicant,
    /// None when no preference could be satisfied.
    pub allocation: Option<Allocation>,
}

/// The state of one venue of the pool.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VenueSnapshot {
    pub id: VenueId,
    pub venue: Venue,
    pub raw_capacity: u32,
    pub effective_capacity: u32,
    pub remaining: u32,
}

impl VenueSnapshot {
    pub fn allocated(&self) -> u32 {
        self.effective_capacity - self.remaining
    }
}

// ******** Output data structures *********

/// One bucket of the preference satisfaction summary.
#[derive(PartialEq, Debug, Clone)]
pub struct PreferenceStat {
    /// None is the "Not Allotted" bucket.
    pub basis: Option<AllotmentBasis>,
    pub count: u64,
    pub percentage: f64,
}

pub const NOT_ALLOTTED: &str = "Not Allotted";

impl PreferenceStat {
    pub fn label(&self) -> String {
        match self.basis {
            Some(b) => b.label(),
            None => NOT_ALLOTTED.to_string(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct DistrictStats {
    pub district: String,
    pub total: u64,
    /// Percentages are relative to the district total.
    pub preferences: Vec<PreferenceStat>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VenueStats {
    pub id: VenueId,
    pub venue: Venue,
    pub raw_capacity: u32,
    pub effective_capacity: u32,
    pub allotted: u32,
    pub remaining: u32,
}

/// The applicants seated in one venue, in roll number order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AttendanceGroup {
    pub id: VenueId,
    pub venue: Venue,
    /// Indices into the list of allotted applicants.
    pub members: Vec<usize>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AllotmentReport {
    pub total_applicants: u64,
    pub total_allotted: u64,
    pub total_not_allotted: u64,
    pub total_venues: u64,
    pub total_seats: u64,
    pub preference_summary: Vec<PreferenceStat>,
    pub district_summary: Vec<DistrictStats>,
    pub venue_summary: Vec<VenueStats>,
    /// Indices into the list of allotted applicants.
    pub not_allotted: Vec<usize>,
    pub attendance: Vec<AttendanceGroup>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AllotmentResult {
    pub applicants: Vec<AllottedApplicant>,
    pub venues: Vec<VenueSnapshot>,
    pub report: AllotmentReport,
}

/// Errors that prevent the allotment from completing.
#[derive(PartialEq, Debug, Clone)]
pub enum AllotmentErrors {
    /// Only raised when the capacity is checked strictly.
    InsufficientCapacity { candidates: u64, seats: u64 },
    InvalidRollStart(u64),
    /// The roll numbers would go past the largest representable value.
    RollNumberOverflow { roll_start: u64, candidates: u64 },
    InvalidBufferFraction(String),
    /// The seat counter of a venue disagrees with the applicants allotted to it.
    InconsistentVenueCount {
        venue: String,
        counter: u32,
        counted: u32,
    },
}

impl Error for AllotmentErrors {}

impl Display for AllotmentErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllotmentErrors::InsufficientCapacity { candidates, seats } => write!(
                f,
                "Capacity insufficient! Candidates: {}, Available seats: {}",
                candidates, seats
            ),
            AllotmentErrors::InvalidRollStart(x) => {
                write!(f, "The first roll number must be at least 1, got {}", x)
            }
            AllotmentErrors::RollNumberOverflow {
                roll_start,
                candidates,
            } => write!(
                f,
                "Cannot number {} applicants starting from {}: the roll numbers are too large",
                candidates, roll_start
            ),
            AllotmentErrors::InvalidBufferFraction(x) => {
                write!(f, "The buffer fraction must be in (0, 1], got {}", x)
            }
            AllotmentErrors::InconsistentVenueCount {
                venue,
                counter,
                counted,
            } => write!(
                f,
                "Venue {}: {} seats taken according to the pool but {} applicants allotted",
                venue, counter, counted
            ),
        }
    }
}

// ********* Configuration **********

pub const DEFAULT_ROLL_START: u64 = 7100001;

/// The fraction of the declared capacity that can be used.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct BufferFraction(f64);

impl BufferFraction {
    pub const FULL: BufferFraction = BufferFraction(1.0);

    pub fn new(x: f64) -> Result<BufferFraction, AllotmentErrors> {
        if x.is_finite() && x > 0.0 && x <= 1.0 {
            Ok(BufferFraction(x))
        } else {
            Err(AllotmentErrors::InvalidBufferFraction(x.to_string()))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// The usable seats of a venue. Never less than one seat.
    pub fn apply(&self, raw_capacity: u32) -> u32 {
        let reduced = (raw_capacity as f64 * self.0).floor() as u32;
        reduced.max(1)
    }
}

/// How applicants are matched to venues.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AllocationMode {
    /// First available venue in the district of the earliest possible preference.
    Preference,
    /// First venue with a free seat, in venue table order. Preferences are ignored.
    RowOrder,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AllotmentRules {
    pub roll_start: u64,
    pub buffer_fraction: BufferFraction,
    pub allocation_mode: AllocationMode,
    /// Refuse to run if there are fewer seats than applicants.
    /// Always applied in row order mode.
    pub strict_capacity: bool,
}

impl AllotmentRules {
    pub const DEFAULT_RULES: AllotmentRules = AllotmentRules {
        roll_start: DEFAULT_ROLL_START,
        buffer_fraction: BufferFraction::FULL,
        allocation_mode: AllocationMode::Preference,
        strict_capacity: false,
    };

    pub fn is_strict(&self) -> bool {
        self.strict_capacity || self.allocation_mode == AllocationMode::RowOrder
    }
}
