pub use crate::config::*;
use chrono::NaiveDateTime;

/// A builder for assembling a roster and a venue table by hand.
///
/// The readers of the command line program produce the same structures. This
/// builder is meant for programs that already have the data in memory.
///
/// ```
/// pub use seat_allocation::builder::Builder;
/// pub use seat_allocation::AllotmentRules;
/// # use seat_allocation::AllotmentErrors;
///
/// let mut builder = Builder::new(&AllotmentRules::DEFAULT_RULES)?;
/// builder.add_venue("V01", "1", "Govt. Polytechnic", "Lab A", "Pune", "2");
/// builder.add_applicant_simple("1001", &["Nashik".to_string(), "Pune".to_string()]);
/// builder.add_applicant_simple("1002", &["".to_string(), "Pune".to_string()]);
///
/// let res = builder.run()?;
/// assert_eq!(res.report.total_allotted, 2);
/// assert_eq!(res.applicants[0].roll_number, 7100001);
///
/// # Ok::<(), AllotmentErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AllotmentRules,
    pub(crate) _applicants: Vec<Applicant>,
    pub(crate) _venues: Vec<VenueRecord>,
}

/// Reads an identifier: integers are compared as numbers, anything else as text.
/// The text of the identifier is kept as written, leading zeros included.
pub fn parse_applicant_id(s: &str) -> ApplicantId {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        ApplicantId::Missing
    } else if let Ok(n) = trimmed.parse::<i64>() {
        ApplicantId::Number(n, trimmed.to_string())
    } else {
        ApplicantId::Text(trimmed.to_string())
    }
}

impl Builder {
    pub fn new(rules: &AllotmentRules) -> Result<Builder, AllotmentErrors> {
        if rules.roll_start < 1 {
            return Err(AllotmentErrors::InvalidRollStart(rules.roll_start));
        }
        Ok(Builder {
            _rules: rules.clone(),
            _applicants: Vec::new(),
            _venues: Vec::new(),
        })
    }

    /// Adds a row of the venue table. Rows are kept in the order they are added.
    ///
    /// Surrounding spaces are removed, as for the preferences of applicants.
    pub fn add_venue(
        &mut self,
        code: &str,
        venue_number: &str,
        centre_name: &str,
        lab_name: &str,
        district: &str,
        capacity: &str,
    ) {
        self._venues.push(VenueRecord {
            code: code.trim().to_string(),
            venue_number: venue_number.trim().to_string(),
            centre_name: centre_name.trim().to_string(),
            lab_name: lab_name.trim().to_string(),
            district: district.trim().to_string(),
            capacity: capacity.trim().to_string(),
        });
    }

    /// Adds an applicant without submission time.
    ///
    /// Empty strings in the preferences are blank choices.
    pub fn add_applicant_simple(&mut self, id: &str, preferences: &[String]) {
        self.add_applicant(parse_applicant_id(id), None, None, preferences)
    }

    pub fn add_applicant(
        &mut self,
        id: ApplicantId,
        name: Option<String>,
        submitted_at: Option<NaiveDateTime>,
        preferences: &[String],
    ) {
        let source_row = self._applicants.len();
        self._applicants.push(Applicant {
            id,
            name,
            submitted_at,
            preferences: preferences
                .iter()
                .map(|p| {
                    let t = p.trim();
                    if t.is_empty() {
                        None
                    } else {
                        Some(t.to_string())
                    }
                })
                .collect(),
            source_row,
        });
    }

    pub fn run(self) -> Result<AllotmentResult, AllotmentErrors> {
        crate::run_allotment(self._applicants, &self._venues, &self._rules)
    }
}
