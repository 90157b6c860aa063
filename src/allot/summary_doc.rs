// A plain text summary of a run, split into printable pages.

use crate::allot::*;

pub const DEFAULT_LINES_PER_PAGE: u32 = 50;
/// The page header takes two lines.
pub const MIN_LINES_PER_PAGE: u32 = 3;

const HEADER_LINES: usize = 2;
const PAGE_BREAK: char = '\x0C';

fn body_lines(res: &AllotmentResult) -> Vec<String> {
    let report = &res.report;
    let mut lines: Vec<String> = Vec::new();
    lines.push("Totals".to_string());
    lines.push(format!("  Applicants: {}", report.total_applicants));
    lines.push(format!("  Allotted: {}", report.total_allotted));
    lines.push(format!("  Not allotted: {}", report.total_not_allotted));
    lines.push(format!(
        "  Venues: {} ({} seats)",
        report.total_venues, report.total_seats
    ));
    lines.push("".to_string());

    lines.push("Preference satisfaction".to_string());
    for s in report.preference_summary.iter() {
        lines.push(format!("  {}: {} ({:.2}%)", s.label(), s.count, s.percentage));
    }
    lines.push("".to_string());

    lines.push("Districts".to_string());
    for d in report.district_summary.iter() {
        lines.push(format!("  {}: {} allotted", d.district, d.total));
        for s in d.preferences.iter() {
            lines.push(format!("    {}: {} ({:.2}%)", s.label(), s.count, s.percentage));
        }
    }
    lines.push("".to_string());

    lines.push("Venues".to_string());
    for v in report.venue_summary.iter() {
        lines.push(format!(
            "  {} {} {} ({}): {} of {} seats",
            v.venue.venue_number,
            v.venue.centre_name,
            v.venue.lab_name,
            v.venue.district,
            v.allotted,
            v.effective_capacity
        ));
    }

    if !report.not_allotted.is_empty() {
        lines.push("".to_string());
        lines.push("Not allotted".to_string());
        for idx in report.not_allotted.iter() {
            let a = &res.applicants[*idx];
            lines.push(format!("  {} {}", a.roll_number, a.applicant.id));
        }
    }
    lines
}

/// Splits the lines into pages of at most `lines_per_page` lines, headers
/// included. Pages are separated by a form feed.
pub fn paginate(run_name: &str, lines: &[String], lines_per_page: usize) -> String {
    let per_page = lines_per_page.saturating_sub(HEADER_LINES).max(1);
    let mut out = String::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![lines]
    } else {
        lines.chunks(per_page).collect()
    };
    for (idx, chunk) in chunks.iter().enumerate() {
        if idx > 0 {
            out.push(PAGE_BREAK);
        }
        out.push_str(&format!("{} - Page {}\n\n", run_name, idx + 1));
        for l in chunk.iter() {
            out.push_str(l);
            out.push('\n');
        }
    }
    out
}

pub fn render_summary(run_name: &str, res: &AllotmentResult, lines_per_page: usize) -> String {
    let lines = body_lines(res);
    debug!("render_summary: {} lines", lines.len());
    paginate(run_name, &lines, lines_per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {}", i)).collect()
    }

    #[test]
    fn single_page() {
        let doc = paginate("Mock", &lines(2), 10);
        assert_eq!(doc, "Mock - Page 1\n\nline 1\nline 2\n");
    }

    #[test]
    fn page_breaks() {
        let doc = paginate("Mock", &lines(5), 4);
        let pages: Vec<&str> = doc.split(PAGE_BREAK).collect();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], "Mock - Page 1\n\nline 1\nline 2\n");
        assert_eq!(pages[1], "Mock - Page 2\n\nline 3\nline 4\n");
        assert_eq!(pages[2], "Mock - Page 3\n\nline 5\n");
        assert!(pages.iter().all(|p| p.lines().count() <= 4));
    }

    #[test]
    fn empty_document_has_one_page() {
        assert_eq!(paginate("Mock", &[], 50), "Mock - Page 1\n\n");
    }

    #[test]
    fn rendered_summary() {
        let mut b = seat_allocation::builder::Builder::new(&AllotmentRules::DEFAULT_RULES).unwrap();
        b.add_venue("C01", "V1", "Central School", "Lab A", "D1", "1");
        b.add_applicant_simple("1", &["D1".to_string()]);
        b.add_applicant_simple("2", &["D1".to_string()]);
        let res = b.run().unwrap();
        let doc = render_summary("Mock", &res, 50);
        assert!(doc.starts_with("Mock - Page 1\n\nTotals\n"));
        assert!(doc.contains("  Preference 1: 1 (50.00%)\n"));
        assert!(doc.contains("  Not Allotted: 1 (50.00%)\n"));
        assert!(doc.contains("  V1 Central School Lab A (D1): 1 of 1 seats\n"));
        assert!(doc.contains("  7100002 2\n"));
        assert!(!doc.contains(PAGE_BREAK));
    }
}
