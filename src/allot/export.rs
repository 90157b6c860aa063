// Writes the results of a run as a set of tables.

use std::collections::HashSet;

use crate::allot::{io_common::*, *};

/// Spreadsheet programs refuse longer sheet names.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const ALLOTMENT_COLUMNS: [&str; 7] = [
    "RollNo",
    "Code",
    "Venue No",
    "Centre Name",
    "Lab Name",
    "District",
    "Preference Allotted",
];

fn truncate_chars(s: &str, max_len: usize) -> String {
    s.chars().take(max_len).collect()
}

/// A name for the attendance sheet of a venue that can also be used as a
/// worksheet name.
pub fn sheet_name(venue: &Venue) -> String {
    let raw = format!("{}-{}", venue.venue_number, venue.lab_name);
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    truncate_chars(cleaned.trim(), MAX_SHEET_NAME_LEN)
}

/// Sheet names for all the groups, made unique by a `~N` suffix when two
/// venues end up with the same name.
pub fn unique_sheet_names(venues: &[&Venue]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for v in venues {
        let base = sheet_name(v);
        let mut name = base.clone();
        let mut counter = 2;
        // Names are compared without case, as spreadsheet programs do.
        while seen.contains(&name.to_lowercase()) {
            let suffix = format!("~{}", counter);
            let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
            name = format!("{}{}", truncate_chars(&base, keep), suffix);
            counter += 1;
        }
        seen.insert(name.to_lowercase());
        res.push(name);
    }
    res
}

fn percentage_text(x: f64) -> String {
    format!("{:.2}", x)
}

fn open_writer(path: &Path) -> BAllotResult<csv::Writer<fs::File>> {
    let p = path.display().to_string();
    let w = csv::Writer::from_path(path).context(CsvWriteSnafu { path: p })?;
    Ok(w)
}

fn write_rows(path: &Path, header: &[String], rows: &[Vec<String>]) -> BAllotResult<String> {
    let p = path.display().to_string();
    let mut w = open_writer(path)?;
    w.write_record(header)
        .context(CsvWriteSnafu { path: p.clone() })?;
    for r in rows {
        w.write_record(r).context(CsvWriteSnafu { path: p.clone() })?;
    }
    w.flush().context(WritingOutputSnafu { path: p.clone() })?;
    Ok(p)
}

fn to_strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

fn venue_cells(res: &AllotmentResult, a: &AllottedApplicant) -> Vec<String> {
    match a.allocation {
        Some(alloc) => {
            let v = &res.venues[alloc.venue.0].venue;
            vec![
                v.code.clone(),
                v.venue_number.clone(),
                v.centre_name.clone(),
                v.lab_name.clone(),
                v.district.clone(),
                alloc.basis.label(),
            ]
        }
        None => {
            let mut cells = vec!["".to_string(); 5];
            cells.push(NOT_ALLOTTED.to_string());
            cells
        }
    }
}

fn allotment_rows(table: &RawTable, res: &AllotmentResult) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = table.header.clone();
    header.extend(to_strings(&ALLOTMENT_COLUMNS));
    let rows = res
        .applicants
        .iter()
        .map(|a| {
            let mut row: Vec<String> = (0..table.header.len())
                .map(|idx| {
                    table
                        .rows
                        .get(a.applicant.source_row)
                        .map(|r| cell_at(r, idx).to_text())
                        .unwrap_or_default()
                })
                .collect();
            row.push(a.roll_number.to_string());
            row.extend(venue_cells(res, a));
            row
        })
        .collect();
    (header, rows)
}

fn preference_rows(stats: &[PreferenceStat]) -> Vec<Vec<String>> {
    stats
        .iter()
        .map(|s| {
            vec![
                s.label(),
                s.count.to_string(),
                percentage_text(s.percentage),
            ]
        })
        .collect()
}

fn district_rows(report: &AllotmentReport) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for d in report.district_summary.iter() {
        for r in preference_rows(&d.preferences) {
            let mut row = vec![d.district.clone()];
            row.extend(r);
            rows.push(row);
        }
    }
    rows
}

fn venue_rows(report: &AllotmentReport) -> Vec<Vec<String>> {
    report
        .venue_summary
        .iter()
        .map(|v| {
            vec![
                v.venue.code.clone(),
                v.venue.venue_number.clone(),
                v.venue.centre_name.clone(),
                v.venue.lab_name.clone(),
                v.venue.district.clone(),
                v.raw_capacity.to_string(),
                v.effective_capacity.to_string(),
                v.allotted.to_string(),
                v.remaining.to_string(),
            ]
        })
        .collect()
}

// Roll number, identifier and name of an applicant.
fn applicant_header(source: &ApplicantSource) -> Vec<String> {
    let mut header = vec!["RollNo".to_string(), source.id_column.clone()];
    if let Some(name_col) = &source.name_column {
        header.push(name_col.clone());
    }
    header
}

fn applicant_cells(source: &ApplicantSource, a: &AllottedApplicant) -> Vec<String> {
    let mut row = vec![a.roll_number.to_string(), a.applicant.id.to_string()];
    if source.name_column.is_some() {
        row.push(a.applicant.name.clone().unwrap_or_default());
    }
    row
}

fn not_allotted_rows(source: &ApplicantSource, res: &AllotmentResult) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = applicant_header(source);
    header.extend(source.preference_columns.iter().cloned());
    let rows = res
        .report
        .not_allotted
        .iter()
        .map(|idx| {
            let a = &res.applicants[*idx];
            let mut row = applicant_cells(source, a);
            row.extend(
                a.applicant
                    .preferences
                    .iter()
                    .map(|p| p.clone().unwrap_or_default()),
            );
            row
        })
        .collect();
    (header, rows)
}

fn attendance_rows(
    source: &ApplicantSource,
    res: &AllotmentResult,
    group: &AttendanceGroup,
) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = vec!["Sl No".to_string()];
    header.extend(applicant_header(source));
    header.push("Signature".to_string());
    let rows = group
        .members
        .iter()
        .enumerate()
        .map(|(pos, idx)| {
            let mut row = vec![(pos + 1).to_string()];
            row.extend(applicant_cells(source, &res.applicants[*idx]));
            row.push("".to_string());
            row
        })
        .collect();
    (header, rows)
}

fn create_dir(p: &Path) -> BAllotResult<()> {
    fs::create_dir_all(p).context(WritingOutputSnafu {
        path: p.display().to_string(),
    })?;
    Ok(())
}

/// Writes all the output tables, the JSON summary and the summary document.
///
/// Returns the paths of the files written.
pub fn write_outputs(
    out_dir: &Path,
    applicant_table: &RawTable,
    source: &ApplicantSource,
    res: &AllotmentResult,
    summary_json: &str,
    summary_doc: Option<&str>,
) -> BAllotResult<Vec<String>> {
    let report = &res.report;
    let attendance_dir = out_dir.join("attendance");
    create_dir(out_dir)?;
    create_dir(&attendance_dir)?;

    let mut written: Vec<String> = Vec::new();

    let (header, rows) = allotment_rows(applicant_table, res);
    written.push(write_rows(&out_dir.join("allotment.csv"), &header, &rows)?);

    written.push(write_rows(
        &out_dir.join("preference_summary.csv"),
        &to_strings(&["Preference", "Count", "Percentage"]),
        &preference_rows(&report.preference_summary),
    )?);

    written.push(write_rows(
        &out_dir.join("district_summary.csv"),
        &to_strings(&["District", "Preference", "Count", "Percentage"]),
        &district_rows(report),
    )?);

    written.push(write_rows(
        &out_dir.join("venue_summary.csv"),
        &to_strings(&[
            "Code",
            "Venue No",
            "Centre Name",
            "Lab Name",
            "District",
            "Raw Capacity",
            "Effective Capacity",
            "Allotted",
            "Remaining",
        ]),
        &venue_rows(report),
    )?);

    let (header, rows) = not_allotted_rows(source, res);
    written.push(write_rows(&out_dir.join("not_allotted.csv"), &header, &rows)?);

    let group_venues: Vec<&Venue> = report.attendance.iter().map(|g| &g.venue).collect();
    let names = unique_sheet_names(&group_venues);
    for (group, name) in report.attendance.iter().zip(names.iter()) {
        let (header, rows) = attendance_rows(source, res, group);
        let p = attendance_dir.join(format!("{}.csv", name));
        written.push(write_rows(&p, &header, &rows)?);
    }

    let json_p = out_dir.join("summary.json");
    fs::write(&json_p, summary_json).context(WritingOutputSnafu {
        path: json_p.display().to_string(),
    })?;
    written.push(json_p.display().to_string());

    if let Some(doc) = summary_doc {
        let doc_p = out_dir.join("summary.txt");
        fs::write(&doc_p, doc).context(WritingOutputSnafu {
            path: doc_p.display().to_string(),
        })?;
        written.push(doc_p.display().to_string());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(number: &str, lab: &str) -> Venue {
        Venue {
            code: "C".to_string(),
            venue_number: number.to_string(),
            centre_name: "Centre".to_string(),
            lab_name: lab.to_string(),
            district: "D1".to_string(),
        }
    }

    #[test]
    fn sheet_names() {
        assert_eq!(sheet_name(&venue("V1", "Lab A")), "V1-Lab A");
        assert_eq!(sheet_name(&venue("V1", "Lab [1/2]")), "V1-Lab _1_2_");
        let long = venue("V10", "Computer Laboratory Block North Wing");
        let name = sheet_name(&long);
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_LEN);
        assert_eq!(name, "V10-Computer Laboratory Block N");
    }

    #[test]
    fn colliding_sheet_names() {
        let a = venue("V10", "Computer Laboratory Block North Wing");
        let b = venue("V10", "Computer Laboratory Block North Annex");
        let c = venue("v10", "computer laboratory block north");
        let names = unique_sheet_names(&[&a, &b, &c]);
        assert_eq!(names[0], "V10-Computer Laboratory Block N");
        assert_eq!(names[1], "V10-Computer Laboratory Block~2");
        assert_eq!(names[2], "v10-computer laboratory block~3");
        assert!(names.iter().all(|n| n.chars().count() <= MAX_SHEET_NAME_LEN));
    }
}
