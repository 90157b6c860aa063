use log::{debug, info, warn};

use seat_allocation::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::allot::config_reader::*;
use crate::allot::io_common::*;

pub mod config_reader;
pub mod export;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod summary_doc;

#[derive(Debug, Snafu)]
pub enum AllotError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The file {path} does not contain any worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Cannot find worksheet {name:?} in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Unknown provider {provider:?} for {path} (expected csv or xlsx)"))]
    UnknownProvider { provider: String, path: String },
    #[snafu(display("Cannot find column {column:?} in the header of {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Allotment failed: {source}"))]
    Allotment { source: AllotmentErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type AllotResult<T> = Result<T, AllotError>;
type BAllotResult<T> = Result<T, Box<AllotError>>;

/// Values from the command line that take precedence over the configuration file.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RunOverrides {
    pub out_dir: Option<String>,
    pub roll_start: Option<u64>,
    pub buffer_fraction: Option<f64>,
}

fn mode_name(mode: AllocationMode) -> &'static str {
    match mode {
        AllocationMode::Preference => "preference",
        AllocationMode::RowOrder => "rowOrder",
    }
}

fn validate_rules(run_rules: &RunRules, overrides: &RunOverrides) -> AllotResult<AllotmentRules> {
    let roll_start = overrides
        .roll_start
        .or(run_rules.roll_start)
        .unwrap_or(DEFAULT_ROLL_START);
    if roll_start < 1 {
        whatever!("rollStart must be at least 1, got {}", roll_start)
    }
    let buffer = overrides
        .buffer_fraction
        .or(run_rules.buffer_fraction)
        .unwrap_or(1.0);
    let buffer_fraction = BufferFraction::new(buffer).context(AllotmentSnafu {})?;
    let allocation_mode = match run_rules.allocation_mode.as_deref() {
        None | Some("preference") => AllocationMode::Preference,
        Some("rowOrder") => AllocationMode::RowOrder,
        Some(x) => {
            whatever!(
                "Cannot use allocation mode {:?} (expected preference or rowOrder)",
                x
            )
        }
    };
    Ok(AllotmentRules {
        roll_start,
        buffer_fraction,
        allocation_mode,
        strict_capacity: run_rules.strict_capacity.unwrap_or(false),
    })
}

fn validate_output_settings(settings: &OutputSettings) -> AllotResult<u32> {
    let lines_per_page = settings
        .lines_per_page
        .unwrap_or(summary_doc::DEFAULT_LINES_PER_PAGE);
    if lines_per_page < summary_doc::MIN_LINES_PER_PAGE {
        whatever!(
            "linesPerPage must be at least {}, got {}",
            summary_doc::MIN_LINES_PER_PAGE,
            lines_per_page
        )
    }
    Ok(lines_per_page)
}

fn read_table(
    root_path: &Path,
    provider: &str,
    file_path: &str,
    worksheet: Option<&str>,
) -> BAllotResult<RawTable> {
    let p: PathBuf = root_path.join(file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read table {:?}", p2);
    let table = match provider {
        "csv" => io_csv::read_csv_table(&p2)?,
        "xlsx" => io_excel::read_excel_table(&p2, worksheet)?,
        x => {
            return Err(Box::new(AllotError::UnknownProvider {
                provider: x.to_string(),
                path: p2,
            }));
        }
    };
    debug!(
        "read_table: {} header: {:?} rows: {}",
        table.path,
        table.header,
        table.rows.len()
    );
    Ok(table)
}

fn read_applicants(table: &RawTable, source: &ApplicantSource) -> BAllotResult<Vec<Applicant>> {
    let id_idx = table.column(&source.id_column)?;
    let time_idx = table.column(&source.submission_time_column)?;
    let name_idx = match &source.name_column {
        Some(c) => Some(table.column(c)?),
        None => None,
    };
    let pref_idxs = get_col_index_mapping(&source.preference_columns, &table.header, &table.path)?;

    let mut res: Vec<Applicant> = Vec::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let time_cell = cell_at(row, time_idx);
        let submitted_at = read_timestamp(time_cell);
        if submitted_at.is_none() && !matches!(time_cell, Cell::Empty) {
            warn!(
                "read_applicants: row {}: cannot read submission time {:?}, treated as missing",
                row_idx + 2,
                time_cell
            );
        }
        let applicant = Applicant {
            id: read_applicant_id(cell_at(row, id_idx)),
            name: name_idx.and_then(|idx| read_optional_text(cell_at(row, idx))),
            submitted_at,
            preferences: pref_idxs
                .iter()
                .map(|idx| read_optional_text(cell_at(row, *idx)))
                .collect(),
            source_row: row_idx,
        };
        debug!("read_applicants: {:?}", applicant);
        res.push(applicant);
    }
    Ok(res)
}

fn read_venues(table: &RawTable, source: &VenueSource) -> BAllotResult<Vec<VenueRecord>> {
    let cols = get_col_index_mapping(
        &[
            source.code_column.clone(),
            source.venue_number_column.clone(),
            source.centre_name_column.clone(),
            source.lab_name_column.clone(),
            source.district_column.clone(),
            source.capacity_column.clone(),
        ],
        &table.header,
        &table.path,
    )?;
    let res = table
        .rows
        .iter()
        .map(|row| VenueRecord {
            code: cell_at(row, cols[0]).to_text(),
            venue_number: cell_at(row, cols[1]).to_text(),
            centre_name: cell_at(row, cols[2]).to_text(),
            lab_name: cell_at(row, cols[3]).to_text(),
            district: cell_at(row, cols[4]).to_text(),
            capacity: cell_at(row, cols[5]).to_text(),
        })
        .collect();
    Ok(res)
}

fn percentage_js(x: f64) -> JSValue {
    json!(format!("{:.2}", x))
}

fn preference_stats_js(stats: &[PreferenceStat]) -> Vec<JSValue> {
    stats
        .iter()
        .map(|s| {
            json!({
                "preference": s.label(),
                "count": s.count,
                "percentage": percentage_js(s.percentage),
            })
        })
        .collect()
}

fn build_summary_js(config: &AllotConfig, rules: &AllotmentRules, res: &AllotmentResult) -> JSValue {
    let report = &res.report;
    let districts: Vec<JSValue> = report
        .district_summary
        .iter()
        .map(|d| {
            json!({
                "district": d.district,
                "total": d.total,
                "preferences": preference_stats_js(&d.preferences),
            })
        })
        .collect();
    let venues: Vec<JSValue> = report
        .venue_summary
        .iter()
        .map(|v| {
            json!({
                "code": v.venue.code,
                "venueNumber": v.venue.venue_number,
                "centreName": v.venue.centre_name,
                "labName": v.venue.lab_name,
                "district": v.venue.district,
                "rawCapacity": v.raw_capacity,
                "effectiveCapacity": v.effective_capacity,
                "allotted": v.allotted,
                "remaining": v.remaining,
            })
        })
        .collect();
    let not_allotted: Vec<JSValue> = report
        .not_allotted
        .iter()
        .map(|idx| {
            let a = &res.applicants[*idx];
            json!({
                "rollNumber": a.roll_number,
                "applicantId": a.applicant.id.to_string(),
            })
        })
        .collect();
    json!({
        "config": {
            "runName": config.output_settings.run_name,
            "rollStart": rules.roll_start,
            "bufferFraction": rules.buffer_fraction.value(),
            "allocationMode": mode_name(rules.allocation_mode),
            "strictCapacity": rules.is_strict(),
        },
        "totals": {
            "applicants": report.total_applicants,
            "allotted": report.total_allotted,
            "notAllotted": report.total_not_allotted,
            "venues": report.total_venues,
            "seats": report.total_seats,
        },
        "preferenceSummary": preference_stats_js(&report.preference_summary),
        "districtSummary": districts,
        "venueSummary": venues,
        "notAllotted": not_allotted,
    })
}

/// Reads the configuration and the input tables, runs the allotment and writes
/// all the outputs.
///
/// Nothing is written if the allotment fails. Returns the output directory.
pub fn run_allotment_files(
    config_path: String,
    overrides: &RunOverrides,
    check_summary_path: Option<String>,
) -> BAllotResult<PathBuf> {
    let config_p = Path::new(config_path.as_str());
    let config = read_config(&config_path)?;
    info!("config: {:?}", config);

    // Validate the rules:
    let rules = validate_rules(&config.rules, overrides)?;
    let lines_per_page = validate_output_settings(&config.output_settings)?;

    let root_p = config_p.parent().context(MissingParentDirSnafu {
        path: config_path.clone(),
    })?;

    let app_src = &config.applicant_source;
    let applicant_table = read_table(
        root_p,
        &app_src.provider,
        &app_src.file_path,
        app_src.excel_worksheet_name.as_deref(),
    )?;
    let venue_src = &config.venue_source;
    let venue_table = read_table(
        root_p,
        &venue_src.provider,
        &venue_src.file_path,
        venue_src.excel_worksheet_name.as_deref(),
    )?;

    let applicants = read_applicants(&applicant_table, app_src)?;
    let venues = read_venues(&venue_table, venue_src)?;

    let res = run_allotment(applicants, &venues, &rules).context(AllotmentSnafu {})?;

    let summary_js = build_summary_js(&config, &rules, &res);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    debug!("summary: {}", pretty_js_stats);

    let summary_doc = if config.output_settings.generate_summary_document.unwrap_or(true) {
        Some(summary_doc::render_summary(
            &config.output_settings.run_name,
            &res,
            lines_per_page as usize,
        ))
    } else {
        None
    };

    let out_dir: PathBuf = match (&overrides.out_dir, &config.output_settings.output_directory) {
        (Some(d), _) => PathBuf::from(d),
        (None, Some(d)) => root_p.join(d),
        (None, None) => root_p.join("output"),
    };
    let written = export::write_outputs(
        &out_dir,
        &applicant_table,
        app_src,
        &res,
        &pretty_js_stats,
        summary_doc.as_deref(),
    )?;
    for p in written.iter() {
        info!("Wrote {}", p);
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary {}", summary_p);
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return Err(Box::new(AllotError::ReferenceMismatch {}));
        }
        info!("The summary matches the reference {}", summary_p);
    }

    Ok(out_dir)
}

#[cfg(test)]
fn run_allotment_test(test_name: &str, overrides: &RunOverrides) -> BAllotResult<PathBuf> {
    let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/allotment_data");
    info!("Running test {}", test_name);
    let summary_path = format!("{}/{}/{}_expected_summary.json", test_dir, test_name, test_name);
    let check = if Path::new(&summary_path).exists() {
        Some(summary_path)
    } else {
        None
    };
    run_allotment_files(
        format!("{}/{}/{}_config.json", test_dir, test_name, test_name),
        overrides,
        check,
    )
}

#[cfg(test)]
static TEST_RUNS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

#[cfg(test)]
fn test_out_dir(test_name: &str) -> PathBuf {
    let run = TEST_RUNS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let p = std::env::temp_dir().join(format!(
        "rollallot-{}-{}-{}",
        test_name,
        std::process::id(),
        run
    ));
    let _ = fs::remove_dir_all(&p);
    p
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) -> PathBuf {
    let out_dir = test_out_dir(test_name);
    let overrides = RunOverrides {
        out_dir: Some(out_dir.display().to_string()),
        ..RunOverrides::default()
    };
    match run_allotment_test(test_name, &overrides) {
        Ok(p) => p,
        Err(e) => panic!("Test {} failed: {}", test_name, e),
    }
}
