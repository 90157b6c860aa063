// Primitives for reading CSV files.

use crate::allot::{io_common::*, *};

pub fn read_csv_table(path: &str) -> BAllotResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, line);
        let row: Vec<Cell> = line
            .iter()
            .map(|s| {
                if s.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(s.to_string())
                }
            })
            .collect();
        if row.iter().all(|c| *c == Cell::Empty) {
            warn!("read_csv_table: {}: skipping empty line {}", path, lineno);
            continue;
        }
        rows.push(row);
    }
    Ok(RawTable {
        path: path.to_string(),
        header,
        rows,
    })
}
