use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::allot::{io_common::*, *};

/// Reads a worksheet of an Excel file. The first row is the header.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> BAllotResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = match iter.next() {
        Some(cells) => cells
            .iter()
            .map(|c| read_cell(c).to_text().trim().to_string())
            .collect(),
        None => Vec::new(),
    };
    debug!("read_excel_table: header: {:?}", header);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let cells: Vec<Cell> = row.iter().map(read_cell).collect();
        if cells.iter().all(|c| *c == Cell::Empty) {
            debug!("read_excel_table: skipping empty row {}", idx + 2);
            continue;
        }
        debug!("read_excel_table: row {}: {:?}", idx + 2, cells);
        rows.push(cells);
    }
    Ok(RawTable {
        path: path.to_string(),
        header,
        rows,
    })
}

fn read_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) if s.trim().is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.trim().to_string()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        DataType::DateTime(f) => match excel_serial_to_datetime(*f) {
            Some(dt) => Cell::DateTime(dt),
            None => Cell::Number(*f),
        },
        DataType::Empty => Cell::Empty,
        c => {
            warn!("read_cell: cannot read cell {:?}, treated as empty", c);
            Cell::Empty
        }
    }
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> BAllotResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    let wrange = if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?
    };
    Ok(wrange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Empty), Cell::Empty);
        assert_eq!(read_cell(&DataType::String("  ".to_string())), Cell::Empty);
        assert_eq!(
            read_cell(&DataType::String(" Pune ".to_string())),
            Cell::Text("Pune".to_string())
        );
        assert_eq!(read_cell(&DataType::Int(30)), Cell::Number(30.0));
        assert_eq!(read_cell(&DataType::Float(12.0)), Cell::Number(12.0));
        assert_eq!(
            read_cell(&DataType::DateTime(45306.4375)),
            Cell::DateTime(excel_serial_to_datetime(45306.4375).unwrap())
        );
    }

    fn fixture(name: &str) -> String {
        format!(
            "{}/tests/allotment_data/xlsx_roster/{}",
            env!("CARGO_MANIFEST_DIR"),
            name
        )
    }

    #[test]
    fn named_worksheet() {
        let t = read_excel_table(&fixture("applicants.xlsx"), Some("Applicants")).unwrap();
        assert_eq!(t.header, vec!["ApplNo", "Name", "FSubDate", "Pref1", "Pref2"]);
        assert_eq!(t.rows.len(), 4);
        assert_eq!(t.rows[0][0], Cell::Number(42.0));
        assert_eq!(t.rows[2][0], Cell::Text("0042".to_string()));
        assert_eq!(
            read_timestamp(cell_at(&t.rows[0], 2)),
            excel_serial_to_datetime(45306.4375)
        );
        assert_eq!(cell_at(&t.rows[1], 4), &Cell::Empty);
    }

    #[test]
    fn first_worksheet_by_default() {
        let t = read_excel_table(&fixture("applicants.xlsx"), None).unwrap();
        assert_eq!(t.header, vec!["Exported roster"]);
        assert!(t.rows.is_empty());
        let venues = read_excel_table(&fixture("venues.xlsx"), None).unwrap();
        assert_eq!(venues.rows.len(), 2);
        assert_eq!(cell_at(&venues.rows[0], 5).to_text(), "2");
    }

    #[test]
    fn missing_worksheet() {
        let err = read_excel_table(&fixture("venues.xlsx"), Some("Applicants")).unwrap_err();
        match *err {
            AllotError::MissingWorksheet { name, .. } => assert_eq!(name, "Applicants"),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn missing_workbook() {
        let err = read_excel_table("/nonexistent/labs.xlsx", None).unwrap_err();
        assert!(matches!(*err, AllotError::OpeningExcel { .. }));
    }
}
