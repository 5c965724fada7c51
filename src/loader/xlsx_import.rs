use std::path::Path;

use calamine::{Data, Reader, Xlsx, XlsxError, open_workbook};

use crate::error::LoadError;
use crate::models::{Cell, Table, Value};

use super::{dedupe_headers, is_na_marker};

fn map_xlsx_err(path: &Path, e: XlsxError) -> LoadError {
    match e {
        XlsxError::Io(source) => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => LoadError::Parse {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn to_cell(d: &Data) -> Cell {
    match d {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if is_na_marker(s) => None,
        Data::String(s) => Some(Value::Text(s.clone())),
        Data::Int(n) => Some(Value::Int(*n)),
        Data::Float(x) => Some(Value::Float(*x)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => Some(Value::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::Text(s.clone())),
    }
}

fn header_text(d: &Data) -> String {
    match d {
        Data::Empty => String::new(),
        Data::Float(x) if x.fract() == 0.0 => format!("{}", *x as i64),
        other => other.to_string(),
    }
}

/// Read the first worksheet of a workbook; its first row is the header.
pub fn read_xlsx_table(path: &Path) -> Result<Table, LoadError> {
    let mut wb: Xlsx<_> = open_workbook(path).map_err(|e| map_xlsx_err(path, e))?;
    let range = match wb.worksheet_range_at(0) {
        Some(r) => r.map_err(|e| map_xlsx_err(path, e))?,
        None => {
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                reason: "workbook has no worksheets".into(),
            });
        }
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(h) => h.iter().map(header_text).collect(),
        None => Vec::new(),
    };
    let mut table = Table::new(dedupe_headers(headers));
    for r in rows {
        table.push_row(r.iter().map(to_cell).collect());
    }
    log::debug!(
        "Loaded {} rows x {} columns from {}",
        table.row_count(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn reads_first_sheet_with_typed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("people.xlsx");
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.write_string(0, 0, "Name").unwrap();
        ws.write_string(0, 1, "Father Name").unwrap();
        ws.write_string(0, 2, "Age").unwrap();
        ws.write_string(1, 0, "Alice").unwrap();
        ws.write_string(1, 1, "Bob").unwrap();
        ws.write_number(1, 2, 41.0).unwrap();
        ws.write_string(2, 0, "Carol").unwrap();
        ws.write_string(2, 1, "#N/A").unwrap();
        wb.save(&p).unwrap();

        let t = read_xlsx_table(&p).unwrap();
        assert_eq!(t.columns(), &["Name", "Father Name", "Age"]);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.cell(0, "Name"), Some(&Value::Text("Alice".into())));
        assert_eq!(t.cell(0, "Age"), Some(&Value::Float(41.0)));
        assert_eq!(t.cell(1, "Father Name"), None);
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.xlsx");
        std::fs::write(&p, b"not a zip archive").unwrap();
        let err = read_xlsx_table(&p).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }), "got {err:?}");
    }
}
