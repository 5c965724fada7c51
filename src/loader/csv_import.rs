use std::path::Path;

use csv::ReaderBuilder;

use crate::error::LoadError;
use crate::models::{Cell, Table, Value};

use super::{dedupe_headers, is_na_marker};

fn map_csv_err(path: &Path, e: csv::Error) -> LoadError {
    if e.is_io_error() {
        match e.into_kind() {
            csv::ErrorKind::Io(source) => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => LoadError::Parse {
                path: path.to_path_buf(),
                reason: format!("{:?}", other),
            },
        }
    } else {
        LoadError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }
}

/// Read a comma-delimited file; the first record is the header.
/// Every cell is kept as text; empty cells and NA markers become missing values.
pub fn read_csv_table(path: &Path) -> Result<Table, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| map_csv_err(path, e))?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| map_csv_err(path, e))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();
    let mut table = Table::new(dedupe_headers(headers));

    for rec in rdr.records() {
        let rec = rec.map_err(|e| map_csv_err(path, e))?;
        let row: Vec<Cell> = rec
            .iter()
            .map(|s| {
                if is_na_marker(s) {
                    None
                } else {
                    Some(Value::Text(s.to_string()))
                }
            })
            .collect();
        table.push_row(row);
    }
    log::debug!(
        "Loaded {} rows x {} columns from {}",
        table.row_count(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}
