//! Table loading: one tabular file in, one in-memory [`Table`] out.
//!
//! The format is chosen by file extension only; see [`TableFormat::from_path`].

pub mod csv_import;
pub mod xlsx_import;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::models::Table;

pub use csv_import::read_csv_table;
pub use xlsx_import::read_xlsx_table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Csv,
}

impl TableFormat {
    /// Extension match is case-insensitive (`.CSV` and `.csv` are both accepted).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("xlsx") {
            Some(Self::Xlsx)
        } else if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else {
            None
        }
    }
}

pub fn load_table(path: &Path) -> Result<Table, LoadError> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Xlsx) => read_xlsx_table(path),
        Some(TableFormat::Csv) => read_csv_table(path),
        None => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Direct children of `dir` with a supported extension, sorted by full path.
pub fn discover_tables(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && TableFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Cell texts read as missing values, matching the pandas `read_csv` /
/// `read_excel` defaults. Comparison is exact and case-sensitive.
pub const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_marker(s: &str) -> bool {
    NA_MARKERS.contains(&s)
}

/// Blank headers become `Unnamed: <idx>`; repeats become `X.1`, `X.2`, ...
pub(crate) fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for (idx, h) in raw.into_iter().enumerate() {
        let base = if h.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            h
        };
        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}
