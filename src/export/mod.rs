//! Result persistence: the partial-save and final-save naming policy.

pub mod csv_export;
pub mod xlsx_export;

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::matching::CombinedResult;

pub const PARTIAL_PREFIX: &str = "partial_matched_data_";
pub const FINAL_PREFIX: &str = "matched_data_";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported output format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveKind {
    Partial,
    Final,
}

impl SaveKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Partial => PARTIAL_PREFIX,
            Self::Final => FINAL_PREFIX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedOutput {
    pub kind: SaveKind,
    pub path: PathBuf,
    pub rows: usize,
}

/// `<dir>/<prefix><timestamp>.<ext>`, with `_<n>` before the extension for the n-th
/// file claiming the same timestamp.
pub fn output_path(
    dir: &Path,
    kind: SaveKind,
    at: NaiveDateTime,
    format: OutputFormat,
    attempt: u32,
) -> PathBuf {
    let stamp = at.format(TIMESTAMP_FORMAT);
    let name = if attempt <= 1 {
        format!("{}{}.{}", kind.prefix(), stamp, format.extension())
    } else {
        format!(
            "{}{}_{}.{}",
            kind.prefix(),
            stamp,
            attempt,
            format.extension()
        )
    };
    dir.join(name)
}

#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist an interrupted run. Nothing is written when no rows were collected.
    pub fn save_partial(
        &self,
        combined: &CombinedResult,
    ) -> Result<Option<SavedOutput>, ExportError> {
        if combined.is_empty() {
            return Ok(None);
        }
        self.save_at(SaveKind::Partial, combined, Local::now().naive_local())
            .map(Some)
    }

    /// Persist a completed run.
    pub fn save_final(&self, combined: &CombinedResult) -> Result<SavedOutput, ExportError> {
        self.save_at(SaveKind::Final, combined, Local::now().naive_local())
    }

    pub fn save(
        &self,
        kind: SaveKind,
        combined: &CombinedResult,
    ) -> Result<Option<SavedOutput>, ExportError> {
        match kind {
            SaveKind::Partial => self.save_partial(combined),
            SaveKind::Final => self.save_final(combined).map(Some),
        }
    }

    /// Write with an explicit timestamp. Existing files are never replaced.
    pub fn save_at(
        &self,
        kind: SaveKind,
        combined: &CombinedResult,
        at: NaiveDateTime,
    ) -> Result<SavedOutput, ExportError> {
        let (path, file) = self.create_unique(kind, at)?;
        let table = combined.to_table();
        let written = match self.format {
            OutputFormat::Xlsx => xlsx_export::write_xlsx(&table, file),
            OutputFormat::Csv => csv_export::write_csv(&table, file),
        };
        if let Err(e) = written {
            // Do not leave a truncated file claiming the name.
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }
        log::info!("Wrote {} rows to {}", table.row_count(), path.display());
        Ok(SavedOutput {
            kind,
            path,
            rows: table.row_count(),
        })
    }

    fn create_unique(
        &self,
        kind: SaveKind,
        at: NaiveDateTime,
    ) -> Result<(PathBuf, File), ExportError> {
        let mut attempt = 1u32;
        loop {
            let path = output_path(&self.output_dir, kind, at, self.format, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(f) => return Ok((path, f)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(source) => return Err(ExportError::Io { path, source }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Table, Value};
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap()
    }

    fn combined_with_one_row() -> CombinedResult {
        let mut t = Table::new(vec!["Name".into(), "Father Name".into()]);
        t.push_row(vec![Some(Value::from("john")), Some(Value::from("smith"))]);
        let mut acc = CombinedResult::new();
        acc.append(t, "d.csv", "r.csv");
        acc
    }

    #[test]
    fn names_follow_prefix_and_timestamp() {
        let dir = Path::new("/out");
        assert_eq!(
            output_path(dir, SaveKind::Final, ts(), OutputFormat::Xlsx, 1),
            Path::new("/out/matched_data_20240309_070501.xlsx")
        );
        assert_eq!(
            output_path(dir, SaveKind::Partial, ts(), OutputFormat::Csv, 3),
            Path::new("/out/partial_matched_data_20240309_070501_3.csv")
        );
    }

    #[test]
    fn partial_save_skips_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let w = ResultWriter::new(dir.path(), OutputFormat::Csv);
        let saved = w.save_partial(&CombinedResult::new()).unwrap();
        assert!(saved.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn same_second_saves_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let w = ResultWriter::new(dir.path(), OutputFormat::Csv);
        let acc = combined_with_one_row();
        let a = w.save_at(SaveKind::Final, &acc, ts()).unwrap();
        let b = w.save_at(SaveKind::Final, &acc, ts()).unwrap();
        assert_ne!(a.path, b.path);
        assert!(b.path.ends_with("matched_data_20240309_070501_2.csv"));
        assert_eq!(a.rows, 1);

        let text = std::fs::read_to_string(&a.path).unwrap();
        assert_eq!(
            text,
            "Name,Father Name,findout,file_names\njohn,smith,r.csv,d.csv | r.csv\n"
        );
    }

    #[test]
    fn missing_output_dir_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let w = ResultWriter::new(dir.path().join("gone"), OutputFormat::Xlsx);
        let err = w.save_final(&combined_with_one_row()).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("XLSX".parse::<OutputFormat>(), Ok(OutputFormat::Xlsx));
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert!("xls".parse::<OutputFormat>().is_err());
    }
}
