//! Common test utilities and fixtures

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

/// Temporary data / reference / output folders for one run.
pub struct TestFolders {
    pub temp_dir: TempDir,
    pub data: PathBuf,
    pub reference: PathBuf,
    pub output: PathBuf,
}

impl TestFolders {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data = temp_dir.path().join("data");
        let reference = temp_dir.path().join("reference");
        let output = temp_dir.path().join("output");
        fs::create_dir(&data).unwrap();
        fs::create_dir(&reference).unwrap();
        Self {
            temp_dir,
            data,
            reference,
            output,
        }
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        let mut v: Vec<PathBuf> = match fs::read_dir(&self.output) {
            Ok(rd) => rd.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        };
        v.sort();
        v
    }
}

pub fn write_csv(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write csv fixture");
}

/// Write a single-sheet workbook; every cell is a string.
pub fn write_xlsx(path: &Path, rows: &[&[&str]]) {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, v) in row.iter().enumerate() {
            if !v.is_empty() {
                ws.write_string(r as u32, c as u16, *v).unwrap();
            }
        }
    }
    wb.save(path).expect("Failed to write xlsx fixture");
}
