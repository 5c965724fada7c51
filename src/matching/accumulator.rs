use crate::models::{Cell, FILE_NAMES_COL, FINDOUT_COL, Table, Value};

/// Running union of every pair's match rows, in the order they were appended.
///
/// Columns are the ordered union of all batch columns; rows from a batch that
/// lacked a column read as missing there. The provenance columns `findout` and
/// `file_names` always come last.
#[derive(Debug, Clone, Default)]
pub struct CombinedResult {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    provenance: Vec<(String, String)>,
}

impl CombinedResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tag `batch` with its file pair and append it. Returns the number of rows
    /// appended; an empty batch is a no-op.
    pub fn append(&mut self, batch: Table, data_name: &str, reference_name: &str) -> usize {
        if batch.is_empty() {
            return 0;
        }
        // Provenance columns carried in from the inputs are replaced by this pair's.
        let slots: Vec<Option<usize>> = batch
            .columns()
            .iter()
            .map(|c| {
                if c == FINDOUT_COL || c == FILE_NAMES_COL {
                    return None;
                }
                Some(match self.columns.iter().position(|x| x == c) {
                    Some(i) => i,
                    None => {
                        self.columns.push(c.clone());
                        self.columns.len() - 1
                    }
                })
            })
            .collect();

        let label = format!("{} | {}", data_name, reference_name);
        let added = batch.row_count();
        self.rows.reserve(added);
        for src in batch.rows() {
            let mut row: Vec<Cell> = vec![None; self.columns.len()];
            for (cell, slot) in src.iter().zip(&slots) {
                if let Some(i) = *slot {
                    row[i] = cell.clone();
                }
            }
            self.rows.push(row);
            self.provenance
                .push((reference_name.to_string(), label.clone()));
        }
        added
    }

    /// Materialize the combined rows, provenance columns included.
    pub fn to_table(&self) -> Table {
        let mut cols = self.columns.clone();
        cols.push(FINDOUT_COL.to_string());
        cols.push(FILE_NAMES_COL.to_string());
        let width = self.columns.len();
        let mut t = Table::new(cols);
        for (row, (findout, names)) in self.rows.iter().zip(&self.provenance) {
            let mut r = row.clone();
            r.resize(width, None);
            r.push(Some(Value::Text(findout.clone())));
            r.push(Some(Value::Text(names.clone())));
            t.push_row(r);
        }
        t
    }
}
