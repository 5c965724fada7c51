//! Pairwise matching of one reference table against one data table.

use std::collections::HashMap;

use crate::models::{Cell, Table, Value};
use crate::normalize::{KeyCase, KeyedTable};

pub mod accumulator;

pub use accumulator::CombinedResult;

/// Suffixes for a non-key column present on both sides.
pub const REFERENCE_SUFFIX: &str = "_x";
pub const DATA_SUFFIX: &str = "_y";

/// Output layout of a join: reference columns, then data columns minus the key.
fn joined_columns(reference: &KeyedTable, data: &KeyedTable) -> (Vec<String>, Vec<usize>) {
    let ref_cols = reference.table.columns();
    let data_cols = data.table.columns();
    let is_ref_key = |i: usize| i == reference.name_idx || i == reference.father_idx;
    let is_data_key = |i: usize| i == data.name_idx || i == data.father_idx;

    let data_payload: Vec<usize> = (0..data_cols.len()).filter(|&i| !is_data_key(i)).collect();

    let mut columns = Vec::with_capacity(ref_cols.len() + data_payload.len());
    for (i, c) in ref_cols.iter().enumerate() {
        let shared = !is_ref_key(i) && data_payload.iter().any(|&j| &data_cols[j] == c);
        if shared {
            columns.push(format!("{}{}", c, REFERENCE_SUFFIX));
        } else {
            columns.push(c.clone());
        }
    }
    for &j in &data_payload {
        let c = &data_cols[j];
        let shared = ref_cols
            .iter()
            .enumerate()
            .any(|(i, rc)| !is_ref_key(i) && rc == c);
        if shared {
            columns.push(format!("{}{}", c, DATA_SUFFIX));
        } else {
            columns.push(c.clone());
        }
    }
    (columns, data_payload)
}

/// Inner join on the normalized (Name, Father Name) key.
///
/// Every reference row is paired with every data row sharing its key, so duplicate
/// keys on either side produce all combinations. Rows whose key has a missing
/// component or an empty father name are dropped. Output order is reference-row
/// major, then data-row major.
pub fn match_pair(reference: &KeyedTable, data: &KeyedTable, key_case: KeyCase) -> Table {
    let (columns, data_payload) = joined_columns(reference, data);
    let mut out = Table::new(columns);

    let mut index: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (j, key) in data.keys.iter().enumerate() {
        if !key.is_matchable() {
            continue;
        }
        if let (Some(n), Some(f)) = (key.name.as_deref(), key.father_name.as_deref()) {
            index.entry((n, f)).or_default().push(j);
        }
    }
    if index.is_empty() {
        return out;
    }

    for (i, key) in reference.keys.iter().enumerate() {
        if !key.is_matchable() {
            continue;
        }
        let (Some(n), Some(f)) = (key.name.as_deref(), key.father_name.as_deref()) else {
            continue;
        };
        let Some(hits) = index.get(&(n, f)) else {
            continue;
        };
        let ref_row = &reference.table.rows()[i];
        for &j in hits {
            let data_row = &data.table.rows()[j];
            let mut row: Vec<Cell> = Vec::with_capacity(out.columns().len());
            for (c, cell) in ref_row.iter().enumerate() {
                let v = match key_case {
                    KeyCase::Lowered if c == reference.name_idx => Some(Value::Text(n.to_string())),
                    KeyCase::Lowered if c == reference.father_idx => {
                        Some(Value::Text(f.to_string()))
                    }
                    _ => cell.clone(),
                };
                row.push(v);
            }
            row.extend(data_payload.iter().map(|&c| data_row[c].clone()));
            out.push_row(row);
        }
    }
    out
}
