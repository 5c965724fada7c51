use crate::error::LoadError;
use crate::models::{FATHER_NAME_COL, NAME_COL, Table, Value};

/// Which casing the displayed key columns carry in the match output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    /// Key columns keep the casing found in the source file.
    #[default]
    Original,
    /// Key columns are written lowercased, exactly as they were compared.
    Lowered,
}

pub fn normalize_text(input: &str) -> String {
    input.to_lowercase()
}

/// Normalized comparison key for one row. `None` components are missing cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub name: Option<String>,
    pub father_name: Option<String>,
}

impl RowKey {
    /// Both components present and the father name non-empty after normalization.
    pub fn is_matchable(&self) -> bool {
        self.name.is_some() && self.father_name.as_deref().is_some_and(|f| !f.is_empty())
    }
}

/// A table together with the normalized key of each of its rows.
#[derive(Debug, Clone)]
pub struct KeyedTable {
    pub table: Table,
    pub keys: Vec<RowKey>,
    pub name_idx: usize,
    pub father_idx: usize,
}

fn norm_cell(v: Option<&Value>) -> Option<String> {
    v.map(|v| normalize_text(&v.to_string()))
}

/// Lowercase the identity key of every row. `label` names the table in errors.
pub fn normalize_keys(table: Table, label: &str) -> Result<KeyedTable, LoadError> {
    let name_idx = table
        .column_index(NAME_COL)
        .ok_or_else(|| LoadError::MissingColumn {
            column: NAME_COL,
            table: label.to_string(),
        })?;
    let father_idx = table
        .column_index(FATHER_NAME_COL)
        .ok_or_else(|| LoadError::MissingColumn {
            column: FATHER_NAME_COL,
            table: label.to_string(),
        })?;
    let keys = table
        .rows()
        .iter()
        .map(|r| RowKey {
            name: norm_cell(r[name_idx].as_ref()),
            father_name: norm_cell(r[father_idx].as_ref()),
        })
        .collect();
    Ok(KeyedTable {
        table,
        keys,
        name_idx,
        father_idx,
    })
}

impl KeyedTable {
    /// Overwrite the displayed key columns with their normalized form.
    pub fn lower_key_columns(&mut self) {
        let (ni, fi) = (self.name_idx, self.father_idx);
        for (row, key) in self.table.rows_mut().iter_mut().zip(&self.keys) {
            row[ni] = key.name.clone().map(Value::Text);
            row[fi] = key.father_name.clone().map(Value::Text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        let mut t = Table::new(vec!["Name".into(), "Father Name".into(), "Age".into()]);
        t.push_row(vec![
            Some("ALICE".into()),
            Some("Bob".into()),
            Some(Value::Int(3)),
        ]);
        t.push_row(vec![Some("Éva".into()), None, None]);
        t
    }

    #[test]
    fn test_normalize_text_lowercases_only() {
        assert_eq!(normalize_text("JoHN"), "john");
        assert_eq!(normalize_text("  Éva "), "  éva ");
    }

    #[test]
    fn keys_are_lowered_and_display_untouched() {
        let k = normalize_keys(people(), "people.csv").unwrap();
        assert_eq!(k.keys[0].name.as_deref(), Some("alice"));
        assert_eq!(k.keys[0].father_name.as_deref(), Some("bob"));
        assert_eq!(k.keys[1].father_name, None);
        assert_eq!(k.table.cell(0, "Name"), Some(&Value::Text("ALICE".into())));
    }

    #[test]
    fn lower_key_columns_rewrites_display() {
        let mut k = normalize_keys(people(), "people.csv").unwrap();
        k.lower_key_columns();
        assert_eq!(k.table.cell(0, "Name"), Some(&Value::Text("alice".into())));
        assert_eq!(k.table.cell(1, "Name"), Some(&Value::Text("éva".into())));
        assert_eq!(k.table.cell(0, "Age"), Some(&Value::Int(3)));
    }

    #[test]
    fn missing_column_is_reported() {
        let t = Table::new(vec!["Name".into(), "Age".into()]);
        let err = normalize_keys(t, "r.csv").unwrap_err();
        match err {
            LoadError::MissingColumn { column, table } => {
                assert_eq!(column, "Father Name");
                assert_eq!(table, "r.csv");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn matchable_requires_non_empty_father() {
        let k = RowKey {
            name: Some("a".into()),
            father_name: Some(String::new()),
        };
        assert!(!k.is_matchable());
        let k = RowKey {
            name: None,
            father_name: Some("b".into()),
        };
        assert!(!k.is_matchable());
        let k = RowKey {
            name: Some("a".into()),
            father_name: Some("b".into()),
        };
        assert!(k.is_matchable());
    }
}
