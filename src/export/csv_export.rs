use std::fs::File;
use std::io::BufWriter;

use csv::WriterBuilder;

use crate::error::ExportError;
use crate::models::Table;

fn csv_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Csv(e.to_string())
}

/// Write `table` as comma-delimited text: header row, then one record per row.
/// Missing cells are written empty.
pub fn write_csv(table: &Table, file: File) -> Result<(), ExportError> {
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    let mut w = WriterBuilder::new().from_writer(buf_writer);
    w.write_record(table.columns()).map_err(csv_err)?;
    for row in table.rows() {
        let record: Vec<String> = row
            .iter()
            .map(|c| c.as_ref().map(|v| v.to_string()).unwrap_or_default())
            .collect();
        w.write_record(&record).map_err(csv_err)?;
    }
    w.flush().map_err(csv_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    #[test]
    fn writes_header_and_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.csv");
        let mut t = Table::new(vec!["Name".into(), "Father Name".into(), "Age".into()]);
        t.push_row(vec![Some("john".into()), Some("smith, jr".into()), None]);
        t.push_row(vec![Some("jane".into()), Some("doe".into()), Some(Value::Int(7))]);

        write_csv(&t, File::create(&p).unwrap()).unwrap();
        let text = std::fs::read_to_string(&p).unwrap();
        assert_eq!(
            text,
            "Name,Father Name,Age\njohn,\"smith, jr\",\njane,doe,7\n"
        );
    }
}
