use std::fs::File;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};

use crate::error::ExportError;
use crate::models::{Table, Value};

pub const SHEET_NAME: &str = "Matches";

fn xlsx_err(e: XlsxError) -> ExportError {
    ExportError::Xlsx(e.to_string())
}

fn header_format() -> Format {
    Format::new().set_bold().set_align(FormatAlign::Center)
}

fn write_sheet(ws: &mut Worksheet, table: &Table) -> Result<(), XlsxError> {
    let hfmt = header_format();
    for (c, h) in table.columns().iter().enumerate() {
        ws.write_string_with_format(0, c as u16, h, &hfmt)?;
    }
    for (i, row) in table.rows().iter().enumerate() {
        let r = (i as u32) + 1;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                None => {}
                Some(Value::Text(s)) => {
                    ws.write_string(r, c, s)?;
                }
                Some(Value::Int(n)) => {
                    ws.write_number(r, c, *n as f64)?;
                }
                Some(Value::Float(x)) if x.is_finite() => {
                    ws.write_number(r, c, *x)?;
                }
                Some(Value::Float(x)) => {
                    ws.write_string(r, c, x.to_string())?;
                }
                Some(Value::Bool(b)) => {
                    ws.write_boolean(r, c, *b)?;
                }
            }
        }
    }
    ws.autofit();
    Ok(())
}

/// Write `table` into a single-sheet workbook streamed to `file`.
pub fn write_xlsx(table: &Table, file: File) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(xlsx_err)?;
    write_sheet(sheet, table).map_err(xlsx_err)?;
    workbook.save_to_writer(file).map_err(xlsx_err)?;
    Ok(())
}
