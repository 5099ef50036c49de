//! Export of pivot results to CSV and Excel.

use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::Value;
use thiserror::Error;

use crate::executor::ResultTable;

/// Excel's row limit per worksheet, header row included.
pub const EXCEL_MAX_ROWS: usize = 1_048_576;

/// Excel's column limit per worksheet.
pub const EXCEL_MAX_COLUMNS: usize = 16_384;

const SHEET_NAME: &str = "pivot";

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    /// The result does not fit the target format.
    #[error("result too large for Excel ({rows} rows, {columns} columns); export as CSV instead")]
    ResultTooLarge { rows: usize, columns: usize },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel export failed: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Text written for a cell. Nulls become empty cells.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serialize `table` as UTF-8 CSV with a header row.
pub fn to_csv_bytes(table: &ResultTable) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
    for row in &table.rows {
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

/// Fail with [`ExportError::ResultTooLarge`] if `table` cannot fit one worksheet.
pub fn check_excel_limits(table: &ResultTable) -> ExportResult<()> {
    let rows = table.row_count();
    let columns = table.column_count();
    // One worksheet row goes to the header.
    if rows + 1 > EXCEL_MAX_ROWS || columns > EXCEL_MAX_COLUMNS {
        return Err(ExportError::ResultTooLarge { rows, columns });
    }
    Ok(())
}

/// Serialize `table` as a single-sheet `.xlsx` workbook.
///
/// Numbers and booleans are written as typed cells, everything else as text.
pub fn to_xlsx_bytes(table: &ResultTable) -> ExportResult<Vec<u8>> {
    check_excel_limits(table)?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, column) in table.columns.iter().enumerate() {
        sheet.write_string(0, col as u16, &column.name)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let xl_row = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let xl_col = c as u16;
            match value {
                Value::Null => {}
                Value::Bool(b) => {
                    sheet.write_boolean(xl_row, xl_col, *b)?;
                }
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        sheet.write_number(xl_row, xl_col, f)?;
                    }
                    None => {
                        sheet.write_string(xl_row, xl_col, n.to_string())?;
                    }
                },
                other => {
                    sheet.write_string(xl_row, xl_col, cell_text(other))?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
