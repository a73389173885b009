// Trace report export: XLSX workbook, per-table CSV, JSON

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};
use serde::Serialize;

use leadtrace_recon::report::{ReportTable, TableCell};

const AMOUNT_FORMAT: &str = "#,##0.00";

/// Write one worksheet per table, named after the table.
pub fn write_report_xlsx(tables: &[ReportTable], path: &Path) -> Result<(), String> {
    let mut workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format(AMOUNT_FORMAT);

    for table in tables {
        let worksheet = workbook
            .add_worksheet()
            .set_name(&table.name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", table.name, e))?;

        write_table(worksheet, table, &header_format, &amount_format)
            .map_err(|e| format!("Failed to write sheet '{}': {}", table.name, e))?;
        worksheet.autofit();
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    log::debug!("wrote {} tables to {}", tables.len(), path.display());
    Ok(())
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &ReportTable,
    header_format: &Format,
    amount_format: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            match cell {
                TableCell::Text(s) if s.is_empty() => {}
                TableCell::Text(s) => {
                    worksheet.write_string(row32, col16, s)?;
                }
                TableCell::Integer(n) => {
                    worksheet.write_number(row32, col16, *n as f64)?;
                }
                TableCell::Amount(cents) => {
                    worksheet.write_number_with_format(
                        row32,
                        col16,
                        *cents as f64 / 100.0,
                        amount_format,
                    )?;
                }
            }
        }
    }

    Ok(())
}

/// Write each table to `{dir}/{name}.csv`, creating `dir` if needed.
pub fn write_report_csv(tables: &[ReportTable], dir: &Path) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("{}: {e}", dir.display()))?;

    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.csv", table.name));
        let mut writer = csv::Writer::from_path(&path).map_err(|e| e.to_string())?;

        writer.write_record(&table.headers).map_err(|e| e.to_string())?;
        for row in &table.rows {
            writer
                .write_record(row.iter().map(TableCell::render))
                .map_err(|e| e.to_string())?;
        }
        writer.flush().map_err(|e| e.to_string())?;
        written.push(path);
    }

    Ok(written)
}

/// Pretty-printed JSON.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value).map_err(|e| e.to_string())?;
    Ok(())
}
