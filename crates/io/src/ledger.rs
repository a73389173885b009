// Ledger import: CSV/TSV and Excel/ODS workbooks into a Dataset

use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;

use leadtrace_recon::model::{CellValue, Dataset};

/// Read a ledger file. The first row is the header; `sheet` selects a
/// worksheet in workbook formats (first sheet when `None`).
pub fn read_dataset(path: &Path, sheet: Option<&str>) -> Result<Dataset, String> {
    let ext = extension(path);
    let (headers, rows) = match ext.as_str() {
        "csv" | "txt" => {
            warn_sheet_ignored(path, sheet);
            let content = read_file_as_utf8(path)?;
            let delimiter = sniff_delimiter(&content);
            read_delimited(&content, delimiter)?
        }
        "tsv" => {
            warn_sheet_ignored(path, sheet);
            read_delimited(&read_file_as_utf8(path)?, b'\t')?
        }
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path, sheet)?,
        other => return Err(format!("unsupported ledger format '.{other}' ({})", path.display())),
    };

    log::debug!(
        "read {} ledger rows, {} columns from {}",
        rows.len(),
        headers.len(),
        path.display()
    );
    Dataset::new(headers, rows).map_err(|e| format!("{}: {e}", path.display()))
}

/// Worksheet names of a workbook, in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, String> {
    let workbook = open_workbook_auto(path).map_err(|e| format!("Failed to open workbook: {}", e))?;
    Ok(workbook.sheet_names().to_vec())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn warn_sheet_ignored(path: &Path, sheet: Option<&str>) {
    if let Some(name) = sheet {
        log::warn!("sheet '{name}' ignored: {} is not a workbook", path.display());
    }
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with the header's field count, weighted by that count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252).
fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
    Ok(decode(bytes))
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s),
        Err(e) => {
            log::debug!("ledger is not UTF-8, decoding as Windows-1252");
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

fn read_delimited(content: &str, delimiter: u8) -> Result<(Vec<String>, Vec<Vec<CellValue>>), String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Err("ledger is empty: no header row".to_string()),
    };
    let header: Vec<CellValue> = header.iter().map(CellValue::from).collect();

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(CellValue::from).collect());
    }

    Ok(frame(header, rows))
}

// ---------------------------------------------------------------------------
// Workbooks
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<(Vec<String>, Vec<Vec<CellValue>>), String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| format!("Failed to open workbook: {}", e))?;
    let sheet_names = workbook.sheet_names().to_vec();

    let name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(format!(
                    "sheet '{}' not found (available: {})",
                    name,
                    sheet_names.join(", ")
                ));
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "workbook contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", name, e))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| format!("sheet '{name}' is empty: no header row"))?;
    let header: Vec<CellValue> = header.iter().map(cell_value).collect();
    let data: Vec<Vec<CellValue>> = rows.map(|r| r.iter().map(cell_value).collect()).collect();

    Ok(frame(header, data))
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => CellValue::text(format!("#{:?}", e)),
        Data::DateTime(dt) => {
            // 1900 date system assumed
            let serial = dt.as_f64();
            serial_to_date(serial)
                .map(CellValue::Date)
                .unwrap_or(CellValue::Number(serial))
        }
        Data::DateTimeIso(s) => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s.as_str()), "%Y-%m-%d")
            .map(CellValue::Date)
            .unwrap_or_else(|_| CellValue::text(s.clone())),
        Data::DurationIso(s) => CellValue::text(s.clone()),
    }
}

/// Excel serial day to calendar date (epoch 1899-12-30). Time of day is dropped.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Square up a header row and its data rows.
///
/// The table is as wide as its last column holding a label or any value.
/// Blank labels inside that width become `Unnamed: {index}`; columns that
/// are blank in the header and in every row past it are dropped.
fn frame(header: Vec<CellValue>, mut rows: Vec<Vec<CellValue>>) -> (Vec<String>, Vec<Vec<CellValue>>) {
    let used = |cells: &[CellValue]| cells.iter().rposition(|c| !c.is_blank()).map_or(0, |i| i + 1);
    let width = rows
        .iter()
        .map(|r| used(r.as_slice()))
        .fold(used(header.as_slice()), usize::max);

    let headers = (0..width)
        .map(|i| match header.get(i).map(|c| c.display()) {
            Some(label) if !label.is_empty() => label,
            _ => format!("Unnamed: {i}"),
        })
        .collect();
    for row in &mut rows {
        row.truncate(width);
    }

    (headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Account;Amount;Memo\n\"Cash, petty\";\"1,250.00\";x\nAP;-5;y\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_read_semicolon_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.csv");
        fs::write(&path, "Acct;Lead;Amt\n1000;10;\"1,250.00\"\n2000;20;-5\n").unwrap();

        let ds = read_dataset(&path, None).unwrap();
        assert_eq!(ds.headers(), &["Acct", "Lead", "Amt"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0][2], CellValue::text("1,250.00"));
    }

    #[test]
    fn test_read_windows_1252_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.csv");
        // "Café" with 0xE9
        fs::write(&path, b"Account,Amount\nCaf\xe9,10\n").unwrap();

        let ds = read_dataset(&path, None).unwrap();
        assert_eq!(ds.rows()[0][0], CellValue::text("Café"));
    }

    #[test]
    fn test_read_csv_with_bom_and_blank_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.csv");
        fs::write(&path, "\u{feff}Account,,Amount\nCash,x,1\n").unwrap();

        let ds = read_dataset(&path, None).unwrap();
        assert_eq!(ds.headers(), &["Account", "Unnamed: 1", "Amount"]);
    }

    #[test]
    fn test_read_csv_duplicate_headers_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.csv");
        fs::write(&path, "Amount,Amount\n1,2\n").unwrap();

        let err = read_dataset(&path, None).unwrap_err();
        assert!(err.contains("duplicate column label"), "{err}");
    }

    #[test]
    fn test_read_tsv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.tsv");
        fs::write(&path, "A,1\tB\nx,y\tz\n").unwrap();

        let ds = read_dataset(&path, None).unwrap();
        assert_eq!(ds.headers(), &["A,1", "B"]);
        assert_eq!(ds.rows()[0][1], CellValue::text("z"));
    }

    #[test]
    fn test_empty_csv_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.csv");
        fs::write(&path, "").unwrap();
        assert!(read_dataset(&path, None).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_dataset(Path::new("ledger.pdf"), None).unwrap_err();
        assert!(err.contains(".pdf"));
    }

    #[test]
    fn test_read_xlsx_typed_cells() {
        use rust_xlsxwriter::{Format, Workbook};

        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let ws = workbook.add_worksheet().set_name("Notes").unwrap();
        ws.write_string(0, 0, "ignore me").unwrap();
        let ws = workbook.add_worksheet().set_name("Ledger").unwrap();
        ws.write_string(0, 0, "Account").unwrap();
        ws.write_string(0, 1, "Lead").unwrap();
        ws.write_string(0, 2, "Posted").unwrap();
        ws.write_string(0, 3, "Amount").unwrap();
        ws.write_string(1, 0, "Cash").unwrap();
        ws.write_number(1, 1, 10.0).unwrap();
        ws.write_number_with_format(1, 2, 45688.0, &date_format).unwrap();
        ws.write_number(1, 3, -12.5).unwrap();
        workbook.save(&path).unwrap();

        assert_eq!(sheet_names(&path).unwrap(), vec!["Notes", "Ledger"]);

        let ds = read_dataset(&path, Some("Ledger")).unwrap();
        assert_eq!(ds.headers(), &["Account", "Lead", "Posted", "Amount"]);
        assert_eq!(ds.rows()[0][0], CellValue::text("Cash"));
        assert_eq!(ds.rows()[0][1], CellValue::Number(10.0));
        assert_eq!(
            ds.rows()[0][2],
            CellValue::Date(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap())
        );
        assert_eq!(ds.rows()[0][3], CellValue::Number(-12.5));

        let first = read_dataset(&path, None).unwrap();
        assert_eq!(first.headers(), &["ignore me"]);

        let err = read_dataset(&path, Some("Missing")).unwrap_err();
        assert!(err.contains("Notes, Ledger"), "{err}");
    }

    #[test]
    fn test_serial_to_date() {
        assert_eq!(serial_to_date(45688.0), NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(serial_to_date(45688.75), NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(serial_to_date(-1.0), None);
    }

    #[test]
    fn test_read_csv_unlabeled_trailing_column_with_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.csv");
        fs::write(&path, "Acct,Lead,Amt,\n1000,10,5,note\n2000,20,-5,\n").unwrap();

        let ds = read_dataset(&path, None).unwrap();
        assert_eq!(ds.headers(), &["Acct", "Lead", "Amt", "Unnamed: 3"]);
        assert_eq!(ds.rows()[0][3], CellValue::text("note"));
        assert_eq!(ds.rows()[1][3], CellValue::Empty);
    }

    #[test]
    fn test_read_csv_empty_trailing_columns_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.csv");
        fs::write(&path, "Acct,Amt,,\n1000,5,,\n2000,-5,\n").unwrap();

        let ds = read_dataset(&path, None).unwrap();
        assert_eq!(ds.headers(), &["Acct", "Amt"]);
        assert_eq!(ds.rows()[0].len(), 2);
    }

    #[test]
    fn test_read_xlsx_unlabeled_trailing_column_with_data() {
        use rust_xlsxwriter::Workbook;

        let dir = tempdir().unwrap();
        let path = dir.path().join("gl.xlsx");

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.write_string(0, 0, "Account").unwrap();
        ws.write_string(0, 1, "Amount").unwrap();
        ws.write_string(1, 0, "Cash").unwrap();
        ws.write_number(1, 1, 10.0).unwrap();
        ws.write_string(2, 0, "AP").unwrap();
        ws.write_number(2, 1, -10.0).unwrap();
        ws.write_string(2, 3, "reviewed").unwrap();
        workbook.save(&path).unwrap();

        let ds = read_dataset(&path, None).unwrap();
        assert_eq!(ds.headers(), &["Account", "Amount", "Unnamed: 2", "Unnamed: 3"]);
        assert_eq!(ds.rows()[1][3], CellValue::text("reviewed"));
    }
}
