//! Tabular rendering of a trace report, one named table per worksheet.

use serde::Serialize;

use crate::model::{DirectionReport, TraceReport, TransactionKey};

pub const EXISTENCE_FOUND: &str = "Existence-Found";
pub const EXISTENCE_NOT_FOUND: &str = "Existence-Not-Found";
pub const COMPLETENESS_FOUND: &str = "Completeness-Found";
pub const COMPLETENESS_NOT_FOUND: &str = "Completeness-Not-Found";
pub const EXISTENCE_ORPHANED: &str = "Existence-Orphaned";
pub const COMPLETENESS_ORPHANED: &str = "Completeness-Orphaned";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableCell {
    Text(String),
    Integer(i64),
    /// Minor units; writers render two decimals.
    Amount(i64),
}

impl TableCell {
    /// Transaction numbers export as numbers only when the number prints
    /// back to the same text; `007` or `+7` stay text.
    fn key(key: &TransactionKey) -> Self {
        match key.as_str().parse::<i64>() {
            Ok(n) if n.to_string() == key.as_str() => Self::Integer(n),
            _ => Self::Text(key.to_string()),
        }
    }

    fn count(n: usize) -> Self {
        Self::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Plain text form, as written to CSV.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Amount(c) => crate::model::format_cents(*c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
}

impl ReportTable {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

impl TraceReport {
    /// Export tables in workbook order. Orphaned tables follow the four
    /// standard ones when `include_orphans` is set.
    pub fn tables(&self, include_orphans: bool) -> Vec<ReportTable> {
        let mut tables = vec![
            found_table(EXISTENCE_FOUND, &self.existence),
            not_found_table(EXISTENCE_NOT_FOUND, &self.existence),
            found_table(COMPLETENESS_FOUND, &self.completeness),
            not_found_table(COMPLETENESS_NOT_FOUND, &self.completeness),
        ];
        if include_orphans {
            tables.push(orphaned_table(EXISTENCE_ORPHANED, &self.existence));
            tables.push(orphaned_table(COMPLETENESS_ORPHANED, &self.completeness));
        }
        tables
    }
}

fn found_table(name: &str, report: &DirectionReport) -> ReportTable {
    let sum_header = format!("AMOUNT_CL_SUM_{}", report.target);
    let recs_header = format!("NO_OF_RECS_{}", report.target);
    let mut table = ReportTable::new(
        name,
        &[
            "TRANSACTION NUMBER",
            "DOCUMENT NUMBER",
            "AMOUNT",
            sum_header.as_str(),
            recs_header.as_str(),
            "DIFFERENCE",
        ],
    );
    // DOCUMENT NUMBER carries the source record count.
    table.rows = report
        .matches
        .iter()
        .map(|m| {
            vec![
                TableCell::key(&m.transaction_number),
                TableCell::count(m.record_count),
                TableCell::Amount(m.amount_cents),
                TableCell::Amount(m.target_amount_cents),
                TableCell::count(m.target_count),
                TableCell::Amount(m.difference_cents),
            ]
        })
        .collect();
    table
}

fn not_found_table(name: &str, report: &DirectionReport) -> ReportTable {
    let mut table = ReportTable::new(
        name,
        &["LEAD SHEET NUMBER", "ACCOUNT NAME", "NUMBER_OF_RECORDS", "AMOUNT"],
    );
    table.rows = report
        .residual
        .iter()
        .map(|r| {
            vec![
                r.lead_sheet
                    .map(|l| TableCell::Integer(l.0))
                    .unwrap_or_else(|| TableCell::Text(String::new())),
                TableCell::Text(r.account_name.clone()),
                TableCell::count(r.record_count),
                TableCell::Amount(r.amount_cents),
            ]
        })
        .collect();
    table
}

fn orphaned_table(name: &str, report: &DirectionReport) -> ReportTable {
    let mut table = ReportTable::new(name, &["TRANSACTION NUMBER", "NUMBER_OF_RECORDS", "AMOUNT"]);
    table.rows = report
        .orphaned
        .iter()
        .map(|o| {
            vec![
                TableCell::key(&o.transaction_number),
                TableCell::count(o.record_count),
                TableCell::Amount(o.amount_cents),
            ]
        })
        .collect();
    table
}
