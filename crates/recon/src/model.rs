use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A single scalar read from a ledger cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Blank cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::Date(_) => false,
        }
    }

    /// Canonical text form. Integral numbers print without a fraction.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// A ledger table as read from a spreadsheet: unique header labels plus rows
/// of the same width.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate header labels. Short rows are
    /// padded with empty cells; long rows are an error.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, ReconError> {
        let mut seen = BTreeSet::new();
        for h in &headers {
            if !seen.insert(h.as_str()) {
                return Err(ReconError::Schema(format!("duplicate column label '{h}'")));
            }
        }

        let width = headers.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(ReconError::Schema(format!(
                    "row {} has {} cells but the header has {width} columns",
                    i + 1,
                    row.len()
                )));
            }
            row.resize(width, CellValue::Empty);
            padded.push(row);
        }

        Ok(Self { headers, rows: padded })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, label: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = self.column_index(label)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }
}

// ---------------------------------------------------------------------------
// Canonical schema
// ---------------------------------------------------------------------------

/// The eight semantic columns every ledger must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredColumn {
    AccountCode,
    AccountName,
    TransactionDate,
    TransactionSource,
    LeadSheetNumber,
    Amount,
    TransactionNumber,
    DocumentNumber,
}

impl RequiredColumn {
    /// Canonical order of the normalized ledger.
    pub const ALL: [RequiredColumn; 8] = [
        Self::AccountCode,
        Self::AccountName,
        Self::TransactionDate,
        Self::TransactionSource,
        Self::LeadSheetNumber,
        Self::Amount,
        Self::TransactionNumber,
        Self::DocumentNumber,
    ];

    /// Canonical header text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountCode => "ACCOUNT CODE",
            Self::AccountName => "ACCOUNT NAME",
            Self::TransactionDate => "TRANSACTION DATE",
            Self::TransactionSource => "TRANSACTION SOURCE",
            Self::LeadSheetNumber => "LEAD SHEET NUMBER",
            Self::Amount => "AMOUNT",
            Self::TransactionNumber => "TRANSACTION NUMBER",
            Self::DocumentNumber => "DOCUMENT NUMBER",
        }
    }

    /// Key used in config files (`account_code`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Self::AccountCode => "account_code",
            Self::AccountName => "account_name",
            Self::TransactionDate => "transaction_date",
            Self::TransactionSource => "transaction_source",
            Self::LeadSheetNumber => "lead_sheet_number",
            Self::Amount => "amount",
            Self::TransactionNumber => "transaction_number",
            Self::DocumentNumber => "document_number",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == header)
    }
}

impl fmt::Display for RequiredColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integer lead sheet number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadSheetId(pub i64);

impl LeadSheetId {
    /// Coerce user input (`"10"`, `"10.0"`, `" 10 "`) to a lead sheet id.
    pub fn parse(s: &str) -> Result<Self, ReconError> {
        integral_text(s)
            .map(Self)
            .ok_or_else(|| ReconError::InvalidLeadId { value: s.to_string() })
    }

    /// Coerce a ledger cell. Blank and non-integral cells yield `None`.
    pub fn from_cell(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Number(n) => integral_f64(*n).map(Self),
            CellValue::Text(s) => integral_text(s).map(Self),
            CellValue::Empty | CellValue::Date(_) => None,
        }
    }
}

impl fmt::Display for LeadSheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn integral_f64(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        Some(n as i64)
    } else {
        None
    }
}

fn integral_text(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
}

/// Canonical transaction number. Numeric keys order by value and sort ahead
/// of non-numeric keys, which order lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransactionKey(String);

impl TransactionKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn from_cell(value: &CellValue) -> Self {
        Self(value.display())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    fn numeric(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

impl Ord for TransactionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for TransactionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Normalized ledger
// ---------------------------------------------------------------------------

/// One ledger row projected onto the eight canonical columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub account_code: String,
    pub account_name: String,
    pub transaction_date: CellValue,
    pub transaction_source: String,
    pub lead_sheet: Option<LeadSheetId>,
    pub amount_cents: i64,
    pub transaction_number: TransactionKey,
    pub document_number: String,
}

impl LedgerRow {
    /// Cells in canonical column order.
    pub fn cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::from(self.account_code.as_str()),
            CellValue::from(self.account_name.as_str()),
            self.transaction_date.clone(),
            CellValue::from(self.transaction_source.as_str()),
            self.lead_sheet
                .map(|l| CellValue::Number(l.0 as f64))
                .unwrap_or(CellValue::Empty),
            CellValue::Number(self.amount_cents as f64 / 100.0),
            CellValue::from(self.transaction_number.as_str()),
            CellValue::from(self.document_number.as_str()),
        ]
    }
}

/// Counters collected while normalizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeStats {
    pub rows_read: usize,
    pub blank_rows_skipped: usize,
    pub rows_without_lead: usize,
}

/// A ledger whose columns are exactly the eight canonical ones.
#[derive(Debug, Clone, Default)]
pub struct NormalizedDataset {
    rows: Vec<LedgerRow>,
    stats: NormalizeStats,
}

impl NormalizedDataset {
    pub fn new(rows: Vec<LedgerRow>, stats: NormalizeStats) -> Self {
        Self { rows, stats }
    }

    pub fn from_rows(rows: Vec<LedgerRow>) -> Self {
        let stats = NormalizeStats {
            rows_read: rows.len(),
            blank_rows_skipped: 0,
            rows_without_lead: rows.iter().filter(|r| r.lead_sheet.is_none()).count(),
        };
        Self { rows, stats }
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn stats(&self) -> &NormalizeStats {
        &self.stats
    }

    pub fn headers() -> [&'static str; 8] {
        RequiredColumn::ALL.map(|c| c.as_str())
    }

    /// Rows posted to one lead sheet.
    pub fn in_lead(&self, lead: LeadSheetId) -> impl Iterator<Item = &LedgerRow> + '_ {
        self.rows.iter().filter(move |r| r.lead_sheet == Some(lead))
    }

    pub fn contains_lead(&self, lead: LeadSheetId) -> bool {
        self.in_lead(lead).next().is_some()
    }

    /// Distinct lead sheet numbers, ascending.
    pub fn lead_sheets(&self) -> Vec<LeadSheetId> {
        let set: BTreeSet<LeadSheetId> = self.rows.iter().filter_map(|r| r.lead_sheet).collect();
        set.into_iter().collect()
    }

    /// Project back to a plain dataset with canonical headers.
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            headers: Self::headers().iter().map(|h| h.to_string()).collect(),
            rows: self.rows.iter().map(LedgerRow::cells).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation + matching
// ---------------------------------------------------------------------------

/// All rows of one transaction within one lead sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionAggregate {
    pub transaction_number: TransactionKey,
    pub record_count: usize,
    pub amount_cents: i64,
}

/// A source transaction compared against the target lead sheet.
///
/// `difference_cents` is `amount_cents + target_amount_cents`: the two lead
/// sheets are expected to carry opposing-sign postings for the same
/// transaction, so a full offset nets to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub transaction_number: TransactionKey,
    pub record_count: usize,
    pub amount_cents: i64,
    pub target_count: usize,
    pub target_amount_cents: i64,
    pub difference_cents: i64,
}

impl MatchResult {
    pub fn is_found(&self) -> bool {
        self.target_count > 0
    }

    pub fn is_offset(&self) -> bool {
        self.difference_cents == 0
    }
}

// ---------------------------------------------------------------------------
// Residuals
// ---------------------------------------------------------------------------

/// Where unmatched transactions were posted instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidualRow {
    pub lead_sheet: Option<LeadSheetId>,
    pub account_name: String,
    pub record_count: usize,
    pub amount_cents: i64,
}

/// A not-found transaction with no rows outside the source lead sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedTransaction {
    pub transaction_number: TransactionKey,
    pub record_count: usize,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Residual {
    pub rows: Vec<ResidualRow>,
    pub orphaned: Vec<OrphanedTransaction>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Existence,
    Completeness,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Existence => "Existence",
            Self::Completeness => "Completeness",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectionSummary {
    pub transactions: usize,
    pub found: usize,
    pub found_with_difference: usize,
    pub not_found: usize,
    pub orphaned: usize,
    pub residual_groups: usize,
    pub source_amount_cents: i64,
    pub not_found_amount_cents: i64,
}

impl DirectionSummary {
    /// True when every source transaction was found and fully offset.
    pub fn is_clean(&self) -> bool {
        self.not_found == 0 && self.found_with_difference == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectionReport {
    pub direction: Direction,
    pub source: LeadSheetId,
    pub target: LeadSheetId,
    pub matches: Vec<MatchResult>,
    pub residual: Vec<ResidualRow>,
    pub orphaned: Vec<OrphanedTransaction>,
    pub summary: DirectionSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceMeta {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
    pub ledger_rows: usize,
    pub normalize: NormalizeStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceReport {
    pub meta: TraceMeta,
    pub existence: DirectionReport,
    pub completeness: DirectionReport,
}

impl TraceReport {
    pub fn is_clean(&self) -> bool {
        self.existence.summary.is_clean() && self.completeness.summary.is_clean()
    }
}

/// Add two amounts in minor units, failing instead of wrapping.
pub(crate) fn add_cents(
    total: i64,
    cents: i64,
    context: impl FnOnce() -> String,
) -> Result<i64, ReconError> {
    total
        .checked_add(cents)
        .ok_or_else(|| ReconError::AmountOverflow { context: context() })
}

/// Format minor units as a fixed two-decimal string (`-1234.50`).
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
