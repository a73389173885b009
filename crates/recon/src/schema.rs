use std::collections::{BTreeMap, HashMap};

use crate::error::ReconError;
use crate::model::{
    CellValue, Dataset, LeadSheetId, LedgerRow, NormalizeStats, NormalizedDataset,
    RequiredColumn, TransactionKey,
};

// ---------------------------------------------------------------------------
// Final mapping
// ---------------------------------------------------------------------------

/// Confirmed mapping from each required column to a dataset label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    labels: BTreeMap<RequiredColumn, String>,
}

impl ColumnMapping {
    /// Later pairs for the same column replace earlier ones.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (RequiredColumn, String)>) -> Self {
        Self { labels: pairs.into_iter().collect() }
    }

    /// Mapping for a ledger whose headers already are the canonical names.
    pub fn identity() -> Self {
        Self::from_pairs(RequiredColumn::ALL.map(|c| (c, c.as_str().to_string())))
    }

    pub fn label(&self, column: RequiredColumn) -> Option<&str> {
        self.labels.get(&column).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RequiredColumn, &str)> + '_ {
        self.labels.iter().map(|(c, l)| (*c, l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Rename and project a raw ledger onto the eight canonical columns.
pub fn normalize(dataset: &Dataset, mapping: &ColumnMapping) -> Result<NormalizedDataset, ReconError> {
    let indices = resolve_indices(dataset, mapping)?;

    let mut stats = NormalizeStats {
        rows_read: dataset.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(dataset.len());

    for (i, raw) in dataset.rows().iter().enumerate() {
        let cells: Vec<&CellValue> = indices.iter().map(|&ix| &raw[ix]).collect();
        if cells.iter().all(|c| c.is_blank()) {
            stats.blank_rows_skipped += 1;
            continue;
        }

        // Spreadsheet row number: header is row 1.
        let row_number = i + 2;
        let get = |col: RequiredColumn| cells[col as usize];

        let lead_sheet = LeadSheetId::from_cell(get(RequiredColumn::LeadSheetNumber));
        if lead_sheet.is_none() {
            stats.rows_without_lead += 1;
        }

        rows.push(LedgerRow {
            account_code: get(RequiredColumn::AccountCode).display(),
            account_name: get(RequiredColumn::AccountName).display(),
            transaction_date: get(RequiredColumn::TransactionDate).clone(),
            transaction_source: get(RequiredColumn::TransactionSource).display(),
            lead_sheet,
            amount_cents: parse_amount_cell(get(RequiredColumn::Amount), row_number)?,
            transaction_number: TransactionKey::from_cell(get(RequiredColumn::TransactionNumber)),
            document_number: get(RequiredColumn::DocumentNumber).display(),
        });
    }

    if stats.blank_rows_skipped > 0 {
        log::warn!("skipped {} blank ledger rows", stats.blank_rows_skipped);
    }
    if stats.rows_without_lead > 0 {
        log::warn!(
            "{} ledger rows have no integer lead sheet number and match no lead sheet",
            stats.rows_without_lead
        );
    }
    log::debug!("normalized {} of {} ledger rows", rows.len(), stats.rows_read);

    Ok(NormalizedDataset::new(rows, stats))
}

/// Normalize a ledger that already carries the canonical headers.
pub fn from_canonical(dataset: &Dataset) -> Result<NormalizedDataset, ReconError> {
    for col in RequiredColumn::ALL {
        if dataset.column_index(col.as_str()).is_none() {
            return Err(ReconError::MissingColumn {
                column: col.as_str().to_string(),
            });
        }
    }
    normalize(dataset, &ColumnMapping::identity())
}

/// Dataset column index for each required column, in canonical order.
///
/// A label selected for two columns is assigned to the later one; the earlier
/// column is then left without a source and the mapping is rejected.
fn resolve_indices(dataset: &Dataset, mapping: &ColumnMapping) -> Result<Vec<usize>, ReconError> {
    let missing: Vec<&str> = RequiredColumn::ALL
        .iter()
        .filter(|c| mapping.label(**c).is_none())
        .map(|c| c.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(ReconError::Schema(format!(
            "column mapping is incomplete, no column selected for: {}",
            missing.join(", ")
        )));
    }

    let mut owner: HashMap<&str, RequiredColumn> = HashMap::new();
    for (col, label) in mapping.iter() {
        if dataset.column_index(label).is_none() {
            return Err(ReconError::Schema(format!(
                "column '{label}' selected for {col} is not in the ledger"
            )));
        }
        owner.insert(label, col);
    }

    let mut indices = Vec::with_capacity(RequiredColumn::ALL.len());
    for col in RequiredColumn::ALL {
        let label = mapping.label(col).unwrap_or_default();
        if let Some(o) = owner.get(label).filter(|o| **o != col) {
            return Err(ReconError::Schema(format!(
                "column '{label}' is selected for both {col} and {o}; {col} has no source column"
            )));
        }
        if let Some(ix) = dataset.column_index(label) {
            indices.push(ix);
        }
    }

    Ok(indices)
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

fn parse_amount_cell(value: &CellValue, row: usize) -> Result<i64, ReconError> {
    let invalid = || ReconError::InvalidAmount {
        row,
        value: value.display(),
    };
    match value {
        CellValue::Empty => Ok(0),
        CellValue::Number(n) => number_to_cents(*n).ok_or_else(invalid),
        CellValue::Date(_) => Err(invalid()),
        CellValue::Text(s) => parse_amount_text(s).ok_or_else(invalid),
    }
}

/// Largest magnitude, in minor units, a numeric cell may carry. Kept below
/// `i64::MAX` so the float-to-int conversion never saturates.
const MAX_NUMBER_CENTS: f64 = 9.0e18;

fn number_to_cents(n: f64) -> Option<i64> {
    let cents = (n * 100.0).round();
    (cents.is_finite() && cents.abs() <= MAX_NUMBER_CENTS).then_some(cents as i64)
}

/// Parse a decimal amount string to minor units (cents).
/// Handles "1234.56", "-1,234.5", "(500.00)", "500.00-", and blanks (zero).
pub fn parse_amount_text(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0);
    }

    let (negative, body) = if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        (true, inner.trim())
    } else if let Some(rest) = s.strip_prefix('-') {
        (true, rest.trim_start())
    } else if let Some(rest) = s.strip_suffix('-') {
        (true, rest.trim_end())
    } else {
        (false, s.strip_prefix('+').unwrap_or(s))
    };

    let body: String = body.chars().filter(|c| *c != ',').collect();
    if body.is_empty() || body.starts_with(|c: char| c == '-' || c == '+') {
        return None;
    }

    let (whole, frac) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body.as_str(), ""),
    };
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let units: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        2 => frac.parse().ok()?,
        _ => return None,
    };

    let minor = units.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -minor } else { minor })
}
