use crate::error::ReconError;
use crate::matcher::match_lead_sheets;
use crate::model::{
    CellValue, Dataset, Direction, DirectionReport, LeadSheetId, NormalizedDataset, TraceMeta,
    TraceReport,
};
use crate::residual::summarize_residual;
use crate::summary::compute_summary;

/// Which two lead sheets to trace against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRequest {
    pub name: String,
    pub source: LeadSheetId,
    pub target: LeadSheetId,
}

impl TraceRequest {
    pub fn new(name: impl Into<String>, source: LeadSheetId, target: LeadSheetId) -> Self {
        Self {
            name: name.into(),
            source,
            target,
        }
    }
}

/// Run both directions: existence (source against target) and completeness
/// (target against source). Both lead sheets must be present and distinct.
pub fn run(ledger: &NormalizedDataset, request: &TraceRequest) -> Result<TraceReport, ReconError> {
    if request.source == request.target {
        return Err(ReconError::SameLeadSheet {
            lead: request.source.0,
        });
    }
    for lead in [request.source, request.target] {
        if !ledger.contains_lead(lead) {
            return Err(ReconError::EmptyLeadSheet { lead: lead.0 });
        }
    }

    let existence = trace(ledger, Direction::Existence, request.source, request.target)?;
    let completeness = trace(ledger, Direction::Completeness, request.target, request.source)?;

    Ok(TraceReport {
        meta: TraceMeta {
            name: request.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            ledger_rows: ledger.len(),
            normalize: ledger.stats().clone(),
        },
        existence,
        completeness,
    })
}

/// One direction: match, locate residual postings, summarize.
pub fn trace(
    ledger: &NormalizedDataset,
    direction: Direction,
    source: LeadSheetId,
    target: LeadSheetId,
) -> Result<DirectionReport, ReconError> {
    let matches = match_lead_sheets(ledger, source, target)?;
    let residual = summarize_residual(ledger, &matches, source)?;
    let summary = compute_summary(&matches, &residual)?;

    log::info!(
        "{direction} {source} -> {target}: {} transactions, {} found ({} with difference), {} not found, {} orphaned",
        summary.transactions,
        summary.found,
        summary.found_with_difference,
        summary.not_found,
        summary.orphaned
    );

    Ok(DirectionReport {
        direction,
        source,
        target,
        matches,
        residual: residual.rows,
        orphaned: residual.orphaned,
        summary,
    })
}

/// Read a comma-separated ledger held in memory. Every non-empty cell is
/// kept as text; typing happens during normalization.
pub fn load_csv_dataset(csv_data: &str) -> Result<Dataset, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        rows.push(record.iter().map(CellValue::from).collect());
    }

    Dataset::new(headers, rows)
}
