use std::collections::BTreeSet;

use crate::engine::{self, TraceRequest};
use crate::error::ReconError;
use crate::model::{Dataset, LeadSheetId, NormalizedDataset, TraceReport};
use crate::resolve::{suggest_mapping, SuggestedMapping, DEFAULT_CUTOFF};
use crate::schema::{normalize, ColumnMapping};

/// Working state of one interactive trace: the most recently loaded ledger,
/// the column suggestion for it, and the normalized ledger once confirmed.
///
/// Loading a new ledger discards everything derived from the previous one.
#[derive(Debug, Default)]
pub struct TraceSession {
    dataset: Option<Dataset>,
    suggestion: Option<SuggestedMapping>,
    ledger: Option<NormalizedDataset>,
}

impl TraceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the working ledger.
    pub fn load(&mut self, dataset: Dataset) {
        log::debug!(
            "session: loaded ledger with {} rows, {} columns",
            dataset.len(),
            dataset.headers().len()
        );
        self.dataset = Some(dataset);
        self.suggestion = None;
        self.ledger = None;
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Suggest a mapping for the loaded ledger and keep it for review.
    pub fn suggest(&mut self, cutoff: f64) -> Result<&SuggestedMapping, ReconError> {
        let dataset = self.loaded()?;
        let suggestion = suggest_mapping(dataset.headers(), cutoff);
        Ok(&*self.suggestion.insert(suggestion))
    }

    /// Suggestion at the default cutoff.
    pub fn suggest_default(&mut self) -> Result<&SuggestedMapping, ReconError> {
        self.suggest(DEFAULT_CUTOFF)
    }

    pub fn suggestion(&self) -> Option<&SuggestedMapping> {
        self.suggestion.as_ref()
    }

    /// Distinct integer lead sheet numbers found in a raw column, ascending.
    /// Blank and non-integral cells are dropped.
    pub fn lead_sheets(&self, label: &str) -> Result<Vec<LeadSheetId>, ReconError> {
        let dataset = self.loaded()?;
        let column = dataset.column(label).ok_or_else(|| ReconError::MissingColumn {
            column: label.to_string(),
        })?;
        let leads: BTreeSet<LeadSheetId> = column.filter_map(LeadSheetId::from_cell).collect();
        Ok(leads.into_iter().collect())
    }

    /// Apply a confirmed mapping and keep the normalized ledger.
    pub fn confirm(&mut self, mapping: &ColumnMapping) -> Result<&NormalizedDataset, ReconError> {
        let ledger = normalize(self.loaded()?, mapping)?;
        Ok(&*self.ledger.insert(ledger))
    }

    pub fn ledger(&self) -> Option<&NormalizedDataset> {
        self.ledger.as_ref()
    }

    pub fn run(&self, request: &TraceRequest) -> Result<TraceReport, ReconError> {
        let ledger = self
            .ledger
            .as_ref()
            .ok_or_else(|| ReconError::Schema("column mapping has not been confirmed".into()))?;
        engine::run(ledger, request)
    }

    fn loaded(&self) -> Result<&Dataset, ReconError> {
        self.dataset
            .as_ref()
            .ok_or_else(|| ReconError::Schema("no ledger loaded".into()))
    }
}
