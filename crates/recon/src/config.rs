use std::collections::BTreeMap;

use serde::Deserialize;

use crate::engine::TraceRequest;
use crate::error::ReconError;
use crate::model::{LeadSheetId, RequiredColumn};
use crate::resolve::DEFAULT_CUTOFF;
use crate::schema::ColumnMapping;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A saved trace job: which ledger, how its columns map, which lead sheets.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,
    /// Ledger path, relative to the config file.
    pub input: String,
    #[serde(default)]
    pub sheet: Option<String>,
    /// Required column key (`account_code`, ...) -> ledger label.
    pub columns: BTreeMap<String, String>,
    pub leads: LeadsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LeadsConfig {
    pub source: LeadSheetId,
    pub target: LeadSheetId,
}

// ---------------------------------------------------------------------------
// Output + Resolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_xlsx")]
    pub xlsx: String,
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub csv_dir: Option<String>,
    #[serde(default = "default_true")]
    pub include_orphans: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            xlsx: default_xlsx(),
            json: None,
            csv_dir: None,
            include_orphans: true,
        }
    }
}

fn default_xlsx() -> String {
    "trace_results.xlsx".into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

fn default_cutoff() -> f64 {
    DEFAULT_CUTOFF
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl JobConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: JobConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }
        if self.input.trim().is_empty() {
            return Err(ReconError::ConfigValidation("input must not be empty".into()));
        }

        for (key, label) in &self.columns {
            if RequiredColumn::from_key(key).is_none() {
                return Err(ReconError::ConfigValidation(format!(
                    "unknown column key '{key}' in [columns]"
                )));
            }
            if label.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "column '{key}' has an empty label"
                )));
            }
        }
        let missing: Vec<&str> = RequiredColumn::ALL
            .iter()
            .map(|c| c.key())
            .filter(|k| !self.columns.contains_key(*k))
            .collect();
        if !missing.is_empty() {
            return Err(ReconError::ConfigValidation(format!(
                "[columns] is missing: {}",
                missing.join(", ")
            )));
        }

        if self.leads.source == self.leads.target {
            return Err(ReconError::ConfigValidation(format!(
                "source and target lead sheets are both {}",
                self.leads.source
            )));
        }

        if !(0.0..=1.0).contains(&self.resolver.cutoff) {
            return Err(ReconError::ConfigValidation(format!(
                "resolver cutoff must be within 0..=1, got {}",
                self.resolver.cutoff
            )));
        }

        if !self.output.xlsx.to_ascii_lowercase().ends_with(".xlsx") {
            return Err(ReconError::ConfigValidation(format!(
                "output.xlsx must name an .xlsx file, got '{}'",
                self.output.xlsx
            )));
        }

        Ok(())
    }

    /// The confirmed column mapping. Call after `validate`.
    pub fn mapping(&self) -> ColumnMapping {
        ColumnMapping::from_pairs(self.columns.iter().filter_map(|(key, label)| {
            RequiredColumn::from_key(key).map(|c| (c, label.clone()))
        }))
    }

    pub fn request(&self) -> TraceRequest {
        TraceRequest::new(self.name.clone(), self.leads.source, self.leads.target)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
