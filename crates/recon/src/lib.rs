//! `leadtrace-recon`: Lead sheet transaction tracing engine.
//!
//! Pure engine crate: receives a ledger already read into a `Dataset`,
//! resolves its columns, and traces transactions between two lead sheets in
//! both directions (existence and completeness). No CLI or IO dependencies.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod report;
pub mod residual;
pub mod resolve;
pub mod schema;
pub mod session;
pub mod summary;

pub use config::JobConfig;
pub use engine::{run, trace, TraceRequest};
pub use error::ReconError;
pub use model::{CellValue, Dataset, LeadSheetId, NormalizedDataset, RequiredColumn, TraceReport};
pub use report::{ReportTable, TableCell};
pub use resolve::{suggest_mapping, SuggestedMapping};
pub use schema::{normalize, ColumnMapping};
pub use session::TraceSession;
