use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// Column mapping is incomplete or refers to labels the dataset lacks.
    Schema(String),
    /// A canonical column is absent from a dataset that should carry it.
    MissingColumn { column: String },
    /// A lead sheet selection cannot be coerced to an integer id.
    InvalidLeadId { value: String },
    /// The selected lead sheet has no rows in the ledger.
    EmptyLeadSheet { lead: i64 },
    /// Source and target lead sheets are the same.
    SameLeadSheet { lead: i64 },
    /// Amount cell that is neither blank nor a decimal number.
    InvalidAmount { row: usize, value: String },
    /// A sum of amounts does not fit in 64-bit minor units.
    AmountOverflow { context: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad cutoff, unknown column key, etc.).
    ConfigValidation(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl ReconError {
    /// Short machine-readable kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::MissingColumn { .. } => "missing_column",
            Self::InvalidLeadId { .. } => "invalid_lead_id",
            Self::EmptyLeadSheet { .. } => "empty_lead_sheet",
            Self::SameLeadSheet { .. } => "same_lead_sheet",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::AmountOverflow { .. } => "amount_overflow",
            Self::ConfigParse(_) => "config_parse",
            Self::ConfigValidation(_) => "config_validation",
            Self::Io(_) => "io",
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(msg) => write!(f, "schema error: {msg}"),
            Self::MissingColumn { column } => write!(f, "missing column: {column}"),
            Self::InvalidLeadId { value } => {
                write!(f, "lead sheet '{value}' is not an integer lead sheet number")
            }
            Self::EmptyLeadSheet { lead } => {
                write!(f, "lead sheet {lead} has no transactions in the ledger")
            }
            Self::SameLeadSheet { lead } => {
                write!(f, "cannot trace lead sheet {lead} against itself")
            }
            Self::InvalidAmount { row, value } => {
                write!(f, "row {row}: cannot parse amount '{value}'")
            }
            Self::AmountOverflow { context } => write!(f, "amount total overflows: {context}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
