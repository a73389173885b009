//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Domain    | Description                                        |
//! |------|-----------|----------------------------------------------------|
//! | 0    | Universal | Success                                            |
//! | 1    | Universal | General error (unspecified)                        |
//! | 2    | Universal | CLI usage error (bad args)                         |
//! | 3    | trace     | Exceptions found (with `--fail-on-exceptions`)     |
//! | 4    | io        | Ledger or config file cannot be read               |
//! | 5    | config    | Job config invalid                                 |
//! | 6    | schema    | Column mapping does not fit the ledger             |
//! | 7    | leads     | Lead sheet selection invalid or absent             |
//! | 8    | io        | Report output cannot be written                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use leadtrace_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Trace (3-8)
// =============================================================================

/// A direction has not-found transactions or non-zero differences, and
/// `--fail-on-exceptions` was given.
pub const EXIT_TRACE_EXCEPTIONS: u8 = 3;

/// Ledger or config file missing, unreadable, or in an unsupported format.
pub const EXIT_READ: u8 = 4;

/// Job config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// Mapping incomplete, label absent from the ledger, or an amount that is
/// unparseable or too large to total.
pub const EXIT_SCHEMA: u8 = 6;

/// Lead sheet not an integer, not in the ledger, or traced against itself.
pub const EXIT_LEAD_SHEET: u8 = 7;

/// Workbook, CSV, or JSON output could not be written.
pub const EXIT_WRITE: u8 = 8;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Schema(_)
        | ReconError::MissingColumn { .. }
        | ReconError::InvalidAmount { .. }
        | ReconError::AmountOverflow { .. } => EXIT_SCHEMA,
        ReconError::InvalidLeadId { .. }
        | ReconError::EmptyLeadSheet { .. }
        | ReconError::SameLeadSheet { .. } => EXIT_LEAD_SHEET,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Io(_) => EXIT_READ,
    }
}
