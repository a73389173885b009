//! `ltrace columns` and `ltrace leads`: inspect a ledger before writing a job.

use std::path::{Path, PathBuf};

use serde::Serialize;

use leadtrace_recon::model::RequiredColumn;
use leadtrace_recon::resolve::Suggestion;
use leadtrace_recon::{LeadSheetId, TraceSession};

use crate::exit_codes::{EXIT_ERROR, EXIT_READ, EXIT_USAGE};
use crate::util::{col_to_letter, max_width, pad_right};
use crate::CliError;

#[derive(Serialize)]
struct ColumnsOutput<'a> {
    ledger: String,
    cutoff: f64,
    columns: Vec<ColumnEntry<'a>>,
    unresolved: Vec<&'static str>,
}

#[derive(Serialize)]
struct ColumnEntry<'a> {
    column: &'static str,
    key: &'static str,
    label: Option<&'a str>,
    /// Spreadsheet column letter of `label`.
    position: Option<String>,
    score: f64,
}

#[derive(Serialize)]
struct LeadsOutput<'a> {
    ledger: String,
    lead_column: &'a str,
    lead_sheets: Vec<LeadSheetId>,
}

pub(crate) fn load_session(ledger: &Path, sheet: Option<&str>) -> Result<TraceSession, CliError> {
    let dataset = leadtrace_io::read_dataset(ledger, sheet)
        .map_err(|e| CliError::new(EXIT_READ, format!("cannot read ledger: {e}")))?;
    let mut session = TraceSession::new();
    session.load(dataset);
    Ok(session)
}

pub fn cmd_columns(
    ledger: PathBuf,
    sheet: Option<String>,
    cutoff: f64,
    json: bool,
    toml_out: bool,
) -> Result<(), CliError> {
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(CliError::new(
            EXIT_USAGE,
            format!("--cutoff must be within 0..=1, got {cutoff}"),
        ));
    }

    let mut session = load_session(&ledger, sheet.as_deref())?;
    let headers: Vec<String> = session
        .dataset()
        .map(|d| d.headers().to_vec())
        .unwrap_or_default();
    let suggestion = session.suggest(cutoff)?.clone();

    let position = |label: &str| {
        headers
            .iter()
            .position(|h| h == label)
            .map(col_to_letter)
    };

    if json {
        let output = ColumnsOutput {
            ledger: ledger.display().to_string(),
            cutoff,
            columns: suggestion
                .entries()
                .iter()
                .map(|e| ColumnEntry {
                    column: e.column.as_str(),
                    key: e.column.key(),
                    label: e.label.as_deref(),
                    position: e.label.as_deref().and_then(position),
                    score: e.score,
                })
                .collect(),
            unresolved: suggestion.unresolved().iter().map(|c| c.key()).collect(),
        };
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else if toml_out {
        print!("{}", columns_toml(suggestion.entries(), cutoff));
    } else {
        let width = max_width(RequiredColumn::ALL.iter().map(|c| c.as_str()));
        for e in suggestion.entries() {
            let name = pad_right(e.column.as_str(), width);
            match (&e.label, e.label.as_deref().and_then(position)) {
                (Some(label), Some(letter)) => {
                    println!("{name}  {label} (column {letter}, score {:.2})", e.score)
                }
                (Some(label), None) => println!("{name}  {label} (score {:.2})", e.score),
                (None, _) => println!("{name}  ? (best score {:.2})", e.score),
            }
        }
    }

    let unresolved = suggestion.unresolved();
    if !unresolved.is_empty() {
        let names: Vec<&str> = unresolved.iter().map(|c| c.as_str()).collect();
        eprintln!(
            "{} column(s) unresolved: {}; choose from: {}",
            unresolved.len(),
            names.join(", "),
            headers.join(", ")
        );
    }

    Ok(())
}

/// A `[columns]` block ready to paste into a job file. Unresolved columns
/// are emitted commented out.
fn columns_toml(entries: &[Suggestion], cutoff: f64) -> String {
    let mut out = String::from("[columns]\n");
    for e in entries {
        match &e.label {
            Some(label) => {
                let quoted = toml::Value::String(label.clone()).to_string();
                out.push_str(&format!("{} = {}\n", e.column.key(), quoted));
            }
            None => out.push_str(&format!(
                "# {} = \"\"  # no label scored {:.2} or higher\n",
                e.column.key(),
                cutoff
            )),
        }
    }
    out
}

pub fn cmd_leads(
    ledger: PathBuf,
    lead_column: String,
    sheet: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let session = load_session(&ledger, sheet.as_deref())?;
    let leads = session.lead_sheets(&lead_column).map_err(|e| {
        CliError::from(e).with_hint(format!(
            "run `ltrace columns {}` to list the ledger's columns",
            ledger.display()
        ))
    })?;

    if json {
        let output = LeadsOutput {
            ledger: ledger.display().to_string(),
            lead_column: &lead_column,
            lead_sheets: leads,
        };
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for lead in &leads {
            println!("{lead}");
        }
        eprintln!("{} lead sheet(s) in column '{lead_column}'", leads.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadtrace_recon::resolve::suggest_mapping;

    #[test]
    fn toml_block_comments_unresolved() {
        let labels: Vec<String> = ["Acct Code", "Amt \"net\""].iter().map(|s| s.to_string()).collect();
        let mut mapping = suggest_mapping(&labels, 0.5);
        mapping.set(RequiredColumn::Amount, Some("Amt \"net\"".into()));
        let block = columns_toml(mapping.entries(), 0.5);

        assert!(block.starts_with("[columns]\n"));
        assert!(block.contains("account_code = \"Acct Code\"\n"));
        assert!(block.contains(r#"amount = 'Amt "net"'"#) || block.contains(r#"amount = "Amt \"net\"""#));
        assert!(block.contains("# document_number = \"\"  # no label scored 0.50 or higher\n"));
    }
}
