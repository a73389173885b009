//! `ltrace trace` / `ltrace validate`: config-driven lead sheet tracing.

use std::path::{Path, PathBuf};

use leadtrace_recon::model::DirectionReport;
use leadtrace_recon::{JobConfig, TraceReport};

use crate::columns::load_session;
use crate::exit_codes::{EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_READ, EXIT_TRACE_EXCEPTIONS, EXIT_WRITE};
use crate::util::format_amount;
use crate::CliError;

pub struct TraceArgs {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub fail_on_exceptions: bool,
}

fn load_config(config_path: &Path) -> Result<JobConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::new(EXIT_READ, format!("cannot read config: {e}")))?;
    JobConfig::from_toml(&config_str).map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
}

/// Paths in the config resolve against the config file's directory.
fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

pub fn cmd_trace(args: TraceArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let base = base_dir(&args.config);
    let ledger_path = base.join(&config.input);

    tracing::info!(config = %args.config.display(), ledger = %ledger_path.display(), "starting trace");

    let mut session = load_session(&ledger_path, config.sheet.as_deref())?;
    session.confirm(&config.mapping()).map_err(|e| {
        CliError::from(e).with_hint(format!(
            "run `ltrace columns {}` to see suggested labels",
            ledger_path.display()
        ))
    })?;
    let report = session.run(&config.request()).map_err(|e| {
        let hint = format!(
            "run `ltrace leads {} --lead-column {:?}` to list lead sheets",
            ledger_path.display(),
            config.columns.get("lead_sheet_number").map(String::as_str).unwrap_or_default()
        );
        CliError::from(e).with_hint(hint)
    })?;

    let tables = report.tables(config.output.include_orphans);

    let xlsx_path = args.output.unwrap_or_else(|| base.join(&config.output.xlsx));
    leadtrace_io::write_report_xlsx(&tables, &xlsx_path)
        .map_err(|e| CliError::new(EXIT_WRITE, format!("cannot write workbook: {e}")))?;

    let csv_dir = args
        .csv_dir
        .or_else(|| config.output.csv_dir.as_ref().map(|d| base.join(d)));
    if let Some(dir) = &csv_dir {
        leadtrace_io::write_report_csv(&tables, dir)
            .map_err(|e| CliError::new(EXIT_WRITE, format!("cannot write CSV tables: {e}")))?;
    }

    if let Some(json_file) = &config.output.json {
        let path = base.join(json_file);
        leadtrace_io::write_json(&report, &path)
            .map_err(|e| CliError::new(EXIT_WRITE, format!("cannot write JSON: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    print_summary(&report);
    eprintln!("wrote {}", xlsx_path.display());
    if let Some(dir) = &csv_dir {
        eprintln!("wrote {} tables to {}", tables.len(), dir.display());
    }

    if args.fail_on_exceptions && !report.is_clean() {
        let exceptions = report.existence.summary.not_found
            + report.existence.summary.found_with_difference
            + report.completeness.summary.not_found
            + report.completeness.summary.found_with_difference;
        return Err(CliError::new(
            EXIT_TRACE_EXCEPTIONS,
            format!("{exceptions} exception(s) found"),
        ));
    }

    Ok(())
}

fn print_summary(report: &TraceReport) {
    let meta = &report.meta;
    eprintln!(
        "trace '{}': lead sheet {} vs {}, {} ledger rows",
        meta.name, report.existence.source, report.existence.target, meta.ledger_rows
    );
    if meta.normalize.blank_rows_skipped > 0 || meta.normalize.rows_without_lead > 0 {
        eprintln!(
            "  {} blank row(s) skipped, {} row(s) without a lead sheet",
            meta.normalize.blank_rows_skipped, meta.normalize.rows_without_lead
        );
    }
    print_direction(&report.existence);
    print_direction(&report.completeness);
}

fn print_direction(d: &DirectionReport) {
    let s = &d.summary;
    eprintln!(
        "  {:<12} {} -> {}: {} transactions ({}), {} found, {} with difference, {} not found ({}), {} orphaned",
        d.direction.label().to_lowercase(),
        d.source,
        d.target,
        s.transactions,
        format_amount(s.source_amount_cents),
        s.found,
        s.found_with_difference,
        s.not_found,
        format_amount(s.not_found_amount_cents),
        s.orphaned,
    );
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let ledger_path = base_dir(&config_path).join(&config.input);

    // The ledger is optional at validate time; check the mapping only when it is there.
    if !ledger_path.exists() {
        eprintln!(
            "valid: trace '{}' (lead sheet {} vs {}); ledger {} not found, mapping not checked",
            config.name,
            config.leads.source,
            config.leads.target,
            ledger_path.display()
        );
        return Ok(());
    }

    let mut session = load_session(&ledger_path, config.sheet.as_deref())?;
    let mapping = config.mapping();
    if let Ok(suggestion) = session.suggest(config.resolver.cutoff) {
        for (column, label) in mapping.iter() {
            if suggestion.get(column) != Some(label) {
                tracing::info!(
                    column = column.as_str(),
                    configured = label,
                    suggested = suggestion.get(column).unwrap_or("-"),
                    "configured label differs from suggestion"
                );
            }
        }
    }
    let ledger = session.confirm(&mapping)?;
    let rows = ledger.len();
    for lead in [config.leads.source, config.leads.target] {
        if !ledger.contains_lead(lead) {
            return Err(CliError::from(leadtrace_recon::ReconError::EmptyLeadSheet { lead: lead.0 }));
        }
    }

    eprintln!(
        "valid: trace '{}' (lead sheet {} vs {}) over {} ledger rows",
        config.name, config.leads.source, config.leads.target, rows
    );
    Ok(())
}
