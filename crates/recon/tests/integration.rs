use std::path::PathBuf;

use leadtrace_recon::engine::{load_csv_dataset, run, TraceRequest};
use leadtrace_recon::model::{Direction, LeadSheetId, NormalizedDataset, RequiredColumn};
use leadtrace_recon::report::{TableCell, EXISTENCE_NOT_FOUND, EXISTENCE_ORPHANED};
use leadtrace_recon::resolve::{suggest_mapping, DEFAULT_CUTOFF};
use leadtrace_recon::schema::{from_canonical, normalize};
use leadtrace_recon::{JobConfig, ReconError, TraceReport, TraceSession};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn scenario_ledger() -> NormalizedDataset {
    from_canonical(&load_csv_dataset(&read_fixture("scenario.csv")).unwrap()).unwrap()
}

fn load_job() -> (JobConfig, NormalizedDataset) {
    let config = JobConfig::from_toml(&read_fixture("job.toml")).unwrap();
    let dataset = load_csv_dataset(&read_fixture(&config.input)).unwrap();
    let ledger = normalize(&dataset, &config.mapping()).unwrap();
    (config, ledger)
}

fn run_job() -> TraceReport {
    let (config, ledger) = load_job();
    run(&ledger, &config.request()).unwrap()
}

// -------------------------------------------------------------------------
// Reference scenario
// -------------------------------------------------------------------------

#[test]
fn scenario_found_and_residual() {
    let report = run(
        &scenario_ledger(),
        &TraceRequest::new("scenario", LeadSheetId(10), LeadSheetId(20)),
    )
    .unwrap();

    let existence = &report.existence;
    assert_eq!(existence.matches.len(), 2);

    let txn_100 = &existence.matches[0];
    assert_eq!(txn_100.transaction_number.as_str(), "100");
    assert!(txn_100.is_found());
    assert_eq!(txn_100.difference_cents, 0);

    let txn_200 = &existence.matches[1];
    assert_eq!(txn_200.transaction_number.as_str(), "200");
    assert_eq!(txn_200.target_count, 0);

    assert_eq!(existence.residual.len(), 1);
    let residual = &existence.residual[0];
    assert_eq!(residual.lead_sheet, Some(LeadSheetId(30)));
    assert_eq!(residual.account_name, "AP");
    assert_eq!(residual.record_count, 1);
    assert_eq!(residual.amount_cents, -30_000);
    assert!(existence.orphaned.is_empty());
}

#[test]
fn scenario_completeness_direction_is_clean() {
    let report = run(
        &scenario_ledger(),
        &TraceRequest::new("scenario", LeadSheetId(10), LeadSheetId(20)),
    )
    .unwrap();
    assert_eq!(report.completeness.direction, Direction::Completeness);
    assert_eq!(report.completeness.matches.len(), 1);
    assert!(report.completeness.summary.is_clean());
    assert!(report.completeness.residual.is_empty());
}

#[test]
fn column_resolution_scenario() {
    let labels: Vec<String> = ["Acct Code", "Name", "Amt"].iter().map(|s| s.to_string()).collect();
    let mapping = suggest_mapping(&labels, DEFAULT_CUTOFF);
    assert_eq!(mapping.get(RequiredColumn::AccountCode), Some("Acct Code"));
    assert_eq!(mapping.get(RequiredColumn::DocumentNumber), None);
    assert!(mapping.finalize().is_err());
}

// -------------------------------------------------------------------------
// Job fixture
// -------------------------------------------------------------------------

#[test]
fn job_normalization_stats() {
    let (_, ledger) = load_job();
    assert_eq!(ledger.stats().rows_read, 13);
    assert_eq!(ledger.stats().blank_rows_skipped, 1);
    assert_eq!(ledger.stats().rows_without_lead, 1);
    assert_eq!(ledger.len(), 12);
    assert_eq!(
        ledger.lead_sheets(),
        vec![LeadSheetId(10), LeadSheetId(20), LeadSheetId(40), LeadSheetId(50)]
    );
}

#[test]
fn job_existence() {
    let report = run_job();
    let e = &report.existence;

    assert_eq!(e.summary.transactions, 4);
    assert_eq!(e.summary.found, 2);
    assert_eq!(e.summary.found_with_difference, 1);
    assert_eq!(e.summary.not_found, 2);
    assert_eq!(e.summary.orphaned, 1);
    assert_eq!(e.summary.residual_groups, 1);
    assert_eq!(e.summary.source_amount_cents, 173_550);
    assert_eq!(e.summary.not_found_amount_cents, 8_550);

    let txn_1002 = e.matches.iter().find(|m| m.transaction_number.as_str() == "1002").unwrap();
    assert_eq!(txn_1002.target_count, 2);
    assert_eq!(txn_1002.target_amount_cents, -35_000);
    assert_eq!(txn_1002.difference_cents, 5_000);

    assert_eq!(e.residual[0].lead_sheet, Some(LeadSheetId(40)));
    assert_eq!(e.residual[0].account_name, "Deposits");
    assert_eq!(e.orphaned[0].transaction_number.as_str(), "1004");
    assert_eq!(e.orphaned[0].amount_cents, 1_000);
}

#[test]
fn job_completeness() {
    let report = run_job();
    let c = &report.completeness;

    assert_eq!(c.source, LeadSheetId(20));
    assert_eq!(c.summary.found, 2);
    assert_eq!(c.summary.not_found, 2);
    assert_eq!(c.summary.orphaned, 0);

    let groups: Vec<(Option<LeadSheetId>, &str, i64)> = c
        .residual
        .iter()
        .map(|r| (r.lead_sheet, r.account_name.as_str(), r.amount_cents))
        .collect();
    assert_eq!(
        groups,
        vec![(Some(LeadSheetId(50)), "AR", 98_000), (None, "Cash", 500)]
    );
}

#[test]
fn source_lead_never_in_residual() {
    let report = run_job();
    assert!(report
        .existence
        .residual
        .iter()
        .all(|r| r.lead_sheet != Some(LeadSheetId(10))));
    assert!(report
        .completeness
        .residual
        .iter()
        .all(|r| r.lead_sheet != Some(LeadSheetId(20))));
}

#[test]
fn every_source_transaction_reported_once() {
    let (_, ledger) = load_job();
    let report = run_job();
    let source_rows: Vec<_> = ledger.in_lead(LeadSheetId(10)).collect();

    let mut keys: Vec<&str> = report
        .existence
        .matches
        .iter()
        .map(|m| m.transaction_number.as_str())
        .collect();
    keys.dedup();
    assert_eq!(keys.len(), report.existence.matches.len());

    let records: usize = report.existence.matches.iter().map(|m| m.record_count).sum();
    assert_eq!(records, source_rows.len());
    let amount: i64 = report.existence.matches.iter().map(|m| m.amount_cents).sum();
    assert_eq!(amount, source_rows.iter().map(|r| r.amount_cents).sum::<i64>());
}

#[test]
fn job_tables() {
    let tables = run_job().tables(true);
    assert_eq!(tables.len(), 6);

    let not_found = tables.iter().find(|t| t.name == EXISTENCE_NOT_FOUND).unwrap();
    assert_eq!(
        not_found.rows,
        vec![vec![
            TableCell::Integer(40),
            TableCell::Text("Deposits".into()),
            TableCell::Integer(1),
            TableCell::Amount(-7_550),
        ]]
    );

    let orphaned = tables.iter().find(|t| t.name == EXISTENCE_ORPHANED).unwrap();
    assert_eq!(orphaned.rows[0][0], TableCell::Integer(1004));
}

#[test]
fn report_serializes_to_json() {
    let json = serde_json::to_value(run_job()).unwrap();
    assert_eq!(json["meta"]["name"], "Cash vs sales FY25");
    assert_eq!(json["existence"]["direction"], "existence");
    assert_eq!(json["existence"]["matches"][0]["transaction_number"], "1001");
    assert_eq!(json["completeness"]["residual"][1]["lead_sheet"], serde_json::Value::Null);
}

// -------------------------------------------------------------------------
// Session + errors
// -------------------------------------------------------------------------

#[test]
fn session_flow_matches_direct_run() {
    let (config, ledger) = load_job();
    let mut session = TraceSession::new();
    session.load(load_csv_dataset(&read_fixture("ledger.csv")).unwrap());
    assert_eq!(
        session.lead_sheets("Lead").unwrap(),
        vec![LeadSheetId(10), LeadSheetId(20), LeadSheetId(40), LeadSheetId(50)]
    );
    session.confirm(&config.mapping()).unwrap();

    let via_session = session.run(&config.request()).unwrap();
    let direct = run(&ledger, &config.request()).unwrap();
    assert_eq!(via_session.existence.matches, direct.existence.matches);
    assert_eq!(via_session.completeness.residual, direct.completeness.residual);
}

#[test]
fn absent_lead_sheet_fails() {
    let err = run(
        &scenario_ledger(),
        &TraceRequest::new("t", LeadSheetId(10), LeadSheetId(77)),
    )
    .unwrap_err();
    assert_eq!(err, ReconError::EmptyLeadSheet { lead: 77 });
    assert_eq!(err.kind(), "empty_lead_sheet");
}
