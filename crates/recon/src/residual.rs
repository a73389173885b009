use std::collections::{BTreeMap, BTreeSet};

use crate::error::ReconError;
use crate::model::{
    add_cents, LeadSheetId, MatchResult, NormalizedDataset, OrphanedTransaction, Residual, ResidualRow,
    TransactionKey,
};

/// Locate where the not-found transactions of one direction were posted.
///
/// Every row carrying a not-found transaction number outside the source lead
/// sheet is grouped by (lead sheet, account name). Rows without a lead sheet
/// group under a blank lead, sorted after the numbered ones; a plain
/// group-by on the two keys would drop those rows and hide where the amount
/// went. Not-found transactions with no rows outside the source are returned
/// as orphaned.
pub fn summarize_residual(
    ledger: &NormalizedDataset,
    matches: &[MatchResult],
    source: LeadSheetId,
) -> Result<Residual, ReconError> {
    let not_found: BTreeSet<&TransactionKey> = matches
        .iter()
        .filter(|m| !m.is_found())
        .map(|m| &m.transaction_number)
        .collect();

    if not_found.is_empty() {
        return Ok(Residual::default());
    }

    // (blank lead last, lead, account name) -> (rows, cents)
    let mut groups: BTreeMap<(bool, Option<LeadSheetId>, String), (usize, i64)> = BTreeMap::new();
    let mut posted_elsewhere: BTreeSet<&TransactionKey> = BTreeSet::new();

    for row in ledger.rows() {
        if row.lead_sheet == Some(source) || !not_found.contains(&row.transaction_number) {
            continue;
        }
        posted_elsewhere.insert(&row.transaction_number);
        let entry = groups
            .entry((row.lead_sheet.is_none(), row.lead_sheet, row.account_name.clone()))
            .or_insert((0, 0));
        entry.0 += 1;
        entry.1 = add_cents(entry.1, row.amount_cents, || {
            format!("residual for account '{}'", row.account_name)
        })?;
    }

    let rows: Vec<ResidualRow> = groups
        .into_iter()
        .map(|((_, lead_sheet, account_name), (record_count, amount_cents))| ResidualRow {
            lead_sheet,
            account_name,
            record_count,
            amount_cents,
        })
        .collect();

    let orphaned: Vec<OrphanedTransaction> = matches
        .iter()
        .filter(|m| !m.is_found() && !posted_elsewhere.contains(&m.transaction_number))
        .map(|m| OrphanedTransaction {
            transaction_number: m.transaction_number.clone(),
            record_count: m.record_count,
            amount_cents: m.amount_cents,
        })
        .collect();

    if !orphaned.is_empty() {
        log::debug!(
            "lead sheet {source}: {} not-found transactions have no postings elsewhere",
            orphaned.len()
        );
    }

    Ok(Residual { rows, orphaned })
}
