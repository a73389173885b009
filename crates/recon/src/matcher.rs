use crate::aggregate::aggregate_map;
use crate::error::ReconError;
use crate::model::{add_cents, LeadSheetId, MatchResult, NormalizedDataset};

/// Match every transaction of the source lead sheet against the target lead
/// sheet by transaction number.
///
/// One result per source transaction, in transaction order. Transactions
/// absent from the target carry a zero target count and amount. The
/// difference adds both sides, so opposing-sign postings that fully offset
/// give zero.
pub fn match_lead_sheets(
    ledger: &NormalizedDataset,
    source: LeadSheetId,
    target: LeadSheetId,
) -> Result<Vec<MatchResult>, ReconError> {
    let source_map = aggregate_map(ledger, source)?;
    let target_map = aggregate_map(ledger, target)?;

    let results = source_map
        .into_iter()
        .map(|(transaction_number, (record_count, amount_cents))| {
            let (target_count, target_amount_cents) =
                target_map.get(&transaction_number).copied().unwrap_or((0, 0));
            let difference_cents = add_cents(amount_cents, target_amount_cents, || {
                format!("difference for transaction '{transaction_number}' ({source} -> {target})")
            })?;
            Ok(MatchResult {
                transaction_number,
                record_count,
                amount_cents,
                target_count,
                target_amount_cents,
                difference_cents,
            })
        })
        .collect::<Result<Vec<_>, ReconError>>()?;

    log::debug!(
        "matched lead sheet {source} -> {target}: {} of {} transactions found",
        results.iter().filter(|r| r.is_found()).count(),
        results.len()
    );

    Ok(results)
}
