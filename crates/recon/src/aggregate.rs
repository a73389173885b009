use std::collections::BTreeMap;

use crate::error::ReconError;
use crate::model::{
    add_cents, LeadSheetId, NormalizedDataset, TransactionAggregate, TransactionKey,
};

/// Group one lead sheet's rows by transaction number, count rows, sum amounts.
pub fn aggregate_lead_sheet(
    ledger: &NormalizedDataset,
    lead: LeadSheetId,
) -> Result<Vec<TransactionAggregate>, ReconError> {
    let groups = aggregate_map(ledger, lead)?;
    log::debug!("lead sheet {lead}: {} transactions", groups.len());

    Ok(groups
        .into_iter()
        .map(|(transaction_number, (record_count, amount_cents))| TransactionAggregate {
            transaction_number,
            record_count,
            amount_cents,
        })
        .collect())
}

/// Keyed view of the same aggregation: transaction -> (rows, cents).
pub(crate) fn aggregate_map(
    ledger: &NormalizedDataset,
    lead: LeadSheetId,
) -> Result<BTreeMap<TransactionKey, (usize, i64)>, ReconError> {
    let mut groups: BTreeMap<TransactionKey, (usize, i64)> = BTreeMap::new();

    for row in ledger.in_lead(lead) {
        let entry = groups.entry(row.transaction_number.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = add_cents(entry.1, row.amount_cents, || {
            format!("transaction '{}' in lead sheet {lead}", row.transaction_number)
        })?;
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, LedgerRow};

    fn row(txn: &str, lead: i64, account: &str, cents: i64) -> LedgerRow {
        LedgerRow {
            account_code: String::new(),
            account_name: account.into(),
            transaction_date: CellValue::Empty,
            transaction_source: "GJ".into(),
            lead_sheet: Some(LeadSheetId(lead)),
            amount_cents: cents,
            transaction_number: TransactionKey::from(txn),
            document_number: format!("{txn}-{lead}"),
        }
    }

    #[test]
    fn folds_duplicate_transactions() {
        let ledger = NormalizedDataset::from_rows(vec![
            row("100", 10, "Cash", 1000),
            row("100", 10, "Cash", -290),
            row("100", 10, "Bank", -2500),
            row("200", 10, "Cash", 50),
        ]);
        let aggs = aggregate_lead_sheet(&ledger, LeadSheetId(10)).unwrap();
        assert_eq!(aggs.len(), 2);
        assert_eq!(aggs[0].transaction_number.as_str(), "100");
        assert_eq!(aggs[0].record_count, 3);
        assert_eq!(aggs[0].amount_cents, 1000 - 290 - 2500);
        assert_eq!(aggs[1].record_count, 1);
    }

    #[test]
    fn ignores_other_lead_sheets() {
        let ledger = NormalizedDataset::from_rows(vec![
            row("100", 10, "Cash", 1000),
            row("100", 20, "Cash", -1000),
            row("300", 30, "AP", 7),
        ]);
        let aggs = aggregate_lead_sheet(&ledger, LeadSheetId(20)).unwrap();
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].amount_cents, -1000);
        assert!(aggregate_lead_sheet(&ledger, LeadSheetId(99)).unwrap().is_empty());
    }

    #[test]
    fn sum_of_aggregates_equals_lead_total() {
        let ledger = NormalizedDataset::from_rows(vec![
            row("1", 10, "Cash", 125),
            row("2", 10, "Cash", -75),
            row("2", 10, "AR", 310),
            row("", 10, "AR", 5),
            row("3", 11, "AR", 999),
        ]);
        let lead = LeadSheetId(10);
        let expected: i64 = ledger.in_lead(lead).map(|r| r.amount_cents).sum();
        let actual: i64 = aggregate_lead_sheet(&ledger, lead).unwrap().iter().map(|a| a.amount_cents).sum();
        assert_eq!(actual, expected);
        assert_eq!(actual, 365);
    }

    #[test]
    fn numeric_keys_sorted_by_value() {
        let ledger = NormalizedDataset::from_rows(vec![
            row("1000", 10, "Cash", 1),
            row("99", 10, "Cash", 1),
            row("JV-7", 10, "Cash", 1),
        ]);
        let keys: Vec<String> = aggregate_lead_sheet(&ledger, LeadSheetId(10))
            .unwrap()
            .into_iter()
            .map(|a| a.transaction_number.to_string())
            .collect();
        assert_eq!(keys, vec!["99", "1000", "JV-7"]);
    }

    #[test]
    fn overflowing_total_is_error() {
        let ledger = NormalizedDataset::from_rows(vec![
            row("100", 10, "Cash", 9_000_000_000_000_000_000),
            row("100", 10, "Cash", 9_000_000_000_000_000_000),
        ]);
        let err = aggregate_lead_sheet(&ledger, LeadSheetId(10)).unwrap_err();
        assert_eq!(err.kind(), "amount_overflow");
        assert!(err.to_string().contains("'100'"), "{err}");
    }
}
