use crate::error::ReconError;
use crate::model::{add_cents, DirectionSummary, MatchResult, Residual};

/// Count and total one direction's match results.
pub fn compute_summary(
    matches: &[MatchResult],
    residual: &Residual,
) -> Result<DirectionSummary, ReconError> {
    let mut summary = DirectionSummary {
        transactions: matches.len(),
        orphaned: residual.orphaned.len(),
        residual_groups: residual.rows.len(),
        ..Default::default()
    };

    for m in matches {
        summary.source_amount_cents = add_cents(summary.source_amount_cents, m.amount_cents, || {
            "source lead sheet total".to_string()
        })?;
        if m.is_found() {
            summary.found += 1;
            if !m.is_offset() {
                summary.found_with_difference += 1;
            }
        } else {
            summary.not_found += 1;
            summary.not_found_amount_cents =
                add_cents(summary.not_found_amount_cents, m.amount_cents, || {
                    "not-found total".to_string()
                })?;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrphanedTransaction, TransactionKey};

    fn result(txn: &str, amount: i64, target_count: usize, target_amount: i64) -> MatchResult {
        MatchResult {
            transaction_number: TransactionKey::from(txn),
            record_count: 1,
            amount_cents: amount,
            target_count,
            target_amount_cents: target_amount,
            difference_cents: amount + target_amount,
        }
    }

    #[test]
    fn summary_counts() {
        let matches = vec![
            result("1", 100, 1, -100),
            result("2", 250, 2, -200),
            result("3", 75, 0, 0),
            result("4", -5, 0, 0),
        ];
        let residual = Residual {
            rows: vec![],
            orphaned: vec![OrphanedTransaction {
                transaction_number: TransactionKey::from("4"),
                record_count: 1,
                amount_cents: -5,
            }],
        };
        let summary = compute_summary(&matches, &residual).unwrap();
        assert_eq!(summary.transactions, 4);
        assert_eq!(summary.found, 2);
        assert_eq!(summary.found_with_difference, 1);
        assert_eq!(summary.not_found, 2);
        assert_eq!(summary.orphaned, 1);
        assert_eq!(summary.residual_groups, 0);
        assert_eq!(summary.source_amount_cents, 420);
        assert_eq!(summary.not_found_amount_cents, 70);
        assert!(!summary.is_clean());
    }

    #[test]
    fn empty_direction_is_clean() {
        let summary = compute_summary(&[], &Residual::default()).unwrap();
        assert_eq!(summary, DirectionSummary::default());
        assert!(summary.is_clean());
    }

    #[test]
    fn overflowing_source_total_is_error() {
        let matches = vec![
            result("1", i64::MAX, 1, -i64::MAX),
            result("2", 1, 1, -1),
        ];
        let err = compute_summary(&matches, &Residual::default()).unwrap_err();
        assert!(matches!(err, ReconError::AmountOverflow { .. }));
    }
}
