//! Ledger summary: counts and money totals over a filtered selection.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::{TransactionRecord, TransactionSource, TransactionType};

/// Types whose amounts make up cash flow, with their sign.
const CASH_FLOW_TERMS: [(TransactionType, bool); 2] = [
    (TransactionType::Deposit, true),
    (TransactionType::Withdraw, false),
];

/// Types whose amounts make up the house game result, with their sign.
const PNL_TERMS: [(TransactionType, bool); 5] = [
    (TransactionType::Bet, true),
    (TransactionType::Vip, true),
    (TransactionType::Win, false),
    (TransactionType::Bonus, false),
    (TransactionType::Refund, false),
];

/// Aggregate view over a filtered selection of transactions.
///
/// Count maps are always fully populated over the closed vocabularies, so
/// consumers never see a missing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub counts_by_type: BTreeMap<TransactionType, u64>,
    pub counts_by_source: BTreeMap<TransactionSource, u64>,
    pub total: u64,
    /// Σdeposit − Σwithdraw.
    pub cash_flow: Decimal,
    /// Σ(bet + vip) − Σ(win + bonus + refund), house perspective.
    #[serde(rename = "gamePnL")]
    pub game_pnl: Decimal,
}

impl Default for LedgerSummary {
    fn default() -> Self {
        Self {
            counts_by_type: zero_type_counts(),
            counts_by_source: zero_source_counts(),
            total: 0,
            cash_flow: Decimal::ZERO,
            game_pnl: Decimal::ZERO,
        }
    }
}

#[must_use]
pub fn zero_type_counts() -> BTreeMap<TransactionType, u64> {
    TransactionType::ALL.into_iter().map(|t| (t, 0)).collect()
}

#[must_use]
pub fn zero_source_counts() -> BTreeMap<TransactionSource, u64> {
    TransactionSource::ALL.into_iter().map(|s| (s, 0)).collect()
}

#[must_use]
pub fn zero_type_sums() -> BTreeMap<TransactionType, Decimal> {
    TransactionType::ALL
        .into_iter()
        .map(|t| (t, Decimal::ZERO))
        .collect()
}

impl LedgerSummary {
    /// Fold a selection of records.
    pub fn fold<'a>(records: impl IntoIterator<Item = &'a TransactionRecord>) -> Self {
        let mut counts_by_type = zero_type_counts();
        let mut counts_by_source = zero_source_counts();
        let mut sums = zero_type_sums();
        let mut total = 0;

        for record in records {
            total += 1;
            *counts_by_type.entry(record.kind).or_default() += 1;
            *counts_by_source.entry(record.source).or_default() += 1;
            *sums.entry(record.kind).or_default() += record.amount;
        }

        Self::from_parts(counts_by_type, counts_by_source, &sums, total)
    }

    /// Build from pre-grouped counts and per-type amount totals. Missing
    /// keys count as zero.
    #[must_use]
    pub fn from_parts(
        type_counts: BTreeMap<TransactionType, u64>,
        source_counts: BTreeMap<TransactionSource, u64>,
        sums: &BTreeMap<TransactionType, Decimal>,
        total: u64,
    ) -> Self {
        let mut counts_by_type = zero_type_counts();
        counts_by_type.extend(type_counts);
        let mut counts_by_source = zero_source_counts();
        counts_by_source.extend(source_counts);

        Self {
            counts_by_type,
            counts_by_source,
            total,
            cash_flow: signed_total(sums, &CASH_FLOW_TERMS),
            game_pnl: signed_total(sums, &PNL_TERMS),
        }
    }

    #[must_use]
    pub fn count(&self, kind: TransactionType) -> u64 {
        self.counts_by_type.get(&kind).copied().unwrap_or(0)
    }

    /// Which active types contribute to cash flow, e.g. `"deposit - withdraw"`.
    #[must_use]
    pub fn cash_flow_formula(&self) -> String {
        self.formula(&CASH_FLOW_TERMS)
    }

    /// Which active types contribute to game P&L.
    #[must_use]
    pub fn pnl_formula(&self) -> String {
        self.formula(&PNL_TERMS)
    }

    fn formula(&self, terms: &[(TransactionType, bool)]) -> String {
        let active = |positive: bool| -> Vec<&'static str> {
            terms
                .iter()
                .filter(|(kind, sign)| *sign == positive && self.count(*kind) > 0)
                .map(|(kind, _)| kind.as_str())
                .collect()
        };
        let plus = active(true);
        let minus = active(false);

        match (plus.is_empty(), minus.is_empty()) {
            (true, true) => "No active types".to_string(),
            (false, true) => plus.join(" + "),
            (true, false) => format!("-({})", minus.join(" + ")),
            (false, false) => {
                let lhs = group(&plus);
                let rhs = group(&minus);
                format!("{lhs} - {rhs}")
            }
        }
    }
}

fn group(parts: &[&str]) -> String {
    if parts.len() > 1 {
        format!("({})", parts.join(" + "))
    } else {
        parts.join(" + ")
    }
}

fn signed_total(sums: &BTreeMap<TransactionType, Decimal>, terms: &[(TransactionType, bool)]) -> Decimal {
    terms.iter().fold(Decimal::ZERO, |acc, (kind, positive)| {
        let amount = sums.get(kind).copied().unwrap_or_default();
        if *positive {
            acc + amount
        } else {
            acc - amount
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::AccountKey;
    use rust_decimal_macros::dec;

    fn rec(kind: TransactionType, source: TransactionSource, amount: Decimal) -> TransactionRecord {
        TransactionRecord::builder(&AccountKey::new("u", "g"), kind, source, amount)
            .build()
            .unwrap()
    }

    #[test]
    fn empty_summary_has_full_zero_maps() {
        let summary = LedgerSummary::fold(&Vec::<TransactionRecord>::new());
        assert_eq!(summary.counts_by_type.len(), TransactionType::ALL.len());
        assert_eq!(summary.counts_by_source.len(), TransactionSource::ALL.len());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.cash_flow_formula(), "No active types");
        assert_eq!(summary.pnl_formula(), "No active types");
    }

    #[test]
    fn fold_computes_cash_flow_and_pnl() {
        let records = vec![
            rec(TransactionType::Deposit, TransactionSource::Web, dec!(100)),
            rec(TransactionType::Withdraw, TransactionSource::Web, dec!(30)),
            rec(TransactionType::Bet, TransactionSource::Casino, dec!(20)),
            rec(TransactionType::Win, TransactionSource::Casino, dec!(5)),
            rec(TransactionType::Vip, TransactionSource::Command, dec!(10)),
            rec(TransactionType::Bonus, TransactionSource::Manual, dec!(2.5)),
        ];
        let summary = LedgerSummary::fold(&records);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.cash_flow, dec!(70));
        assert_eq!(summary.game_pnl, dec!(22.5));
        assert_eq!(summary.counts_by_source[&TransactionSource::Casino], 2);
        assert_eq!(summary.cash_flow_formula(), "deposit - withdraw");
        assert_eq!(summary.pnl_formula(), "(bet + vip) - (win + bonus)");
    }

    #[test]
    fn formula_lists_only_active_types() {
        let records = vec![rec(TransactionType::Deposit, TransactionSource::Web, dec!(1))];
        let summary = LedgerSummary::fold(&records);
        assert_eq!(summary.cash_flow_formula(), "deposit");
        assert_eq!(summary.pnl_formula(), "No active types");

        let records = vec![rec(TransactionType::Win, TransactionSource::Casino, dec!(1))];
        assert_eq!(LedgerSummary::fold(&records).pnl_formula(), "-(win)");
    }

    #[test]
    fn serializes_game_pnl_key() {
        let json = serde_json::to_value(LedgerSummary::default()).unwrap();
        assert!(json.get("gamePnL").is_some());
        assert_eq!(json["countsByType"]["deposit"], 0);
    }
}
