use crate::core::amount::{is_negligible, EPSILON};
use crate::core::entry::DebtEntry;
use crate::core::ledger::Balances;
use crate::core::participant::ParticipantId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One recommended payment from a net debtor to a net creditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Decimal,
}

/// Output of the settlement planner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Net balance of every participant after debts, before any transfer.
    final_balances: Balances,
    /// Transfers that bring every balance back to (near) zero.
    transfers: Vec<Transfer>,
}

impl SettlementPlan {
    pub fn final_balances(&self) -> &Balances {
        &self.final_balances
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Total amount moved by the plan.
    pub fn transferred_total(&self) -> Decimal {
        self.transfers
            .iter()
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
    }

    /// Balances left after executing every transfer. Within [`EPSILON`] of
    /// zero for well-formed input.
    pub fn residual_balances(&self) -> Balances {
        let mut residual = self.final_balances.clone();
        for t in &self.transfers {
            residual.adjust(t.from, t.amount);
            residual.adjust(t.to, -t.amount);
        }
        residual
    }
}

/// Turns net balances into a short list of point-to-point transfers.
pub struct SettlementPlanner;

impl SettlementPlanner {
    /// Apply `debts` on top of `base_balances` and settle the result.
    ///
    /// # Algorithm
    ///
    /// 1. Apply each debt in entry order: the debtor's balance drops by the
    ///    amount, the creditor's rises by it.
    /// 2. Split participants into creditors (balance > ε) sorted descending
    ///    and debtors (balance < −ε) sorted ascending. Both sorts are stable.
    /// 3. Repeatedly match the most negative debtor with the most positive
    ///    creditor, transfer the smaller of the two magnitudes, and move past
    ///    whichever side is now within ε of zero.
    ///
    /// The greedy pass is a heuristic: it keeps the transfer count low but
    /// is not a proven minimum. If balances do not sum to zero the loop
    /// stops when one side runs out and the residue stays in
    /// `final_balances` minus the transfers.
    ///
    /// # Examples
    ///
    /// ```
    /// use group_ledger::core::ledger::Balances;
    /// use group_ledger::core::participant::ParticipantId;
    /// use group_ledger::reconcile::settlement::SettlementPlanner;
    /// use rust_decimal_macros::dec;
    ///
    /// let (a, b, c) = (ParticipantId::new(1), ParticipantId::new(2), ParticipantId::new(3));
    /// let balances: Balances = vec![(a, dec!(10)), (b, dec!(5)), (c, dec!(-15))]
    ///     .into_iter()
    ///     .collect();
    /// let plan = SettlementPlanner::plan(&balances, &[]);
    /// assert_eq!(plan.transfers().len(), 2);
    /// assert_eq!(plan.transfers()[0].to, a);
    /// ```
    pub fn plan(base_balances: &Balances, debts: &[DebtEntry]) -> SettlementPlan {
        let mut final_balances = base_balances.clone();
        for debt in debts {
            final_balances.apply_debt(debt);
        }
        let transfers = Self::settle(&final_balances);
        log::debug!(
            "planned {} transfers for {} participants",
            transfers.len(),
            final_balances.len()
        );
        SettlementPlan {
            final_balances,
            transfers,
        }
    }

    /// Greedy two-pointer settlement of already-netted balances.
    pub fn settle(balances: &Balances) -> Vec<Transfer> {
        let mut creditors: Vec<(ParticipantId, Decimal)> = balances
            .iter()
            .filter(|(_, b)| **b > EPSILON)
            .map(|(p, b)| (*p, *b))
            .collect();
        let mut debtors: Vec<(ParticipantId, Decimal)> = balances
            .iter()
            .filter(|(_, b)| **b < -EPSILON)
            .map(|(p, b)| (*p, *b))
            .collect();

        // `sort_by` is stable: equal balances keep first-appearance order.
        creditors.sort_by(|a, b| b.1.cmp(&a.1));
        debtors.sort_by(|a, b| a.1.cmp(&b.1));

        let mut transfers = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < debtors.len() && j < creditors.len() {
            let (debtor, owed) = debtors[i];
            let (creditor, due) = creditors[j];
            let amount = (-owed).min(due);

            transfers.push(Transfer {
                from: debtor,
                to: creditor,
                amount,
            });

            debtors[i].1 += amount;
            creditors[j].1 -= amount;

            if is_negligible(debtors[i].1) {
                i += 1;
            }
            if is_negligible(creditors[j].1) {
                j += 1;
            }
        }
        transfers
    }
}
