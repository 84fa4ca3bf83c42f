use crate::core::entry::{DebtEntry, ExpenseEntry};
use crate::core::ledger::Balances;
use crate::core::participant::ParticipantId;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the summary needs to know about one chat, derived fresh from
/// the stored entries.
///
/// Holds no lifecycle of its own: build it with [`LedgerAggregator::aggregate`]
/// and drop it after rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatLedgerView {
    /// Spend per participant, in first-appearance order. Participants that
    /// only appear in debts are present with a zero total.
    total_by_participant: IndexMap<ParticipantId, Decimal>,
    /// Expenses in insertion order (ascending sequence).
    expenses: Vec<ExpenseEntry>,
    /// Debts in insertion order (ascending sequence).
    debts: Vec<DebtEntry>,
    total_spent: Decimal,
    payer_count: usize,
    average_spent: Decimal,
}

impl ChatLedgerView {
    pub fn total_by_participant(&self) -> &IndexMap<ParticipantId, Decimal> {
        &self.total_by_participant
    }

    pub fn total_for(&self, participant: &ParticipantId) -> Decimal {
        self.total_by_participant
            .get(participant)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn expenses(&self) -> &[ExpenseEntry] {
        &self.expenses
    }

    pub fn debts(&self) -> &[DebtEntry] {
        &self.debts
    }

    /// Sum of all expenses.
    pub fn total_spent(&self) -> Decimal {
        self.total_spent
    }

    /// Number of distinct participants with at least one expense.
    pub fn payer_count(&self) -> usize {
        self.payer_count
    }

    /// Equal-split share: total spent divided by the number of payers.
    pub fn average_spent(&self) -> Decimal {
        self.average_spent
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.debts.is_empty()
    }

    /// Starting balance of every participant before debts are applied:
    /// own spend minus the average for payers, zero for everyone else.
    pub fn base_balances(&self) -> Balances {
        self.total_by_participant
            .iter()
            .map(|(participant, total)| {
                if *total > Decimal::ZERO {
                    (*participant, *total - self.average_spent)
                } else {
                    (*participant, Decimal::ZERO)
                }
            })
            .collect()
    }
}

/// Folds a chat's entries into per-participant totals.
pub struct LedgerAggregator;

impl LedgerAggregator {
    /// Aggregate expenses and debts into a [`ChatLedgerView`].
    ///
    /// Entries are re-sorted by sequence (stable), so callers may pass them
    /// in any order. No rounding happens here. An empty input yields an
    /// empty view.
    ///
    /// # Examples
    ///
    /// ```
    /// use group_ledger::core::entry::{EntryId, ExpenseEntry};
    /// use group_ledger::core::participant::{ChatId, ParticipantId};
    /// use group_ledger::reconcile::aggregate::LedgerAggregator;
    /// use rust_decimal_macros::dec;
    ///
    /// let chat = ChatId::new(1);
    /// let expenses = vec![
    ///     ExpenseEntry::new(EntryId::new(1), chat, ParticipantId::new(1), dec!(30), "dinner").unwrap(),
    ///     ExpenseEntry::new(EntryId::new(2), chat, ParticipantId::new(2), dec!(10), "wine").unwrap(),
    /// ];
    /// let view = LedgerAggregator::aggregate(&expenses, &[]);
    /// assert_eq!(view.average_spent(), dec!(20));
    /// ```
    pub fn aggregate(expenses: &[ExpenseEntry], debts: &[DebtEntry]) -> ChatLedgerView {
        let mut expenses = expenses.to_vec();
        expenses.sort_by_key(|e| e.sequence());
        let mut debts = debts.to_vec();
        debts.sort_by_key(|d| d.sequence());

        let mut total_by_participant: IndexMap<ParticipantId, Decimal> = IndexMap::new();
        let mut total_spent = Decimal::ZERO;

        for expense in &expenses {
            // Stored amounts are not re-validated on load.
            let total = total_by_participant
                .entry(expense.payer_id())
                .or_insert(Decimal::ZERO);
            *total = total.saturating_add(expense.amount());
            total_spent = total_spent.saturating_add(expense.amount());
        }
        let payer_count = total_by_participant.len();

        for debt in &debts {
            total_by_participant
                .entry(debt.debtor_id())
                .or_insert(Decimal::ZERO);
            total_by_participant
                .entry(debt.creditor_id())
                .or_insert(Decimal::ZERO);
        }

        let average_spent = if payer_count > 0 {
            total_spent / Decimal::from(payer_count)
        } else {
            Decimal::ZERO
        };

        log::debug!(
            "aggregated {} expenses and {} debts: {} participants, {} payers",
            expenses.len(),
            debts.len(),
            total_by_participant.len(),
            payer_count
        );

        ChatLedgerView {
            total_by_participant,
            expenses,
            debts,
            total_spent,
            payer_count,
            average_spent,
        }
    }
}
