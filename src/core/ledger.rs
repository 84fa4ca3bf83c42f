use crate::core::amount::is_negligible;
use crate::core::entry::DebtEntry;
use crate::core::participant::ParticipantId;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Signed balance of each participant in one chat.
///
/// A positive balance means the participant should receive money
/// (net creditor). A negative balance means the participant should pay
/// (net debtor).
///
/// Participants are kept in first-appearance order so that everything
/// derived from a ledger iterates the same way on every run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances {
    positions: IndexMap<ParticipantId, Decimal>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant with a zero balance if not yet present.
    pub fn touch(&mut self, participant: ParticipantId) {
        self.positions.entry(participant).or_insert(Decimal::ZERO);
    }

    /// Add `delta` to the participant's balance.
    pub fn adjust(&mut self, participant: ParticipantId, delta: Decimal) {
        let balance = self.positions.entry(participant).or_insert(Decimal::ZERO);
        *balance = balance.saturating_add(delta);
    }

    /// Apply a debt: debtor loses, creditor gains.
    pub fn apply_debt(&mut self, debt: &DebtEntry) {
        self.adjust(debt.debtor_id(), -debt.amount());
        self.adjust(debt.creditor_id(), debt.amount());
    }

    /// Balance of a participant; zero for unknown participants.
    pub fn balance(&self, participant: &ParticipantId) -> Decimal {
        self.positions
            .get(participant)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.positions.contains_key(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &Decimal)> {
        self.positions.iter()
    }

    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.positions.keys()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sum of all balances. Zero (within rounding of the average) for any
    /// ledger built from expenses and debts.
    pub fn total(&self) -> Decimal {
        self.positions
            .values()
            .fold(Decimal::ZERO, |acc, b| acc.saturating_add(*b))
    }

    /// True when every balance is within the settlement tolerance of zero.
    pub fn is_settled(&self) -> bool {
        self.positions.values().all(|b| is_negligible(*b))
    }

    /// Total amount that still has to move: sum of the positive balances.
    pub fn outstanding(&self) -> Decimal {
        self.positions
            .values()
            .filter(|v| **v > Decimal::ZERO)
            .fold(Decimal::ZERO, |acc, b| acc.saturating_add(*b))
    }
}

impl FromIterator<(ParticipantId, Decimal)> for Balances {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, Decimal)>>(iter: T) -> Self {
        let mut balances = Balances::new();
        for (participant, amount) in iter {
            balances.adjust(participant, amount);
        }
        balances
    }
}
