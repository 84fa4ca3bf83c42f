//! The reconciliation pipeline: aggregate entries, plan settlement, render
//! the summary. All three steps are pure functions of a chat's entries.

pub mod aggregate;
pub mod settlement;
pub mod summary;

use crate::core::entry::{DebtEntry, ExpenseEntry};
use aggregate::{ChatLedgerView, LedgerAggregator};
use settlement::{SettlementPlan, SettlementPlanner};

/// Run aggregation and settlement planning over one snapshot of entries.
pub fn reconcile(expenses: &[ExpenseEntry], debts: &[DebtEntry]) -> (ChatLedgerView, SettlementPlan) {
    let view = LedgerAggregator::aggregate(expenses, debts);
    let plan = SettlementPlanner::plan(&view.base_balances(), view.debts());
    (view, plan)
}
