use crate::core::amount::format_amount;
use crate::core::participant::ParticipantId;
use crate::reconcile::aggregate::ChatLedgerView;
use crate::reconcile::settlement::SettlementPlan;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Write as _;

/// First line of every summary.
pub const SUMMARY_TITLE: &str = "📊 Shared expenses";

/// Body used when there is nothing to show.
pub const EMPTY_PLACEHOLDER: &str = "No expenses recorded yet.";

/// Name shown for participants whose name was never observed.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Display names of participants, as last seen by the store.
#[derive(Debug, Clone, Default)]
pub struct ParticipantNames {
    names: HashMap<ParticipantId, String>,
}

impl ParticipantNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ParticipantId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn name(&self, id: &ParticipantId) -> &str {
        self.names.get(id).map(String::as_str).unwrap_or(UNKNOWN_NAME)
    }
}

impl FromIterator<(ParticipantId, String)> for ParticipantNames {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Renders the pinned summary text of a chat.
///
/// Output is a pure function of its inputs: rendering the same view and
/// plan twice gives identical text. Sections appear only when they have at
/// least one line, always in this order:
///
/// 1. expense detail, most recent first;
/// 2. per-participant totals with total and average spend;
/// 3. private debts in entry order;
/// 4. settlement transfers.
///
/// The text is not truncated; see [`truncate_for_channel`].
#[derive(Debug, Clone)]
pub struct SummaryRenderer<'a> {
    names: &'a ParticipantNames,
    currency_label: &'a str,
}

impl<'a> SummaryRenderer<'a> {
    pub fn new(names: &'a ParticipantNames) -> Self {
        Self {
            names,
            currency_label: "",
        }
    }

    /// Suffix appended to every amount, e.g. `"EUR"`.
    pub fn with_currency_label(mut self, label: &'a str) -> Self {
        self.currency_label = label;
        self
    }

    fn money(&self, amount: Decimal) -> String {
        let formatted = format_amount(amount);
        if self.currency_label.is_empty() {
            formatted
        } else {
            format!("{} {}", formatted, self.currency_label)
        }
    }

    pub fn render(&self, view: &ChatLedgerView, plan: &SettlementPlan) -> String {
        let sections: Vec<String> = [
            self.expense_section(view),
            self.totals_section(view),
            self.debt_section(view),
            self.settlement_section(plan),
        ]
        .into_iter()
        .flatten()
        .collect();

        let body = if sections.is_empty() {
            EMPTY_PLACEHOLDER.to_string()
        } else {
            sections.join("\n\n")
        };
        format!("{}\n\n{}", SUMMARY_TITLE, body)
    }

    fn expense_section(&self, view: &ChatLedgerView) -> Option<String> {
        if view.expenses().is_empty() {
            return None;
        }
        let mut out = String::from("Expenses:");
        for expense in view.expenses().iter().rev() {
            let _ = write!(
                out,
                "\n  - {} ({}): {}",
                self.money(expense.amount()),
                self.names.name(&expense.payer_id()),
                expense.description()
            );
        }
        Some(out)
    }

    fn totals_section(&self, view: &ChatLedgerView) -> Option<String> {
        let payers: Vec<_> = view
            .total_by_participant()
            .iter()
            .filter(|(_, total)| **total > Decimal::ZERO)
            .collect();
        if payers.is_empty() {
            return None;
        }
        let mut out = String::from("Totals:");
        for (participant, total) in payers {
            let _ = write!(
                out,
                "\n  - {}: {}",
                self.names.name(participant),
                self.money(*total)
            );
        }
        let _ = write!(
            out,
            "\n\nTotal spent: {}\nAverage spent: {}",
            self.money(view.total_spent()),
            self.money(view.average_spent())
        );
        Some(out)
    }

    fn debt_section(&self, view: &ChatLedgerView) -> Option<String> {
        if view.debts().is_empty() {
            return None;
        }
        let mut out = String::from("Debts:");
        for debt in view.debts() {
            let _ = write!(
                out,
                "\n  - {} → {}: {} ({})",
                self.names.name(&debt.debtor_id()),
                self.names.name(&debt.creditor_id()),
                self.money(debt.amount()),
                debt.reason()
            );
        }
        Some(out)
    }

    fn settlement_section(&self, plan: &SettlementPlan) -> Option<String> {
        if plan.transfers().is_empty() {
            return None;
        }
        let mut out = String::from("Settlement:");
        for transfer in plan.transfers() {
            let _ = write!(
                out,
                "\n  - {} → {}: {}",
                self.names.name(&transfer.from),
                self.names.name(&transfer.to),
                self.money(transfer.amount)
            );
        }
        Some(out)
    }
}

/// Cut `text` to at most `limit` characters for an output channel,
/// marking the cut with `...`.
pub fn truncate_for_channel(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{DebtEntry, EntryId, ExpenseEntry};
    use crate::core::participant::ChatId;
    use crate::reconcile::aggregate::LedgerAggregator;
    use crate::reconcile::settlement::SettlementPlanner;
    use rust_decimal_macros::dec;

    fn names() -> ParticipantNames {
        [
            (ParticipantId::new(1), "Ann".to_string()),
            (ParticipantId::new(2), "Bob".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn render(expenses: &[ExpenseEntry], debts: &[DebtEntry]) -> String {
        let view = LedgerAggregator::aggregate(expenses, debts);
        let plan = SettlementPlanner::plan(&view.base_balances(), view.debts());
        let names = names();
        SummaryRenderer::new(&names).render(&view, &plan)
    }

    fn expense(id: i64, payer: i64, amount: Decimal, what: &str) -> ExpenseEntry {
        ExpenseEntry::new(EntryId::new(id), ChatId::new(1), ParticipantId::new(payer), amount, what)
            .unwrap()
            .with_sequence(id as u64)
    }

    #[test]
    fn test_empty_ledger_renders_placeholder() {
        assert_eq!(render(&[], &[]), "📊 Shared expenses\n\nNo expenses recorded yet.");
    }

    #[test]
    fn test_full_summary_layout() {
        let debt = DebtEntry::new(
            EntryId::new(3),
            ChatId::new(1),
            ParticipantId::new(2),
            ParticipantId::new(1),
            dec!(5),
            "coffee",
        )
        .unwrap()
        .with_sequence(3);
        let text = render(
            &[expense(1, 1, dec!(30), "groceries"), expense(2, 2, dec!(10), "wine")],
            &[debt],
        );
        let expected = "📊 Shared expenses\n\n\
            Expenses:\n  - 10.00 (Bob): wine\n  - 30.00 (Ann): groceries\n\n\
            Totals:\n  - Ann: 30.00\n  - Bob: 10.00\n\n\
            Total spent: 40.00\nAverage spent: 20.00\n\n\
            Debts:\n  - Bob → Ann: 5.00 (coffee)\n\n\
            Settlement:\n  - Bob → Ann: 15.00";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_balanced_expenses_have_no_settlement_section() {
        let text = render(&[expense(1, 1, dec!(10), "a"), expense(2, 2, dec!(10), "b")], &[]);
        assert!(text.contains("Totals:"));
        assert!(!text.contains("Settlement:"));
    }

    #[test]
    fn test_unknown_names_and_currency_label() {
        let view = LedgerAggregator::aggregate(&[expense(1, 9, dec!(4.5), "tea")], &[]);
        let plan = SettlementPlanner::plan(&view.base_balances(), view.debts());
        let names = ParticipantNames::new();
        let text = SummaryRenderer::new(&names)
            .with_currency_label("EUR")
            .render(&view, &plan);
        assert!(text.contains("  - 4.50 EUR (Unknown): tea"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let entries = [expense(1, 1, dec!(100), "rent"), expense(2, 2, dec!(33.33), "gas")];
        assert_eq!(render(&entries, &[]), render(&entries, &[]));
    }

    #[test]
    fn test_truncate_for_channel() {
        assert_eq!(truncate_for_channel("short", 10), "short");
        assert_eq!(truncate_for_channel("abcdefghijk", 8), "abcde...");
        assert_eq!(truncate_for_channel("ééééé", 4), "é...");
        assert_eq!(truncate_for_channel("ééééé", 4).chars().count(), 4);
    }
}
