use crate::core::entry::{DebtEntry, EntryId, ExpenseEntry};
use crate::core::participant::{ChatId, Participant, ParticipantId};
use rand::Rng;
use rust_decimal::Decimal;

/// Shape of a randomly generated chat ledger.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub chat_id: ChatId,
    pub participant_count: usize,
    pub expense_count: usize,
    pub debt_count: usize,
    /// Smallest amount, in cents.
    pub min_cents: i64,
    /// Largest amount, in cents.
    pub max_cents: i64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chat_id: ChatId::new(1),
            participant_count: 5,
            expense_count: 20,
            debt_count: 5,
            min_cents: 100,
            max_cents: 50_000,
        }
    }
}

/// A generated chat: its members and a sequenced set of entries.
#[derive(Debug, Clone, Default)]
pub struct GeneratedChat {
    pub participants: Vec<Participant>,
    pub expenses: Vec<ExpenseEntry>,
    pub debts: Vec<DebtEntry>,
}

/// Generate a random chat ledger for benchmarks and load tests.
///
/// Expenses and debts share one id and sequence space, interleaved at
/// random, just like messages in a real chat.
pub fn generate_random_chat(config: &ChatConfig) -> GeneratedChat {
    let mut rng = rand::thread_rng();
    let mut chat = GeneratedChat {
        participants: (0..config.participant_count)
            .map(|i| Participant::new(i as i64 + 1, format!("Member {:02}", i + 1)))
            .collect(),
        ..Default::default()
    };
    if chat.participants.is_empty() {
        return chat;
    }

    let min = config.min_cents.max(1);
    let max = config.max_cents.max(min);
    let total = config.expense_count + config.debt_count;
    let (mut expenses_left, mut debts_left) = (config.expense_count, config.debt_count);

    for seq in 1..=total {
        let id = EntryId::new(seq as i64);
        let amount = Decimal::new(rng.gen_range(min..=max), 2);
        let payer = pick(&mut rng, &chat.participants);

        let make_debt = debts_left > 0
            && chat.participants.len() > 1
            && (expenses_left == 0 || rng.gen_range(0..total) < config.debt_count);

        if make_debt {
            let mut creditor = pick(&mut rng, &chat.participants);
            while creditor == payer {
                creditor = pick(&mut rng, &chat.participants);
            }
            if let Ok(debt) = DebtEntry::new(id, config.chat_id, payer, creditor, amount, "generated") {
                chat.debts.push(debt.with_sequence(seq as u64));
            }
            debts_left -= 1;
        } else if expenses_left > 0 {
            if let Ok(expense) = ExpenseEntry::new(id, config.chat_id, payer, amount, "generated") {
                chat.expenses.push(expense.with_sequence(seq as u64));
            }
            expenses_left -= 1;
        }
    }

    chat
}

fn pick(rng: &mut impl Rng, participants: &[Participant]) -> ParticipantId {
    participants[rng.gen_range(0..participants.len())].id
}
