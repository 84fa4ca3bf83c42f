use crate::core::amount::validate_amount;
use crate::core::participant::{ChatId, MessageId, ParticipantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reason given for a debt recorded without one.
pub const DEFAULT_REASON: &str = "No description";

/// Input rejected before it reaches the entry store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("participant {0} cannot owe themselves")]
    SelfDebt(ParticipantId),
    #[error("amount {0} is above the supported maximum")]
    AmountTooLarge(Decimal),
    #[error("'{0}' is not a valid amount")]
    MalformedAmount(String),
    #[error("an expense needs a description")]
    MissingDescription,
}

/// Identifier of an entry within its chat.
///
/// Entries are keyed by the id of the chat message that created them, which
/// is what a delete-by-reply refers back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

impl EntryId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MessageId> for EntryId {
    fn from(id: MessageId) -> Self {
        Self(id.get())
    }
}

impl From<i64> for EntryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Which kind of entry a store operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Expense,
    Debt,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Expense => f.write_str("expense"),
            EntryKind::Debt => f.write_str("debt"),
        }
    }
}

/// Money one participant spent on behalf of the whole group.
///
/// Expenses are immutable once created; the only way to change one is to
/// delete it and record a new one.
///
/// # Examples
///
/// ```
/// use group_ledger::core::entry::{EntryId, ExpenseEntry};
/// use group_ledger::core::participant::{ChatId, ParticipantId};
/// use rust_decimal_macros::dec;
///
/// let expense = ExpenseEntry::new(
///     EntryId::new(10),
///     ChatId::new(1),
///     ParticipantId::new(7),
///     dec!(30),
///     "groceries",
/// )
/// .unwrap();
/// assert_eq!(expense.amount(), dec!(30));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    entry_id: EntryId,
    chat_id: ChatId,
    payer_id: ParticipantId,
    amount: Decimal,
    description: String,
    /// Per-chat insertion order, assigned by the store.
    #[serde(default)]
    sequence: u64,
    recorded_at: DateTime<Utc>,
}

impl ExpenseEntry {
    /// Create a validated expense. The sequence is left at zero until the
    /// store assigns one on insert.
    pub fn new(
        entry_id: EntryId,
        chat_id: ChatId,
        payer_id: ParticipantId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let amount = validate_amount(amount)?;
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        Ok(Self {
            entry_id,
            chat_id,
            payer_id,
            amount,
            description,
            sequence: 0,
            recorded_at: Utc::now(),
        })
    }

    /// Stamp the per-chat insertion order.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn payer_id(&self) -> ParticipantId {
        self.payer_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// A bilateral debt: `debtor` owes `creditor` `amount`, outside the
/// equal split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtEntry {
    entry_id: EntryId,
    chat_id: ChatId,
    debtor_id: ParticipantId,
    creditor_id: ParticipantId,
    amount: Decimal,
    reason: String,
    #[serde(default)]
    sequence: u64,
    recorded_at: DateTime<Utc>,
}

impl DebtEntry {
    /// Create a validated debt. An empty reason is replaced with
    /// [`DEFAULT_REASON`].
    pub fn new(
        entry_id: EntryId,
        chat_id: ChatId,
        debtor_id: ParticipantId,
        creditor_id: ParticipantId,
        amount: Decimal,
        reason: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if debtor_id == creditor_id {
            return Err(ValidationError::SelfDebt(debtor_id));
        }
        let amount = validate_amount(amount)?;
        let reason = reason.into().trim().to_string();
        let reason = if reason.is_empty() {
            DEFAULT_REASON.to_string()
        } else {
            reason
        };
        Ok(Self {
            entry_id,
            chat_id,
            debtor_id,
            creditor_id,
            amount,
            reason,
            sequence: 0,
            recorded_at: Utc::now(),
        })
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn debtor_id(&self) -> ParticipantId {
        self.debtor_id
    }

    pub fn creditor_id(&self) -> ParticipantId {
        self.creditor_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
