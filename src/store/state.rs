use super::{ChatRecord, DeleteOutcome, StoreError};
use crate::core::entry::{DebtEntry, EntryId, EntryKind, ExpenseEntry};
use crate::core::participant::{ChatId, MessageId, Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entries and tracking info of a single chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ChatState {
    #[serde(default)]
    summary_message: Option<MessageId>,
    #[serde(default)]
    next_sequence: u64,
    #[serde(default)]
    expenses: Vec<ExpenseEntry>,
    #[serde(default)]
    debts: Vec<DebtEntry>,
}

impl ChatState {
    fn contains(&self, entry_id: EntryId) -> bool {
        self.expenses.iter().any(|e| e.entry_id() == entry_id)
            || self.debts.iter().any(|d| d.entry_id() == entry_id)
    }

    fn take_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }
}

/// Whole store contents, shared by every backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    chats: BTreeMap<ChatId, ChatState>,
    #[serde(default)]
    participants: BTreeMap<ParticipantId, String>,
}

impl StoreState {
    pub(crate) fn list_expenses(&self, chat_id: ChatId) -> Vec<ExpenseEntry> {
        let mut expenses = self
            .chats
            .get(&chat_id)
            .map(|c| c.expenses.clone())
            .unwrap_or_default();
        expenses.sort_by_key(|e| e.sequence());
        expenses
    }

    pub(crate) fn list_debts(&self, chat_id: ChatId) -> Vec<DebtEntry> {
        let mut debts = self
            .chats
            .get(&chat_id)
            .map(|c| c.debts.clone())
            .unwrap_or_default();
        debts.sort_by_key(|d| d.sequence());
        debts
    }

    pub(crate) fn insert_expense(
        &mut self,
        entry: ExpenseEntry,
    ) -> Result<ExpenseEntry, StoreError> {
        let chat = self.chats.entry(entry.chat_id()).or_default();
        if chat.contains(entry.entry_id()) {
            return Err(StoreError::DuplicateId {
                chat_id: entry.chat_id(),
                entry_id: entry.entry_id(),
            });
        }
        let entry = entry.with_sequence(chat.take_sequence());
        chat.expenses.push(entry.clone());
        Ok(entry)
    }

    pub(crate) fn insert_debt(&mut self, entry: DebtEntry) -> Result<DebtEntry, StoreError> {
        let chat = self.chats.entry(entry.chat_id()).or_default();
        if chat.contains(entry.entry_id()) {
            return Err(StoreError::DuplicateId {
                chat_id: entry.chat_id(),
                entry_id: entry.entry_id(),
            });
        }
        let entry = entry.with_sequence(chat.take_sequence());
        chat.debts.push(entry.clone());
        Ok(entry)
    }

    pub(crate) fn contains_entry(&self, chat_id: ChatId, entry_id: EntryId) -> bool {
        self.chats
            .get(&chat_id)
            .is_some_and(|chat| chat.contains(entry_id))
    }

    pub(crate) fn delete_by_id(&mut self, chat_id: ChatId, entry_id: EntryId) -> DeleteOutcome {
        let Some(chat) = self.chats.get_mut(&chat_id) else {
            return DeleteOutcome::NotFound;
        };
        if let Some(pos) = chat.expenses.iter().position(|e| e.entry_id() == entry_id) {
            chat.expenses.remove(pos);
            return DeleteOutcome::Deleted(EntryKind::Expense);
        }
        if let Some(pos) = chat.debts.iter().position(|d| d.entry_id() == entry_id) {
            chat.debts.remove(pos);
            return DeleteOutcome::Deleted(EntryKind::Debt);
        }
        DeleteOutcome::NotFound
    }

    pub(crate) fn upsert_participant(&mut self, participant: Participant) {
        self.participants.insert(participant.id, participant.name);
    }

    pub(crate) fn participant_name(&self, id: ParticipantId) -> Option<String> {
        self.participants.get(&id).cloned()
    }

    pub(crate) fn chat(&self, chat_id: ChatId) -> Option<ChatRecord> {
        let message = self.chats.get(&chat_id)?.summary_message?;
        Some(ChatRecord {
            chat_id,
            summary_message: message,
        })
    }

    pub(crate) fn track_chat(&mut self, record: ChatRecord) -> Result<(), StoreError> {
        let chat = self.chats.entry(record.chat_id).or_default();
        if chat.summary_message.is_some() {
            return Err(StoreError::AlreadyTracked(record.chat_id));
        }
        chat.summary_message = Some(record.summary_message);
        Ok(())
    }

    pub(crate) fn set_summary_message(
        &mut self,
        chat_id: ChatId,
        message: MessageId,
    ) -> Result<(), StoreError> {
        match self.chats.get_mut(&chat_id) {
            Some(chat) if chat.summary_message.is_some() => {
                chat.summary_message = Some(message);
                Ok(())
            }
            _ => Err(StoreError::ChatNotTracked(chat_id)),
        }
    }
}
