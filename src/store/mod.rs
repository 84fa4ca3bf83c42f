//! Durable keyed collection of expense and debt entries per chat.
//!
//! The reconciliation engine only depends on the [`EntryStore`] contract.
//! Two backends implement it: [`memory::MemoryStore`] for tests and
//! ephemeral runs, and [`json_file::JsonFileStore`], which persists the
//! whole state to a JSON document after every mutation. The backend is
//! picked by [`open_store`] from configuration.

pub mod json_file;
pub mod memory;
mod state;

use crate::config::{EngineConfig, StoreBackend};
use crate::core::entry::{DebtEntry, EntryId, EntryKind, ExpenseEntry};
use crate::core::participant::{ChatId, MessageId, Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors raised by entry store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry {entry_id} already exists in chat {chat_id}")]
    DuplicateId { chat_id: ChatId, entry_id: EntryId },
    #[error("chat {0} is not tracked")]
    ChatNotTracked(ChatId),
    #[error("chat {0} is already tracked")]
    AlreadyTracked(ChatId),
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store data is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of a delete-by-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted(EntryKind),
    NotFound,
}

/// A chat whose ledger is being tracked, with its pinned summary message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub chat_id: ChatId,
    pub summary_message: MessageId,
}

/// Repository of ledger entries keyed by chat and entry id.
///
/// Listings are ordered by `sequence` ascending. Inserts assign the next
/// per-chat sequence number and return the stamped entry. Entry ids are
/// unique per chat across both entry kinds.
pub trait EntryStore {
    fn list_expenses(&self, chat_id: ChatId) -> Result<Vec<ExpenseEntry>, StoreError>;

    fn list_debts(&self, chat_id: ChatId) -> Result<Vec<DebtEntry>, StoreError>;

    fn insert_expense(&mut self, entry: ExpenseEntry) -> Result<ExpenseEntry, StoreError>;

    fn insert_debt(&mut self, entry: DebtEntry) -> Result<DebtEntry, StoreError>;

    fn delete_by_id(
        &mut self,
        chat_id: ChatId,
        entry_id: EntryId,
    ) -> Result<DeleteOutcome, StoreError>;

    /// Record the latest display name of a participant (last write wins).
    fn upsert_participant(&mut self, participant: Participant) -> Result<(), StoreError>;

    fn participant_name(&self, id: ParticipantId) -> Result<Option<String>, StoreError>;

    fn chat(&self, chat_id: ChatId) -> Result<Option<ChatRecord>, StoreError>;

    /// Start tracking a chat. Fails with `AlreadyTracked` if it already is.
    fn track_chat(&mut self, record: ChatRecord) -> Result<(), StoreError>;

    /// Point a tracked chat at a new summary message.
    fn set_summary_message(
        &mut self,
        chat_id: ChatId,
        message: MessageId,
    ) -> Result<(), StoreError>;
}

impl<T: EntryStore + ?Sized> EntryStore for Box<T> {
    fn list_expenses(&self, chat_id: ChatId) -> Result<Vec<ExpenseEntry>, StoreError> {
        (**self).list_expenses(chat_id)
    }

    fn list_debts(&self, chat_id: ChatId) -> Result<Vec<DebtEntry>, StoreError> {
        (**self).list_debts(chat_id)
    }

    fn insert_expense(&mut self, entry: ExpenseEntry) -> Result<ExpenseEntry, StoreError> {
        (**self).insert_expense(entry)
    }

    fn insert_debt(&mut self, entry: DebtEntry) -> Result<DebtEntry, StoreError> {
        (**self).insert_debt(entry)
    }

    fn delete_by_id(
        &mut self,
        chat_id: ChatId,
        entry_id: EntryId,
    ) -> Result<DeleteOutcome, StoreError> {
        (**self).delete_by_id(chat_id, entry_id)
    }

    fn upsert_participant(&mut self, participant: Participant) -> Result<(), StoreError> {
        (**self).upsert_participant(participant)
    }

    fn participant_name(&self, id: ParticipantId) -> Result<Option<String>, StoreError> {
        (**self).participant_name(id)
    }

    fn chat(&self, chat_id: ChatId) -> Result<Option<ChatRecord>, StoreError> {
        (**self).chat(chat_id)
    }

    fn track_chat(&mut self, record: ChatRecord) -> Result<(), StoreError> {
        (**self).track_chat(record)
    }

    fn set_summary_message(
        &mut self,
        chat_id: ChatId,
        message: MessageId,
    ) -> Result<(), StoreError> {
        (**self).set_summary_message(chat_id, message)
    }
}

/// Open the backend selected by `config`.
pub fn open_store(config: &EngineConfig) -> Result<Box<dyn EntryStore>, StoreError> {
    match config.store {
        StoreBackend::Memory => {
            log::debug!("using in-memory entry store");
            Ok(Box::new(MemoryStore::new()))
        }
        StoreBackend::JsonFile => {
            log::debug!("using JSON entry store at {}", config.data_path.display());
            Ok(Box::new(JsonFileStore::open(&config.data_path)?))
        }
    }
}
