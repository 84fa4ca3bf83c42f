use super::state::StoreState;
use super::{ChatRecord, DeleteOutcome, EntryStore, StoreError};
use crate::core::entry::{DebtEntry, EntryId, ExpenseEntry};
use crate::core::participant::{ChatId, MessageId, Participant, ParticipantId};
use std::fs;
use std::path::{Path, PathBuf};

/// Entry store persisted as a single JSON document.
///
/// Every mutation is written through to disk before it becomes visible:
/// the change is applied to a copy of the state, the copy is written to a
/// temporary file next to the target and renamed over it, and only then
/// does the in-memory state move forward. A failed write leaves both the
/// file and the store unchanged.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: StoreState,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                StoreState::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            StoreState::default()
        };
        log::info!("opened ledger store at {}", path.display());
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = self.state.clone();
        let out = op(&mut next)?;
        self.persist(&next)?;
        self.state = next;
        Ok(out)
    }
}

impl EntryStore for JsonFileStore {
    fn list_expenses(&self, chat_id: ChatId) -> Result<Vec<ExpenseEntry>, StoreError> {
        Ok(self.state.list_expenses(chat_id))
    }

    fn list_debts(&self, chat_id: ChatId) -> Result<Vec<DebtEntry>, StoreError> {
        Ok(self.state.list_debts(chat_id))
    }

    fn insert_expense(&mut self, entry: ExpenseEntry) -> Result<ExpenseEntry, StoreError> {
        self.mutate(|state| state.insert_expense(entry))
    }

    fn insert_debt(&mut self, entry: DebtEntry) -> Result<DebtEntry, StoreError> {
        self.mutate(|state| state.insert_debt(entry))
    }

    fn delete_by_id(
        &mut self,
        chat_id: ChatId,
        entry_id: EntryId,
    ) -> Result<DeleteOutcome, StoreError> {
        if !self.state.contains_entry(chat_id, entry_id) {
            return Ok(DeleteOutcome::NotFound);
        }
        self.mutate(|state| Ok(state.delete_by_id(chat_id, entry_id)))
    }

    fn upsert_participant(&mut self, participant: Participant) -> Result<(), StoreError> {
        if self.state.participant_name(participant.id).as_deref() == Some(participant.name.as_str())
        {
            return Ok(());
        }
        self.mutate(|state| {
            state.upsert_participant(participant);
            Ok(())
        })
    }

    fn participant_name(&self, id: ParticipantId) -> Result<Option<String>, StoreError> {
        Ok(self.state.participant_name(id))
    }

    fn chat(&self, chat_id: ChatId) -> Result<Option<ChatRecord>, StoreError> {
        Ok(self.state.chat(chat_id))
    }

    fn track_chat(&mut self, record: ChatRecord) -> Result<(), StoreError> {
        self.mutate(|state| state.track_chat(record))
    }

    fn set_summary_message(
        &mut self,
        chat_id: ChatId,
        message: MessageId,
    ) -> Result<(), StoreError> {
        self.mutate(|state| state.set_summary_message(chat_id, message))
    }
}
