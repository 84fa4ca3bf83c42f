use super::state::StoreState;
use super::{ChatRecord, DeleteOutcome, EntryStore, StoreError};
use crate::core::entry::{DebtEntry, EntryId, ExpenseEntry};
use crate::core::participant::{ChatId, MessageId, Participant, ParticipantId};

/// Entry store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: StoreState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryStore for MemoryStore {
    fn list_expenses(&self, chat_id: ChatId) -> Result<Vec<ExpenseEntry>, StoreError> {
        Ok(self.state.list_expenses(chat_id))
    }

    fn list_debts(&self, chat_id: ChatId) -> Result<Vec<DebtEntry>, StoreError> {
        Ok(self.state.list_debts(chat_id))
    }

    fn insert_expense(&mut self, entry: ExpenseEntry) -> Result<ExpenseEntry, StoreError> {
        self.state.insert_expense(entry)
    }

    fn insert_debt(&mut self, entry: DebtEntry) -> Result<DebtEntry, StoreError> {
        self.state.insert_debt(entry)
    }

    fn delete_by_id(
        &mut self,
        chat_id: ChatId,
        entry_id: EntryId,
    ) -> Result<DeleteOutcome, StoreError> {
        Ok(self.state.delete_by_id(chat_id, entry_id))
    }

    fn upsert_participant(&mut self, participant: Participant) -> Result<(), StoreError> {
        self.state.upsert_participant(participant);
        Ok(())
    }

    fn participant_name(&self, id: ParticipantId) -> Result<Option<String>, StoreError> {
        Ok(self.state.participant_name(id))
    }

    fn chat(&self, chat_id: ChatId) -> Result<Option<ChatRecord>, StoreError> {
        Ok(self.state.chat(chat_id))
    }

    fn track_chat(&mut self, record: ChatRecord) -> Result<(), StoreError> {
        self.state.track_chat(record)
    }

    fn set_summary_message(
        &mut self,
        chat_id: ChatId,
        message: MessageId,
    ) -> Result<(), StoreError> {
        self.state.set_summary_message(chat_id, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::EntryKind;
    use rust_decimal_macros::dec;

    const CHAT: i64 = -42;

    fn expense(id: i64, payer: i64) -> ExpenseEntry {
        ExpenseEntry::new(
            EntryId::new(id),
            ChatId::new(CHAT),
            ParticipantId::new(payer),
            dec!(10),
            "pizza",
        )
        .unwrap()
    }

    fn debt(id: i64, from: i64, to: i64) -> DebtEntry {
        DebtEntry::new(
            EntryId::new(id),
            ChatId::new(CHAT),
            ParticipantId::new(from),
            ParticipantId::new(to),
            dec!(5),
            "coffee",
        )
        .unwrap()
    }

    #[test]
    fn test_insert_assigns_increasing_sequence() {
        let mut store = MemoryStore::new();
        let a = store.insert_expense(expense(100, 1)).unwrap();
        let b = store.insert_debt(debt(101, 1, 2)).unwrap();
        let c = store.insert_expense(expense(102, 2)).unwrap();
        assert!(a.sequence() < b.sequence());
        assert!(b.sequence() < c.sequence());

        let listed = store.list_expenses(ChatId::new(CHAT)).unwrap();
        let ids: Vec<i64> = listed.iter().map(|e| e.entry_id().get()).collect();
        assert_eq!(ids, vec![100, 102]);
    }

    #[test]
    fn test_duplicate_id_across_kinds() {
        let mut store = MemoryStore::new();
        store.insert_expense(expense(7, 1)).unwrap();
        let err = store.insert_debt(debt(7, 1, 2)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[test]
    fn test_same_id_in_other_chat_is_fine() {
        let mut store = MemoryStore::new();
        store.insert_expense(expense(7, 1)).unwrap();
        let other = ExpenseEntry::new(
            EntryId::new(7),
            ChatId::new(CHAT + 1),
            ParticipantId::new(1),
            dec!(1),
            "tea",
        )
        .unwrap();
        assert!(store.insert_expense(other).is_ok());
    }

    #[test]
    fn test_delete_reports_kind() {
        let mut store = MemoryStore::new();
        store.insert_expense(expense(1, 1)).unwrap();
        store.insert_debt(debt(2, 1, 2)).unwrap();
        let chat = ChatId::new(CHAT);

        assert_eq!(
            store.delete_by_id(chat, EntryId::new(2)).unwrap(),
            DeleteOutcome::Deleted(EntryKind::Debt)
        );
        assert_eq!(
            store.delete_by_id(chat, EntryId::new(1)).unwrap(),
            DeleteOutcome::Deleted(EntryKind::Expense)
        );
        assert_eq!(
            store.delete_by_id(chat, EntryId::new(1)).unwrap(),
            DeleteOutcome::NotFound
        );
        assert_eq!(
            store.delete_by_id(ChatId::new(1), EntryId::new(1)).unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[test]
    fn test_participant_names_last_write_wins() {
        let mut store = MemoryStore::new();
        store.upsert_participant(Participant::new(1, "Ann")).unwrap();
        store.upsert_participant(Participant::new(1, "Annie")).unwrap();
        assert_eq!(
            store.participant_name(ParticipantId::new(1)).unwrap(),
            Some("Annie".to_string())
        );
        assert_eq!(store.participant_name(ParticipantId::new(2)).unwrap(), None);
    }

    #[test]
    fn test_chat_tracking() {
        let mut store = MemoryStore::new();
        let chat = ChatId::new(CHAT);
        assert!(store.chat(chat).unwrap().is_none());
        assert!(matches!(
            store.set_summary_message(chat, MessageId::new(5)),
            Err(StoreError::ChatNotTracked(_))
        ));

        let record = ChatRecord {
            chat_id: chat,
            summary_message: MessageId::new(5),
        };
        store.track_chat(record).unwrap();
        assert!(matches!(
            store.track_chat(record),
            Err(StoreError::AlreadyTracked(_))
        ));

        store.set_summary_message(chat, MessageId::new(9)).unwrap();
        assert_eq!(
            store.chat(chat).unwrap().map(|r| r.summary_message),
            Some(MessageId::new(9))
        );
    }
}
