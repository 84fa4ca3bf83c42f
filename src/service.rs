//! Orchestration around the pure engine: mutate the store, recompute the
//! ledger, render the summary and hand it to the messaging gateway.

use crate::command::{parse_command, parse_expense, Command};
use crate::config::EngineConfig;
use crate::core::amount::format_amount;
use crate::core::entry::{DebtEntry, EntryId, EntryKind, ExpenseEntry, ValidationError};
use crate::core::participant::{ChatId, MessageId, Participant};
use crate::error::{LedgerError, Result, SinkError};
use crate::reconcile::reconcile;
use crate::reconcile::summary::{ParticipantNames, SummaryRenderer, EMPTY_PLACEHOLDER, SUMMARY_TITLE};
use crate::store::{ChatRecord, DeleteOutcome, EntryStore, StoreError};
use rust_decimal::Decimal;

const OWE_NEEDS_REPLY: &str = "Reply to a message from the person you owe.";

/// Outbound side of the messaging gateway.
pub trait SummarySink {
    /// Send a new summary message to the chat and pin it.
    fn post(&mut self, chat_id: ChatId, text: &str) -> std::result::Result<MessageId, SinkError>;

    /// Replace the text of the pinned summary `message`.
    ///
    /// Returns the id of the message now holding the summary; a sink that
    /// had to re-post a vanished message returns the new id.
    fn publish(
        &mut self,
        chat_id: ChatId,
        message: MessageId,
        text: &str,
    ) -> std::result::Result<MessageId, SinkError>;
}

/// The message a command replied to.
#[derive(Debug, Clone)]
pub struct RepliedMessage {
    pub message_id: MessageId,
    pub author: Participant,
}

/// An incoming chat message, as delivered by the gateway.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: Participant,
    pub text: String,
    pub reply_to: Option<RepliedMessage>,
}

/// Owns the entry store and runs one reconciliation at a time.
///
/// Every mutating method takes `&mut self`, so "mutate → recompute →
/// render → publish" for a chat can never interleave with another update
/// through the same reconciler. Share it across threads behind a mutex.
pub struct Reconciler<S: EntryStore> {
    store: S,
    currency_label: String,
}

impl<S: EntryStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            currency_label: String::new(),
        }
    }

    pub fn with_config(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            currency_label: config.currency_label.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn is_tracked(&self, chat_id: ChatId) -> Result<bool> {
        Ok(self.store.chat(chat_id)?.is_some())
    }

    /// Begin tracking `chat_id` with `summary_message` as its pinned summary.
    pub fn start_tracking(&mut self, chat_id: ChatId, summary_message: MessageId) -> Result<()> {
        self.store.track_chat(ChatRecord {
            chat_id,
            summary_message,
        })?;
        log::info!("started tracking chat {}", chat_id);
        Ok(())
    }

    /// Validate and store an expense paid by `payer`.
    pub fn record_expense(
        &mut self,
        chat_id: ChatId,
        message_id: MessageId,
        payer: Participant,
        amount: Decimal,
        description: &str,
    ) -> Result<ExpenseEntry> {
        let entry = ExpenseEntry::new(message_id.into(), chat_id, payer.id, amount, description)?;
        let entry = self.store.insert_expense(entry)?;
        self.store.upsert_participant(payer)?;
        log::info!(
            "chat {}: expense {} of {} by {}",
            chat_id,
            entry.entry_id(),
            entry.amount(),
            entry.payer_id()
        );
        Ok(entry)
    }

    /// Validate and store a debt of `debtor` towards `creditor`.
    pub fn record_debt(
        &mut self,
        chat_id: ChatId,
        message_id: MessageId,
        debtor: Participant,
        creditor: Participant,
        amount: Decimal,
        reason: &str,
    ) -> Result<DebtEntry> {
        let entry = DebtEntry::new(
            message_id.into(),
            chat_id,
            debtor.id,
            creditor.id,
            amount,
            reason,
        )?;
        let entry = self.store.insert_debt(entry)?;
        self.store.upsert_participant(debtor)?;
        self.store.upsert_participant(creditor)?;
        log::info!(
            "chat {}: debt {} of {} from {} to {}",
            chat_id,
            entry.entry_id(),
            entry.amount(),
            entry.debtor_id(),
            entry.creditor_id()
        );
        Ok(entry)
    }

    /// Remove the entry created by message `entry_id`.
    pub fn delete_by_reference(&mut self, chat_id: ChatId, entry_id: EntryId) -> Result<DeleteOutcome> {
        let outcome = self.store.delete_by_id(chat_id, entry_id)?;
        match outcome {
            DeleteOutcome::Deleted(kind) => {
                log::info!("chat {}: deleted {} {}", chat_id, kind, entry_id)
            }
            DeleteOutcome::NotFound => {
                log::warn!("chat {}: no entry {} to delete", chat_id, entry_id)
            }
        }
        Ok(outcome)
    }

    /// Render the current summary text of a chat, untruncated.
    pub fn summary(&self, chat_id: ChatId) -> Result<String> {
        let expenses = self.store.list_expenses(chat_id)?;
        let debts = self.store.list_debts(chat_id)?;
        let (view, plan) = reconcile(&expenses, &debts);

        let mut names = ParticipantNames::new();
        for participant in view.total_by_participant().keys() {
            if let Some(name) = self.store.participant_name(*participant)? {
                names.insert(*participant, name);
            }
        }

        Ok(SummaryRenderer::new(&names)
            .with_currency_label(&self.currency_label)
            .render(&view, &plan))
    }

    /// Re-render the summary of a tracked chat and push it to `sink`.
    ///
    /// Records the new message id if the sink had to re-post the summary.
    /// Untracked chats are skipped.
    pub fn refresh(&mut self, chat_id: ChatId, sink: &mut dyn SummarySink) -> Result<()> {
        let Some(record) = self.store.chat(chat_id)? else {
            return Ok(());
        };
        let text = self.summary(chat_id)?;
        let current = sink.publish(chat_id, record.summary_message, &text)?;
        if current != record.summary_message {
            log::info!(
                "chat {}: summary moved from message {} to {}",
                chat_id,
                record.summary_message,
                current
            );
            self.store.set_summary_message(chat_id, current)?;
        }
        Ok(())
    }

    /// Dispatch one incoming chat message and return the reply to send,
    /// if any.
    ///
    /// Messages in untracked chats are ignored, except for the commands
    /// that work anywhere (`/start`, `/ping`, `/getchatid`,
    /// `/start_tracking`). A failed summary publish is logged and does not
    /// undo the stored change.
    pub fn handle_message(
        &mut self,
        message: &IncomingMessage,
        sink: &mut dyn SummarySink,
    ) -> Result<Option<String>> {
        let chat_id = message.chat_id;
        let command = match parse_command(&message.text) {
            Some(Ok(command)) => command,
            Some(Err(_)) => {
                if !self.is_tracked(chat_id)? {
                    return Ok(None);
                }
                if message.reply_to.is_none() {
                    return Ok(Some(OWE_NEEDS_REPLY.to_string()));
                }
                return Ok(Some("Invalid format. Use: /owe <amount> <description>".to_string()));
            }
            None => return self.handle_expense(message, sink),
        };

        match command {
            Command::Start => Ok(Some(
                "Hi! I keep track of shared expenses.\n\n\
                 Add me to your group chat, make me an administrator (needed to pin \
                 messages) and send /start_tracking to begin."
                    .to_string(),
            )),
            Command::Ping => Ok(Some("Pong! I'm online and ready.".to_string())),
            Command::GetChatId => Ok(Some(format!("This chat's id: `{}`", chat_id))),
            Command::StartTracking => self.handle_start_tracking(chat_id, sink),
            Command::Owe { amount, reason } => {
                if !self.is_tracked(chat_id)? {
                    return Ok(None);
                }
                let Some(reply_to) = &message.reply_to else {
                    return Ok(Some(OWE_NEEDS_REPLY.to_string()));
                };
                let debtor = message.sender.clone();
                let creditor = reply_to.author.clone();
                let (debtor_name, creditor_name) = (debtor.name.clone(), creditor.name.clone());
                match self.record_debt(
                    chat_id,
                    message.message_id,
                    debtor,
                    creditor,
                    amount,
                    &reason,
                ) {
                    Ok(debt) => {
                        self.refresh_logged(chat_id, sink);
                        Ok(Some(format!(
                            "✅ Recorded debt: {} owes {} {} ({}).",
                            debtor_name,
                            creditor_name,
                            format_amount(debt.amount()),
                            debt.reason()
                        )))
                    }
                    Err(LedgerError::Validation(ValidationError::SelfDebt(_))) => {
                        Ok(Some("You cannot owe yourself.".to_string()))
                    }
                    Err(LedgerError::Store(StoreError::DuplicateId { .. })) => {
                        log::warn!(
                            "chat {}: message {} already recorded",
                            chat_id,
                            message.message_id
                        );
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
            Command::Delete => {
                if !self.is_tracked(chat_id)? {
                    return Ok(None);
                }
                let Some(reply_to) = &message.reply_to else {
                    return Ok(Some(
                        "Reply to an entry with /delete to remove it.".to_string(),
                    ));
                };
                let outcome = self.delete_by_reference(chat_id, reply_to.message_id.into())?;
                let reply = match outcome {
                    DeleteOutcome::Deleted(EntryKind::Expense) => "✅ Expense deleted.",
                    DeleteOutcome::Deleted(EntryKind::Debt) => "✅ Debt deleted.",
                    DeleteOutcome::NotFound => "Could not find that entry.",
                };
                if outcome != DeleteOutcome::NotFound {
                    self.refresh_logged(chat_id, sink);
                }
                Ok(Some(reply.to_string()))
            }
        }
    }

    fn handle_start_tracking(
        &mut self,
        chat_id: ChatId,
        sink: &mut dyn SummarySink,
    ) -> Result<Option<String>> {
        if self.is_tracked(chat_id)? {
            return Ok(Some(
                "Expenses are already being tracked in this chat.".to_string(),
            ));
        }
        let initial = format!("{}\n\n{}", SUMMARY_TITLE, EMPTY_PLACEHOLDER);
        match sink.post(chat_id, &initial) {
            Ok(message) => {
                self.start_tracking(chat_id, message)?;
                Ok(None)
            }
            Err(e) => {
                log::warn!("chat {}: could not post summary: {}", chat_id, e);
                Ok(Some(
                    "Could not pin the summary message. Make me an administrator.".to_string(),
                ))
            }
        }
    }

    fn handle_expense(
        &mut self,
        message: &IncomingMessage,
        sink: &mut dyn SummarySink,
    ) -> Result<Option<String>> {
        let Some(parsed) = parse_expense(&message.text) else {
            return Ok(None);
        };
        if !self.is_tracked(message.chat_id)? {
            return Ok(None);
        }
        let entry = match self.record_expense(
            message.chat_id,
            message.message_id,
            message.sender.clone(),
            parsed.amount,
            &parsed.description,
        ) {
            Ok(entry) => entry,
            Err(LedgerError::Store(StoreError::DuplicateId { .. })) => {
                log::warn!(
                    "chat {}: message {} already recorded",
                    message.chat_id,
                    message.message_id
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.refresh_logged(message.chat_id, sink);
        Ok(Some(format!(
            "✅ Recorded expense: {} for '{}' from {}.",
            format_amount(entry.amount()),
            entry.description(),
            message.sender.name
        )))
    }

    fn refresh_logged(&mut self, chat_id: ChatId, sink: &mut dyn SummarySink) {
        if let Err(e) = self.refresh(chat_id, sink) {
            log::warn!("chat {}: summary not updated: {}", chat_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::participant::ParticipantId;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct RecordingSink {
        next_id: i64,
        published: Vec<(ChatId, MessageId, String)>,
        fail: bool,
    }

    impl SummarySink for RecordingSink {
        fn post(&mut self, _chat_id: ChatId, _text: &str) -> std::result::Result<MessageId, SinkError> {
            if self.fail {
                return Err(SinkError("not an admin".into()));
            }
            self.next_id += 1;
            Ok(MessageId::new(1000 + self.next_id))
        }

        fn publish(
            &mut self,
            chat_id: ChatId,
            message: MessageId,
            text: &str,
        ) -> std::result::Result<MessageId, SinkError> {
            if self.fail {
                return Err(SinkError("network down".into()));
            }
            self.published.push((chat_id, message, text.to_string()));
            Ok(message)
        }
    }

    const CHAT: ChatId = ChatId::new(-1);

    fn ann() -> Participant {
        Participant::new(1, "Ann")
    }

    fn bob() -> Participant {
        Participant::new(2, "Bob")
    }

    fn msg(id: i64, sender: Participant, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: CHAT,
            message_id: MessageId::new(id),
            sender,
            text: text.to_string(),
            reply_to: None,
        }
    }

    fn reply(id: i64, sender: Participant, text: &str, to: i64, author: Participant) -> IncomingMessage {
        IncomingMessage {
            reply_to: Some(RepliedMessage {
                message_id: MessageId::new(to),
                author,
            }),
            ..msg(id, sender, text)
        }
    }

    fn tracked() -> (Reconciler<MemoryStore>, RecordingSink) {
        let mut reconciler = Reconciler::new(MemoryStore::new());
        let mut sink = RecordingSink::default();
        let out = reconciler
            .handle_message(&msg(1, ann(), "/start_tracking"), &mut sink)
            .unwrap();
        assert!(out.is_none());
        (reconciler, sink)
    }

    #[test]
    fn test_untracked_chat_ignores_expenses() {
        let mut reconciler = Reconciler::new(MemoryStore::new());
        let mut sink = RecordingSink::default();
        let out = reconciler
            .handle_message(&msg(5, ann(), "30 pizza"), &mut sink)
            .unwrap();
        assert!(out.is_none());
        assert!(reconciler.store().list_expenses(CHAT).unwrap().is_empty());
    }

    #[test]
    fn test_start_tracking_twice() {
        let (mut reconciler, mut sink) = tracked();
        let out = reconciler
            .handle_message(&msg(2, ann(), "/start_tracking"), &mut sink)
            .unwrap();
        assert_eq!(
            out.as_deref(),
            Some("Expenses are already being tracked in this chat.")
        );
    }

    #[test]
    fn test_start_tracking_without_pin_rights() {
        let mut reconciler = Reconciler::new(MemoryStore::new());
        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let out = reconciler
            .handle_message(&msg(1, ann(), "/start_tracking"), &mut sink)
            .unwrap();
        assert!(out.unwrap().contains("administrator"));
        assert!(!reconciler.is_tracked(CHAT).unwrap());
    }

    #[test]
    fn test_expense_updates_pinned_summary() {
        let (mut reconciler, mut sink) = tracked();
        let out = reconciler
            .handle_message(&msg(10, ann(), "30 groceries"), &mut sink)
            .unwrap();
        assert_eq!(
            out.as_deref(),
            Some("✅ Recorded expense: 30.00 for 'groceries' from Ann.")
        );
        let (_, message, text) = sink.published.last().unwrap();
        assert_eq!(*message, MessageId::new(1001));
        assert!(text.contains("30.00 (Ann): groceries"));
    }

    #[test]
    fn test_owe_requires_reply() {
        let (mut reconciler, mut sink) = tracked();
        let out = reconciler
            .handle_message(&msg(10, ann(), "/owe 10 lunch"), &mut sink)
            .unwrap();
        assert_eq!(
            out.as_deref(),
            Some("Reply to a message from the person you owe.")
        );
    }

    #[test]
    fn test_owe_records_debt() {
        let (mut reconciler, mut sink) = tracked();
        let out = reconciler
            .handle_message(&reply(11, bob(), "/owe 7,5 taxi", 3, ann()), &mut sink)
            .unwrap();
        assert_eq!(
            out.as_deref(),
            Some("✅ Recorded debt: Bob owes Ann 7.50 (taxi).")
        );
        let debts = reconciler.store().list_debts(CHAT).unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].debtor_id(), ParticipantId::new(2));
        assert!(sink.published.last().unwrap().2.contains("Bob → Ann: 7.50"));
    }

    #[test]
    fn test_owe_self_is_rejected() {
        let (mut reconciler, mut sink) = tracked();
        let out = reconciler
            .handle_message(&reply(11, ann(), "/owe 5", 3, ann()), &mut sink)
            .unwrap();
        assert_eq!(out.as_deref(), Some("You cannot owe yourself."));
        assert!(reconciler.store().list_debts(CHAT).unwrap().is_empty());
    }

    #[test]
    fn test_owe_bad_amount() {
        let (mut reconciler, mut sink) = tracked();
        let out = reconciler
            .handle_message(&reply(11, bob(), "/owe 0 x", 3, ann()), &mut sink)
            .unwrap();
        assert!(out.unwrap().starts_with("Invalid format"));
    }

    #[test]
    fn test_delete_by_reply() {
        let (mut reconciler, mut sink) = tracked();
        reconciler
            .handle_message(&msg(10, ann(), "30 groceries"), &mut sink)
            .unwrap();
        let published = sink.published.len();

        let out = reconciler
            .handle_message(&reply(12, bob(), "/delete", 10, ann()), &mut sink)
            .unwrap();
        assert_eq!(out.as_deref(), Some("✅ Expense deleted."));
        assert_eq!(sink.published.len(), published + 1);
        assert!(sink.published.last().unwrap().2.contains(EMPTY_PLACEHOLDER));

        let out = reconciler
            .handle_message(&reply(13, bob(), "/delete", 10, ann()), &mut sink)
            .unwrap();
        assert_eq!(out.as_deref(), Some("Could not find that entry."));
        assert_eq!(sink.published.len(), published + 1);
    }

    #[test]
    fn test_duplicate_message_is_ignored() {
        let (mut reconciler, mut sink) = tracked();
        reconciler
            .handle_message(&msg(10, ann(), "30 groceries"), &mut sink)
            .unwrap();
        let out = reconciler
            .handle_message(&msg(10, ann(), "30 groceries"), &mut sink)
            .unwrap();
        assert!(out.is_none());
        assert_eq!(reconciler.store().list_expenses(CHAT).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_owe_is_ignored() {
        let (mut reconciler, mut sink) = tracked();
        let owe = reply(5, bob(), "/owe 10 taxi", 3, ann());
        assert!(reconciler.handle_message(&owe, &mut sink).unwrap().is_some());

        let out = reconciler.handle_message(&owe, &mut sink).unwrap();
        assert!(out.is_none());
        assert_eq!(reconciler.store().list_debts(CHAT).unwrap().len(), 1);
    }

    #[test]
    fn test_rejected_duplicate_keeps_names() {
        let (mut reconciler, mut sink) = tracked();
        reconciler
            .handle_message(&msg(10, ann(), "30 groceries"), &mut sink)
            .unwrap();
        let renamed = Participant::new(1, "Annie");
        reconciler
            .handle_message(&msg(10, renamed, "30 groceries"), &mut sink)
            .unwrap();
        assert_eq!(
            reconciler
                .store()
                .participant_name(ParticipantId::new(1))
                .unwrap()
                .as_deref(),
            Some("Ann")
        );
    }

    #[test]
    fn test_owe_bad_amount_without_reply_asks_for_reply() {
        let (mut reconciler, mut sink) = tracked();
        let out = reconciler
            .handle_message(&msg(10, bob(), "/owe lots"), &mut sink)
            .unwrap();
        assert_eq!(out.as_deref(), Some(OWE_NEEDS_REPLY));
    }

    #[test]
    fn test_largest_amounts_keep_summary_working() {
        let (mut reconciler, mut sink) = tracked();
        for id in [10, 11] {
            let out = reconciler
                .handle_message(&msg(id, ann(), "1000000000000 yacht"), &mut sink)
                .unwrap();
            assert!(out.is_some());
        }
        for id in [12, 13] {
            let out = reconciler
                .handle_message(
                    &msg(id, bob(), "50000000000000000000000000000 yacht"),
                    &mut sink,
                )
                .unwrap();
            assert!(out.is_none());
        }

        assert_eq!(reconciler.store().list_expenses(CHAT).unwrap().len(), 2);
        let text = reconciler.summary(CHAT).unwrap();
        assert!(text.contains("Total spent: 2000000000000.00"));
        assert!(sink.published.last().unwrap().2.contains("Ann: 2000000000000.00"));
    }

    #[test]
    fn test_sink_failure_keeps_entry() {
        let (mut reconciler, mut sink) = tracked();
        sink.fail = true;
        let out = reconciler
            .handle_message(&msg(10, ann(), "12 bread"), &mut sink)
            .unwrap();
        assert!(out.is_some());
        assert_eq!(reconciler.store().list_expenses(CHAT).unwrap().len(), 1);
    }

    #[test]
    fn test_refresh_records_reposted_message() {
        struct Reposting;
        impl SummarySink for Reposting {
            fn post(&mut self, _: ChatId, _: &str) -> std::result::Result<MessageId, SinkError> {
                Ok(MessageId::new(1))
            }
            fn publish(
                &mut self,
                _: ChatId,
                _: MessageId,
                _: &str,
            ) -> std::result::Result<MessageId, SinkError> {
                Ok(MessageId::new(77))
            }
        }

        let mut reconciler = Reconciler::new(MemoryStore::new());
        reconciler.start_tracking(CHAT, MessageId::new(1)).unwrap();
        reconciler.refresh(CHAT, &mut Reposting).unwrap();
        assert_eq!(
            reconciler.store().chat(CHAT).unwrap().unwrap().summary_message,
            MessageId::new(77)
        );
    }

    #[test]
    fn test_record_expense_validates() {
        let mut reconciler = Reconciler::new(MemoryStore::new());
        let err = reconciler
            .record_expense(CHAT, MessageId::new(1), ann(), dec!(-1), "oops")
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::NonPositiveAmount(_))
        ));
        assert!(reconciler.store().list_expenses(CHAT).unwrap().is_empty());
    }
}
