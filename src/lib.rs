//! # group-ledger
//!
//! Shared expense and debt reconciliation for chat groups.
//!
//! Members of a chat record what they spent for the group and what they
//! owe each other. After every change the engine recomputes each member's
//! deviation from the equal split, nets in the private debts, and plans a
//! short list of transfers that settles everyone. The result is rendered
//! as the text of one pinned summary message.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: participants, entries, amounts, balances
//! - **store** — Entry store contract with in-memory and JSON file backends
//! - **reconcile** — Ledger aggregation, settlement planning, summary rendering
//! - **command** — Recognition of bot commands and expense messages
//! - **service** — Per-chat orchestration around the store and the gateway
//! - **simulation** — Random chat generation for benchmarks

pub mod command;
pub mod config;
pub mod core;
pub mod error;
pub mod reconcile;
pub mod service;
pub mod simulation;
pub mod store;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::entry::{DebtEntry, EntryId, ExpenseEntry};
    pub use crate::core::ledger::Balances;
    pub use crate::core::participant::{ChatId, MessageId, Participant, ParticipantId};
    pub use crate::error::LedgerError;
    pub use crate::reconcile::aggregate::{ChatLedgerView, LedgerAggregator};
    pub use crate::reconcile::reconcile;
    pub use crate::reconcile::settlement::{SettlementPlan, SettlementPlanner, Transfer};
    pub use crate::reconcile::summary::{ParticipantNames, SummaryRenderer};
    pub use crate::service::{Reconciler, SummarySink};
    pub use crate::store::{DeleteOutcome, EntryStore, MemoryStore};
}
