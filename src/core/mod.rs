//! Foundational types: participants, entries, amounts and balances.

pub mod amount;
pub mod entry;
pub mod ledger;
pub mod participant;
