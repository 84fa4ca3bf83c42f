use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a chat member taking part in the ledger.
///
/// The id is opaque to the engine: it comes from the messaging platform
/// and never changes, while the display name attached to it may.
///
/// # Examples
///
/// ```
/// use group_ledger::core::participant::ParticipantId;
///
/// let alice = ParticipantId::new(1001);
/// let bob = ParticipantId::new(1002);
/// assert_ne!(alice, bob);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(i64);

impl ParticipantId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ParticipantId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Identifier of a chat group. Every chat keeps an independent ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(i64);

impl ChatId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Identifier of a message inside a chat (the pinned summary, or the
/// command message an entry was created from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat member as last observed: id plus current display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(id),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_equality() {
        let a = ParticipantId::new(7);
        let b = ParticipantId::new(7);
        let c = ParticipantId::new(8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_participant_display() {
        assert_eq!(format!("{}", ParticipantId::new(42)), "42");
        assert_eq!(format!("{}", ChatId::new(-100123)), "-100123");
    }

    #[test]
    fn test_participant_serializes_transparently() {
        let json = serde_json::to_string(&ParticipantId::new(5)).unwrap();
        assert_eq!(json, "5");
        let p: Participant = serde_json::from_str(r#"{"id":5,"name":"Ann"}"#).unwrap();
        assert_eq!(p, Participant::new(5, "Ann"));
    }
}
