//! Recognition of chat text: bot commands and free-form expense messages.

use crate::core::amount::{validate_amount, parse_amount};
use crate::core::entry::{ValidationError, DEFAULT_REASON};
use rust_decimal::Decimal;

/// A bot command addressed to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Ping,
    GetChatId,
    StartTracking,
    /// `/owe <amount> [reason]`; the debtor is the sender, the creditor the
    /// author of the replied-to message.
    Owe { amount: Decimal, reason: String },
    /// `/delete`, sent as a reply to the entry to remove.
    Delete,
}

/// An expense typed as `"<amount> <description>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpense {
    pub amount: Decimal,
    pub description: String,
}

/// Parse a command message.
///
/// Returns `None` when `text` is not a command this bot handles. A known
/// command with bad arguments yields `Some(Err(_))`. A `@botname` suffix on
/// the command is ignored.
///
/// # Examples
///
/// ```
/// use group_ledger::command::{parse_command, Command};
/// use rust_decimal_macros::dec;
///
/// let cmd = parse_command("/owe 12,5 taxi home").unwrap().unwrap();
/// assert_eq!(cmd, Command::Owe { amount: dec!(12.5), reason: "taxi home".into() });
/// assert!(parse_command("hello").is_none());
/// ```
pub fn parse_command(text: &str) -> Option<Result<Command, ValidationError>> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head);

    let command = match name {
        "start" => Command::Start,
        "ping" => Command::Ping,
        "getchatid" => Command::GetChatId,
        "start_tracking" => Command::StartTracking,
        "delete" => Command::Delete,
        "owe" => return Some(parse_owe_args(args)),
        _ => return None,
    };
    Some(Ok(command))
}

fn parse_owe_args(args: &str) -> Result<Command, ValidationError> {
    let (raw_amount, reason) = match args.split_once(char::is_whitespace) {
        Some((amount, reason)) => (amount, reason.trim()),
        None => (args, ""),
    };
    let amount = validate_amount(parse_amount(raw_amount)?)?;
    let reason = if reason.is_empty() {
        DEFAULT_REASON.to_string()
    } else {
        reason.to_string()
    };
    Ok(Command::Owe { amount, reason })
}

/// Recognise an expense message.
///
/// The first whitespace-separated token must be a valid amount and a
/// description must follow. Anything else is ordinary chat and yields
/// `None`.
pub fn parse_expense(text: &str) -> Option<ParsedExpense> {
    let text = text.trim();
    if text.starts_with('/') {
        return None;
    }
    let (raw_amount, description) = text.split_once(char::is_whitespace)?;
    let description = description.trim();
    if description.is_empty() {
        return None;
    }
    let amount = validate_amount(parse_amount(raw_amount).ok()?).ok()?;
    Some(ParsedExpense {
        amount,
        description: description.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("/start"), Some(Ok(Command::Start)));
        assert_eq!(parse_command("/ping"), Some(Ok(Command::Ping)));
        assert_eq!(parse_command("/getchatid"), Some(Ok(Command::GetChatId)));
        assert_eq!(
            parse_command("/start_tracking@ledger_bot"),
            Some(Ok(Command::StartTracking))
        );
        assert_eq!(parse_command("/delete"), Some(Ok(Command::Delete)));
        assert_eq!(parse_command("/unknown"), None);
    }

    #[test]
    fn test_owe_defaults_reason() {
        assert_eq!(
            parse_command("/owe 10"),
            Some(Ok(Command::Owe {
                amount: dec!(10),
                reason: DEFAULT_REASON.to_string()
            }))
        );
    }

    #[test]
    fn test_owe_rejects_bad_amounts() {
        assert!(matches!(
            parse_command("/owe"),
            Some(Err(ValidationError::MalformedAmount(_)))
        ));
        assert!(matches!(
            parse_command("/owe ten lunch"),
            Some(Err(ValidationError::MalformedAmount(_)))
        ));
        assert!(matches!(
            parse_command("/owe -5 lunch"),
            Some(Err(ValidationError::NonPositiveAmount(_)))
        ));
        assert!(matches!(
            parse_command("/owe 50000000000000000000000000000 yacht"),
            Some(Err(ValidationError::AmountTooLarge(_)))
        ));
    }

    #[test]
    fn test_expense_messages() {
        assert_eq!(
            parse_expense("25,40 fuel and snacks"),
            Some(ParsedExpense {
                amount: dec!(25.40),
                description: "fuel and snacks".to_string()
            })
        );
        assert_eq!(parse_expense("25"), None);
        assert_eq!(parse_expense("hello there"), None);
        assert_eq!(parse_expense("0 nothing"), None);
        assert_eq!(parse_expense("-3 refund"), None);
        assert_eq!(parse_expense("/owe 3 x"), None);
        assert_eq!(parse_expense("50000000000000000000000000000 yacht"), None);
    }
}
