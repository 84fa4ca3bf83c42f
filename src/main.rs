//! group-ledger CLI
//!
//! Drive the reconciliation engine against the configured entry store.
//!
//! # Usage
//!
//! ```bash
//! # Start tracking a chat, then record entries
//! group-ledger track --chat -100
//! group-ledger expense --chat -100 --message 10 --payer 1 --name Ann --amount 30 --description groceries
//! group-ledger owe --chat -100 --message 11 --debtor 2 --debtor-name Bob --creditor 1 --creditor-name Ann --amount 5
//!
//! # Show the summary
//! group-ledger summary --chat -100
//!
//! # Plan settlement for a standalone entries file
//! group-ledger plan --input entries.json --format json
//! ```

use group_ledger::config::EngineConfig;
use group_ledger::core::amount::{format_amount, parse_amount};
use group_ledger::core::entry::{DebtEntry, EntryId, ExpenseEntry};
use group_ledger::core::participant::{ChatId, MessageId, Participant, ParticipantId};
use group_ledger::error::SinkError;
use group_ledger::reconcile::reconcile;
use group_ledger::reconcile::summary::{truncate_for_channel, ParticipantNames, SummaryRenderer};
use group_ledger::service::{Reconciler, SummarySink};
use group_ledger::simulation::generator::{generate_random_chat, ChatConfig};
use group_ledger::store::{open_store, DeleteOutcome, EntryStore};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::process;

fn print_usage() {
    eprintln!(
        r#"group-ledger — shared expense and debt reconciliation

USAGE:
    group-ledger [--config <FILE>] <COMMAND> [OPTIONS]

COMMANDS:
    track       Start tracking a chat
    expense     Record an expense
    owe         Record a debt between two participants
    delete      Delete an entry by the id of its message
    summary     Print the current summary of a chat
    plan        Reconcile a standalone entries file
    generate    Generate a random entries file (for testing)
    help        Show this message

OPTIONS (track):
    --chat <ID>             Chat id
    --message <ID>          Id of the pinned summary message (default: 1)

OPTIONS (expense):
    --chat <ID> --message <ID> --payer <ID> --name <NAME>
    --amount <AMOUNT> --description <TEXT>

OPTIONS (owe):
    --chat <ID> --message <ID>
    --debtor <ID> --debtor-name <NAME> --creditor <ID> --creditor-name <NAME>
    --amount <AMOUNT> [--reason <TEXT>]

OPTIONS (delete):
    --chat <ID> --entry <ID>

OPTIONS (summary):
    --chat <ID>

OPTIONS (plan):
    --input <FILE>          Path to JSON entries file
    --format <FORMAT>       Output format: text (default) or json

OPTIONS (generate):
    --participants <N>      Number of participants (default: 5)
    --expenses <N>          Number of expenses (default: 20)
    --debts <N>             Number of debts (default: 5)
    --output <FILE>         Write to file instead of stdout

ENVIRONMENT:
    LEDGER_STORE, LEDGER_DATA_PATH, LEDGER_CURRENCY, LEDGER_MESSAGE_LIMIT,
    LEDGER_LOG_LEVEL, RUST_LOG"#
    );
}

/// JSON schema for standalone entries files.
#[derive(serde::Deserialize, serde::Serialize, Default)]
struct EntriesFile {
    #[serde(default)]
    names: BTreeMap<i64, String>,
    #[serde(default)]
    expenses: Vec<ExpenseInput>,
    #[serde(default)]
    debts: Vec<DebtInput>,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct ExpenseInput {
    payer: i64,
    amount: String,
    #[serde(default = "default_description")]
    description: String,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct DebtInput {
    from: i64,
    to: i64,
    amount: String,
    #[serde(default)]
    reason: String,
}

fn default_description() -> String {
    "Expense".to_string()
}

/// JSON output schema for `plan`.
#[derive(serde::Serialize)]
struct PlanOutput {
    total_spent: String,
    average_spent: String,
    balances: Vec<BalanceOutput>,
    transfers: Vec<TransferOutput>,
}

#[derive(serde::Serialize)]
struct BalanceOutput {
    participant: i64,
    name: String,
    balance: String,
    status: String,
}

#[derive(serde::Serialize)]
struct TransferOutput {
    from: String,
    to: String,
    amount: String,
}

/// Sink that prints the summary instead of editing a chat message.
struct StdoutSink {
    limit: usize,
}

impl SummarySink for StdoutSink {
    fn post(&mut self, _chat_id: ChatId, text: &str) -> Result<MessageId, SinkError> {
        println!("{}", truncate_for_channel(text, self.limit));
        Ok(MessageId::new(1))
    }

    fn publish(
        &mut self,
        _chat_id: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<MessageId, SinkError> {
        println!("{}", truncate_for_channel(text, self.limit));
        Ok(message)
    }
}

fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Parse `--key value` pairs.
fn parse_options(args: &[String]) -> HashMap<String, String> {
    let mut options = HashMap::new();
    let mut i = 0;
    while i < args.len() {
        let Some(key) = args[i].strip_prefix("--") else {
            fail(format!("Unknown option: {}", args[i]));
        };
        i += 1;
        let value = args
            .get(i)
            .cloned()
            .unwrap_or_else(|| fail(format!("--{} requires a value", key)));
        options.insert(key.to_string(), value);
        i += 1;
    }
    options
}

fn required<'a>(options: &'a HashMap<String, String>, key: &str) -> &'a str {
    options
        .get(key)
        .map(String::as_str)
        .unwrap_or_else(|| fail(format!("--{} is required", key)))
}

fn required_id(options: &HashMap<String, String>, key: &str) -> i64 {
    let raw = required(options, key);
    raw.parse()
        .unwrap_or_else(|_| fail(format!("--{} must be an integer, got '{}'", key, raw)))
}

fn required_amount(options: &HashMap<String, String>) -> Decimal {
    parse_amount(required(options, "amount")).unwrap_or_else(|e| fail(e))
}

fn open_reconciler(config: &EngineConfig) -> Reconciler<Box<dyn EntryStore>> {
    let store = open_store(config).unwrap_or_else(|e| fail(e));
    Reconciler::with_config(store, config)
}

fn cmd_track(config: &EngineConfig, args: &[String]) {
    let options = parse_options(args);
    let chat = ChatId::new(required_id(&options, "chat"));
    let message: i64 = options
        .get("message")
        .map(|m| m.parse().unwrap_or_else(|_| fail("--message must be an integer")))
        .unwrap_or(1);

    let mut reconciler = open_reconciler(config);
    reconciler
        .start_tracking(chat, MessageId::new(message))
        .unwrap_or_else(|e| fail(e));
    eprintln!("Tracking chat {} (summary message {})", chat, message);
}

fn cmd_expense(config: &EngineConfig, args: &[String]) {
    let options = parse_options(args);
    let chat = ChatId::new(required_id(&options, "chat"));
    let message = MessageId::new(required_id(&options, "message"));
    let payer = Participant::new(required_id(&options, "payer"), required(&options, "name"));
    let amount = required_amount(&options);
    let description = required(&options, "description");

    let mut reconciler = open_reconciler(config);
    let entry = reconciler
        .record_expense(chat, message, payer, amount, description)
        .unwrap_or_else(|e| fail(e));
    eprintln!(
        "Recorded expense {}: {} for '{}'",
        entry.entry_id(),
        format_amount(entry.amount()),
        entry.description()
    );
    refresh(config, &mut reconciler, chat);
}

fn cmd_owe(config: &EngineConfig, args: &[String]) {
    let options = parse_options(args);
    let chat = ChatId::new(required_id(&options, "chat"));
    let message = MessageId::new(required_id(&options, "message"));
    let debtor = Participant::new(required_id(&options, "debtor"), required(&options, "debtor-name"));
    let creditor = Participant::new(
        required_id(&options, "creditor"),
        required(&options, "creditor-name"),
    );
    let amount = required_amount(&options);
    let reason = options.get("reason").map(String::as_str).unwrap_or("");

    let mut reconciler = open_reconciler(config);
    let entry = reconciler
        .record_debt(chat, message, debtor, creditor, amount, reason)
        .unwrap_or_else(|e| fail(e));
    eprintln!(
        "Recorded debt {}: {} ({})",
        entry.entry_id(),
        format_amount(entry.amount()),
        entry.reason()
    );
    refresh(config, &mut reconciler, chat);
}

fn cmd_delete(config: &EngineConfig, args: &[String]) {
    let options = parse_options(args);
    let chat = ChatId::new(required_id(&options, "chat"));
    let entry = EntryId::new(required_id(&options, "entry"));

    let mut reconciler = open_reconciler(config);
    match reconciler
        .delete_by_reference(chat, entry)
        .unwrap_or_else(|e| fail(e))
    {
        DeleteOutcome::Deleted(kind) => {
            eprintln!("Deleted {} {}", kind, entry);
            refresh(config, &mut reconciler, chat);
        }
        DeleteOutcome::NotFound => {
            eprintln!("No entry {} in chat {}", entry, chat);
            process::exit(2);
        }
    }
}

fn cmd_summary(config: &EngineConfig, args: &[String]) {
    let options = parse_options(args);
    let chat = ChatId::new(required_id(&options, "chat"));
    let reconciler = open_reconciler(config);
    let text = reconciler.summary(chat).unwrap_or_else(|e| fail(e));
    println!("{}", truncate_for_channel(&text, config.message_limit));
}

fn refresh(config: &EngineConfig, reconciler: &mut Reconciler<Box<dyn EntryStore>>, chat: ChatId) {
    let mut sink = StdoutSink {
        limit: config.message_limit,
    };
    if let Err(e) = reconciler.refresh(chat, &mut sink) {
        eprintln!("Warning: summary not refreshed: {}", e);
    }
}

fn load_entries(path: &str) -> (ParticipantNames, Vec<ExpenseEntry>, Vec<DebtEntry>) {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));

    let file: EntriesFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "names": {{ "1": "Ann", "2": "Bob" }},
  "expenses": [ {{ "payer": 1, "amount": "30", "description": "groceries" }} ],
  "debts": [ {{ "from": 2, "to": 1, "amount": "5", "reason": "coffee" }} ]
}}"#
        );
        process::exit(1);
    });

    let chat = ChatId::new(0);
    let mut seq: i64 = 0;
    let mut next_id = || {
        seq += 1;
        seq
    };

    let mut expenses = Vec::new();
    for input in &file.expenses {
        let id = next_id();
        let amount = parse_amount(&input.amount).unwrap_or_else(|e| fail(e));
        let entry = ExpenseEntry::new(
            EntryId::new(id),
            chat,
            ParticipantId::new(input.payer),
            amount,
            input.description.as_str(),
        )
        .unwrap_or_else(|e| fail(e));
        expenses.push(entry.with_sequence(id as u64));
    }

    let mut debts = Vec::new();
    for input in &file.debts {
        let id = next_id();
        let amount = parse_amount(&input.amount).unwrap_or_else(|e| fail(e));
        let entry = DebtEntry::new(
            EntryId::new(id),
            chat,
            ParticipantId::new(input.from),
            ParticipantId::new(input.to),
            amount,
            input.reason.as_str(),
        )
        .unwrap_or_else(|e| fail(e));
        debts.push(entry.with_sequence(id as u64));
    }

    let names = file
        .names
        .into_iter()
        .map(|(id, name)| (ParticipantId::new(id), name))
        .collect();
    (names, expenses, debts)
}

fn cmd_plan(config: &EngineConfig, args: &[String]) {
    let options = parse_options(args);
    let path = required(&options, "input");
    let format = options.get("format").map(String::as_str).unwrap_or("text");

    let (names, expenses, debts) = load_entries(path);
    let (view, plan) = reconcile(&expenses, &debts);

    match format {
        "json" => {
            let output = PlanOutput {
                total_spent: format_amount(view.total_spent()),
                average_spent: format_amount(view.average_spent()),
                balances: plan
                    .final_balances()
                    .iter()
                    .map(|(participant, balance)| BalanceOutput {
                        participant: participant.get(),
                        name: names.name(participant).to_string(),
                        balance: format_amount(*balance),
                        status: if *balance > Decimal::ZERO {
                            "CREDITOR".to_string()
                        } else if *balance < Decimal::ZERO {
                            "DEBTOR".to_string()
                        } else {
                            "SETTLED".to_string()
                        },
                    })
                    .collect(),
                transfers: plan
                    .transfers()
                    .iter()
                    .map(|t| TransferOutput {
                        from: names.name(&t.from).to_string(),
                        to: names.name(&t.to).to_string(),
                        amount: format_amount(t.amount),
                    })
                    .collect(),
            };
            let json = serde_json::to_string_pretty(&output).unwrap_or_else(|e| fail(e));
            println!("{}", json);
        }
        "text" => {
            let text = SummaryRenderer::new(&names)
                .with_currency_label(&config.currency_label)
                .render(&view, &plan);
            println!("{}", truncate_for_channel(&text, config.message_limit));
        }
        other => fail(format!("--format must be 'text' or 'json', got '{}'", other)),
    }
}

fn cmd_generate(args: &[String]) {
    let options = parse_options(args);
    let count = |key: &str, default: usize| -> usize {
        options
            .get(key)
            .map(|v| {
                v.parse()
                    .unwrap_or_else(|_| fail(format!("--{} requires a number", key)))
            })
            .unwrap_or(default)
    };

    let config = ChatConfig {
        participant_count: count("participants", 5),
        expense_count: count("expenses", 20),
        debt_count: count("debts", 5),
        ..Default::default()
    };
    let chat = generate_random_chat(&config);

    let output = EntriesFile {
        names: chat
            .participants
            .iter()
            .map(|p| (p.id.get(), p.name.clone()))
            .collect(),
        expenses: chat
            .expenses
            .iter()
            .map(|e| ExpenseInput {
                payer: e.payer_id().get(),
                amount: e.amount().to_string(),
                description: e.description().to_string(),
            })
            .collect(),
        debts: chat
            .debts
            .iter()
            .map(|d| DebtInput {
                from: d.debtor_id().get(),
                to: d.creditor_id().get(),
                amount: d.amount().to_string(),
                reason: d.reason().to_string(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&output).unwrap_or_else(|e| fail(e));
    match options.get("output") {
        Some(path) => {
            fs::write(path, &json)
                .unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
            eprintln!(
                "Generated {} expenses and {} debts across {} participants → {}",
                chat.expenses.len(),
                chat.debts.len(),
                chat.participants.len(),
                path
            );
        }
        None => println!("{}", json),
    }
}

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let mut config_path: Option<PathBuf> = None;
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        if pos + 1 >= args.len() {
            fail("--config requires a file path");
        }
        config_path = Some(PathBuf::from(args.remove(pos + 1)));
        args.remove(pos);
    }

    let config = EngineConfig::load(config_path.as_deref()).unwrap_or_else(|e| fail(e));
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    if args.is_empty() {
        print_usage();
        process::exit(1);
    }

    let command = args[0].as_str();
    let rest = &args[1..];

    match command {
        "track" => cmd_track(&config, rest),
        "expense" => cmd_expense(&config, rest),
        "owe" => cmd_owe(&config, rest),
        "delete" => cmd_delete(&config, rest),
        "summary" => cmd_summary(&config, rest),
        "plan" => cmd_plan(&config, rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
