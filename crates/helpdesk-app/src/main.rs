//! Helpdesk application binary - composition root.
//!
//! Ties together all Helpdesk crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Initialize storage (SQLite) and seed the knowledge base if empty
//! 3. Select the completion provider (Gemini when an API key is configured,
//!    the deterministic offline provider otherwise)
//! 4. Wire the conversation orchestrator
//! 5. Run an interactive console session standing in for the HTTP/UI layer

mod cli;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use helpdesk_action::{ActionPayload, LogNotifier, Notifier};
use helpdesk_chat::{ActionTaken, ChatOrchestrator};
use helpdesk_completion::{CompletionProvider, GeminiClient, OfflineProvider};
use helpdesk_core::config::HelpdeskConfig;
use helpdesk_core::types::ActionKind;
use helpdesk_storage::{ConversationRepository, Database, DocumentRepository};

use cli::CliArgs;

/// Expand ~ to the home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if let Some(rest) = data_dir.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(data_dir)
    }
}

/// Seed a small FAQ document so retrieval works out of the box.
fn seed_knowledge_base(documents: &DocumentRepository) -> Result<(), helpdesk_core::HelpdeskError> {
    if !documents.list()?.is_empty() {
        return Ok(());
    }

    documents.save(
        "product-faq.md",
        &[
            "Warranty: every product ships with a 12-month warranty covering \
             manufacturing defects. The warranty does not cover accidental damage.",
            "Returns: products can be returned within 30 days of delivery for a \
             full refund. A return authorization (RMA) number is required; keep \
             the original packaging.",
            "Shipping: standard shipping takes 3-5 business days. Orders over \
             $50 ship free. Tracking numbers are emailed on dispatch.",
            "Support hours: the human support team is available Monday to Friday, \
             9am to 6pm. Callback requests outside these hours are scheduled for \
             the next business day.",
        ],
    )?;
    tracing::info!("Seeded knowledge base with product-faq.md");
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  :ticket <low|medium|high> <summary...>   create a support ticket");
    println!("  :return <order_id> <product> <reason...> start a product return");
    println!("  :call <phone> [preferred time...]        request a callback");
    println!("  :quit                                    end the session");
    println!("Anything else is sent to the assistant.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = HelpdeskConfig::load_or_default(&config_file);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.general.log_level.clone())),
        )
        .init();

    tracing::info!("Starting Helpdesk v{}", env!("CARGO_PKG_VERSION"));

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    let db_path = data_dir.join("helpdesk.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let documents = DocumentRepository::new(Arc::clone(&db));
    seed_knowledge_base(&documents)?;

    // Completion provider: live client when a key is configured, offline
    // deterministic provider otherwise.
    let provider: Arc<dyn CompletionProvider> = match GeminiClient::new(&config.completion) {
        Ok(client) => {
            tracing::info!(model = %config.completion.model, "Using Gemini completion provider");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to the offline completion provider");
            Arc::new(OfflineProvider::new())
        }
    };

    let notifier: Arc<dyn Notifier> = if config.notify.enabled {
        Arc::new(LogNotifier::with_recipient(config.notify.support_email.clone()))
    } else {
        Arc::new(LogNotifier::new())
    };
    let orchestrator = ChatOrchestrator::new(Arc::clone(&db), provider, notifier, &config);

    // Conversation bootstrap: created on first customer contact.
    let conversations = ConversationRepository::new(db);
    let conversation = conversations.create(
        &args.customer_name,
        args.customer_email.as_deref(),
        &args.language,
    )?;
    tracing::info!(conversation_id = %conversation.id, "Conversation started");

    println!("Helpdesk console session for {} (:help for commands)", args.customer_name);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Action(kind, payload) => {
                match orchestrator
                    .execute_action(conversation.id, kind, &payload)
                    .await
                {
                    Ok(outcome) => println!("{}", outcome.confirmation),
                    Err(e) => println!("Could not complete that: {}", e),
                }
            }
            Command::Message(text) => {
                match orchestrator
                    .handle_customer_message(conversation.id, text, None)
                    .await
                {
                    Ok(reply) => {
                        println!("{}", reply.reply_text);
                        if !reply.sources.is_empty() {
                            println!("  (sources: {})", reply.sources.join(", "));
                        }
                        if let Some(ActionTaken::Proposed { intent }) = reply.action_taken {
                            println!(
                                "  (detected a {} request — use the matching command to confirm)",
                                intent.intent
                            );
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

enum Command<'a> {
    Message(&'a str),
    Action(ActionKind, ActionPayload),
    Help,
    Quit,
}

/// Parse a console line into a command or a plain customer message.
fn parse_command(line: &str) -> Command<'_> {
    if !line.starts_with(':') {
        return Command::Message(line);
    }

    let mut parts = line.split_whitespace();
    match parts.next() {
        Some(":quit") | Some(":q") => Command::Quit,
        Some(":help") => Command::Help,
        Some(":ticket") => {
            let priority = parts.next().unwrap_or("");
            let summary = parts.collect::<Vec<_>>().join(" ");
            Command::Action(
                ActionKind::CreateTicket,
                ActionPayload::new(serde_json::json!({
                    "summary": summary,
                    "priority": priority,
                })),
            )
        }
        Some(":return") => {
            let order_id = parts.next().unwrap_or("");
            let product = parts.next().unwrap_or("");
            let reason = parts.collect::<Vec<_>>().join(" ");
            Command::Action(
                ActionKind::ReturnProduct,
                ActionPayload::new(serde_json::json!({
                    "order_id": order_id,
                    "product": product,
                    "reason": reason,
                })),
            )
        }
        Some(":call") => {
            let phone_number = parts.next().unwrap_or("");
            let preferred_time = parts.collect::<Vec<_>>().join(" ");
            Command::Action(
                ActionKind::RequestCall,
                ActionPayload::new(serde_json::json!({
                    "phone_number": phone_number,
                    "preferred_time": preferred_time,
                    "reason": "",
                })),
            )
        }
        _ => Command::Message(line),
    }
}
