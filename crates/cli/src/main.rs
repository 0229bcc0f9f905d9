use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use replybot_classifier::{ClassifierConfig, HttpIntentClassifier, DEFAULT_CLASSIFIER_URL};
use replybot_core::{ReplyRecord, UnmatchedIntentPolicy};
use replybot_observability::init_cli_tracing;
use replybot_resolver::ReplyResolver;
use replybot_storage::{load_seed_file, seed_replies, ReplyRepository, Store};

#[derive(Debug, Parser)]
#[command(name = "replybot")]
#[command(about = "Reply bot operator CLI")]
struct Cli {
    /// SQLite URL; replies live only for this process when unset.
    #[arg(long, env = "REPLYBOT_DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "REPLYBOT_CLASSIFIER_URL", default_value = DEFAULT_CLASSIFIER_URL)]
    classifier_url: String,

    /// Falls back to `API_KEY` when unset.
    #[arg(long, env = "REPLYBOT_CLASSIFIER_API_KEY", hide_env_values = true)]
    classifier_api_key: Option<String>,

    #[arg(long, env = "REPLYBOT_CLASSIFIER_CONNECT_TIMEOUT_SECONDS", default_value_t = 6)]
    classifier_connect_timeout_seconds: u64,

    #[arg(long, env = "REPLYBOT_CLASSIFIER_TIMEOUT_SECONDS", default_value_t = 20)]
    classifier_timeout_seconds: u64,

    /// Store an empty placeholder for confident intents that have no reply.
    #[arg(long, env = "REPLYBOT_SEED_UNMATCHED_INTENTS")]
    seed_unmatched: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Resolve {
        #[arg(long)]
        bot_id: String,
        message: String,
    },
    Chat {
        #[arg(long)]
        bot_id: String,
    },
    Seed {
        file: PathBuf,
    },
    Replies {
        #[command(subcommand)]
        command: RepliesCommand,
    },
}

#[derive(Debug, Subcommand)]
enum RepliesCommand {
    List,
    Add {
        #[arg(long)]
        intent: String,
        #[arg(long)]
        reply: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_cli_tracing("replybot_cli");
    let cli = Cli::parse();

    let store = Store::from_database_url(cli.database_url.as_deref()).await?;

    match cli.command {
        Command::Resolve {
            ref bot_id,
            ref message,
        } => {
            let resolver = build_resolver(&cli, store)?;
            let result = resolver.resolve(bot_id, message).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Chat { ref bot_id } => {
            let resolver = build_resolver(&cli, store)?;
            run_chat(&resolver, bot_id).await?;
        }
        Command::Seed { ref file } => {
            let records = load_seed_file(file)?;
            let total = records.len();
            let inserted = seed_replies(&store, records).await?;
            println!("seeded {inserted} of {total} replies from {}", file.display());
        }
        Command::Replies { ref command } => match command {
            RepliesCommand::List => {
                let replies = store.list_replies().await?;
                println!("{}", serde_json::to_string_pretty(&replies)?);
            }
            RepliesCommand::Add { intent, reply } => {
                anyhow::ensure!(!intent.trim().is_empty(), "--intent must not be empty");
                anyhow::ensure!(!reply.trim().is_empty(), "--reply must not be empty");
                store
                    .upsert_reply(ReplyRecord::new(intent.clone(), reply.clone()))
                    .await?;
                println!("stored reply for intent {intent}");
            }
        },
    }

    Ok(())
}

fn classifier_config(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> ClassifierConfig {
    let api_key = cli
        .classifier_api_key
        .clone()
        .or_else(|| lookup("API_KEY"))
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());

    ClassifierConfig {
        base_url: cli.classifier_url.clone(),
        api_key,
        connect_timeout: Duration::from_secs(cli.classifier_connect_timeout_seconds),
        timeout: Duration::from_secs(cli.classifier_timeout_seconds),
    }
}

fn build_resolver(cli: &Cli, store: Store) -> Result<ReplyResolver<HttpIntentClassifier, Store>> {
    let config = classifier_config(cli, |key| std::env::var(key).ok());
    let classifier =
        HttpIntentClassifier::new(config).context("failed creating intent classifier client")?;

    Ok(
        ReplyResolver::new(Arc::new(classifier), Arc::new(store))
            .with_unmatched_policy(UnmatchedIntentPolicy::from_flag(cli.seed_unmatched)),
    )
}

async fn run_chat(resolver: &ReplyResolver<HttpIntentClassifier, Store>, bot_id: &str) -> Result<()> {
    println!("Reply bot chat mode for {bot_id}. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        match resolver.resolve_detailed(bot_id, message).await {
            Ok(resolution) => {
                println!("\n{}", resolution.result.reply);
                if let Some(intent) = resolution.outcome.intent() {
                    println!("  [{}: {intent}]", resolution.outcome.label());
                } else {
                    println!("  [{}]", resolution.outcome.label());
                }
                println!();
            }
            Err(err) => eprintln!("resolution failed: {err}"),
        }
    }

    Ok(())
}
