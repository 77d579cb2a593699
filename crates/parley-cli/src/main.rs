//! Parley CLI
//!
//! Teach, ask and inspect a Parley engine from the command line.

mod chat;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use parley_core::storage::DEFAULT_SQLITE_FILE;
use parley_core::{
    default_data_dir, CacheConfig, Engine, EngineConfig, JsonSnapshotStore, Orchestrator,
    QueryOutcome, SqliteSnapshotStore,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Default user id for CLI sessions
const CLI_USER: &str = "cli";

/// Parley - self-learning response engine CLI
#[derive(Parser)]
#[command(name = "parley")]
#[command(author = "Parley Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Teach and query a self-learning response engine")]
struct Cli {
    /// Directory holding the snapshot (defaults to the platform data directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Snapshot backend
    #[arg(long, global = true, value_enum, default_value_t = Backend::Json)]
    backend: Backend,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Json,
    Sqlite,
}

#[derive(Subcommand)]
enum Commands {
    /// Teach a question -> response pair
    Teach {
        question: String,
        response: String,
        #[arg(long, default_value = CLI_USER)]
        user: String,
    },

    /// Ask a question
    Ask {
        question: String,
        #[arg(long, default_value = CLI_USER)]
        user: String,
    },

    /// Interactive session
    Chat {
        #[arg(long, default_value = CLI_USER)]
        user: String,
    },

    /// Show engine statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a user's recent exchanges
    Context {
        #[arg(long, default_value = CLI_USER)]
        user: String,
    },

    /// Forget everything
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut orchestrator = open_orchestrator(cli.data_dir, cli.backend)?;

    match cli.command {
        Commands::Teach {
            question,
            response,
            user,
        } => run_teach(&mut orchestrator, &user, &question, &response),
        Commands::Ask { question, user } => run_ask(&mut orchestrator, &user, &question),
        Commands::Chat { user } => chat::run(&mut orchestrator, &user),
        Commands::Stats { json } => run_stats(&orchestrator, json),
        Commands::Context { user } => run_context(&orchestrator, &user),
        Commands::Reset { yes } => run_reset(&mut orchestrator, yes),
    }
}

fn open_orchestrator(data_dir: Option<PathBuf>, backend: Backend) -> anyhow::Result<Orchestrator> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let config = EngineConfig::from_env();

    let engine = match backend {
        Backend::Json => Engine::open(JsonSnapshotStore::in_dir(&dir), config)?,
        Backend::Sqlite => {
            let store = SqliteSnapshotStore::new(Some(dir.join(DEFAULT_SQLITE_FILE)))?;
            Engine::open(store, config)?
        }
    };

    Ok(Orchestrator::new(engine, CacheConfig::from_env())?)
}

fn run_teach(
    orchestrator: &mut Orchestrator,
    user: &str,
    question: &str,
    response: &str,
) -> anyhow::Result<()> {
    let pattern_id = orchestrator.teach(user, question, response)?;
    let pattern = orchestrator.engine().patterns().get(&pattern_id);

    println!("{} {}", "Learned".green().bold(), pattern_id[..12].dimmed());
    if let Some(pattern) = pattern {
        println!("{}: {}", "Responses".white().bold(), pattern.responses.len());
        println!("{}: {:.2}", "Confidence".white().bold(), pattern.confidence);
    }
    Ok(())
}

fn run_ask(orchestrator: &mut Orchestrator, user: &str, question: &str) -> anyhow::Result<()> {
    match orchestrator.process_query(user, question)? {
        QueryOutcome::Matched(result) => {
            println!("{}", result.response);
            println!(
                "{}",
                format!(
                    "matched \"{}\" ({:.2}, {})",
                    result.matched_question, result.confidence, result.source
                )
                .dimmed()
            );
        }
        QueryOutcome::NoMatch { suggestion } => {
            println!("{}", suggestion.yellow());
        }
    }
    Ok(())
}

fn run_stats(orchestrator: &Orchestrator, json: bool) -> anyhow::Result<()> {
    let status = orchestrator.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "=== Parley Statistics ===".cyan().bold());
    println!();
    println!("{}: {}", "Patterns".white().bold(), status.engine.total_patterns);
    println!("{}: {}", "Associations".white().bold(), status.engine.total_associations);
    println!("{}: {}", "Events Logged".white().bold(), status.engine.event_log_len);
    println!("{}: {}", "Users".white().bold(), status.engine.unique_users);
    println!(
        "{}: {:.2}",
        "Average Confidence".white().bold(),
        status.engine.average_confidence
    );
    println!("{}: {}", "Storage".white().bold(), orchestrator.engine().describe_store());
    Ok(())
}

fn run_context(orchestrator: &Orchestrator, user: &str) -> anyhow::Result<()> {
    let entries = orchestrator.context(user);
    if entries.is_empty() {
        println!("{}", format!("No context for {user}.").dimmed());
        return Ok(());
    }

    println!("{}", format!("=== Context for {user} ===").cyan().bold());
    for entry in entries {
        println!(
            "{} {} {}",
            entry.time.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            "Q:".white().bold(),
            entry.question
        );
        println!("{:19} {} {}", "", "A:".white().bold(), entry.response);
    }
    Ok(())
}

fn run_reset(orchestrator: &mut Orchestrator, yes: bool) -> anyhow::Result<()> {
    let patterns = orchestrator.status().engine.total_patterns;

    // Confirmation prompt (unless --yes)
    if !yes {
        print!(
            "{} Forget {} learned patterns? This cannot be undone. [y/N] ",
            "WARNING:".red().bold(),
            patterns
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    orchestrator.reset()?;
    println!("{}", "All learned state cleared.".green().bold());
    Ok(())
}
