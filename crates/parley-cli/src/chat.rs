//! Interactive chat loop

use std::io::{self, BufRead, Write};

use colored::Colorize;
use parley_core::{Orchestrator, QueryOutcome};

/// One line of chat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Teach { question: String, response: String },
    Stats,
    Context,
    Help,
    Quit,
    Empty,
    /// Unknown slash command or malformed `/teach`
    Invalid(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Empty;
        }
        if !line.starts_with('/') {
            return ChatCommand::Ask(line.to_string());
        }

        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match command {
            "/quit" | "/exit" => ChatCommand::Quit,
            "/stats" => ChatCommand::Stats,
            "/context" => ChatCommand::Context,
            "/help" => ChatCommand::Help,
            "/teach" => match rest.split_once("=>") {
                Some((q, r)) if !q.trim().is_empty() && !r.trim().is_empty() => {
                    ChatCommand::Teach {
                        question: q.trim().to_string(),
                        response: r.trim().to_string(),
                    }
                }
                _ => ChatCommand::Invalid("usage: /teach <question> => <response>".to_string()),
            },
            other => ChatCommand::Invalid(format!("unknown command {other}, try /help")),
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".white().bold());
    println!("  {:28} teach a new answer", "/teach <question> => <answer>".cyan());
    println!("  {:28} engine and cache counters", "/stats".cyan());
    println!("  {:28} your recent exchanges", "/context".cyan());
    println!("  {:28} leave", "/quit".cyan());
}

/// Read lines from stdin until `/quit` or EOF
pub fn run(orchestrator: &mut Orchestrator, user: &str) -> anyhow::Result<()> {
    println!("{}", "=== Parley Chat ===".cyan().bold());
    println!("{}", "Ask anything, or /help for commands.".dimmed());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", ">".green().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;

        match ChatCommand::parse(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => print_help(),
            ChatCommand::Ask(question) => match orchestrator.process_query(user, &question) {
                Ok(QueryOutcome::Matched(result)) => {
                    println!("{} {}", result.response, format!("({:.2})", result.confidence).dimmed());
                }
                Ok(QueryOutcome::NoMatch { suggestion }) => println!("{}", suggestion.yellow()),
                Err(e) => eprintln!("{} {}", "ERR".red(), e),
            },
            ChatCommand::Teach { question, response } => {
                match orchestrator.teach(user, &question, &response) {
                    Ok(_) => println!("{}", "Learned.".green()),
                    Err(e) => eprintln!("{} {}", "ERR".red(), e),
                }
            }
            ChatCommand::Stats => {
                let status = orchestrator.status();
                println!(
                    "patterns={} associations={} events={} users={} cache={} (hits {}, misses {})",
                    status.engine.total_patterns,
                    status.engine.total_associations,
                    status.engine.event_log_len,
                    status.engine.unique_users,
                    status.cache_size,
                    status.cache_hits,
                    status.cache_misses
                );
            }
            ChatCommand::Context => {
                let entries = orchestrator.context(user);
                if entries.is_empty() {
                    println!("{}", "No context yet.".dimmed());
                }
                for entry in entries {
                    println!("  {} {}", "Q:".white().bold(), entry.question);
                    println!("  {} {}", "A:".white().bold(), entry.response);
                }
            }
            ChatCommand::Invalid(message) => println!("{}", message.yellow()),
        }
    }

    Ok(())
}
