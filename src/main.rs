//! maat CLI: forward-chaining inference with truth maintenance.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use maat::export::KbExport;
use maat::kb::{EngineConfig, KnowledgeBase};
use maat::parse::{self, ParsedItem};
use maat::unify::Bindings;

#[derive(Parser)]
#[command(name = "maat", version, about = "Forward-chaining inference engine with truth maintenance")]
struct Cli {
    /// Maximum derivation-chain depth per assertion.
    #[arg(long, global = true, default_value = "64")]
    max_chain_depth: usize,

    /// Maximum number of items derived per assertion.
    #[arg(long, global = true, default_value = "10000")]
    max_derived: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a knowledge file, chain to closure, and print the knowledge base.
    Run {
        /// Path to a knowledge file (`fact:`/`rule:` lines).
        #[arg(long)]
        file: PathBuf,

        /// Optional query to run after loading, e.g. "(loves ?x bob)".
        #[arg(long)]
        ask: Option<String>,
    },

    /// Query the knowledge base and print one binding set per match.
    Ask {
        /// Path to a knowledge file.
        #[arg(long)]
        file: PathBuf,

        /// Query statement, e.g. "(loves ?x bob)".
        #[arg(long)]
        query: String,
    },

    /// Retract a fact and print the resulting knowledge base.
    Retract {
        /// Path to a knowledge file.
        #[arg(long)]
        file: PathBuf,

        /// Ground fact to retract, e.g. "(loves alice bob)".
        #[arg(long)]
        fact: String,
    },

    /// Export the knowledge base as JSON.
    Export {
        /// Path to a knowledge file.
        #[arg(long)]
        file: PathBuf,

        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,
    },

    /// Show knowledge-base statistics.
    Info {
        /// Path to a knowledge file.
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = EngineConfig {
        max_chain_depth: cli.max_chain_depth,
        max_derived: cli.max_derived,
    };

    match cli.command {
        Commands::Run { file, ask } => {
            let kb = load_kb(&file, config)?;
            print!("{}", kb.render());
            if let Some(query_text) = ask {
                let query = parse::parse_statement(&query_text)?;
                let results = kb.ask(&query)?;
                print_bindings(&query_text, &results);
            }
        }

        Commands::Ask { file, query } => {
            let kb = load_kb(&file, config)?;
            let statement = parse::parse_statement(&query)?;
            let results = kb.ask(&statement)?;
            print_bindings(&query, &results);
        }

        Commands::Retract { file, fact } => {
            let mut kb = load_kb(&file, config)?;
            let statement = parse::parse_statement(&fact)?;
            kb.retract_fact(&statement);
            print!("{}", kb.render());
        }

        Commands::Export { file, pretty } => {
            let kb = load_kb(&file, config)?;
            let export = KbExport::from_kb(&kb);
            let json = if pretty {
                serde_json::to_string_pretty(&export).into_diagnostic()?
            } else {
                serde_json::to_string(&export).into_diagnostic()?
            };
            println!("{json}");
        }

        Commands::Info { file } => {
            let kb = load_kb(&file, config)?;
            println!("knowledge base: {}", file.display());
            println!("  facts:           {}", kb.fact_count());
            println!("  rules:           {}", kb.rule_count());
            println!("  max chain depth: {}", kb.config().max_chain_depth);
            println!("  max derived:     {}", kb.config().max_derived);
        }
    }

    Ok(())
}

/// Read a knowledge file and assert its forms in file order, forward
/// chaining to closure after each one.
fn load_kb(path: &Path, config: EngineConfig) -> Result<KnowledgeBase> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    let items = parse::parse_document(&content)?;

    let mut kb = KnowledgeBase::new(config);
    for item in items {
        match item {
            ParsedItem::Fact(statement) => {
                kb.assert_fact(statement)?;
            }
            ParsedItem::Rule(lhs, rhs) => {
                kb.assert_rule(lhs, rhs)?;
            }
        }
    }

    tracing::info!(
        facts = kb.fact_count(),
        rules = kb.rule_count(),
        "knowledge base loaded"
    );
    Ok(kb)
}

fn print_bindings(query: &str, results: &[Bindings]) {
    if results.is_empty() {
        println!("{query}: no matching facts");
        return;
    }
    println!("{query}: {} match(es)", results.len());
    for (i, bindings) in results.iter().enumerate() {
        if bindings.is_empty() {
            println!("  {}. exact match", i + 1);
        } else {
            println!("  {}. {bindings}", i + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_args_are_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn load_kb_chains_to_closure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fact: (loves alice bob)").unwrap();
        writeln!(file, "rule: ((loves ?x ?y)) -> (happy ?x)").unwrap();
        file.flush().unwrap();

        let kb = load_kb(file.path(), EngineConfig::default()).unwrap();
        assert_eq!(kb.fact_count(), 2);
        assert_eq!(kb.rule_count(), 1);
        assert!(kb.contains_fact(&parse::parse_statement("(happy alice)").unwrap()));
    }

    #[test]
    fn load_kb_surfaces_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fact: (loves ?x bob)").unwrap();
        file.flush().unwrap();

        assert!(load_kb(file.path(), EngineConfig::default()).is_err());
    }
}
