//! Askgraph CLI
//!
//! Answers a small family of factual questions ("What is the capital of
//! France?") by resolving them to a Wikidata entity and running a fixed
//! SPARQL template for the detected intent.

use anyhow::Result;
use askgraph_core::{
    assemble, classify, extract, Identifier, Intent, ResolveReport, Resolver,
};
use askgraph_wikidata::{WikidataClient, WikidataConfig};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod args;
mod output;

use args::ServiceArgs;

/// Questions exercised by `askgraph demo`.
const DEMO_QUESTIONS: &[&str] = &[
    "What is the capital of France?",
    "What is the population of India?",
    "Who is the president of France?",
    "Which continent is Japan in?",
    "Which administrative entities does India contain?",
    "What is the capital of Georgia?",
    "What is the capital of Springfield?",
];

#[derive(Parser)]
#[command(name = "askgraph")]
#[command(
    author,
    version,
    about = "Askgraph: answer factual questions from Wikidata"
)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a question end to end and print the answers.
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Skip search and disambiguation and use this entity id.
        #[arg(long, value_name = "QID")]
        qid: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Print the intent a question maps to (offline).
    Classify {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Print the entity mention extracted from a question (offline).
    Mention {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// List search hits for a mention and mark the one that would be picked.
    ///
    /// A full question is accepted too; its mention and intent are derived
    /// the same way `ask` does.
    Candidates {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Intent whose type keywords guide the pick.
        #[arg(long)]
        intent: Option<Intent>,
        #[arg(long)]
        json: bool,
    },

    /// Print the SPARQL query for an intent and entity id (offline).
    Sparql {
        #[arg(long)]
        intent: Intent,
        #[arg(long, value_name = "QID")]
        qid: Identifier,
    },

    /// List supported intents with their type keywords and templates.
    Intents,

    /// Run a fixed set of sample questions against the live endpoints.
    Demo {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask {
            question,
            qid,
            json,
        } => {
            // The outcome is already on stdout; only the status is left to report.
            let resolved = cmd_ask(&cli.service, &question.join(" "), qid.as_deref(), json)?;
            return Ok(if resolved {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Commands::Classify { question } => {
            cmd_classify(&question.join(" "));
            Ok(())
        }
        Commands::Mention { question } => {
            println!("{}", extract(&question.join(" ")));
            Ok(())
        }
        Commands::Candidates { text, intent, json } => {
            cmd_candidates(&cli.service, &text.join(" "), intent, json)
        }
        Commands::Sparql { intent, qid } => {
            println!("{}", assemble(intent, qid.as_str()));
            Ok(())
        }
        Commands::Intents => {
            cmd_intents();
            Ok(())
        }
        Commands::Demo { json } => cmd_demo(&cli.service, json),
    };
    result.map(|()| ExitCode::SUCCESS)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn client(service: &ServiceArgs) -> Result<WikidataClient> {
    let config = service.wikidata_config(WikidataConfig::from_env()?)?;
    tracing::debug!(
        api_url = %config.api_url,
        sparql_url = %config.sparql_url,
        delay_ms = config.request_delay.as_millis() as u64,
        "wikidata client"
    );
    Ok(WikidataClient::new(config)?)
}

// ============================================================================
// Commands
// ============================================================================

/// Prints the outcome (resolution or resolution error) and reports whether
/// the question resolved. Setup failures are returned as errors.
fn cmd_ask(service: &ServiceArgs, question: &str, qid: Option<&str>, json: bool) -> Result<bool> {
    let identifier = qid.map(Identifier::parse).transpose()?;
    let client = client(service)?;
    let resolver = Resolver::with_backend(&client).config(service.resolver_config()?);

    let outcome = match &identifier {
        Some(identifier) => resolver.resolve_with_identifier(question, identifier),
        None => resolver.resolve(question),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ResolveReport::from(&outcome))?
        );
    } else {
        output::print_outcome(&outcome);
    }
    Ok(outcome.is_ok())
}

fn cmd_classify(question: &str) {
    match classify(question) {
        Some(intent) => println!("{}", intent.as_str()),
        None => println!("{}", "unrecognized".yellow()),
    }
}

#[derive(Serialize)]
struct CandidatesReport<'a> {
    mention: &'a str,
    intent: Option<Intent>,
    candidates: &'a [askgraph_core::Candidate],
    decision: Option<askgraph_core::disambiguate::Decision>,
}

fn cmd_candidates(
    service: &ServiceArgs,
    text: &str,
    intent: Option<Intent>,
    json: bool,
) -> Result<()> {
    let (mention, intent) = mention_and_intent(text, intent);
    let client = client(service)?;
    let resolver = Resolver::with_backend(&client).config(service.resolver_config()?);

    let candidates = resolver.candidates(&mention)?;
    let decision = resolver.decide(&candidates, intent, &mention.trim().to_lowercase());

    if json {
        let report = CandidatesReport {
            mention: &mention,
            intent,
            candidates: &candidates,
            decision,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let intent_label = intent.map_or("none", Intent::as_str);
    println!(
        "{} {} {}",
        "Candidates for".green().bold(),
        mention.bold(),
        format!("(intent: {intent_label})").dimmed()
    );
    output::print_candidates(&candidates, decision.as_ref());
    Ok(())
}

/// A question yields its extracted mention and classified intent; bare text
/// is taken as the mention itself. An explicit intent always wins.
fn mention_and_intent(text: &str, explicit: Option<Intent>) -> (String, Option<Intent>) {
    match classify(text) {
        Some(classified) => (extract(text), explicit.or(Some(classified))),
        None => (text.trim().to_string(), explicit),
    }
}

fn cmd_intents() {
    for intent in Intent::ALL {
        println!("{}", intent.as_str().cyan().bold());
        println!(
            "  {} {}",
            "keywords:".dimmed(),
            intent.type_keywords().join(", ")
        );
        for line in intent.template().lines() {
            println!("    {}", line.trim_end());
        }
    }
}

#[derive(Serialize)]
struct DemoEntry<'a> {
    question: &'a str,
    #[serde(flatten)]
    report: ResolveReport,
}

fn cmd_demo(service: &ServiceArgs, json: bool) -> Result<()> {
    let client = client(service)?;
    let resolver = Resolver::with_backend(&client).config(service.resolver_config()?);

    let mut entries = Vec::new();
    for &question in DEMO_QUESTIONS {
        let outcome = resolver.resolve(question);
        if let Err(err) = &outcome {
            tracing::warn!(question, error = %err, "demo question failed");
        }
        if json {
            entries.push(DemoEntry {
                question,
                report: ResolveReport::from(&outcome),
            });
        } else {
            println!("{} {}", "Q:".green().bold(), question.bold());
            output::print_outcome(&outcome);
            println!();
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    }
    Ok(())
}
