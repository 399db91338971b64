//! Terminal rendering for resolution outcomes.

use askgraph_core::disambiguate::Decision;
use askgraph_core::{Candidate, ResolveError, Resolution};
use colored::Colorize;

pub fn print_outcome(outcome: &Result<Resolution, ResolveError>) {
    match outcome {
        Ok(resolution) => print_resolution(resolution),
        Err(err) => {
            println!("{} {}", "error:".red().bold(), err);
            if let Some(candidates) = err.candidates() {
                print_candidates(candidates, None);
            }
        }
    }
}

fn print_resolution(resolution: &Resolution) {
    let resolved = &resolution.resolved;
    println!("{}{}", label("intent"), resolved.intent.as_str().cyan());
    println!("{}{}", label("mention"), resolved.mention);
    println!("{}{}", label("qid"), resolved.identifier.bold());

    if resolution.is_empty_answer() {
        println!("{}", "No answers found.".yellow());
        if let Some(candidates) = &resolution.candidates {
            if !candidates.is_empty() {
                println!("{}", "candidates considered:".dimmed());
                print_candidates(candidates, None);
            }
        }
        return;
    }

    println!("{}", "answers".dimmed());
    for answer in &resolution.answers {
        println!("  {} {}", "•".green(), answer.display());
    }
}

fn label(name: &str) -> colored::ColoredString {
    format!("{name:<9}").dimmed()
}

/// One line per candidate; the chosen one (if any) is marked with its stage.
pub fn print_candidates(candidates: &[Candidate], decision: Option<&Decision>) {
    if candidates.is_empty() {
        println!("  {}", "(no candidates)".dimmed());
        return;
    }
    for (index, candidate) in candidates.iter().enumerate() {
        let line = candidate_line(candidate);
        match decision {
            Some(d) if d.index == index => {
                let reason = match &d.keyword {
                    Some(keyword) => format!("{}: {keyword}", d.stage),
                    None => d.stage.to_string(),
                };
                println!("{} {} {}", "→".green().bold(), line.bold(), format!("[{reason}]").green());
            }
            _ => println!("  {line}"),
        }
    }
}

pub fn candidate_line(candidate: &Candidate) -> String {
    let mut line = candidate.id.clone();
    if let Some(label) = &candidate.label {
        line.push_str("  ");
        line.push_str(label);
    }
    if let Some(description) = &candidate.description {
        line.push_str(" (");
        line.push_str(description);
        line.push(')');
    }
    line
}
