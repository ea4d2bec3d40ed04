use anyhow::Result;

use legislacion_core::search::ProjectedRecord;
use legislacion_core::{parse_intent, ComparisonReport};

use crate::session::{Answer, CompareOutcome, SearchOutcome, Session};

/// Maximum characters of a summary shown per result line.
const EXCERPT_CHARS: usize = 240;

pub fn run_parse(text: &str) -> Result<()> {
    let intent = parse_intent(text);
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}

pub async fn run_search(
    session: &Session,
    text: &str,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let mut intent = parse_intent(text);
    if limit.is_some() {
        intent.limit = limit;
    }

    let outcome = session.search(&intent).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

pub async fn run_compare(session: &Session, text: &str, a: usize, b: usize, json: bool) -> Result<()> {
    let (outcome, comparison) = session
        .search_and_compare(&parse_intent(text), a, b)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        println!("{} results for this query.", outcome.results.len());
        println!();
        print_comparison(&comparison);
    }
    Ok(())
}

pub async fn run_ask(session: &Session, text: &str, json: bool) -> Result<()> {
    let answer = session.ask(text).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    match answer {
        Answer::Search(outcome) => print_outcome(&outcome),
        Answer::Compare { search, comparison } => match comparison {
            Some(comparison) => print_comparison(&comparison),
            None => {
                println!(
                    "Need at least two matching norms to compare, found {}.",
                    search.results.len()
                );
                if !search.results.is_empty() {
                    println!();
                    print_outcome(&search);
                }
            }
        },
    }
    Ok(())
}

fn print_outcome(outcome: &SearchOutcome) {
    if outcome.results.is_empty() {
        println!("No results.");
        return;
    }

    println!(
        "{} of {} matching norms ({} order)",
        outcome.results.len(),
        outcome.total_matches,
        outcome.mode
    );
    println!();

    for (i, record) in outcome.results.iter().enumerate() {
        print_record(i + 1, record);
    }
}

fn print_record(position: usize, record: &ProjectedRecord) {
    match record.score {
        Some(score) => println!("{}. [{:.2}] {}", position, score, record.title()),
        None => println!("{}. {}", position, record.title()),
    }
    if let Some(ref fecha) = record.fecha {
        println!("    fecha: {}", fecha);
    }
    if let Some(ref estado) = record.estado {
        println!("    estado: {}", estado);
    }
    if let Some(ref sumario) = record.sumario {
        println!("    sumario: \"{}\"", excerpt(sumario));
    }
    if let Some(ref url) = record.url {
        println!("    url: {}", url);
    }
    println!();
}

fn print_comparison(comparison: &CompareOutcome) {
    let ComparisonReport {
        similarity,
        only_in_a,
        only_in_b,
        summary_a,
        summary_b,
    } = &comparison.report;

    println!("A: {}", comparison.a.title());
    println!("    {}", excerpt(summary_a));
    println!("B: {}", comparison.b.title());
    println!("    {}", excerpt(summary_b));
    println!();
    println!("similarity: {}/100", similarity);
    println!("only in A: {}", keyword_list(only_in_a));
    println!("only in B: {}", keyword_list(only_in_b));
}

fn keyword_list(words: &[String]) -> String {
    if words.is_empty() {
        "-".to_string()
    } else {
        words.join(", ")
    }
}

fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= EXCERPT_CHARS {
        flat.to_string()
    } else {
        let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
        format!("{}…", cut.trim_end())
    }
}
