use anyhow::Result;
use serde::Serialize;

use legislacion_core::CanonicalField;

use crate::session::Session;

#[derive(Serialize)]
struct FetchReport<'a> {
    provider: &'a str,
    records: usize,
    columns: usize,
    fields: &'a legislacion_core::FieldMap,
}

/// Acquire the corpus and report its size and resolved fields.
pub async fn run_fetch(session: &Session, json: bool) -> Result<()> {
    let loaded = session.load().await?;

    if json {
        let report = FetchReport {
            provider: session.provider_name(),
            records: loaded.corpus.len(),
            columns: loaded.corpus.columns().len(),
            fields: &loaded.fields,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Loaded {} records with {} columns from {}.",
        loaded.corpus.len(),
        loaded.corpus.columns().len(),
        session.provider_name()
    );
    println!();
    println!("{:<12} COLUMN", "FIELD");
    for field in CanonicalField::ALL {
        println!(
            "{:<12} {}",
            field.name(),
            loaded.fields.get(field).unwrap_or("(unresolved)")
        );
    }
    Ok(())
}

/// List every source column and the canonical field it serves, if any.
pub async fn run_columns(session: &Session) -> Result<()> {
    let loaded = session.load().await?;

    println!("{:<32} FIELD", "COLUMN");
    for column in loaded.corpus.columns() {
        let field = loaded
            .fields
            .iter()
            .find(|(_, resolved)| *resolved == column.as_str())
            .map(|(field, _)| field.name())
            .unwrap_or("-");
        println!("{:<32} {}", column, field);
    }
    Ok(())
}
