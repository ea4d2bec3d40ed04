//! Ranking of filtered records.
//!
//! # Modes
//!
//! 1. **Relevance**: free text given and `sumario` resolved. Per record:
//!    `Σ_terms 2.0 × occurrences(term) + 0.02 × partial_ratio(summary, term)`
//!    over the accent-folded, lowercased summary. Blends literal matches
//!    with tolerance for inflection and typos.
//! 2. **Recency**: no free text (or no summary column) and `fecha`
//!    resolved. Most recent first; unparseable dates last.
//! 3. **Original**: otherwise the filtered order is kept.
//!
//! All sorts are stable: equal keys keep their filtered order.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::columns::{CanonicalField, FieldMap};
use crate::fuzzy::partial_ratio;
use crate::models::Record;
use crate::text::fold;

/// Weight of each literal occurrence of a term.
pub const OCCURRENCE_WEIGHT: f64 = 2.0;
/// Weight of the 0–100 fuzzy partial similarity.
pub const FUZZY_WEIGHT: f64 = 0.02;

const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%y", "%d-%m-%y",
];

/// Which ordering was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMode {
    Relevance,
    Recency,
    Original,
}

impl std::fmt::Display for RankMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Relevance => "relevance",
            Self::Recency => "recency",
            Self::Original => "original",
        })
    }
}

/// A ranked record. `score` is set only in relevance mode.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'c> {
    pub record: &'c Record,
    pub score: Option<f64>,
}

/// Order `records` and keep the first `limit`.
pub fn rank<'c>(
    records: Vec<&'c Record>,
    fields: &FieldMap,
    q: Option<&str>,
    limit: usize,
) -> (Vec<Hit<'c>>, RankMode) {
    let terms: Vec<String> = q
        .map(|q| fold(q).split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let (mut hits, mode) = if !terms.is_empty() && fields.is_resolved(CanonicalField::Sumario) {
        (by_relevance(records, fields, &terms), RankMode::Relevance)
    } else if fields.is_resolved(CanonicalField::Fecha) {
        (by_recency(records, fields), RankMode::Recency)
    } else {
        let hits = records
            .into_iter()
            .map(|record| Hit {
                record,
                score: None,
            })
            .collect();
        (hits, RankMode::Original)
    };

    tracing::debug!(?mode, candidates = hits.len(), limit, "ranked records");
    hits.truncate(limit);
    (hits, mode)
}

/// Relevance of one summary to already-folded terms.
pub fn relevance_score(summary: &str, terms: &[String]) -> f64 {
    let summary = fold(summary);
    terms
        .iter()
        .map(|term| {
            let occurrences = summary.matches(term.as_str()).count() as f64;
            OCCURRENCE_WEIGHT * occurrences + FUZZY_WEIGHT * partial_ratio(&summary, term)
        })
        .sum()
}

/// Permissive, day-first date parsing.
///
/// Accepts `dd/mm/yyyy` and friends, ISO dates, a trailing time part and a
/// bare 4-digit year (read as January 1st).
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(value);

    for candidate in [value, date_part] {
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, fmt) {
                // "%Y" happily reads "98" as year 98.
                if fmt.contains("%Y") && date.year() < 1000 {
                    continue;
                }
                return Some(date);
            }
        }
    }

    if date_part.len() == 4 && date_part.chars().all(|c| c.is_ascii_digit()) {
        return date_part
            .parse()
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }
    None
}

fn by_relevance<'c>(records: Vec<&'c Record>, fields: &FieldMap, terms: &[String]) -> Vec<Hit<'c>> {
    let mut hits: Vec<Hit<'c>> = records
        .into_iter()
        .map(|record| {
            let summary = fields.value(record, CanonicalField::Sumario).unwrap_or("");
            Hit {
                record,
                score: Some(relevance_score(summary, terms)),
            }
        })
        .collect();
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits
}

fn by_recency<'c>(records: Vec<&'c Record>, fields: &FieldMap) -> Vec<Hit<'c>> {
    let mut keyed: Vec<(Option<NaiveDate>, &'c Record)> = records
        .into_iter()
        .map(|record| {
            let date = fields
                .value(record, CanonicalField::Fecha)
                .and_then(parse_date);
            (date, record)
        })
        .collect();
    // `None` sorts below every date, so descending puts it last.
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed
        .into_iter()
        .map(|(_, record)| Hit {
            record,
            score: None,
        })
        .collect()
}
