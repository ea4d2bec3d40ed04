//! Pairwise comparison of two records.
//!
//! Each record is canonicalized as its resolved `tipo`, `numero`, `anio`,
//! `fecha` and `estado` values followed by its summary. The similarity is
//! the token-set ratio of the two texts; the keyword differences are the
//! folded alphabetic tokens (≥ 4 chars, minus connector words) found on one
//! side only.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::columns::{CanonicalField, FieldMap};
use crate::fuzzy::token_set_ratio;
use crate::models::Record;
use crate::text::fold;

/// Maximum keywords reported per side.
pub const MAX_KEYWORDS: usize = 10;

const LABEL_FIELDS: [CanonicalField; 5] = [
    CanonicalField::Tipo,
    CanonicalField::Numero,
    CanonicalField::Anio,
    CanonicalField::Fecha,
    CanonicalField::Estado,
];

const STOPWORDS: &[&str] = &[
    "ante", "bajo", "cada", "como", "contra", "cual", "cuales", "cuando", "desde", "dentro",
    "donde", "durante", "entre", "esas", "esos", "esta", "estas", "este", "estos", "fuera",
    "hacia", "hasta", "mediante", "otra", "otras", "otro", "otros", "para", "pero", "porque",
    "segun", "sean", "sera", "sobre", "solo", "tambien", "toda", "todas", "todo", "todos",
    "tras",
];

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Alphabetic}{4,}").unwrap());

/// Result of comparing record A with record B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    /// Token-set similarity, 0–100.
    pub similarity: u8,
    /// Keywords present only in A, sorted, at most [`MAX_KEYWORDS`].
    pub only_in_a: Vec<String>,
    /// Keywords present only in B, sorted, at most [`MAX_KEYWORDS`].
    pub only_in_b: Vec<String>,
    /// Canonicalized text of A.
    pub summary_a: String,
    /// Canonicalized text of B.
    pub summary_b: String,
}

/// Compare two records. Missing fields are left out; never fails.
pub fn compare(a: &Record, b: &Record, fields: &FieldMap) -> ComparisonReport {
    let summary_a = canonical_text(a, fields);
    let summary_b = canonical_text(b, fields);

    let similarity = token_set_ratio(&summary_a, &summary_b).round().clamp(0.0, 100.0) as u8;

    let words_a = keywords(&summary_a);
    let words_b = keywords(&summary_b);

    ComparisonReport {
        similarity,
        only_in_a: words_a.difference(&words_b).take(MAX_KEYWORDS).cloned().collect(),
        only_in_b: words_b.difference(&words_a).take(MAX_KEYWORDS).cloned().collect(),
        summary_a,
        summary_b,
    }
}

/// `"LEY 14528 2013 · Régimen de adopción"`; labels or summary may be absent.
pub fn canonical_text(record: &Record, fields: &FieldMap) -> String {
    let labels: Vec<&str> = LABEL_FIELDS
        .iter()
        .filter_map(|&f| fields.value(record, f))
        .map(str::trim)
        .collect();
    let summary = fields
        .value(record, CanonicalField::Sumario)
        .map(str::trim)
        .unwrap_or("");

    match (labels.is_empty(), summary.is_empty()) {
        (true, _) => summary.to_string(),
        (false, true) => labels.join(" "),
        (false, false) => format!("{} · {}", labels.join(" "), summary),
    }
}

/// Folded alphabetic tokens of at least four letters, minus stopwords.
/// `BTreeSet` keeps them alphabetically sorted.
pub fn keywords(text: &str) -> BTreeSet<String> {
    let folded = fold(text);
    WORD_RE
        .find_iter(&folded)
        .map(|m| m.as_str())
        .filter(|w| !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Corpus;

    fn corpus(rows: &[&[&str]]) -> Corpus {
        let columns = ["tipo_norma", "numero_norma", "estado", "sumario"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Corpus::new(
            columns,
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect()),
        )
    }

    #[test]
    fn test_adoption_example() {
        let c = corpus(&[
            &["LEY", "14528", "", "régimen de adopción"],
            &["LEY", "15464", "", "régimen de adopción internacional"],
        ]);
        let fields = FieldMap::resolve(c.columns());
        let report = compare(&c.records()[0], &c.records()[1], &fields);
        assert_eq!(report.only_in_b, vec!["internacional"]);
        assert!(report.only_in_a.is_empty());
        assert!(report.similarity > 50, "similarity = {}", report.similarity);
        assert!(report.similarity < 100);
        assert_eq!(report.summary_a, "LEY 14528 · régimen de adopción");
    }

    #[test]
    fn test_self_comparison_is_maximal() {
        let c = corpus(&[&["DECRETO", "2366", "Vigente", "Emergencia en seguridad pública"]]);
        let fields = FieldMap::resolve(c.columns());
        let rec = &c.records()[0];
        let report = compare(rec, rec, &fields);
        assert_eq!(report.similarity, 100);
        assert!(report.only_in_a.is_empty());
        assert!(report.only_in_b.is_empty());
    }

    #[test]
    fn test_empty_records_compare_equal() {
        let c = corpus(&[&["", "", "", ""]]);
        let fields = FieldMap::resolve(c.columns());
        let rec = &c.records()[0];
        let report = compare(rec, rec, &fields);
        assert_eq!(report.similarity, 100);
        assert_eq!(report.summary_a, "");
    }

    #[test]
    fn test_unresolved_fields_are_omitted() {
        let c = Corpus::new(
            vec!["descripcion".to_string()],
            vec![vec!["Pesca artesanal".to_string()], vec!["Pesca deportiva".to_string()]],
        );
        let fields = FieldMap::resolve(c.columns());
        let report = compare(&c.records()[0], &c.records()[1], &fields);
        assert_eq!(report.summary_a, "Pesca artesanal");
        assert_eq!(report.only_in_a, vec!["artesanal"]);
        assert_eq!(report.only_in_b, vec!["deportiva"]);
    }

    #[test]
    fn test_keywords_filtering() {
        let words = keywords("Sobre la protección de los HUMEDALES para el año 2020");
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        assert_eq!(words, vec!["humedales", "proteccion"]);
    }

    #[test]
    fn test_keyword_lists_are_capped() {
        let long_a = "alfa bravo charlie delta echo foxtrot golf hotel india juliet kilo lima mike";
        let c = corpus(&[&["", "", "", long_a], &["", "", "", "zulu"]]);
        let fields = FieldMap::resolve(c.columns());
        let report = compare(&c.records()[0], &c.records()[1], &fields);
        assert_eq!(report.only_in_a.len(), MAX_KEYWORDS);
        assert_eq!(report.only_in_a[0], "alfa");
        assert_eq!(report.only_in_b, vec!["zulu"]);
    }
}
