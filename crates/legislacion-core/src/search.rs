//! Query entry point: filter, rank and project.
//!
//! The search operates on a borrowed [`Corpus`] and returns a [`ResultSet`]
//! of references into it. The caller owns corpus acquisition and decides
//! how to present the results.
//!
//! # Pipeline
//!
//! 1. Resolve canonical fields (or reuse a cached [`FieldMap`]).
//! 2. Apply jurisdiction and structured filters ([`crate::filter`]).
//! 3. Rank by relevance, recency or original order ([`crate::rank`]).
//! 4. Truncate to the effective limit ([`SearchParams::effective_limit`]).

use serde::Serialize;

use crate::columns::{CanonicalField, FieldMap};
use crate::filter::apply_filters;
use crate::intent::QueryIntent;
use crate::models::{Corpus, Record};
use crate::rank::{rank, Hit, RankMode};

/// Result-count bounds and jurisdiction, decoupled from application config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Used when no limit (or a non-positive one) is requested. Also the
    /// floor for smaller requests.
    pub default_limit: i64,
    /// Ceiling for requested limits.
    pub max_limit: i64,
    /// Only records whose `provincia` contains this are kept.
    pub jurisdiction: Option<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            jurisdiction: Some("Buenos Aires".to_string()),
        }
    }
}

impl SearchParams {
    /// Number of results to return for a requested limit.
    ///
    /// Unspecified or non-positive → `default_limit`; smaller requests are
    /// raised to `default_limit`; larger ones are capped at `max_limit`.
    pub fn effective_limit(&self, requested: Option<i64>) -> usize {
        let max = self.max_limit.max(1);
        let default = self.default_limit.clamp(1, max);
        let limit = match requested {
            Some(n) if n > 0 => n.clamp(1, max).max(default),
            _ => default,
        };
        limit as usize
    }
}

/// Ranked view over a corpus plus the field map used to produce it.
#[derive(Debug, Clone)]
pub struct ResultSet<'c> {
    pub hits: Vec<Hit<'c>>,
    pub fields: FieldMap,
    pub mode: RankMode,
    /// Records that passed the filters, before truncation.
    pub total_matches: usize,
}

impl<'c> ResultSet<'c> {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Record at a 0-based result position.
    pub fn get(&self, index: usize) -> Option<&'c Record> {
        self.hits.get(index).map(|h| h.record)
    }

    pub fn records(&self) -> impl Iterator<Item = &'c Record> + '_ {
        self.hits.iter().map(|h| h.record)
    }

    /// Corpus row positions, in result order.
    pub fn rows(&self) -> Vec<usize> {
        self.hits.iter().map(|h| h.record.row()).collect()
    }

    /// Canonical view of every hit, for presentation.
    pub fn project(&self) -> Vec<ProjectedRecord> {
        self.hits
            .iter()
            .map(|h| ProjectedRecord::new(h.record, &self.fields, h.score))
            .collect()
    }
}

/// A record reduced to its canonical fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedRecord {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub provincia: Option<String>,
    pub tipo: Option<String>,
    pub numero: Option<String>,
    pub anio: Option<String>,
    pub fecha: Option<String>,
    pub sumario: Option<String>,
    pub estado: Option<String>,
    pub url: Option<String>,
}

impl ProjectedRecord {
    pub fn new(record: &Record, fields: &FieldMap, score: Option<f64>) -> Self {
        let get = |f: CanonicalField| fields.value(record, f).map(|v| v.trim().to_string());
        Self {
            row: record.row(),
            score,
            provincia: get(CanonicalField::Provincia),
            tipo: get(CanonicalField::Tipo),
            numero: get(CanonicalField::Numero),
            anio: get(CanonicalField::Anio),
            fecha: get(CanonicalField::Fecha),
            sumario: get(CanonicalField::Sumario),
            estado: get(CanonicalField::Estado),
            url: get(CanonicalField::Url),
        }
    }

    /// One-line heading such as `"LEY 14528/2013"`.
    pub fn title(&self) -> String {
        let mut title = [self.tipo.as_deref(), self.numero.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(anio) = self.anio.as_deref() {
            if title.is_empty() {
                title = anio.to_string();
            } else {
                title = format!("{}/{}", title, anio);
            }
        }
        if title.is_empty() {
            format!("registro {}", self.row)
        } else {
            title
        }
    }
}

/// Run a query against a corpus, resolving its fields first.
pub fn search<'c>(corpus: &'c Corpus, intent: &QueryIntent, params: &SearchParams) -> ResultSet<'c> {
    let fields = FieldMap::resolve(corpus.columns());
    search_with_fields(corpus, &fields, intent, params)
}

/// Run a query with a field map already resolved for `corpus`.
pub fn search_with_fields<'c>(
    corpus: &'c Corpus,
    fields: &FieldMap,
    intent: &QueryIntent,
    params: &SearchParams,
) -> ResultSet<'c> {
    let filtered = apply_filters(
        corpus.records(),
        fields,
        &intent.filters(),
        params.jurisdiction.as_deref(),
    );
    let total_matches = filtered.len();
    let limit = params.effective_limit(intent.limit);
    let (hits, mode) = rank(filtered, fields, intent.q.as_deref(), limit);

    tracing::debug!(total_matches, returned = hits.len(), "search complete");

    ResultSet {
        hits,
        fields: fields.clone(),
        mode,
        total_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::parse_intent;

    fn corpus(n: usize) -> Corpus {
        let columns = ["provincia", "tipo_norma", "numero_norma", "sumario", "fecha_sancion"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut rows: Vec<Vec<String>> = vec![
            vec!["Buenos Aires", "LEY", "15464", "Régimen de adopción internacional", "01/01/2023"],
            vec!["Buenos Aires", "LEY", "14528", "Régimen de adopción", "01/01/2013"],
            vec!["Buenos Aires", "DECRETO", "2366", "Emergencia en seguridad pública", "10/10/2025"],
        ]
        .into_iter()
        .map(|r| r.into_iter().map(String::from).collect())
        .collect();
        for i in 0..n {
            rows.push(vec![
                "Buenos Aires".into(),
                "RESOLUCION".into(),
                format!("{}", 9000 + i),
                format!("Resolución administrativa {}", i),
                "01/01/2001".into(),
            ]);
        }
        Corpus::new(columns, rows)
    }

    #[test]
    fn test_type_and_number_query_finds_the_norm() {
        let c = corpus(0);
        let results = search(&c, &parse_intent("ley 14528"), &SearchParams::default());
        assert_eq!(results.len(), 1);
        let first = &results.project()[0];
        assert_eq!(first.tipo.as_deref(), Some("LEY"));
        assert_eq!(first.numero.as_deref(), Some("14528"));
        assert_eq!(first.title(), "LEY 14528");
    }

    #[test]
    fn test_free_text_ranks_by_relevance() {
        let c = corpus(0);
        let results = search(&c, &parse_intent("adopción internacional"), &SearchParams::default());
        assert_eq!(results.mode, RankMode::Relevance);
        assert_eq!(results.get(0).map(Record::row), Some(0));
        assert_eq!(results.get(1).map(Record::row), Some(1));
    }

    #[test]
    fn test_no_free_text_ranks_by_recency() {
        let c = corpus(0);
        let results = search(&c, &QueryIntent::default(), &SearchParams::default());
        assert_eq!(results.mode, RankMode::Recency);
        assert_eq!(results.rows(), vec![2, 0, 1]);
    }

    #[test]
    fn test_effective_limit() {
        let p = SearchParams::default();
        assert_eq!(p.effective_limit(None), 10);
        assert_eq!(p.effective_limit(Some(0)), 10);
        assert_eq!(p.effective_limit(Some(-5)), 10);
        assert_eq!(p.effective_limit(Some(3)), 10);
        assert_eq!(p.effective_limit(Some(25)), 25);
        assert_eq!(p.effective_limit(Some(999)), 50);
    }

    #[test]
    fn test_large_limit_is_capped() {
        let c = corpus(80);
        let intent = QueryIntent {
            limit: Some(999),
            ..Default::default()
        };
        let results = search(&c, &intent, &SearchParams::default());
        assert_eq!(results.len(), 50);
        assert_eq!(results.total_matches, 83);

        let intent = QueryIntent {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(search(&c, &intent, &SearchParams::default()).len(), 10);
    }

    #[test]
    fn test_results_are_a_subsequence_of_the_corpus() {
        let c = corpus(5);
        let unfiltered: Vec<usize> = c.records().iter().map(Record::row).collect();
        let intent = QueryIntent {
            tipo: Some("RESOLUCION".into()),
            ..Default::default()
        };
        let params = SearchParams {
            jurisdiction: None,
            ..Default::default()
        };
        let results = search(&c, &intent, &params);
        assert_eq!(results.len(), 5);
        // Equal dates keep corpus order.
        let rows = results.rows();
        let mut sorted = rows.clone();
        sorted.sort_unstable();
        assert_eq!(rows, sorted);
        assert!(rows.iter().all(|r| unfiltered.contains(r)));
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let c = corpus(0);
        let results = search(&c, &parse_intent("decreto 1"), &SearchParams::default());
        assert!(results.is_empty());
        assert_eq!(results.total_matches, 0);
        assert!(results.project().is_empty());
    }

    #[test]
    fn test_projection_serializes_canonical_fields() {
        let c = corpus(0);
        let results = search(&c, &parse_intent("ley 14528"), &SearchParams::default());
        let json = serde_json::to_value(results.project()).unwrap();
        assert_eq!(json[0]["numero"], "14528");
        assert!(json[0]["url"].is_null());
        assert!(json[0].get("score").is_none());
    }

    #[test]
    fn test_title_fallbacks() {
        let rec = ProjectedRecord {
            row: 7,
            score: None,
            provincia: None,
            tipo: None,
            numero: None,
            anio: None,
            fecha: None,
            sumario: None,
            estado: None,
            url: None,
        };
        assert_eq!(rec.title(), "registro 7");
        let rec = ProjectedRecord {
            tipo: Some("LEY".into()),
            numero: Some("1".into()),
            anio: Some("2000".into()),
            ..rec
        };
        assert_eq!(rec.title(), "LEY 1/2000");
    }
}
