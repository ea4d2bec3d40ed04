//! Structured filters over the corpus.
//!
//! Filtering is order-preserving and never mutates the corpus: it narrows a
//! vector of record references. Each step is skipped when its canonical
//! field is unresolved for the current corpus.
//!
//! | Step | Field | Keeps records whose field... |
//! |------|-------|------------------------------|
//! | Jurisdiction | `provincia` | contains the jurisdiction name |
//! | Type | `tipo` | contains the requested type |
//! | Number | `numero` | contains the requested number as text |
//! | Year | `anio` | contains the year, or whose first 4-digit number is in range |
//! | Validity | `estado` | matches the in-force / repealed vocabulary |

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::columns::{CanonicalField, FieldMap};
use crate::models::Record;
use crate::text::{contains_folded, fold};

/// Lower bound used when only `anio_hasta` is given.
pub const MIN_YEAR: i32 = 1800;
/// Upper bound used when only `anio_desde` is given.
pub const MAX_YEAR: i32 = 9999;

/// The structured part of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub tipo: Option<String>,
    pub numero: Option<String>,
    pub anio: Option<i32>,
    pub anio_desde: Option<i32>,
    pub anio_hasta: Option<i32>,
    pub vigente: Option<bool>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self == &Filters::default()
    }
}

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
static IN_FORCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vigente|en vigor|activ[oa]").unwrap());
static REPEALED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"no vigente|sin vigencia|derogad|anulad|abrogad|caduc").unwrap());

/// Narrow `records` by `filters`, preserving order.
///
/// `jurisdiction` restricts to records whose `provincia` contains it; `None`
/// or an empty string disables that step.
pub fn apply_filters<'c, I>(
    records: I,
    fields: &FieldMap,
    filters: &Filters,
    jurisdiction: Option<&str>,
) -> Vec<&'c Record>
where
    I: IntoIterator<Item = &'c Record>,
{
    let mut out: Vec<&'c Record> = records.into_iter().collect();

    if let Some(place) = jurisdiction.filter(|j| !j.trim().is_empty()) {
        retain_field(&mut out, fields, CanonicalField::Provincia, |v| {
            contains_folded(v, place)
        });
    }

    if let Some(tipo) = filters.tipo.as_deref() {
        retain_field(&mut out, fields, CanonicalField::Tipo, |v| {
            contains_folded(v, tipo)
        });
    }

    if let Some(numero) = filters.numero.as_deref() {
        retain_field(&mut out, fields, CanonicalField::Numero, |v| {
            contains_folded(v, numero)
        });
    }

    if let Some(anio) = filters.anio {
        let year = anio.to_string();
        retain_field(&mut out, fields, CanonicalField::Anio, |v| v.contains(&year));
    } else if filters.anio_desde.is_some() || filters.anio_hasta.is_some() {
        let lo = filters.anio_desde.unwrap_or(MIN_YEAR);
        let hi = filters.anio_hasta.unwrap_or(MAX_YEAR);
        retain_field(&mut out, fields, CanonicalField::Anio, |v| {
            (lo..=hi).contains(&first_year(v))
        });
    }

    if let Some(vigente) = filters.vigente {
        retain_field(&mut out, fields, CanonicalField::Estado, |v| {
            matches_validity(v, vigente)
        });
    }

    out
}

/// First 4-digit number in a value, or 0 when there is none.
pub fn first_year(value: &str) -> i32 {
    YEAR_RE
        .find(value)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Whether a status value matches the in-force pattern (`vigente = true`)
/// or the repealed pattern (`vigente = false`). The patterns are tested
/// independently, so "No vigente" matches both.
pub fn matches_validity(estado: &str, vigente: bool) -> bool {
    let folded = fold(estado);
    if vigente {
        IN_FORCE_RE.is_match(&folded)
    } else {
        REPEALED_RE.is_match(&folded)
    }
}

/// Keep records whose value for `field` satisfies `pred`. A record with an
/// empty cell fails the predicate; an unresolved field keeps everything.
fn retain_field<F>(records: &mut Vec<&Record>, fields: &FieldMap, field: CanonicalField, pred: F)
where
    F: Fn(&str) -> bool,
{
    if !fields.is_resolved(field) {
        tracing::debug!(%field, "field unresolved, filter skipped");
        return;
    }
    records.retain(|r| fields.value(r, field).map(&pred).unwrap_or(false));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Corpus;

    fn corpus() -> Corpus {
        let columns = ["provincia", "tipo_norma", "numero_norma", "anio", "estado", "sumario"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = vec![
            ["Buenos Aires", "LEY", "14528", "2013", "Vigente", "adopción"],
            ["Buenos Aires", "DECRETO", "2366", "2025", "Vigente", "emergencia"],
            ["Córdoba", "LEY", "10000", "2011", "Vigente", "tránsito"],
            ["BUENOS AIRES", "LEY", "140", "1999", "Derogada", "pesca"],
            ["Buenos Aires", "RESOLUCION", "214", "s/f", "No vigente", "salud"],
        ];
        Corpus::new(
            columns,
            rows.into_iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect()),
        )
    }

    fn numbers(records: &[&Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("numero_norma").unwrap_or_default().to_string())
            .collect()
    }

    fn run(filters: Filters) -> Vec<String> {
        let corpus = corpus();
        let fields = FieldMap::resolve(corpus.columns());
        numbers(&apply_filters(corpus.records(), &fields, &filters, Some("Buenos Aires")))
    }

    #[test]
    fn test_jurisdiction_only() {
        assert_eq!(run(Filters::default()), vec!["14528", "2366", "140", "214"]);
    }

    #[test]
    fn test_jurisdiction_skipped_when_unresolved() {
        let corpus = corpus();
        let columns: Vec<String> = corpus.columns().iter().filter(|c| *c != "provincia").cloned().collect();
        let fields = FieldMap::resolve(&columns);
        let out = apply_filters(corpus.records(), &fields, &Filters::default(), Some("Buenos Aires"));
        assert_eq!(out.len(), corpus.len());
    }

    #[test]
    fn test_tipo_filter_is_accent_insensitive() {
        let filters = Filters {
            tipo: Some("RESOLUCIÓN".into()),
            ..Default::default()
        };
        assert_eq!(run(filters), vec!["214"]);
    }

    #[test]
    fn test_numero_matches_as_substring() {
        let filters = Filters {
            numero: Some("14".into()),
            ..Default::default()
        };
        assert_eq!(run(filters), vec!["14528", "140", "214"]);
    }

    #[test]
    fn test_exact_year() {
        let filters = Filters {
            anio: Some(2025),
            ..Default::default()
        };
        assert_eq!(run(filters), vec!["2366"]);
    }

    #[test]
    fn test_year_takes_precedence_over_range() {
        let filters = Filters {
            anio: Some(1999),
            anio_desde: Some(2010),
            ..Default::default()
        };
        assert_eq!(run(filters), vec!["140"]);
    }

    #[test]
    fn test_year_range_open_ends() {
        let from = Filters {
            anio_desde: Some(2000),
            ..Default::default()
        };
        assert_eq!(run(from), vec!["14528", "2366"]);

        // "s/f" has no year and extracts as 0, below the default lower bound.
        let until = Filters {
            anio_hasta: Some(2013),
            ..Default::default()
        };
        assert_eq!(run(until), vec!["14528", "140"]);
    }

    #[test]
    fn test_validity() {
        let in_force = Filters {
            vigente: Some(true),
            ..Default::default()
        };
        // "No vigente" contains the in-force word and is kept.
        assert_eq!(run(in_force), vec!["14528", "2366", "214"]);

        let repealed = Filters {
            vigente: Some(false),
            ..Default::default()
        };
        assert_eq!(run(repealed), vec!["140", "214"]);
    }

    #[test]
    fn test_adding_filters_never_grows_results() {
        let base = run(Filters::default());
        let one = run(Filters {
            tipo: Some("LEY".into()),
            ..Default::default()
        });
        let two = run(Filters {
            tipo: Some("LEY".into()),
            vigente: Some(true),
            ..Default::default()
        });
        assert!(one.len() <= base.len());
        assert!(two.len() <= one.len());
        assert!(two.iter().all(|n| one.contains(n)));
        assert!(one.iter().all(|n| base.contains(n)));
    }

    #[test]
    fn test_matches_validity() {
        assert!(matches_validity("Vigente", true));
        assert!(matches_validity("En vigor", true));
        assert!(matches_validity("NO VIGENTE", true));
        assert!(matches_validity("NO VIGENTE", false));
        assert!(matches_validity("Derogada implícitamente", false));
        assert!(matches_validity("Caduca", false));
        assert!(!matches_validity("Derogada", true));
        assert!(!matches_validity("Vigente", false));
        assert!(!matches_validity("desconocido", true));
        assert!(!matches_validity("desconocido", false));
    }

    #[test]
    fn test_in_force_keeps_no_vigente_status() {
        let corpus = Corpus::new(
            vec!["estado".to_string()],
            vec![vec!["No vigente".to_string()], vec!["Vigente".to_string()]],
        );
        let fields = FieldMap::resolve(corpus.columns());
        let filters = Filters {
            vigente: Some(true),
            ..Default::default()
        };
        let out = apply_filters(corpus.records(), &fields, &filters, None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_first_year() {
        assert_eq!(first_year("Año 2013"), 2013);
        assert_eq!(first_year("12/05/1998"), 1998);
        assert_eq!(first_year("s/f"), 0);
    }
}
