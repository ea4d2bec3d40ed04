//! Natural-language intent parsing.
//!
//! Turns a raw Spanish query into a [`QueryIntent`]. Parsing never fails:
//! anything not recognised stays in the free-text remainder `q`.
//!
//! # Rules
//!
//! Matchers run in this order over a working copy of the input. Spans
//! consumed by a matcher are blanked so later matchers cannot see them;
//! whatever survives is the free text.
//!
//! | Order | Pattern | Sets | Consumed |
//! |-------|---------|------|----------|
//! | 0 | `tipo:LEY`, `vigente:true`, `limit:10`, ... | the named field | yes |
//! | 1 | `compara`, `versus`, `vs`, `diferencias entre` | `action` | no |
//! | 2 | `ley 14528`, `decreto 2366/2025` | `tipo`, `numero`, `anio` | yes |
//! | 3 | `ley`, `decretos`, `res.` | `tipo` (last wins) | no |
//! | 4 | `vigente` / `derogada`, `no vigente`, ... | `vigente` (negative wins) | yes |
//! | 5 | `desde 2010`, `hasta 2015`, `2010 a 2015` | `anio_desde`, `anio_hasta` | yes |
//! | 5 | `año 2020` | `anio` | no |
//! | 6 | `limite: 20` | `limit` (unclamped) | yes |

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filter::Filters;
use crate::text::{collapse_whitespace, fold};

/// What the caller should do with the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Search,
    Compare,
}

/// The structured interpretation of a free-text query.
///
/// If `anio` is set it takes precedence over `anio_desde`/`anio_hasta`
/// when filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryIntent {
    /// Free-text remainder used for relevance ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anio: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anio_desde: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anio_hasta: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vigente: Option<bool>,
    /// Requested result count, exactly as typed. Clamped by the search layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    pub action: Action,
}

impl QueryIntent {
    /// The structured filter subset of this intent.
    pub fn filters(&self) -> Filters {
        Filters {
            tipo: self.tipo.clone(),
            numero: self.numero.clone(),
            anio: self.anio,
            anio_desde: self.anio_desde,
            anio_hasta: self.anio_hasta,
            vigente: self.vigente,
        }
    }
}

static KEY_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(tipo|n[uú]mero|anio|año|desde|hasta|vigente|limit|l[ií]mite):\s*(\S+)")
        .unwrap()
});
static COMPARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:compar\w*|versus|vs|diferencias?\s+entre)\b").unwrap()
});
static TYPE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\bleyes|\bley|\bdecretos|\bdecreto|\bresoluciones|\bresoluci[oó]n|\bres\.)[\s:]*(?:(?:n[°º]|nro\.?|n\.)\s*)?(\d+)(?:/(\d{4}))?\b",
    )
    .unwrap()
});
static TYPE_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:leyes|ley|decretos|decreto|resoluciones|resoluci[oó]n)\b|\bres\.")
        .unwrap()
});
static VIGENTE_TRUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:vigentes?|en\s+vigor|activas?|activos?)\b").unwrap()
});
static VIGENTE_FALSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:no\s+vigentes?|sin\s+vigencia|derogad[ao]s?|anulad[ao]s?|abrogad[ao]s?|caducad[ao]s?|caduc[ao]s?|expirad[ao]s?)\b",
    )
    .unwrap()
});
static DESDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdesde\s+(?:el\s+)?(?:(?:año|anio)\s+)?(\d{4})\b").unwrap()
});
static HASTA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bhasta\s+(?:el\s+)?(?:(?:año|anio)\s+)?(\d{4})\b").unwrap()
});
static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{4})\s*(?:-|\ba\b|\bal\b|\bhasta\b)\s*(\d{4})\b").unwrap()
});
static ANIO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:año|anio)\s+(\d{4})\b").unwrap());
static LIMIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:limit|l[ií]mite)\s*:?\s*(\d{1,2})\b").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

/// Parse a raw query into a [`QueryIntent`].
pub fn parse_intent(raw: &str) -> QueryIntent {
    let mut intent = QueryIntent::default();
    let mut scan = Scanner::new(raw);

    parse_key_values(&mut scan, &mut intent);

    if COMPARE_RE.is_match(&scan.text) {
        intent.action = Action::Compare;
    }

    let typed = scan.captures(&TYPE_NUMBER_RE);
    for hit in &typed {
        if let Some(tipo) = hit.group(1).and_then(canonical_tipo) {
            intent.tipo = Some(tipo.to_string());
        }
        intent.numero = hit.group(2).map(str::to_string);
        if let Some(year) = hit.group(3).and_then(|y| y.parse().ok()) {
            intent.anio = Some(year);
        }
    }
    scan.blank(typed.iter().map(|h| h.span.clone()));

    for m in TYPE_WORD_RE.find_iter(&scan.text) {
        if let Some(tipo) = canonical_tipo(m.as_str()) {
            intent.tipo = Some(tipo.to_string());
        }
    }

    // Both cue classes are matched on the same text: "no vigente" contains
    // "vigente", and the negative class is applied last.
    let in_force = scan.spans(&VIGENTE_TRUE_RE);
    let repealed = scan.spans(&VIGENTE_FALSE_RE);
    if !in_force.is_empty() {
        intent.vigente = Some(true);
    }
    if !repealed.is_empty() {
        intent.vigente = Some(false);
    }
    scan.blank(in_force.into_iter().chain(repealed));

    let desde = scan.captures(&DESDE_RE);
    let hasta = scan.captures(&HASTA_RE);
    let range = scan.captures(&RANGE_RE);
    for hit in &desde {
        intent.anio_desde = hit.year(1);
    }
    for hit in &hasta {
        intent.anio_hasta = hit.year(1);
    }
    for hit in &range {
        intent.anio_desde = hit.year(1);
        intent.anio_hasta = hit.year(2);
    }
    scan.blank(
        desde
            .iter()
            .chain(hasta.iter())
            .chain(range.iter())
            .map(|h| h.span.clone()),
    );

    for hit in scan.captures(&ANIO_RE) {
        if let Some(year) = hit.year(1) {
            intent.anio = Some(year);
        }
    }

    let limits = scan.captures(&LIMIT_RE);
    for hit in &limits {
        if let Some(n) = hit.group(1).and_then(|n| n.parse().ok()) {
            intent.limit = Some(n);
        }
    }
    scan.blank(limits.iter().map(|h| h.span.clone()));

    let rest = collapse_whitespace(&scan.text);
    intent.q = if rest.is_empty() { None } else { Some(rest) };

    tracing::debug!(?intent, "parsed query intent");
    intent
}

/// Map a type word to its canonical uppercase label.
///
/// `ley`/`leyes` → `LEY`, `decreto(s)` → `DECRETO`,
/// `resolución`/`resolucion`/`res.` → `RESOLUCIÓN`.
pub fn canonical_tipo(word: &str) -> Option<&'static str> {
    match fold(word.trim()).trim_end_matches('.') {
        "ley" | "leyes" => Some("LEY"),
        "decreto" | "decretos" => Some("DECRETO"),
        "resolucion" | "resoluciones" | "res" => Some("RESOLUCIÓN"),
        _ => None,
    }
}

/// Structured `key:value` filters. Consumed even when the value is invalid.
fn parse_key_values(scan: &mut Scanner, intent: &mut QueryIntent) {
    let hits = scan.captures(&KEY_VALUE_RE);
    for hit in &hits {
        let (Some(key), Some(value)) = (hit.group(1), hit.group(2)) else {
            continue;
        };
        // "tipo:LEY," or "vigente:true." in running text
        let value = value.trim_matches(|c: char| !c.is_alphanumeric());
        if value.is_empty() {
            continue;
        }
        match fold(key).as_str() {
            "tipo" => {
                intent.tipo = Some(
                    canonical_tipo(value)
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_uppercase()),
                );
            }
            "numero" => intent.numero = Some(value.to_string()),
            "anio" | "ano" => intent.anio = first_year(value),
            "desde" => intent.anio_desde = first_year(value),
            "hasta" => intent.anio_hasta = first_year(value),
            "vigente" => {
                intent.vigente = match fold(value).as_str() {
                    "true" | "si" | "1" | "yes" => Some(true),
                    "false" | "no" | "0" => Some(false),
                    _ => intent.vigente,
                }
            }
            "limit" | "limite" => {
                if let Ok(n) = value.parse() {
                    intent.limit = Some(n);
                }
            }
            _ => {}
        }
    }
    scan.blank(hits.iter().map(|h| h.span.clone()));
}

fn first_year(s: &str) -> Option<i32> {
    YEAR_RE.find(s).and_then(|m| m.as_str().parse().ok())
}

/// A regex match with owned capture groups.
struct Hit {
    span: Range<usize>,
    groups: Vec<Option<String>>,
}

impl Hit {
    fn group(&self, i: usize) -> Option<&str> {
        self.groups.get(i).and_then(|g| g.as_deref())
    }

    fn year(&self, i: usize) -> Option<i32> {
        self.group(i).and_then(|y| y.parse().ok())
    }
}

/// Working copy of the input. Blanking replaces bytes with spaces, so byte
/// offsets stay valid across matchers run on the same text.
struct Scanner {
    text: String,
}

impl Scanner {
    fn new(raw: &str) -> Self {
        Self {
            text: raw.to_string(),
        }
    }

    fn spans(&self, re: &Regex) -> Vec<Range<usize>> {
        re.find_iter(&self.text).map(|m| m.range()).collect()
    }

    fn captures(&self, re: &Regex) -> Vec<Hit> {
        re.captures_iter(&self.text)
            .filter_map(|caps| {
                let span = caps.get(0)?.range();
                let groups = caps
                    .iter()
                    .map(|g| g.map(|m| m.as_str().to_string()))
                    .collect();
                Some(Hit { span, groups })
            })
            .collect()
    }

    fn blank(&mut self, spans: impl IntoIterator<Item = Range<usize>>) {
        for span in spans {
            let filler = " ".repeat(span.len());
            self.text.replace_range(span, &filler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_and_number() {
        let intent = parse_intent("ley 14528");
        assert_eq!(intent.tipo.as_deref(), Some("LEY"));
        assert_eq!(intent.numero.as_deref(), Some("14528"));
        assert_eq!(intent.anio, None);
        assert_eq!(intent.q, None);
        assert_eq!(intent.action, Action::Search);
    }

    #[test]
    fn test_type_number_and_year() {
        let intent = parse_intent("decreto 2366/2025 sobre emergencia");
        assert_eq!(intent.tipo.as_deref(), Some("DECRETO"));
        assert_eq!(intent.numero.as_deref(), Some("2366"));
        assert_eq!(intent.anio, Some(2025));
        assert_eq!(intent.q.as_deref(), Some("sobre emergencia"));
    }

    #[test]
    fn test_resolution_aliases() {
        for text in ["resolución 12", "Resolucion 12", "res. 12"] {
            let intent = parse_intent(text);
            assert_eq!(intent.tipo.as_deref(), Some("RESOLUCIÓN"), "input: {}", text);
            assert_eq!(intent.numero.as_deref(), Some("12"), "input: {}", text);
            assert_eq!(intent.q, None, "input: {}", text);
        }
    }

    #[test]
    fn test_standalone_type_word_last_wins_and_stays_in_text() {
        let intent = parse_intent("ley o decreto de tránsito");
        assert_eq!(intent.tipo.as_deref(), Some("DECRETO"));
        assert_eq!(intent.numero, None);
        assert_eq!(intent.q.as_deref(), Some("ley o decreto de tránsito"));
    }

    #[test]
    fn test_standalone_type_overrides_numbered_type() {
        let intent = parse_intent("decreto 100 y la ley");
        assert_eq!(intent.tipo.as_deref(), Some("LEY"));
        assert_eq!(intent.numero.as_deref(), Some("100"));
    }

    #[test]
    fn test_validity_cues() {
        assert_eq!(parse_intent("leyes vigentes de salud").vigente, Some(true));
        assert_eq!(parse_intent("decretos derogados").vigente, Some(false));
        assert_eq!(parse_intent("normas abrogadas").vigente, Some(false));
        assert_eq!(parse_intent("educación").vigente, None);
    }

    #[test]
    fn test_negative_validity_cue_wins() {
        let intent = parse_intent("vigente o derogada");
        assert_eq!(intent.vigente, Some(false));
        let intent = parse_intent("ley no vigente de pesca");
        assert_eq!(intent.vigente, Some(false));
        assert_eq!(intent.q.as_deref(), Some("ley de pesca"));
    }

    #[test]
    fn test_year_range_cues() {
        let intent = parse_intent("salud desde 2010 hasta 2015");
        assert_eq!(intent.anio_desde, Some(2010));
        assert_eq!(intent.anio_hasta, Some(2015));
        assert_eq!(intent.q.as_deref(), Some("salud"));

        let intent = parse_intent("educación 1990 a 1995");
        assert_eq!(intent.anio_desde, Some(1990));
        assert_eq!(intent.anio_hasta, Some(1995));
        assert_eq!(intent.q.as_deref(), Some("educación"));

        let intent = parse_intent("pesca 2001-2003");
        assert_eq!(intent.anio_desde, Some(2001));
        assert_eq!(intent.anio_hasta, Some(2003));
    }

    #[test]
    fn test_bare_range_overrides_desde_hasta() {
        let intent = parse_intent("desde 2000 salud 2010 al 2012");
        assert_eq!(intent.anio_desde, Some(2010));
        assert_eq!(intent.anio_hasta, Some(2012));
    }

    #[test]
    fn test_standalone_year() {
        let intent = parse_intent("leyes del año 2020");
        assert_eq!(intent.anio, Some(2020));
        assert_eq!(intent.anio_desde, None);
    }

    #[test]
    fn test_limit_cue_is_unclamped() {
        let intent = parse_intent("ambiente límite: 99");
        assert_eq!(intent.limit, Some(99));
        assert_eq!(intent.q.as_deref(), Some("ambiente"));

        let intent = parse_intent("ambiente limit:3");
        assert_eq!(intent.limit, Some(3));
    }

    #[test]
    fn test_compare_action() {
        assert_eq!(
            parse_intent("comparar ley 14528 con ley 15464").action,
            Action::Compare
        );
        assert_eq!(parse_intent("adopción vs tutela").action, Action::Compare);
        assert_eq!(parse_intent("adopción").action, Action::Search);
    }

    #[test]
    fn test_structured_variant() {
        let intent = parse_intent("seguridad pública tipo:LEY vigente:true limit:10");
        assert_eq!(intent.q.as_deref(), Some("seguridad pública"));
        assert_eq!(intent.tipo.as_deref(), Some("LEY"));
        assert_eq!(intent.vigente, Some(true));
        assert_eq!(intent.limit, Some(10));
    }

    #[test]
    fn test_structured_years_and_unknown_type() {
        let intent = parse_intent("tipo:ordenanza desde:2001 hasta:2004 numero:77 vigente:no");
        assert_eq!(intent.tipo.as_deref(), Some("ORDENANZA"));
        assert_eq!(intent.anio_desde, Some(2001));
        assert_eq!(intent.anio_hasta, Some(2004));
        assert_eq!(intent.numero.as_deref(), Some("77"));
        assert_eq!(intent.vigente, Some(false));
        assert_eq!(intent.q, None);
    }

    #[test]
    fn test_structured_values_drop_surrounding_punctuation() {
        let intent = parse_intent("tipo:LEY, numero:14528; vigente:true. limit:5)");
        assert_eq!(intent.tipo.as_deref(), Some("LEY"));
        assert_eq!(intent.numero.as_deref(), Some("14528"));
        assert_eq!(intent.vigente, Some(true));
        assert_eq!(intent.limit, Some(5));
        assert_eq!(intent.q, None);

        assert_eq!(parse_intent("tipo:\"res.\"").tipo.as_deref(), Some("RESOLUCIÓN"));
    }

    #[test]
    fn test_unrecognised_input_is_free_text() {
        let intent = parse_intent("  protección   de humedales ");
        assert_eq!(
            intent,
            QueryIntent {
                q: Some("protección de humedales".to_string()),
                ..Default::default()
            }
        );
        assert_eq!(parse_intent(""), QueryIntent::default());
        assert_eq!(parse_intent("   "), QueryIntent::default());
    }

    #[test]
    fn test_number_match_is_stripped_from_text() {
        for (text, rest) in [
            ("régimen ley 14528 adopción", "régimen adopción"),
            ("decreto 2366/2025", ""),
            ("ver res. 45/2019 anexos", "ver anexos"),
        ] {
            let intent = parse_intent(text);
            assert_eq!(intent.q.as_deref().unwrap_or(""), rest, "input: {}", text);
        }
    }

    #[test]
    fn test_intent_deserializes_partial_json() {
        let intent: QueryIntent =
            serde_json::from_str(r#"{"q": "salud", "vigente": true}"#).unwrap();
        assert_eq!(intent.q.as_deref(), Some("salud"));
        assert_eq!(intent.vigente, Some(true));
        assert_eq!(intent.action, Action::Search);
    }
}
