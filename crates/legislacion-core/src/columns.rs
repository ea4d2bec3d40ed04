//! Column resolution: raw dataset headers → canonical semantic fields.
//!
//! Dataset snapshots name their columns inconsistently (`tipo_norma`,
//! `Tipo`, `tipo de norma`, ...). Every downstream step reads fields through
//! a [`FieldMap`] and skips itself when the field it needs is unresolved.
//!
//! # Algorithm
//!
//! For each [`CanonicalField`], with names compared lowercased and
//! accent-folded:
//!
//! 1. **Exact**: the first alias (priority order) equal to some column wins.
//! 2. **Substring**: otherwise the first column (column order) containing
//!    any alias as whole name segments wins. Segments are separated by any
//!    non-alphanumeric character, so `ano` matches `ano_sancion` but not
//!    `organo_emisor`.
//! 3. Otherwise the field is unresolved.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::Record;
use crate::text::fold;

/// The fixed set of semantic attributes a record may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalField {
    Provincia,
    Tipo,
    Numero,
    Anio,
    Fecha,
    Sumario,
    Estado,
    Url,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::Provincia,
        CanonicalField::Tipo,
        CanonicalField::Numero,
        CanonicalField::Anio,
        CanonicalField::Fecha,
        CanonicalField::Sumario,
        CanonicalField::Estado,
        CanonicalField::Url,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Provincia => "provincia",
            Self::Tipo => "tipo",
            Self::Numero => "numero",
            Self::Anio => "anio",
            Self::Fecha => "fecha",
            Self::Sumario => "sumario",
            Self::Estado => "estado",
            Self::Url => "url",
        }
    }

    /// Known raw column names, highest priority first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Provincia => &[
                "provincia",
                "jurisdiccion",
                "provincia_nombre",
                "jurisdiccion_nombre",
            ],
            Self::Tipo => &[
                "tipo_norma",
                "tipo",
                "tipo de norma",
                "clase_norma",
                "tipo_documento",
            ],
            Self::Numero => &[
                "numero_norma",
                "numero",
                "nro_norma",
                "nro",
                "norma_numero",
            ],
            Self::Anio => &["anio", "año", "anio_norma", "year"],
            Self::Fecha => &[
                "fecha_sancion",
                "fecha",
                "fecha_publicacion",
                "fecha_norma",
                "fecha_boletin",
            ],
            Self::Sumario => &[
                "sumario",
                "resumen",
                "descripcion",
                "sintesis",
                "titulo",
            ],
            Self::Estado => &["estado", "vigencia", "estado_vigencia", "situacion"],
            Self::Url => &["url", "link", "enlace", "url_norma"],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical field → raw column resolved for one corpus.
///
/// Every resolved value is a column that exists in the corpus the map was
/// built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    resolved: BTreeMap<CanonicalField, String>,
}

impl FieldMap {
    /// Resolve every canonical field against a corpus header.
    pub fn resolve(columns: &[String]) -> Self {
        let resolved = CanonicalField::ALL
            .iter()
            .filter_map(|&field| resolve_column(columns, field.aliases()).map(|c| (field, c)))
            .collect();
        Self { resolved }
    }

    /// Raw column for a field, if resolved.
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.resolved.get(&field).map(String::as_str)
    }

    pub fn is_resolved(&self, field: CanonicalField) -> bool {
        self.resolved.contains_key(&field)
    }

    /// A record's value for a canonical field. `None` when the field is
    /// unresolved or the cell is empty.
    pub fn value<'r>(&self, record: &'r Record, field: CanonicalField) -> Option<&'r str> {
        self.get(field).and_then(|column| record.get(column))
    }

    /// Resolved `(field, column)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.resolved.iter().map(|(f, c)| (*f, c.as_str()))
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CanonicalField::ALL.len()))?;
        for field in CanonicalField::ALL {
            map.serialize_entry(field.name(), &self.get(field))?;
        }
        map.end()
    }
}

/// Two-pass alias match; see the module docs.
pub fn resolve_column(columns: &[String], aliases: &[&str]) -> Option<String> {
    let folded: Vec<String> = columns.iter().map(|c| fold(c.trim())).collect();
    let aliases: Vec<String> = aliases.iter().map(|a| fold(a)).collect();

    for alias in &aliases {
        if let Some(idx) = folded.iter().position(|c| c == alias) {
            return Some(columns[idx].clone());
        }
    }

    folded
        .iter()
        .position(|c| aliases.iter().any(|a| contains_segment(c, a)))
        .map(|idx| columns[idx].clone())
}

/// `haystack` contains `needle` bounded by the ends or non-alphanumerics.
fn contains_segment(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
