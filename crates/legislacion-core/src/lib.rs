//! # Legislación PBA Core
//!
//! Pure query-understanding and ranking logic for the provincial legal-norm
//! corpus: data models, column resolution, intent parsing, filtering,
//! ranking, comparison and the corpus provider trait.
//!
//! This crate performs no filesystem or network I/O. Acquisition lives
//! behind [`provider::CorpusProvider`], implemented by the application.
//!
//! ```text
//! raw text ──▶ intent ──▶ filter ──▶ rank ──▶ ResultSet
//!                            ▲          ▲
//!                            └─ columns ┘
//! ```

pub mod columns;
pub mod compare;
pub mod error;
pub mod filter;
pub mod fuzzy;
pub mod intent;
pub mod models;
pub mod provider;
pub mod rank;
pub mod search;
pub mod text;

pub use columns::{CanonicalField, FieldMap};
pub use compare::{compare, ComparisonReport};
pub use error::{Error, Result};
pub use intent::{parse_intent, Action, QueryIntent};
pub use models::{Corpus, Record};
pub use search::{search, ResultSet, SearchParams};
