//! Corpus acquisition abstraction.
//!
//! The [`CorpusProvider`] trait is the only seam between the core and the
//! outside world. Implementations fetch, cache and parse the dataset; the
//! core only ever sees the resulting [`Corpus`].
//!
//! Callers load at most once per session and share the corpus read-only.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Corpus;

pub use memory::InMemoryProvider;

/// A source of the legal-norm corpus.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use legislacion_core::provider::CorpusProvider;
/// use legislacion_core::{Corpus, Result};
///
/// pub struct EmptyProvider;
///
/// #[async_trait]
/// impl CorpusProvider for EmptyProvider {
///     fn name(&self) -> &str { "empty" }
///
///     async fn load(&self) -> Result<Corpus> {
///         Ok(Corpus::new(vec!["sumario".to_string()], Vec::<Vec<String>>::new()))
///     }
/// }
/// ```
#[async_trait]
pub trait CorpusProvider: Send + Sync {
    /// Short label for logs and status output.
    fn name(&self) -> &str;

    /// Produce the full corpus.
    ///
    /// Fails with [`Error::Acquisition`](crate::Error::Acquisition) when no
    /// usable source is available.
    async fn load(&self) -> Result<Corpus>;
}
