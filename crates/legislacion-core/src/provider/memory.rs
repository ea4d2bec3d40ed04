//! In-memory [`CorpusProvider`] for tests and embedding.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Corpus;

use super::CorpusProvider;

/// Serves a fixed corpus, or always fails when built with
/// [`InMemoryProvider::unavailable`].
pub struct InMemoryProvider {
    corpus: Option<Corpus>,
    reason: String,
    loads: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            corpus: Some(corpus),
            reason: String::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// A provider whose every load fails with an acquisition error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            corpus: None,
            reason: reason.into(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of times [`CorpusProvider::load`] has been called.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CorpusProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> Result<Corpus> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.corpus
            .clone()
            .ok_or_else(|| Error::Acquisition(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_fixed_corpus() {
        let corpus = Corpus::new(
            vec!["sumario".to_string()],
            vec![vec!["Régimen de adopción".to_string()]],
        );
        let provider = InMemoryProvider::new(corpus);
        let loaded = provider.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(provider.load_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_is_acquisition_failure() {
        let provider = InMemoryProvider::unavailable("portal down");
        let err = provider.load().await.unwrap_err();
        assert!(err.is_acquisition());
        assert_eq!(err.to_string(), "Acquisition failed: portal down");
    }
}
