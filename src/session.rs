//! Conversation session over a lazily loaded corpus.
//!
//! A [`Session`] owns a [`CorpusProvider`] and acquires the corpus on first
//! use and shares it read-only across requests. The rows of the most recent
//! result set form the *working set*, which the CLI's follow-up
//! [`Session::detail`] and [`Session::compare_indices`] address by 1-based
//! position. [`Session::ask`] and [`Session::search_and_compare`] only ever
//! read their own result set, so overlapping requests stay isolated.

use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use legislacion_core::provider::CorpusProvider;
use legislacion_core::rank::RankMode;
use legislacion_core::search::{search_with_fields, ProjectedRecord};
use legislacion_core::{
    compare, parse_intent, Action, ComparisonReport, Corpus, FieldMap, QueryIntent, Record,
    ResultSet, SearchParams,
};

/// Corpus plus its resolved field map.
pub struct Loaded {
    pub corpus: Arc<Corpus>,
    pub fields: FieldMap,
}

/// Owned outcome of one search, detached from the corpus borrow.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub intent: QueryIntent,
    pub mode: RankMode,
    pub total_matches: usize,
    pub results: Vec<ProjectedRecord>,
}

/// Comparison between two records of the working set.
#[derive(Debug, Clone, Serialize)]
pub struct CompareOutcome {
    pub a: ProjectedRecord,
    pub b: ProjectedRecord,
    pub report: ComparisonReport,
}

/// Reply to a free-text request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Answer {
    Search(SearchOutcome),
    Compare {
        search: SearchOutcome,
        /// `None` when fewer than two records matched.
        comparison: Option<CompareOutcome>,
    },
}

pub struct Session {
    provider: Arc<dyn CorpusProvider>,
    params: SearchParams,
    loaded: OnceCell<Loaded>,
    working_set: Mutex<Vec<usize>>,
}

impl Session {
    pub fn new(provider: Arc<dyn CorpusProvider>, params: SearchParams) -> Self {
        Self {
            provider,
            params,
            loaded: OnceCell::new(),
            working_set: Mutex::new(Vec::new()),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// The corpus, acquired on first call. A failed acquisition is not
    /// cached, so the next call retries.
    pub async fn load(&self) -> Result<&Loaded> {
        let loaded = self
            .loaded
            .get_or_try_init(|| async {
                tracing::info!(provider = self.provider.name(), "loading corpus");
                let corpus = self.provider.load().await?;
                let fields = FieldMap::resolve(corpus.columns());
                tracing::info!(
                    records = corpus.len(),
                    resolved = fields.iter().count(),
                    "corpus loaded"
                );
                Ok::<_, legislacion_core::Error>(Loaded {
                    corpus: Arc::new(corpus),
                    fields,
                })
            })
            .await?;
        Ok(loaded)
    }

    /// Run a parsed intent and make its results the working set.
    pub async fn search(&self, intent: &QueryIntent) -> Result<SearchOutcome> {
        let loaded = self.load().await?;
        let results = search_with_fields(&loaded.corpus, &loaded.fields, intent, &self.params);

        self.set_working_set(results.rows());
        Ok(outcome(intent, &results))
    }

    /// Run a parsed intent and compare results `a` and `b` (1-based) of that
    /// same result set. The working set is updated but never read back, so
    /// concurrent callers cannot observe each other's results.
    pub async fn search_and_compare(
        &self,
        intent: &QueryIntent,
        a: usize,
        b: usize,
    ) -> Result<(SearchOutcome, CompareOutcome)> {
        let loaded = self.load().await?;
        let results = search_with_fields(&loaded.corpus, &loaded.fields, intent, &self.params);

        let pick = |index: usize| {
            index
                .checked_sub(1)
                .and_then(|i| results.get(i))
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "result {} not found, the query returned {} results",
                        index,
                        results.len()
                    )
                })
        };
        let comparison = compare_records(pick(a)?, pick(b)?, &loaded.fields);

        self.set_working_set(results.rows());
        Ok((outcome(intent, &results), comparison))
    }

    /// Parse free text and act on it. A compare request compares the top two
    /// hits of its own search.
    pub async fn ask(&self, text: &str) -> Result<Answer> {
        let intent = parse_intent(text);
        let loaded = self.load().await?;
        let results = search_with_fields(&loaded.corpus, &loaded.fields, &intent, &self.params);
        self.set_working_set(results.rows());

        let search = outcome(&intent, &results);
        match intent.action {
            Action::Search => Ok(Answer::Search(search)),
            Action::Compare => {
                let comparison = match (results.get(0), results.get(1)) {
                    (Some(a), Some(b)) => Some(compare_records(a, b, &loaded.fields)),
                    _ => None,
                };
                Ok(Answer::Compare { search, comparison })
            }
        }
    }

    /// Record at 1-based position `index` of the working set.
    pub async fn detail(&self, index: usize) -> Result<ProjectedRecord> {
        let loaded = self.load().await?;
        let row = self.working_row(index)?;
        let record = loaded
            .corpus
            .get(row)
            .ok_or_else(|| anyhow::anyhow!("record {} not found in corpus", row))?;
        Ok(ProjectedRecord::new(record, &loaded.fields, None))
    }

    /// Compare two records of the working set by 1-based position.
    pub async fn compare_indices(&self, a: usize, b: usize) -> Result<CompareOutcome> {
        let loaded = self.load().await?;
        let (row_a, row_b) = (self.working_row(a)?, self.working_row(b)?);

        let (Some(record_a), Some(record_b)) = (loaded.corpus.get(row_a), loaded.corpus.get(row_b))
        else {
            bail!("records {} and {} not found in corpus", row_a, row_b);
        };

        Ok(compare_records(record_a, record_b, &loaded.fields))
    }

    /// Number of records in the working set.
    pub fn working_set_len(&self) -> usize {
        self.lock_working_set().len()
    }

    fn set_working_set(&self, rows: Vec<usize>) {
        *self.lock_working_set() = rows;
    }

    fn working_row(&self, index: usize) -> Result<usize> {
        let rows = self.lock_working_set();
        if rows.is_empty() {
            bail!("no results in the working set, run a search first");
        }
        match index.checked_sub(1).and_then(|i| rows.get(i)) {
            Some(row) => Ok(*row),
            None => bail!(
                "result {} not found, the working set has {} results",
                index,
                rows.len()
            ),
        }
    }

    fn lock_working_set(&self) -> std::sync::MutexGuard<'_, Vec<usize>> {
        self.working_set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn outcome(intent: &QueryIntent, results: &ResultSet<'_>) -> SearchOutcome {
    SearchOutcome {
        intent: intent.clone(),
        mode: results.mode,
        total_matches: results.total_matches,
        results: results.project(),
    }
}

fn compare_records(a: &Record, b: &Record, fields: &FieldMap) -> CompareOutcome {
    CompareOutcome {
        a: ProjectedRecord::new(a, fields, None),
        b: ProjectedRecord::new(b, fields, None),
        report: compare(a, b, fields),
    }
}
