pub mod http;

use search_core::{evaluate, parse, store, DocId, InvertedIndex, QueryExpr, Result, SearchError, Tokenizer};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub url: String,
    pub source_path: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub query: String,
    /// Matching documents, ascending.
    pub doc_ids: Vec<DocId>,
}

/// Outcome of one line of a batch file. A malformed line fails on its own.
#[derive(Debug)]
pub struct BatchEntry {
    pub line: usize,
    pub query: String,
    pub outcome: Result<SearchResult>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }
}

/// Answers boolean queries against one loaded index. The index is shared
/// read-only, so a `Retriever` can serve any number of threads at once.
#[derive(Debug)]
pub struct Retriever {
    index: Arc<InvertedIndex>,
    tokenizer: Tokenizer,
}

impl Retriever {
    pub fn new(index: InvertedIndex) -> Self {
        Self::from_shared(Arc::new(index))
    }

    pub fn from_shared(index: Arc<InvertedIndex>) -> Self {
        // Queries must be normalized exactly as the documents were.
        let tokenizer = Tokenizer::new(index.tokenizer_config().clone());
        Self { index, tokenizer }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(store::load(path)?))
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn parse(&self, query: &str) -> Result<QueryExpr> {
        parse(query, &self.tokenizer)
    }

    pub fn evaluate(&self, expr: &QueryExpr) -> Vec<DocId> {
        evaluate(&self.index, expr)
    }

    pub fn search(&self, query: &str) -> Result<SearchResult> {
        let expr = self.parse(query)?;
        let doc_ids = self.evaluate(&expr);
        tracing::debug!(query, parsed = %expr, hits = doc_ids.len(), "query evaluated");
        Ok(SearchResult { query: query.to_string(), doc_ids })
    }

    /// Resolve doc ids to their stored metadata, keeping the input order.
    pub fn resolve(&self, ids: &[DocId]) -> Vec<Hit> {
        ids.iter()
            .filter_map(|id| self.index.document(*id))
            .map(|doc| Hit {
                doc_id: doc.id,
                url: doc.url.clone(),
                source_path: doc.source_path.clone(),
                title: doc.title.clone(),
            })
            .collect()
    }

    /// Evaluate each non-blank line as an independent query.
    pub fn search_batch<'a, I>(&self, lines: I) -> BatchReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let start = Instant::now();
        let mut entries = Vec::new();
        for (i, raw) in lines.into_iter().enumerate() {
            let query = raw.trim();
            if query.is_empty() {
                continue;
            }
            let outcome = self.search(query);
            if let Err(e) = &outcome {
                tracing::warn!(line = i + 1, query, error = %e, "query failed");
            }
            entries.push(BatchEntry { line: i + 1, query: query.to_string(), outcome });
        }
        let report = BatchReport { entries, elapsed: start.elapsed() };
        tracing::info!(
            queries = report.entries.len(),
            failures = report.failures(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch complete"
        );
        report
    }

    /// Run a batch file with one query per line.
    pub fn search_file(&self, path: impl AsRef<Path>) -> Result<BatchReport> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| SearchError::IoRead { path: path.to_path_buf(), source })?;
        let text: Cow<'_, str> = String::from_utf8_lossy(&bytes);
        Ok(self.search_batch(text.lines()))
    }
}
