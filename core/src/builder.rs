use crate::error::{Result, SearchError};
use crate::index::{DocId, Document, InvertedIndex, FIRST_DOC_ID};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

/// A harvested page as handed over by the crawler. The text is dropped once indexed.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,
    pub source_path: String,
    pub title: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(url: impl Into<String>, source_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self { url: url.into(), source_path: source_path.into(), title: String::new(), text: text.into() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Accumulates postings one document at a time.
pub struct IndexBuilder {
    tokenizer: Tokenizer,
    next_doc_id: DocId,
    documents: BTreeMap<DocId, Document>,
    postings: HashMap<String, Vec<DocId>>,
    started: Instant,
}

impl IndexBuilder {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(config),
            next_doc_id: FIRST_DOC_ID,
            documents: BTreeMap::new(),
            postings: HashMap::new(),
            started: Instant::now(),
        }
    }

    pub fn add_document(&mut self, doc: RawDocument) -> DocId {
        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;

        let mut seen_in_doc: HashSet<String> = HashSet::new();
        for term in self.tokenizer.terms(&doc.text) {
            if seen_in_doc.contains(&term) {
                continue;
            }
            self.postings.entry(term.clone()).or_default().push(doc_id);
            seen_in_doc.insert(term);
        }
        tracing::trace!(doc_id, url = %doc.url, terms = seen_in_doc.len(), "indexed document");

        self.documents.insert(
            doc_id,
            Document { id: doc_id, url: doc.url, source_path: doc.source_path, title: doc.title },
        );
        doc_id
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn finish(self) -> Result<InvertedIndex> {
        if self.documents.is_empty() {
            return Err(SearchError::EmptyCorpus);
        }
        let postings: BTreeMap<String, Vec<DocId>> = self
            .postings
            .into_iter()
            .map(|(term, mut list)| {
                list.sort_unstable();
                list.dedup();
                (term, list)
            })
            .collect();
        let doc_count = self.documents.len() as u32;
        let index = InvertedIndex::from_parts(self.tokenizer.config().clone(), self.documents, postings, doc_count)?;

        let stats = index.stats();
        tracing::info!(
            num_docs = stats.num_docs,
            num_terms = stats.num_terms,
            num_postings = stats.num_postings,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "index build complete"
        );
        Ok(index)
    }
}

/// Build an index from documents in input order; ids are assigned from 1.
pub fn build<I>(documents: I, config: TokenizerConfig) -> Result<InvertedIndex>
where
    I: IntoIterator<Item = RawDocument>,
{
    let mut builder = IndexBuilder::new(config);
    for doc in documents {
        builder.add_document(doc);
    }
    builder.finish()
}
