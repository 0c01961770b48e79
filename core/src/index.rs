use crate::error::{Result, SearchError};
use crate::tokenizer::TokenizerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type DocId = u32;

/// Doc ids are dense and start here.
pub const FIRST_DOC_ID: DocId = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub source_path: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub num_docs: u32,
    pub num_terms: usize,
    pub num_postings: usize,
}

/// Immutable inverted index. Built by [`crate::builder::IndexBuilder`] or
/// loaded by [`crate::store::load`]; both paths go through [`InvertedIndex::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvertedIndex {
    tokenizer: TokenizerConfig,
    documents: BTreeMap<DocId, Document>,
    postings: BTreeMap<String, Vec<DocId>>, // each list sorted ascending, unique
    doc_count: u32,
}

impl InvertedIndex {
    /// Assemble an index, rejecting anything that breaks the structural invariants.
    pub(crate) fn from_parts(
        tokenizer: TokenizerConfig,
        documents: BTreeMap<DocId, Document>,
        postings: BTreeMap<String, Vec<DocId>>,
        doc_count: u32,
    ) -> Result<Self> {
        let index = Self { tokenizer, documents, postings, doc_count };
        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<()> {
        if self.doc_count as usize != self.documents.len() {
            return Err(SearchError::corrupt(format!(
                "doc_count is {} but the documents table holds {} entries",
                self.doc_count,
                self.documents.len()
            )));
        }
        for (expected, (key, doc)) in (FIRST_DOC_ID..).zip(&self.documents) {
            if *key != expected {
                return Err(SearchError::corrupt(format!("doc ids are not dense: expected {expected}, found {key}")));
            }
            if doc.id != *key {
                return Err(SearchError::corrupt(format!("document stored under id {key} claims id {}", doc.id)));
            }
        }
        for (term, list) in &self.postings {
            if term.is_empty() {
                return Err(SearchError::corrupt("empty term in postings table"));
            }
            if list.is_empty() {
                return Err(SearchError::corrupt(format!("term {term:?} has an empty posting list")));
            }
            if list.windows(2).any(|w| w[0] >= w[1]) {
                return Err(SearchError::corrupt(format!("posting list for {term:?} is not strictly ascending")));
            }
            if let Some(missing) = list.iter().find(|id| !self.documents.contains_key(*id)) {
                return Err(SearchError::corrupt(format!("term {term:?} references unknown doc id {missing}")));
            }
        }
        Ok(())
    }

    pub fn tokenizer_config(&self) -> &TokenizerConfig {
        &self.tokenizer
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub fn documents(&self) -> &BTreeMap<DocId, Document> {
        &self.documents
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(&id)
    }

    /// Posting list for an already-normalized term; empty when the term is unknown.
    pub fn postings(&self, term: &str) -> &[DocId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub(crate) fn postings_table(&self) -> &BTreeMap<String, Vec<DocId>> {
        &self.postings
    }

    /// Every doc id in the index, ascending.
    pub fn universe(&self) -> Vec<DocId> {
        self.documents.keys().copied().collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_docs: self.doc_count,
            num_terms: self.postings.len(),
            num_postings: self.postings.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: DocId) -> Document {
        Document { id, url: format!("https://example.org/{id}"), source_path: format!("pages/{id}.json"), title: String::new() }
    }

    fn docs(n: DocId) -> BTreeMap<DocId, Document> {
        (1..=n).map(|id| (id, doc(id))).collect()
    }

    #[test]
    fn accepts_consistent_parts() {
        let postings = BTreeMap::from([("campus".to_string(), vec![1, 2])]);
        let index = InvertedIndex::from_parts(TokenizerConfig::default(), docs(2), postings, 2).unwrap();
        assert_eq!(index.postings("campus"), &[1, 2]);
        assert!(index.postings("missing").is_empty());
        assert_eq!(index.universe(), vec![1, 2]);
        assert_eq!(index.stats(), IndexStats { num_docs: 2, num_terms: 1, num_postings: 2 });
    }

    #[test]
    fn rejects_unknown_doc_reference() {
        let postings = BTreeMap::from([("campus".to_string(), vec![1, 7])]);
        let err = InvertedIndex::from_parts(TokenizerConfig::default(), docs(2), postings, 2).unwrap_err();
        assert!(matches!(err, SearchError::CorruptIndex(_)));
    }

    #[test]
    fn rejects_unsorted_or_duplicate_postings() {
        for list in [vec![2, 1], vec![1, 1]] {
            let postings = BTreeMap::from([("campus".to_string(), list)]);
            let err = InvertedIndex::from_parts(TokenizerConfig::default(), docs(2), postings, 2).unwrap_err();
            assert!(matches!(err, SearchError::CorruptIndex(_)));
        }
    }

    #[test]
    fn rejects_doc_count_mismatch_and_gaps() {
        let err = InvertedIndex::from_parts(TokenizerConfig::default(), docs(2), BTreeMap::new(), 3).unwrap_err();
        assert!(matches!(err, SearchError::CorruptIndex(_)));

        let mut gappy = docs(3);
        gappy.remove(&2);
        let err = InvertedIndex::from_parts(TokenizerConfig::default(), gappy, BTreeMap::new(), 2).unwrap_err();
        assert!(matches!(err, SearchError::CorruptIndex(_)));
    }
}
