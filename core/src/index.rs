use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::tokenizer::Tokenizer;

/// Opaque, case-sensitive document identifier.
pub type DocId = String;
/// Ordered set of document ids. Always freshly built, never a view into the index.
pub type DocSet = BTreeSet<DocId>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    #[serde(rename = "tf")]
    pub term_frequency: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    /// Occurrences across the whole corpus.
    #[serde(rename = "freq")]
    pub total_frequency: u64,
    /// Distinct documents containing the term; equals `postings.len()`.
    #[serde(rename = "df")]
    pub document_frequency: u32,
    pub postings: HashMap<DocId, Posting>,
}

/// Term → postings table plus the set of documents it has seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    #[serde(rename = "docids")]
    pub(crate) doc_ids: DocSet,
    #[serde(rename = "table")]
    pub(crate) terms: HashMap<String, TermEntry>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Record one occurrence of `term` in `doc_id`.
    pub fn add_term(&mut self, term: &str, doc_id: &str) {
        if !self.doc_ids.contains(doc_id) {
            self.doc_ids.insert(doc_id.to_string());
        }
        let entry = self.terms.entry(term.to_string()).or_default();
        entry.total_frequency += 1;
        match entry.postings.get_mut(doc_id) {
            Some(posting) => posting.term_frequency += 1,
            None => {
                entry.postings.insert(doc_id.to_string(), Posting { term_frequency: 1 });
                entry.document_frequency += 1;
            }
        }
    }

    /// Tokenize `text` and record every term under `doc_id`. Returns the number of terms added.
    pub fn add_document(&mut self, doc_id: &str, text: &str, tokenizer: &dyn Tokenizer) -> usize {
        let mut added = 0;
        for term in tokenizer.tokenize(text) {
            self.add_term(&term, doc_id);
            added += 1;
        }
        added
    }

    /// `tf * ln(N / df)`, or 0 when the term or its posting for `doc_id` is missing.
    ///
    /// A term present in every document scores 0; that is the intended IDF behaviour.
    pub fn tfidf(&self, doc_id: &str, term: &str) -> f64 {
        let Some(entry) = self.terms.get(term) else { return 0.0 };
        let Some(posting) = entry.postings.get(doc_id) else { return 0.0 };
        let n = self.doc_ids.len();
        if n == 0 || entry.document_frequency == 0 {
            return 0.0;
        }
        let idf = (n as f64 / entry.document_frequency as f64).ln();
        posting.term_frequency as f64 * idf
    }

    /// Statistics for `term`; unknown terms yield the zero entry.
    pub fn term_info(&self, term: &str) -> TermEntry {
        self.terms.get(term).cloned().unwrap_or_default()
    }

    pub fn posting_set(&self, term: &str) -> DocSet {
        self.terms
            .get(term)
            .map(|entry| entry.postings.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn doc_ids(&self) -> &DocSet { &self.doc_ids }

    pub fn num_docs(&self) -> usize { self.doc_ids.len() }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn contains_term(&self, term: &str) -> bool { self.terms.contains_key(term) }

    /// Check the bookkeeping invariants, describing the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        for (term, entry) in &self.terms {
            if entry.document_frequency as usize != entry.postings.len() {
                return Err(format!(
                    "term {term:?}: df {} does not match {} postings",
                    entry.document_frequency,
                    entry.postings.len()
                ));
            }
            let tf_sum: u64 = entry.postings.values().map(|p| p.term_frequency as u64).sum();
            if entry.total_frequency != tf_sum {
                return Err(format!(
                    "term {term:?}: freq {} does not match tf sum {tf_sum}",
                    entry.total_frequency
                ));
            }
            if let Some(doc) = entry.postings.keys().find(|d| !self.doc_ids.contains(*d)) {
                return Err(format!("term {term:?}: posting for unknown document {doc:?}"));
            }
        }
        Ok(())
    }
}
