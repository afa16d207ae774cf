use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::{Result, SearchError};
use crate::index::{DocId, InvertedIndex};
use crate::persist::{load_snapshot, save_snapshot};
use crate::query::{rank, BooleanQueryEvaluator, BooleanQueryParser, Operator, QueryToken, RankedMatches};
use crate::registry::DocumentRegistry;
use crate::tokenizer::{self, Tokenizer};

pub const MSG_OK: &str = "query succeeded";
pub const MSG_FAILED: &str = "query failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Boolean,
    Simple,
}

impl FromStr for SearchMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "boolean" => Ok(SearchMode::Boolean),
            "simple" => Ok(SearchMode::Simple),
            other => Err(SearchError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Boolean => f.write_str("boolean"),
            SearchMode::Simple => f.write_str("simple"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchExtra {
    /// Number of leading query terms that took part in ranking (simple mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_num: Option<usize>,
}

/// Uniform result for both modes. Check `status` before reading `matched_ids`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub status: bool,
    pub matched_ids: Vec<DocId>,
    pub message: String,
    pub elapsed_seconds: f64,
    pub extra: SearchExtra,
}

impl SearchResult {
    fn failed(elapsed_seconds: f64) -> Self {
        Self {
            status: false,
            matched_ids: Vec::new(),
            message: MSG_FAILED.to_string(),
            elapsed_seconds,
            extra: SearchExtra::default(),
        }
    }
}

/// Owns the index, the document registry and the tokenizer, and answers queries.
pub struct SearchEngine {
    index: InvertedIndex,
    registry: DocumentRegistry,
    tokenizer: Box<dyn Tokenizer>,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        let tokenizer = tokenizer::from_config(&config.tokenizer);
        Self::with_tokenizer(config, tokenizer)
    }

    pub fn with_tokenizer(config: EngineConfig, tokenizer: Box<dyn Tokenizer>) -> Self {
        Self { index: InvertedIndex::new(), registry: DocumentRegistry::new(), tokenizer, config }
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn registry(&self) -> &DocumentRegistry { &self.registry }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn register_document<P: AsRef<Path>>(&mut self, doc_id: &str, path: P) {
        self.registry.register(doc_id, path.as_ref());
    }

    /// Tokenize `text` into the index under `doc_id`.
    pub fn index_document(&mut self, doc_id: &str, text: &str) -> usize {
        self.index.add_document(doc_id, text, self.tokenizer.as_ref())
    }

    /// Register and index every file directly inside `dir`. Returns the document count.
    pub fn load_documents<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let found = self.registry.scan_dir(dir)?;
        let mut total_terms = 0;
        for (doc_id, path) in &found {
            let bytes = std::fs::read(path)?;
            let text = String::from_utf8_lossy(&bytes);
            total_terms += self.index_document(doc_id, &text);
        }
        tracing::info!(
            docs = found.len(),
            terms = total_terms,
            vocabulary = self.index.num_terms(),
            "indexed documents"
        );
        Ok(found.len())
    }

    /// Register every file in `dir` without indexing it.
    pub fn register_documents<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        Ok(self.registry.scan_dir(dir)?.len())
    }

    /// Replace the index with the snapshot at `path`. On error the current index is kept.
    pub fn load_snapshot<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.index = load_snapshot(path.as_ref())?;
        Ok(())
    }

    /// Swap in an index loaded elsewhere, e.g. outside a lock.
    pub fn replace_index(&mut self, index: InvertedIndex) -> InvertedIndex {
        std::mem::replace(&mut self.index, index)
    }

    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_snapshot(path.as_ref(), &self.index)
    }

    /// Excerpt of a registered document, sized by `excerpt_chars`.
    pub fn excerpt(&self, doc_id: &str) -> Result<Option<String>> {
        self.registry.excerpt(doc_id, self.config.excerpt_chars)
    }

    /// Dispatch on a textual mode. Anything but `boolean`/`simple` is an `InvalidMode` error.
    pub fn search(&self, mode: &str, query: &str) -> Result<SearchResult> {
        let mode: SearchMode = mode.parse()?;
        Ok(self.search_with(mode, query))
    }

    /// Run a query. Query failures come back as a result with `status == false`.
    pub fn search_with(&self, mode: SearchMode, query: &str) -> SearchResult {
        let start = Instant::now();
        let outcome = match mode {
            SearchMode::Boolean => self.boolean_search(query).map(|ids| (ids, SearchExtra::default())),
            SearchMode::Simple => {
                let matches = self.simple_search(query);
                let extra = SearchExtra { match_num: Some(matches.contributing) };
                Ok((matches.doc_ids, extra))
            }
        };
        let elapsed_seconds = start.elapsed().as_secs_f64();

        match outcome {
            Ok((matched_ids, extra)) => {
                tracing::debug!(%mode, query, hits = matched_ids.len(), elapsed_seconds, "search");
                SearchResult { status: true, matched_ids, message: MSG_OK.to_string(), elapsed_seconds, extra }
            }
            Err(err) if err.is_query_error() => {
                tracing::warn!(%mode, query, error = %err, "query rejected");
                SearchResult::failed(elapsed_seconds)
            }
            Err(err) => {
                tracing::error!(%mode, query, error = %err, "search failed");
                SearchResult::failed(elapsed_seconds)
            }
        }
    }

    /// Parse and evaluate a boolean expression over the registry's universe.
    pub fn boolean_search(&self, query: &str) -> Result<Vec<DocId>> {
        let strict = self.config.strict_boolean;
        let tokens = self.expand_operands(BooleanQueryParser::new(strict).parse(query)?);
        let universe = self.registry.ids();
        let matched = BooleanQueryEvaluator::new(strict).evaluate(&tokens, &self.index, &universe)?;
        Ok(matched.into_iter().collect())
    }

    /// Ranked free-text search over the registry's universe.
    pub fn simple_search(&self, query: &str) -> RankedMatches {
        let terms: Vec<String> = query
            .split_whitespace()
            .flat_map(|word| self.tokenizer.query_terms(word))
            .collect();
        rank(&terms, &self.index, &self.registry.ids())
    }

    /// Replace each operand with its index terms. A word that splits into several
    /// terms becomes their conjunction; a word with no index terms is kept as typed
    /// and so looks up the empty set.
    fn expand_operands(&self, tokens: Vec<QueryToken>) -> Vec<QueryToken> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            let QueryToken::Term(word) = token else {
                out.push(token);
                continue;
            };
            let mut terms = self.tokenizer.query_terms(&word).into_iter();
            match terms.next() {
                None => out.push(QueryToken::Term(word)),
                Some(first) => {
                    out.push(QueryToken::Term(first));
                    for term in terms {
                        out.push(QueryToken::Term(term));
                        out.push(QueryToken::Op(Operator::And));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceTokenizer;

    fn engine() -> SearchEngine {
        let mut se = SearchEngine::with_tokenizer(EngineConfig::default(), Box::new(WhitespaceTokenizer));
        for (id, text) in [("1", "a x"), ("2", "a b x y"), ("3", "b")] {
            se.index_document(id, text);
            se.register_document(id, format!("/nonexistent/{id}.txt"));
        }
        se
    }

    #[test]
    fn unknown_mode_is_an_error() {
        assert!(matches!(engine().search("fuzzy", "a"), Err(SearchError::InvalidMode(m)) if m == "fuzzy"));
        assert!(matches!(engine().search("Boolean", "a"), Err(SearchError::InvalidMode(_))));
    }

    #[test]
    fn boolean_mode_returns_set() {
        let r = engine().search("boolean", "a and not b").unwrap();
        assert!(r.status);
        assert_eq!(r.matched_ids, vec!["1"]);
        assert_eq!(r.extra.match_num, None);
        assert_eq!(r.message, MSG_OK);
    }

    #[test]
    fn malformed_boolean_becomes_failed_result() {
        let r = engine().search("boolean", "a and").unwrap();
        assert!(!r.status);
        assert!(r.matched_ids.is_empty());
        assert_eq!(r.message, MSG_FAILED);
    }

    #[test]
    fn simple_mode_reports_match_num() {
        let r = engine().search("simple", "x y").unwrap();
        assert!(r.status);
        assert_eq!(r.matched_ids, vec!["2"]);
        assert_eq!(r.extra.match_num, Some(2));
    }

    #[test]
    fn empty_simple_query_is_empty_success() {
        let r = engine().search("simple", "   ").unwrap();
        assert!(r.status);
        assert!(r.matched_ids.is_empty());
        assert_eq!(r.extra.match_num, Some(0));
    }

    #[test]
    fn universe_comes_from_registry() {
        let mut se = engine();
        se.register_document("4", "/nonexistent/4.txt");
        let r = se.search("boolean", "not a").unwrap();
        assert_eq!(r.matched_ids, vec!["3", "4"]);
    }

    #[test]
    fn strict_config_rejects_unbalanced() {
        let config = EngineConfig { strict_boolean: true, ..EngineConfig::default() };
        let mut se = SearchEngine::with_tokenizer(config, Box::new(WhitespaceTokenizer));
        se.index_document("1", "a");
        se.register_document("1", "/nonexistent/1.txt");
        assert!(!se.search("boolean", "(a").unwrap().status);
        assert!(engine().search("boolean", "(a").unwrap().status);
    }

    #[test]
    fn result_serializes_like_a_record() {
        let r = engine().search("simple", "x").unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], true);
        assert_eq!(json["extra"]["match_num"], 1);
        assert!(json["elapsed_seconds"].is_number());
    }
}
