use std::cmp::Ordering;

use crate::index::{DocId, DocSet, InvertedIndex};

/// Outcome of a free-text query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedMatches {
    /// Best first. Order among equal scores is unspecified.
    pub doc_ids: Vec<DocId>,
    pub scores: Vec<f64>,
    /// How many leading query terms narrowed the candidates and were scored.
    pub contributing: usize,
}

/// Narrow `universe` term by term, keeping the last non-empty candidate set,
/// then rank the survivors by summed TF-IDF over the contributing terms.
pub fn rank(terms: &[String], index: &InvertedIndex, universe: &DocSet) -> RankedMatches {
    if terms.is_empty() {
        return RankedMatches::default();
    }

    let mut candidates = universe.clone();
    let mut contributing = terms.len();
    for (i, term) in terms.iter().enumerate() {
        let postings = index.posting_set(term);
        let narrowed: DocSet = candidates.intersection(&postings).cloned().collect();
        if narrowed.is_empty() {
            contributing = i;
            if i == 0 {
                candidates.clear();
            }
            break;
        }
        candidates = narrowed;
    }

    let scored_terms = &terms[..contributing];
    let mut ranked: Vec<(DocId, f64)> = candidates
        .into_iter()
        .map(|doc| {
            let score: f64 = scored_terms.iter().map(|t| index.tfidf(&doc, t)).sum();
            (doc, score)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let (doc_ids, scores) = ranked.into_iter().unzip();
    RankedMatches { doc_ids, scores, contributing }
}
