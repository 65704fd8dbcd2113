use std::collections::{HashMap, HashSet};

/// BM25 parameters
#[derive(Debug, Clone, Copy)]
pub struct Bm25 {
    k1: f64,
    b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self {
            k1: 1.5, // Term frequency saturation parameter
            b: 0.75, // Length normalization parameter
        }
    }
}

/// Corpus statistics for BM25 scoring, built fresh for every ranking call.
///
/// The document set must contain the reference product's name(s) as well as
/// every candidate's name(s); a term missing from the corpus has no IDF
/// weight and contributes nothing to any score.
#[derive(Debug, Clone)]
pub struct Bm25Model {
    idf: HashMap<String, f64>,
    avg_doc_length: f64,
}

impl Bm25Model {
    /// Build IDF weights and the average document length from a corpus of
    /// tokenized names.
    ///
    /// IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1), which stays positive
    /// even for terms present in every document.
    pub fn build(documents: &[HashSet<String>]) -> Self {
        let total_docs = documents.len() as f64;

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in documents {
            for term in doc {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let idf = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let df = df as f64;
                let weight = ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln();
                (term.to_string(), weight)
            })
            .collect();

        let avg_doc_length = if documents.is_empty() {
            1.0
        } else {
            documents.iter().map(|d| d.len()).sum::<usize>() as f64 / total_docs
        };

        Self { idf, avg_doc_length }
    }

    /// IDF weight for a term, if it occurred anywhere in the corpus.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn avg_doc_length(&self) -> f64 {
        self.avg_doc_length
    }
}

impl Bm25 {
    pub fn new(k1: f64, b: f64) -> Self {
        Self { k1, b }
    }

    /// Score a query token set against a document token set, normalized to
    /// [0, 1] by the maximum score the query could reach against a document
    /// of this length.
    ///
    /// Term frequency is binary: product names are short and repeated terms
    /// are unlikely, so a term either contributes once or is skipped.
    pub fn score(&self, query: &HashSet<String>, doc: &HashSet<String>, model: &Bm25Model) -> f64 {
        if query.is_empty() || doc.is_empty() {
            return 0.0;
        }

        let doc_length = doc.len() as f64;
        let length_norm = 1.0 - self.b + self.b * (doc_length / model.avg_doc_length);

        let mut score = 0.0;
        let mut max_score = 0.0;

        for term in query {
            let Some(idf) = model.idf(term) else {
                continue;
            };

            // tf = 1: contribution if the term were (or is) present
            let contribution = idf * (self.k1 + 1.0) / (1.0 + self.k1 * length_norm);
            max_score += contribution;

            if doc.contains(term) {
                score += contribution;
            }
        }

        if max_score > 0.0 {
            (score / max_score).min(1.0)
        } else {
            0.0
        }
    }
}

/// Jaccard set-overlap coefficient: |a ∩ b| / |a ∪ b|.
///
/// Stateless alternative to BM25 for contexts where no corpus is available
/// to carry IDF statistics. Returns 0 when either set is empty.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.union(b).count();

    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_rare_term_outweighs_common_term() {
        // "rare" appears in 1 of 4 documents, "common" in 3 of 4.
        let corpus = vec![
            doc(&["rare", "common"]),
            doc(&["common", "other"]),
            doc(&["common", "noise"]),
            doc(&["noise", "other"]),
        ];
        let model = Bm25Model::build(&corpus);

        let rare = model.idf("rare").unwrap();
        let common = model.idf("common").unwrap();
        assert!(rare > common);
    }

    #[test]
    fn test_identical_sets_score_one() {
        let corpus = vec![doc(&["gluten", "cookie"]), doc(&["sugar", "cookie"])];
        let model = Bm25Model::build(&corpus);

        let score = Bm25::default().score(&doc(&["gluten", "cookie"]), &doc(&["gluten", "cookie"]), &model);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_overlap_scores_between_zero_and_one() {
        let corpus = vec![doc(&["gluten", "cookie"]), doc(&["sugar", "cookie"])];
        let model = Bm25Model::build(&corpus);

        let score = Bm25::default().score(&doc(&["gluten", "cookie"]), &doc(&["sugar", "cookie"]), &model);
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_empty_query_or_doc_scores_zero() {
        let corpus = vec![doc(&["cookie"])];
        let model = Bm25Model::build(&corpus);
        let bm25 = Bm25::default();

        assert_eq!(bm25.score(&doc(&[]), &doc(&["cookie"]), &model), 0.0);
        assert_eq!(bm25.score(&doc(&["cookie"]), &doc(&[]), &model), 0.0);
    }

    #[test]
    fn test_query_outside_corpus_scores_zero() {
        let model = Bm25Model::build(&[]);
        let score = Bm25::default().score(&doc(&["cookie"]), &doc(&["cookie"]), &model);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_corpus_avgdl_defaults_to_one() {
        let model = Bm25Model::build(&[]);
        assert_eq!(model.avg_doc_length(), 1.0);
    }

    #[test]
    fn test_jaccard_similarity() {
        let a = doc(&["gluten", "cookie"]);
        let b = doc(&["sugar", "cookie"]);
        // one shared token out of three distinct
        assert!((jaccard_similarity(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(jaccard_similarity(&a, &doc(&[])), 0.0);
        assert!((jaccard_similarity(&a, &a) - 1.0).abs() < 1e-9);
    }
}
