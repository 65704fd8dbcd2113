use crate::product::Product;
use crate::ranking::Bm25Model;
use crate::similarity::similarity_score;
use crate::tokenizer::tokenize;

/// One scored candidate from a ranking call.
#[derive(Debug, Clone)]
pub struct ScoredProduct {
    pub id: String,
    pub name: String,
    pub score: f64,
}

/// Rank substitute candidates for a reference product.
///
/// Filters out the reference itself and anything out of stock, builds one
/// BM25 corpus model over the surviving pool (reference and candidate names
/// in both languages), scores every survivor with the composite scorer and
/// returns the top `limit` in descending score order. Equal scores keep
/// their pool order. Pure computation: no I/O, no state kept between calls.
pub fn rank_products(reference: &Product, candidates: &[Product], limit: usize) -> Vec<ScoredProduct> {
    let eligible: Vec<&Product> = candidates
        .iter()
        .filter(|p| p.id != reference.id && p.in_stock())
        .collect();

    if eligible.is_empty() {
        return Vec::new();
    }

    // Corpus: reference plus every surviving candidate, both languages.
    // A name that tokenizes to nothing still scores 0 on the name component
    // rather than being excluded.
    let mut documents = Vec::with_capacity(eligible.len() + 1);
    documents.push(tokenize(&reference.name));
    if let Some(secondary) = &reference.name_secondary {
        documents.push(tokenize(secondary));
    }
    for product in &eligible {
        documents.push(tokenize(&product.name));
        if let Some(secondary) = &product.name_secondary {
            documents.push(tokenize(secondary));
        }
    }
    let model = Bm25Model::build(&documents);

    let mut scored: Vec<ScoredProduct> = eligible
        .iter()
        .map(|product| ScoredProduct {
            id: product.id.clone(),
            name: product.name.clone(),
            score: similarity_score(reference, product, &model),
        })
        .collect();

    // Stable sort: ties retain candidate pool order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    scored
}

/// Convenience wrapper returning only the ordered candidate ids.
pub fn rank(reference: &Product, candidates: &[Product], limit: usize) -> Vec<String> {
    rank_products(reference, candidates, limit)
        .into_iter()
        .map(|scored| scored.id)
        .collect()
}
