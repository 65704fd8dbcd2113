//! Composite substitute scoring.
//!
//! Weighted sum of three independent contributions:
//! - 60% name similarity (BM25 over the per-request corpus)
//! - 30% price proximity (similar price point = similar product segment)
//! - 10% manufacturer match
//!
//! A missing contribution is simply absent, never imputed: a product with
//! no price and no manufacturer can score at most 0.60.

use crate::product::Product;
use crate::ranking::{jaccard_similarity, Bm25, Bm25Model};
use crate::tokenizer::tokenize;

pub const NAME_WEIGHT: f64 = 0.60;
pub const PRICE_WEIGHT: f64 = 0.30;
pub const MANUFACTURER_WEIGHT: f64 = 0.10;

/// Composite similarity between a reference product and one candidate,
/// scored against a corpus model shared across the whole candidate pool.
pub fn similarity_score(reference: &Product, candidate: &Product, model: &Bm25Model) -> f64 {
    let mut score = name_similarity(reference, candidate, model) * NAME_WEIGHT;

    if let (Some(ref_price), Some(cand_price)) = (reference.price, candidate.price) {
        if ref_price > 0.0 && cand_price > 0.0 {
            score += price_similarity(ref_price, cand_price) * PRICE_WEIGHT;
        }
    }

    if manufacturer_matches(reference, candidate) {
        score += MANUFACTURER_WEIGHT;
    }

    score
}

/// BM25 name similarity. When both products carry a second-language name
/// the pair is scored in both languages against the same model (the corpus
/// folds tokens of both languages together) and the best match wins.
pub fn name_similarity(reference: &Product, candidate: &Product, model: &Bm25Model) -> f64 {
    let bm25 = Bm25::default();

    let primary = bm25.score(&tokenize(&reference.name), &tokenize(&candidate.name), model);

    match (&reference.name_secondary, &candidate.name_secondary) {
        (Some(ref_sec), Some(cand_sec)) => {
            let secondary = bm25.score(&tokenize(ref_sec), &tokenize(cand_sec), model);
            primary.max(secondary)
        }
        _ => primary,
    }
}

/// Jaccard name similarity, usable without a corpus model. Applies the same
/// best-of-both-languages rule as the BM25 path.
pub fn name_similarity_fallback(reference: &Product, candidate: &Product) -> f64 {
    let primary = jaccard_similarity(&tokenize(&reference.name), &tokenize(&candidate.name));

    match (&reference.name_secondary, &candidate.name_secondary) {
        (Some(ref_sec), Some(cand_sec)) => {
            let secondary = jaccard_similarity(&tokenize(ref_sec), &tokenize(cand_sec));
            primary.max(secondary)
        }
        _ => primary,
    }
}

/// Tiered price proximity with the reference price as base:
/// within 20% is a perfect match, within 50% acceptable, beyond that poor.
fn price_similarity(ref_price: f64, cand_price: f64) -> f64 {
    let diff_pct = (ref_price - cand_price).abs() / ref_price;

    if diff_pct <= 0.20 {
        1.0
    } else if diff_pct <= 0.50 {
        0.5
    } else {
        0.2
    }
}

fn manufacturer_matches(reference: &Product, candidate: &Product) -> bool {
    match (&reference.manufacturer_name, &candidate.manufacturer_name) {
        (Some(a), Some(b)) => {
            !a.is_empty() && !b.is_empty() && a.to_lowercase() == b.to_lowercase()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Product {
        Product::new("ref".into(), "Gluten-Free Cookie Mix".into(), "5".into()).with_price(10.0)
    }

    fn candidate(id: &str, name: &str) -> Product {
        Product::new(id.into(), name.into(), "5".into()).with_quantity(10)
    }

    fn model_for(reference: &Product, candidates: &[Product]) -> Bm25Model {
        let mut documents = vec![tokenize(&reference.name)];
        documents.extend(candidates.iter().map(|p| tokenize(&p.name)));
        Bm25Model::build(&documents)
    }

    #[test]
    fn test_score_is_monotonic_in_price_proximity() {
        let reference = reference();
        let close = candidate("1", "Gluten-Free Cookie Mix").with_price(11.0);
        let mid = candidate("2", "Gluten-Free Cookie Mix").with_price(14.0);
        let far = candidate("3", "Gluten-Free Cookie Mix").with_price(30.0);

        let model = model_for(&reference, &[close.clone(), mid.clone(), far.clone()]);

        let s_close = similarity_score(&reference, &close, &model);
        let s_mid = similarity_score(&reference, &mid, &model);
        let s_far = similarity_score(&reference, &far, &model);

        assert!(s_close >= s_mid);
        assert!(s_mid >= s_far);
    }

    #[test]
    fn test_price_tier_boundaries() {
        assert_eq!(price_similarity(10.0, 12.0), 1.0); // exactly 20%
        assert_eq!(price_similarity(10.0, 15.0), 0.5); // exactly 50%
        assert_eq!(price_similarity(10.0, 15.01), 0.2);
        assert_eq!(price_similarity(10.0, 8.0), 1.0); // cheaper side
    }

    #[test]
    fn test_manufacturer_match_is_worth_exactly_its_weight() {
        let reference = reference().with_manufacturer("Bakeline".into());
        let with_match = candidate("1", "Gluten-Free Cookie Mix")
            .with_price(10.0)
            .with_manufacturer("BAKELINE".into());
        let without = candidate("2", "Gluten-Free Cookie Mix")
            .with_price(10.0)
            .with_manufacturer("Other".into());

        let model = model_for(&reference, &[with_match.clone(), without.clone()]);

        let diff = similarity_score(&reference, &with_match, &model)
            - similarity_score(&reference, &without, &model);
        assert!((diff - MANUFACTURER_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_missing_price_and_manufacturer_caps_at_name_weight() {
        let reference = Product::new("ref".into(), "Gluten-Free Cookie Mix".into(), "5".into());
        let twin = candidate("1", "Gluten-Free Cookie Mix");

        let model = model_for(&reference, &[twin.clone()]);

        let score = similarity_score(&reference, &twin, &model);
        assert!((score - NAME_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_secondary_language_best_match_wins() {
        let mut reference = reference();
        reference.name_secondary = Some("Ciastka bezglutenowe".into());
        let mut cand = candidate("1", "Totally Different Name");
        cand.name_secondary = Some("Ciastka bezglutenowe".into());

        let documents = vec![
            tokenize(&reference.name),
            tokenize(reference.name_secondary.as_deref().unwrap()),
            tokenize(&cand.name),
            tokenize(cand.name_secondary.as_deref().unwrap()),
        ];
        let model = Bm25Model::build(&documents);

        // Primary names share nothing, secondary names are identical.
        let score = name_similarity(&reference, &cand, &model);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_uses_jaccard_overlap() {
        let reference = reference();
        let half = candidate("1", "Sugar Cookie Mix");

        let score = name_similarity_fallback(&reference, &half);
        // {gluten, cookie} vs {sugar, cookie}: 1 shared of 3 distinct
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }
}
