use regex::Regex;
use std::collections::HashSet;

lazy_static::lazy_static! {
    /// Bilingual (English + Polish) stop words: articles, prepositions and
    /// generic packaging/marketing words that carry no product identity.
    static ref STOP_WORDS: HashSet<&'static str> = {
        [
            // English
            "the", "and", "for", "with", "of", "in", "on", "at", "a", "an",
            "free", "pack", "mix", "set", "piece", "pieces", "bag", "box",
            // Polish
            "i", "na", "do", "z", "w", "o", "dla", "po", "ze", "od",
        ]
        .iter()
        .copied()
        .collect()
    };

    /// Quantity/unit suffixes like "600g", "1 kg", "250ml", "10 szt".
    static ref QUANTITY_RE: Regex =
        Regex::new(r"\d+\s?(g|kg|ml|l|mg|szt|pcs|oz|lb)(\s|$)").unwrap();

    static ref WORD_RE: Regex = Regex::new(r"\w+").unwrap();
}

/// Minimum token length in characters; anything shorter is noise.
const MIN_TOKEN_LEN: usize = 3;

/// Tokenize a product name into a set of significant keywords.
///
/// Lower-cases the input, strips quantity/unit patterns, extracts word
/// runs and drops stop words and short tokens. Duplicates collapse; an
/// empty name yields an empty set.
pub fn tokenize(name: &str) -> HashSet<String> {
    if name.is_empty() {
        return HashSet::new();
    }

    let text = name.to_lowercase();
    let text = QUANTITY_RE.replace_all(&text, " ");

    WORD_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .filter(|w| !STOP_WORDS.contains(w.as_str()) && w.chars().count() >= MIN_TOKEN_LEN)
        .collect()
}
