use ahash::AHashMap;

/// Split text into lower-cased word tokens longer than two characters.
/// Word characters are ASCII letters, digits and `_`; anything else splits.
/// Duplicates are kept: term frequency feeds the cosine score.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn term_frequencies(tokens: &[String]) -> AHashMap<&str, u64> {
    let mut counts = AHashMap::with_capacity(tokens.len());
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Cosine similarity of the term-frequency vectors of two texts, in `[0, 1]`.
///
/// Two texts with no tokens at all are similar only when byte-identical;
/// a text with no tokens never matches one that has some.
pub fn similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let tf_a = term_frequencies(&tokens_a);
    let tf_b = term_frequencies(&tokens_b);

    let dot: u64 = tf_a
        .iter()
        .filter_map(|(term, count)| tf_b.get(term).map(|other| count * other))
        .sum();
    let mag_a: u64 = tf_a.values().map(|c| c * c).sum();
    let mag_b: u64 = tf_b.values().map(|c| c * c).sum();

    let denominator = (mag_a as f64 * mag_b as f64).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    (dot as f64 / denominator).clamp(0.0, 1.0)
}
