//! Text analysis for string fields.
//!
//! The engine uses one fixed pipeline: lowercase the value, split it on
//! ASCII whitespace runs into terms, and append the full lowercased phrase
//! as one additional term. The phrase term is what makes exact full-value
//! lookups (`filter_term("name", "neoway business solution")`) work without
//! a separate keyword index.
//!
//! The tokenizer does not de-duplicate; the indexing planner drops
//! duplicate (field, term) pairs before they reach the merge-set.

/// Tokenize a string field value.
///
/// Returns each whitespace-separated term, lowercased, followed by the
/// full lowercased phrase.
///
/// # Examples
///
/// ```
/// use myrica::analysis::tokenize;
///
/// let terms = tokenize("Neoway Business Solution");
/// assert_eq!(
///     terms,
///     vec!["neoway", "business", "solution", "neoway business solution"]
/// );
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let phrase = text.to_lowercase();

    let mut terms: Vec<String> = phrase
        .split_ascii_whitespace()
        .map(|t| t.to_string())
        .collect();

    terms.push(phrase);
    terms
}
