//! Free-text answer normalization and matching.
//!
//! Matching is exact on the normalized form: lower-cased, punctuation
//! stripped (apostrophes and hyphens survive), whitespace collapsed.
//! Diacritics are kept, so `"parís"` and `"paris"` are different answers.
//! Only ASCII decimal digits count as digits: numeric symbols such as `²`
//! or `½` are stripped like punctuation.

/// Lower-cases `text`, keeps only letters, digits, whitespace, `'` and `-`,
/// collapses whitespace runs to a single space and trims.
pub fn normalize(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_ascii_digit() || c.is_whitespace() || *c == '\'' || *c == '-')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True iff `input` normalizes to a non-empty string equal to the
/// normalized form of at least one accepted answer.
pub fn matches(input: Option<&str>, accepted: &[String]) -> bool {
    let Some(input) = input else {
        return false;
    };
    let norm = normalize(input);
    if norm.is_empty() {
        return false;
    }
    accepted.iter().any(|a| normalize(a) == norm)
}

/// Splits a comma-separated answer field. Entries are trimmed and empty
/// ones (`"a,,b"`) are dropped.
pub fn parse_answers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
