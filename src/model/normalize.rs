//! Text normalization shared by the data model and the fuzzy matcher.

use unicode_normalization::UnicodeNormalization;

/// Legal-entity suffixes dropped from company names before matching.
const COMPANY_SUFFIXES: &[&str] = &[
    "inc",
    "llc",
    "corp",
    "corporation",
    "ltd",
    "limited",
    "co",
    "gmbh",
    "plc",
];

/// NFKC, lower-case, punctuation to spaces, whitespace collapsed.
#[must_use]
pub fn normalize_text(input: &str) -> String {
    let folded: String = input
        .nfkc()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() || c == '+' || c == '#' { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Company normalization: [`normalize_text`] plus trailing legal suffixes removed.
#[must_use]
pub fn normalize_company(input: &str) -> String {
    let normalized = normalize_text(input);
    let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    while tokens.len() > 1 {
        match tokens.last() {
            Some(last) if COMPANY_SUFFIXES.contains(last) => {
                tokens.pop();
            }
            _ => break,
        }
    }
    tokens.join(" ")
}

/// Split normalized text into tokens.
#[must_use]
pub fn tokens(input: &str) -> Vec<String> {
    normalize_text(input)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
