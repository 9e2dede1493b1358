//! URL slug derivation for new stories.

use uuid::Uuid;

/// Longest slug body before the uniqueness suffix.
const MAX_SLUG_LEN: usize = 80;

/// Length of the random uniqueness suffix.
const SUFFIX_LEN: usize = 6;

/// Derive a URL slug from a headline.
///
/// Lowercases, replaces runs of non-alphanumeric characters with single
/// hyphens, trims, truncates, and appends a short random suffix so two
/// stories with the same headline never collide.
pub fn slug_from_headline(headline: &str) -> String {
    let mut body = String::with_capacity(headline.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in headline.chars() {
        if c.is_ascii_alphanumeric() {
            body.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            body.push('-');
            last_was_hyphen = true;
        }
        if body.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    while body.ends_with('-') {
        body.pop();
    }

    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(SUFFIX_LEN)
        .collect();

    if body.is_empty() {
        suffix
    } else {
        format!("{}-{}", body, suffix)
    }
}
