//! HTS code format expansion and duty-rate column selection.
//!
//! Documents write the same tariff line in several ways (`3002.12.0010`,
//! `3002.12.00.10`, `3002120010`). The reference table uses one of them, so
//! lookups try every plausible spelling in turn.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::entities::{HtsRow, RateType};

/// Dimensions and measurements such as `500 X 100 X 100MM`, `500 x 100` or `12cm`.
static MEASUREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d+\s*[x×]\s*\d+(?:\s*[x×]\s*\d+)?(?:\s*(?:mm|cm|in|ft)\b)?|\d+(?:\.\d+)?\s*(?:mm|cm|in|ft)\b",
    )
    .unwrap()
});

/// Most words a description search matches on.
pub const MAX_SEARCH_TERMS: usize = 5;

/// Expands a stated HTS code into candidate spellings for lookup.
///
/// The cleaned input (trimmed, upper-cased, whitespace removed) always comes
/// first; duplicates are dropped while preserving order. Blank input yields
/// an empty list.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     candidate_formats("3002.12.0010"),
///     vec!["3002.12.0010", "3002.12.00.10", "3002.12.00.00"],
/// );
/// ```
pub fn candidate_formats(code: &str) -> Vec<String> {
    let cleaned: String = code
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Vec::new();
    }

    let mut formats = vec![cleaned.clone()];

    if cleaned.contains('.') {
        let parts: Vec<&str> = cleaned.split('.').collect();

        match parts.as_slice() {
            [heading, sub] => {
                formats.push(format!("{heading}.{sub}.00.00"));
                formats.push(format!("{heading}.{sub}.0000"));
            }
            [heading, sub, tail] if tail.len() == 4 && tail.is_ascii() => {
                let (stat, suffix) = tail.split_at(2);
                formats.push(format!("{heading}.{sub}.{stat}.{suffix}"));
                formats.push(format!("{heading}.{sub}.00.{suffix}"));
                formats.push(format!("{heading}.{sub}.{stat}.00"));
            }
            [heading, sub, tail] if tail.len() == 2 => {
                formats.push(format!("{heading}.{sub}.{tail}.00"));
            }
            [heading, sub, stat, suffix] if !stat.is_empty() && !suffix.is_empty() => {
                formats.push(format!("{heading}.{sub}.{stat}{suffix}"));
            }
            _ => {}
        }
    } else if cleaned.len() >= 6 && cleaned.is_ascii() {
        formats.push(format!(
            "{}.{}.{}",
            &cleaned[..4],
            &cleaned[4..6],
            &cleaned[6..]
        ));
        if cleaned.len() == 10 {
            formats.push(format!(
                "{}.{}.{}.{}",
                &cleaned[..4],
                &cleaned[4..6],
                &cleaned[6..8],
                &cleaned[8..]
            ));
        }
    }

    let mut seen = std::collections::HashSet::new();
    formats.retain(|f| !f.is_empty() && seen.insert(f.clone()));
    formats
}

/// Prefix used when no exact spelling matches: `"{heading}.{subheading}"`.
///
/// Returns `None` for undotted codes.
pub fn heading_prefix(candidate: &str) -> Option<String> {
    let mut parts = candidate.split('.');
    let heading = parts.next().filter(|h| !h.is_empty())?;
    let sub = parts.next()?;
    Some(format!("{heading}.{sub}"))
}

/// Picks the rate used for duty work: column 2, then special, then general.
///
/// The first non-blank column wins; a row with no rates selects nothing.
pub fn select_rate(row: &HtsRow) -> Option<(String, RateType)> {
    [
        (&row.column_2_rate_of_duty, RateType::Column2),
        (&row.special_rate_of_duty, RateType::Special),
        (&row.general_rate_of_duty, RateType::General),
    ]
    .into_iter()
    .find_map(|(rate, kind)| {
        rate.as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(|r| (r.to_string(), kind))
    })
}

/// Reduces a product description to the words worth searching for.
///
/// Measurements are removed first. Remaining words shorter than three
/// characters or without a letter are dropped; the rest are lower-cased and
/// deduplicated, keeping the first [`MAX_SEARCH_TERMS`]. When cleaning
/// leaves nothing, the words of the raw description are used instead.
pub fn search_terms(description: &str) -> Vec<String> {
    let cleaned = MEASUREMENT.replace_all(description, " ");
    let terms = words(&cleaned);
    if terms.is_empty() {
        words(description)
    } else {
        terms
    }
}

fn words(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() < 3 || !word.chars().any(char::is_alphabetic) {
            continue;
        }
        let word = word.to_lowercase();
        if !terms.contains(&word) {
            terms.push(word);
        }
        if terms.len() == MAX_SEARCH_TERMS {
            break;
        }
    }
    terms
}
