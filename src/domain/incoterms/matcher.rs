//! Resolution of free-text Incoterm strings against the catalog.
//!
//! Extracted documents state their trade term in many shapes: `"FOB"`,
//! `"fob"`, `"F.O.B. Shanghai"`, `"Free on Board"`, `"CIF-Rotterdam"`. The
//! matcher tries four strategies in order and returns the first hit:
//!
//! 1. **Exact code** - normalized input equals a code
//! 2. **Embedded code** - first 3-4 letter token in the text that is a code
//! 3. **Name** - normalized name and input are equal or one contains the other
//! 4. **Partial code** - normalized input and a code contain one another

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::catalog::{Incoterm, all_incoterms, default_incoterm};

static CODE_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{3,4}\b").unwrap());

/// Upper-cases and strips dots, whitespace and hyphens.
pub fn normalize_incoterm(input: &str) -> String {
    input
        .to_uppercase()
        .chars()
        .filter(|c| *c != '.' && *c != '-' && !c.is_whitespace())
        .collect()
}

/// Matches extracted text to a catalog entry.
///
/// Returns `None` for missing, blank, or unrecognized input. Callers decide
/// what to default to; see [`resolve_incoterm`].
pub fn match_incoterm(input: Option<&str>) -> Option<&'static Incoterm> {
    let raw = input.map(str::trim).filter(|s| !s.is_empty())?;
    let normalized = normalize_incoterm(raw);
    if normalized.is_empty() {
        return None;
    }
    let catalog = all_incoterms();

    if let Some(term) = catalog.iter().find(|t| t.code == normalized) {
        tracing::debug!(input = raw, code = term.code, "Incoterm matched by exact code");
        return Some(term);
    }

    // Dots are dropped so "F.O.B." still forms a token; hyphens and spaces
    // stay as word boundaries.
    let tokenizable = raw.to_uppercase().replace('.', "");
    for token in CODE_TOKEN_REGEX.find_iter(&tokenizable) {
        if let Some(term) = catalog.iter().find(|t| t.code == token.as_str()) {
            tracing::debug!(input = raw, code = term.code, "Incoterm matched by embedded code");
            return Some(term);
        }
    }

    if let Some(term) = catalog.iter().find(|t| {
        let name = normalize_incoterm(t.name);
        name == normalized || normalized.contains(&name) || name.contains(&normalized)
    }) {
        tracing::debug!(input = raw, code = term.code, "Incoterm matched by name");
        return Some(term);
    }

    let matched = catalog
        .iter()
        .find(|t| normalized.contains(t.code) || t.code.contains(normalized.as_str()));
    if let Some(term) = matched {
        tracing::debug!(input = raw, code = term.code, "Incoterm matched by partial code");
    }
    matched
}

/// How the effective Incoterm of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncotermSource {
    /// The stated term was recognized.
    Matched,
    /// Nothing was stated (empty, `N/A`, `NA`).
    Defaulted,
    /// A term was stated but could not be matched.
    Unrecognized,
}

impl IncotermSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncotermSource::Matched => "matched",
            IncotermSource::Defaulted => "defaulted",
            IncotermSource::Unrecognized => "unrecognized",
        }
    }
}

/// An Incoterm chosen for a document together with how it was chosen.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedIncoterm {
    pub incoterm: &'static Incoterm,
    pub source: IncotermSource,
}

/// Applies the document default policy on top of [`match_incoterm`].
///
/// Missing, `N/A` and `NA` inputs, and inputs no tier recognizes, resolve to
/// the default term (FOB).
pub fn resolve_incoterm(input: Option<&str>) -> ResolvedIncoterm {
    let stated = input.map(str::trim).unwrap_or_default();

    let resolved = if stated.is_empty()
        || stated.eq_ignore_ascii_case("N/A")
        || stated.eq_ignore_ascii_case("NA")
    {
        ResolvedIncoterm {
            incoterm: default_incoterm(),
            source: IncotermSource::Defaulted,
        }
    } else {
        match match_incoterm(Some(stated)) {
            Some(incoterm) => ResolvedIncoterm {
                incoterm,
                source: IncotermSource::Matched,
            },
            None => ResolvedIncoterm {
                incoterm: default_incoterm(),
                source: IncotermSource::Unrecognized,
            },
        }
    };

    metrics::counter!("incoterm_resolutions_total", "source" => resolved.source.as_str())
        .increment(1);

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::incoterms::catalog::incoterm_by_code;

    fn code_of(input: Option<&str>) -> Option<&'static str> {
        match_incoterm(input).map(|t| t.code)
    }

    #[test]
    fn test_every_code_matches_itself_in_any_case() {
        for term in all_incoterms() {
            assert_eq!(code_of(Some(term.code)), Some(term.code));
            assert_eq!(
                code_of(Some(&term.code.to_lowercase())),
                Some(term.code)
            );
        }
    }

    #[test]
    fn test_embedded_code_with_place() {
        assert_eq!(code_of(Some("FOB Shanghai")), Some("FOB"));
        assert_eq!(code_of(Some("CIF-Rotterdam")), Some("CIF"));
        assert_eq!(code_of(Some("F.O.B. Ningbo")), Some("FOB"));
    }

    #[test]
    fn test_first_embedded_code_wins_by_position() {
        // CIF precedes FOB in the catalog; scan order must win.
        assert_eq!(code_of(Some("FOB or CIF")), Some("FOB"));
        assert_eq!(code_of(Some("DDP, else EXW")), Some("DDP"));
    }

    #[test]
    fn test_match_by_full_name() {
        assert_eq!(code_of(Some("Free On Board")), Some("FOB"));
        assert_eq!(code_of(Some("delivered duty paid")), Some("DDP"));
        assert_eq!(code_of(Some("Ex-Works")), Some("EXW"));
        assert_eq!(code_of(Some("Carriage Paid To New York")), Some("CPT"));
    }

    #[test]
    fn test_partial_code_fallback() {
        assert_eq!(code_of(Some("incotermFOBport")), Some("FOB"));
    }

    #[test]
    fn test_blank_and_unknown_inputs() {
        assert_eq!(code_of(None), None);
        assert_eq!(code_of(Some("")), None);
        assert_eq!(code_of(Some("   ")), None);
        assert_eq!(code_of(Some("...")), None);
        assert_eq!(code_of(Some("XYZ")), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_incoterm("f.o.b - Port"), "FOBPORT");
    }

    #[test]
    fn test_resolve_defaults_to_fob() {
        for input in [None, Some(""), Some("N/A"), Some("n/a"), Some(" NA ")] {
            let resolved = resolve_incoterm(input);
            assert_eq!(resolved.incoterm.code, "FOB");
            assert_eq!(resolved.source, IncotermSource::Defaulted);
        }

        let resolved = resolve_incoterm(Some("XYZ"));
        assert_eq!(resolved.incoterm.code, "FOB");
        assert_eq!(resolved.source, IncotermSource::Unrecognized);
    }

    #[test]
    fn test_resolve_keeps_recognized_term() {
        let resolved = resolve_incoterm(Some("ddp"));

        assert_eq!(resolved.source, IncotermSource::Matched);
        assert_eq!(resolved.incoterm, incoterm_by_code("DDP").unwrap());
    }
}
