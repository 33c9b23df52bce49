//! Post-processing: deterministic cleanup of a vision-model title answer.
//!
//! The model is asked for the bare heading text, but answers still arrive
//! with LaTeX-style subscripts copied from scientific titles (`$_{2}$`),
//! stray dollar signs, line breaks where the heading wrapped, and the
//! occasional code fence. Each rule below is a pure `&str → String` pass.
//!
//! ## Rule Order
//!
//! Fences go first so the inner text is what the other rules see. The
//! subscript rule must run before `$` removal, otherwise `$_{2}$` would turn
//! into `_{2}` and no longer match.

use crate::error::TitleError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Turn a raw model answer into a single-line title.
///
/// Rules (applied in order):
/// 1. Strip outer code fences
/// 2. Unwrap `$_{x}$` subscripts to `x`
/// 3. Remove the remaining `$` characters
/// 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 5. Replace each run of line breaks with one space
/// 6. Trim
///
/// Returns [`TitleError::Empty`] when nothing is left.
pub fn clean_title(raw: &str) -> Result<String, TitleError> {
    let s = strip_fences(raw);
    let s = unwrap_subscripts(&s);
    let s = s.replace('$', "");
    let s = remove_invisible_chars(&s);
    let s = join_lines(&s);
    let title = s.trim();

    if title.is_empty() {
        return Err(TitleError::Empty);
    }
    Ok(title.to_string())
}

// ── Rule 1: Strip outer fences ───────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").unwrap());

fn strip_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Subscripts ───────────────────────────────────────────────────────

static RE_SUBSCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$_\{([^}]+)\}").unwrap());

fn unwrap_subscripts(input: &str) -> String {
    RE_SUBSCRIPT.replace_all(input, "$1").into_owned()
}

// ── Rule 4: Invisible characters ─────────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{2060}'], "")
}

// ── Rule 5: Line breaks ──────────────────────────────────────────────────────

static RE_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());

fn join_lines(input: &str) -> String {
    RE_LINE_BREAKS.replace_all(input, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscript_unwrapped() {
        assert_eq!(
            clean_title("CO$_{2}$ Emission Estimates").unwrap(),
            "CO2 Emission Estimates"
        );
        assert_eq!(clean_title("H$_{2}$O and $x$").unwrap(), "H2O and x");
    }

    #[test]
    fn test_line_breaks_become_spaces() {
        assert_eq!(
            clean_title("A Study of\nCitation Networks\r\n").unwrap(),
            "A Study of Citation Networks"
        );
        assert_eq!(clean_title("One\n\n\nTwo").unwrap(), "One Two");
    }

    #[test]
    fn test_fenced_answer() {
        assert_eq!(clean_title("```text\nDeep Learning\n```").unwrap(), "Deep Learning");
    }

    #[test]
    fn test_invisible_removed() {
        assert_eq!(clean_title("\u{FEFF}Title\u{200B}").unwrap(), "Title");
    }

    #[test]
    fn test_empty_answer_is_error() {
        assert_eq!(clean_title(""), Err(TitleError::Empty));
        assert_eq!(clean_title("  \n $$ \r\n"), Err(TitleError::Empty));
    }

    #[test]
    fn test_plain_title_unchanged() {
        assert_eq!(
            clean_title("Türkiye'de Yükseköğretim").unwrap(),
            "Türkiye'de Yükseköğretim"
        );
    }
}
