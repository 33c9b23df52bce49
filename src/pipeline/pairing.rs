//! Input pairing: match citing PDFs to publication-info PDFs.
//!
//! Users upload two folders named the same way (`1.pdf … 12.pdf`), so each
//! list is sorted by file name on its own and the lists are zipped by index.
//! Plain lexicographic order would put `10.pdf` before `2.pdf`; the
//! comparison here treats digit runs as numbers and ignores case and accents.

use crate::error::ReportError;
use crate::model::{CitationPair, NamedPdf};
use std::cmp::Ordering;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Validate, sort and pair the two input lists.
///
/// Fails before any PDF is opened when the lists are empty or differ in
/// length.
pub fn pair_inputs(
    mut citing: Vec<NamedPdf>,
    mut publication: Vec<NamedPdf>,
) -> Result<Vec<CitationPair>, ReportError> {
    if citing.len() != publication.len() {
        return Err(ReportError::CountMismatch {
            citing: citing.len(),
            publication: publication.len(),
        });
    }
    if citing.is_empty() {
        return Err(ReportError::EmptyInput { which: "citing" });
    }

    citing.sort_by(|a, b| natural_cmp(&a.file_name, &b.file_name));
    publication.sort_by(|a, b| natural_cmp(&a.file_name, &b.file_name));

    let pairs: Vec<CitationPair> = citing
        .into_iter()
        .zip(publication)
        .map(|(c, p)| {
            debug!("Paired '{}' with '{}'", c.file_name, p.file_name);
            CitationPair::new(c, p)
        })
        .collect();

    Ok(pairs)
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk {
    Number(String),
    Text(String),
}

/// Split into digit runs (leading zeros dropped) and folded text runs.
fn chunks(s: &str) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for c in s.nfd().filter(|c| !is_combining_mark(*c)) {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != in_digits {
            out.push(finish_chunk(std::mem::take(&mut current), in_digits));
        }
        in_digits = is_digit;
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        out.push(finish_chunk(current, in_digits));
    }
    out
}

fn finish_chunk(run: String, digits: bool) -> Chunk {
    if digits {
        let trimmed = run.trim_start_matches('0');
        Chunk::Number(if trimmed.is_empty() { "0".into() } else { trimmed.into() })
    } else {
        Chunk::Text(run)
    }
}

fn cmp_chunk(a: &Chunk, b: &Chunk) -> Ordering {
    match (a, b) {
        // No leading zeros, so a longer digit run is a larger number.
        (Chunk::Number(x), Chunk::Number(y)) => x.len().cmp(&y.len()).then_with(|| x.cmp(y)),
        (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
        (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
    }
}

/// Natural file-name ordering: `"2.pdf" < "10.pdf"`, `"a.pdf" == "A.pdf"`
/// up to the raw-string tie-break that keeps the order total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        match cmp_chunk(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> NamedPdf {
        NamedPdf::new(name, name.as_bytes().to_vec())
    }

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        v.sort_by(|a, b| natural_cmp(a, b));
        v
    }

    #[test]
    fn numeric_runs_compare_by_value() {
        assert_eq!(
            sorted(&["f2.pdf", "f10.pdf", "f1.pdf"]),
            vec!["f1.pdf", "f2.pdf", "f10.pdf"]
        );
        assert_eq!(
            sorted(&["10.pdf", "9.pdf", "100.pdf"]),
            vec!["9.pdf", "10.pdf", "100.pdf"]
        );
    }

    #[test]
    fn case_and_accents_are_ignored() {
        assert_eq!(natural_cmp("Atif2.pdf", "atif10.pdf"), Ordering::Less);
        assert_eq!(natural_cmp("Örnek3.pdf", "ornek12.pdf"), Ordering::Less);
        assert_eq!(sorted(&["b.pdf", "A.pdf"]), vec!["A.pdf", "b.pdf"]);
    }

    #[test]
    fn leading_zeros_do_not_change_value() {
        assert_eq!(sorted(&["007.pdf", "8.pdf"]), vec!["007.pdf", "8.pdf"]);
        assert_ne!(natural_cmp("07.pdf", "7.pdf"), Ordering::Equal);
    }

    #[test]
    fn pairs_by_sorted_position() {
        let pairs = pair_inputs(
            vec![pdf("c10.pdf"), pdf("c2.pdf"), pdf("c1.pdf")],
            vec![pdf("p2.pdf"), pdf("p1.pdf"), pdf("p10.pdf")],
        )
        .unwrap();
        let names: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.citing.file_name.as_str(), p.publication.file_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("c1.pdf", "p1.pdf"), ("c2.pdf", "p2.pdf"), ("c10.pdf", "p10.pdf")]
        );
        assert_eq!(pairs[2].name, "c10");
    }

    #[test]
    fn mismatch_is_rejected() {
        let err = pair_inputs(
            vec![pdf("1.pdf"), pdf("2.pdf"), pdf("3.pdf")],
            vec![pdf("1.pdf"), pdf("2.pdf")],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReportError::CountMismatch {
                citing: 3,
                publication: 2
            }
        ));
    }

    #[test]
    fn empty_is_rejected() {
        let err = pair_inputs(vec![], vec![]).unwrap_err();
        assert!(matches!(err, ReportError::EmptyInput { .. }));
    }
}
