//! Case-insensitive whole-word matching of emphasis terms inside paragraph text.

use std::ops::Range;

use regex::{Regex, RegexBuilder};

/// Finds occurrences of a fixed set of terms. Longer terms win over their prefixes.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    regex: Regex,
    /// One start-anchored pattern per term, longest first, for retrying a
    /// position whose longest match is not a whole word.
    anchored: Vec<Regex>,
}

impl TermMatcher {
    /// Returns `None` when there is nothing to match.
    pub fn new<'a>(terms: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut terms: Vec<&str> = terms
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return None;
        }

        // Alternation is leftmost-first, so "Power BI" must come before "Power".
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        terms.dedup();

        let pattern = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");

        let regex = case_insensitive(&pattern)?;
        let anchored = terms
            .iter()
            .map(|t| case_insensitive(&format!("^(?:{})", regex::escape(t))))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { regex, anchored })
    }

    /// Byte ranges of every whole-word match, in order, non-overlapping.
    pub fn find_all(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut at = 0;

        while at <= text.len() {
            let Some(m) = self.regex.find_at(text, at) else {
                break;
            };
            let start = m.start();
            let whole_word = std::iter::once(m.range())
                .chain(self.anchored.iter().filter_map(|term| {
                    term.find(&text[start..]).map(|t| start..start + t.end())
                }))
                .find(|span| is_whole_word(text, span.clone()));

            match whole_word {
                Some(span) => {
                    at = span.end;
                    spans.push(span);
                }
                None => {
                    at = start + text[start..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }

        spans
    }
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A boundary is only required on a side where the match itself ends in a word
/// character, so terms like "C++" or ".NET" still match.
fn is_whole_word(text: &str, range: Range<usize>) -> bool {
    let matched = &text[range.clone()];
    let before = text[..range.start].chars().next_back();
    let after = text[range.end..].chars().next();

    let starts_in_word = matched.chars().next().is_some_and(is_word_char);
    let ends_in_word = matched.chars().next_back().is_some_and(is_word_char);

    let left_ok = !starts_in_word || !before.is_some_and(is_word_char);
    let right_ok = !ends_in_word || !after.is_some_and(is_word_char);
    left_ok && right_ok
}
