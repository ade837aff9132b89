//! Template-marker convention: where tailored content lands in a template.
//!
//! Résumé templates may carry `{{PROFILE_SUMMARY}}`, `{{SKILLS}}` and
//! `{{EXPERIENCE_HIGHLIGHTS}}` placeholders; without a summary placeholder the
//! paragraph after a "Summary"/"Profile" heading is used. Cover letters carry
//! `{{COVER_LETTER_BODY}}`, or else everything between the salutation and the
//! closing is the body. `{{DATE}}` becomes today's date.

use std::ops::Range;

pub const PROFILE_SUMMARY_MARKER: &str = "{{PROFILE_SUMMARY}}";
pub const SKILLS_MARKER: &str = "{{SKILLS}}";
pub const EXPERIENCE_HIGHLIGHTS_MARKER: &str = "{{EXPERIENCE_HIGHLIGHTS}}";
pub const COVER_LETTER_BODY_MARKER: &str = "{{COVER_LETTER_BODY}}";
pub const DATE_MARKER: &str = "{{DATE}}";

pub const SKILL_SEPARATOR: &str = " • ";
pub const DATE_FORMAT: &str = "%B %-d, %Y";

const SUMMARY_HEADINGS: &[&str] = &[
    "profile",
    "summary",
    "professional summary",
    "profile summary",
    "professional profile",
    "about me",
];

/// Section titles that end a summary section.
const SECTION_HEADINGS: &[&str] = &[
    "experience",
    "work experience",
    "professional experience",
    "employment",
    "employment history",
    "work history",
    "education",
    "skills",
    "core skills",
    "technical skills",
    "key skills",
    "projects",
    "certifications",
    "achievements",
    "languages",
    "interests",
    "references",
];

const SALUTATION: &str = "dear";

const CLOSINGS: &[&str] = &[
    "sincerely",
    "best regards",
    "kind regards",
    "warm regards",
    "regards",
    "yours",
    "respectfully",
];

/// Where the profile summary goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryTarget {
    /// Paragraph containing `{{PROFILE_SUMMARY}}`; only the marker is replaced.
    Marker(usize),
    /// First non-empty paragraph after a summary heading; replaced whole.
    AfterHeading(usize),
}

/// The body paragraphs of a cover letter and the text the model sees as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverLetterBody {
    pub range: Range<usize>,
    pub template_text: String,
    /// The template separates body paragraphs with empty paragraphs.
    pub spaced: bool,
}

pub fn find_marker(texts: &[String], marker: &str) -> Option<usize> {
    texts.iter().position(|t| t.contains(marker))
}

pub fn marker_positions(texts: &[String], marker: &str) -> Vec<usize> {
    texts
        .iter()
        .enumerate()
        .filter(|(_, t)| t.contains(marker))
        .map(|(i, _)| i)
        .collect()
}

pub fn find_summary_target(texts: &[String]) -> Option<SummaryTarget> {
    if let Some(i) = find_marker(texts, PROFILE_SUMMARY_MARKER) {
        return Some(SummaryTarget::Marker(i));
    }

    let heading = texts.iter().position(|t| is_summary_heading(t))?;
    let offset = texts[heading + 1..]
        .iter()
        .position(|t| !t.trim().is_empty())?;
    let target = heading + 1 + offset;

    // An empty summary section: the next paragraph already starts another one.
    if is_section_heading(&texts[target]) {
        return None;
    }
    Some(SummaryTarget::AfterHeading(target))
}

pub fn find_cover_letter_body(texts: &[String]) -> Option<CoverLetterBody> {
    if let Some(i) = find_marker(texts, COVER_LETTER_BODY_MARKER) {
        let template_text = join_non_blank(
            texts
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, t)| t.as_str()),
        );
        return Some(CoverLetterBody {
            range: i..i + 1,
            template_text,
            spaced: false,
        });
    }

    let salutation = texts.iter().position(|t| starts_with_word(t, SALUTATION))?;
    let closing = salutation
        + 1
        + texts[salutation + 1..]
            .iter()
            .position(|t| CLOSINGS.iter().any(|c| starts_with_word(t, c)))?;

    let inner = &texts[salutation + 1..closing];
    let first = inner.iter().position(|t| !t.trim().is_empty())?;
    let last = inner.iter().rposition(|t| !t.trim().is_empty())?;
    let body = &inner[first..=last];

    Some(CoverLetterBody {
        range: salutation + 1 + first..salutation + 2 + last,
        template_text: join_non_blank(body.iter().map(String::as_str)),
        spaced: body.iter().any(|t| t.trim().is_empty()),
    })
}

fn is_summary_heading(text: &str) -> bool {
    SUMMARY_HEADINGS.contains(&normalize_heading(text).as_str())
}

/// A known section title, or a short all-caps line such as "EMPLOYMENT HISTORY".
fn is_section_heading(text: &str) -> bool {
    let normalized = normalize_heading(text);
    if is_summary_heading(text) || SECTION_HEADINGS.contains(&normalized.as_str()) {
        return true;
    }

    let trimmed = text.trim().trim_end_matches(':');
    trimmed.chars().count() <= 40
        && trimmed.chars().any(char::is_alphabetic)
        && !trimmed.chars().any(char::is_lowercase)
}

fn normalize_heading(text: &str) -> String {
    text.trim().trim_end_matches(':').trim().to_lowercase()
}

/// Case-insensitive prefix match that does not accept "Dearborn" for "dear".
fn starts_with_word(text: &str, word: &str) -> bool {
    let lower = text.trim_start().to_lowercase();
    lower
        .strip_prefix(word)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
}

fn join_non_blank<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    texts
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_summary_marker_wins_over_heading() {
        let t = texts(&["Summary", "Old summary", "Profile: {{PROFILE_SUMMARY}}"]);
        assert_eq!(find_summary_target(&t), Some(SummaryTarget::Marker(2)));
    }

    #[test]
    fn test_summary_after_heading_skips_blank_paragraphs() {
        let t = texts(&["Olha Polishchuk", "PROFESSIONAL SUMMARY:", "", "Analyst with 5 years"]);
        assert_eq!(find_summary_target(&t), Some(SummaryTarget::AfterHeading(3)));
    }

    #[test]
    fn test_no_summary_target() {
        let t = texts(&["Experience", "Summary"]);
        assert_eq!(find_summary_target(&t), None);
        assert_eq!(find_summary_target(&texts(&["Education"])), None);
    }

    #[test]
    fn test_empty_summary_section_does_not_claim_next_heading() {
        let t = texts(&["Jane Doe", "Summary", "", "Experience", "Analyst at Acme"]);
        assert_eq!(find_summary_target(&t), None);

        let t = texts(&["Profile:", "EMPLOYMENT HISTORY", "Analyst at Acme"]);
        assert_eq!(find_summary_target(&t), None);
    }

    #[test]
    fn test_heading_must_match_whole_paragraph() {
        let t = texts(&["Summary of qualifications follows", "Line"]);
        assert_eq!(find_summary_target(&t), None);
    }

    #[test]
    fn test_marker_positions_lists_all() {
        let t = texts(&["{{SKILLS}}", "x", "Core: {{SKILLS}}"]);
        assert_eq!(marker_positions(&t, SKILLS_MARKER), vec![0, 2]);
    }

    #[test]
    fn test_cover_letter_body_between_salutation_and_closing() {
        let t = texts(&[
            "Jane Doe",
            "Dear Hiring Manager,",
            "",
            "First paragraph.",
            "",
            "Second paragraph.",
            "",
            "Sincerely,",
            "Jane",
        ]);
        let body = find_cover_letter_body(&t).unwrap();
        assert_eq!(body.range, 3..6);
        assert_eq!(body.template_text, "First paragraph.\n\nSecond paragraph.");
        assert!(body.spaced);
    }

    #[test]
    fn test_cover_letter_body_without_spacing() {
        let t = texts(&["Dear team,", "Only paragraph.", "Kind regards,"]);
        let body = find_cover_letter_body(&t).unwrap();
        assert_eq!(body.range, 1..2);
        assert!(!body.spaced);
    }

    #[test]
    fn test_cover_letter_marker_uses_rest_as_context() {
        let t = texts(&["{{DATE}}", "Dear team,", "{{COVER_LETTER_BODY}}", "", "Regards,"]);
        let body = find_cover_letter_body(&t).unwrap();
        assert_eq!(body.range, 2..3);
        assert_eq!(body.template_text, "{{DATE}}\n\nDear team,\n\nRegards,");
    }

    #[test]
    fn test_cover_letter_without_body_is_none() {
        assert!(find_cover_letter_body(&texts(&["Dear team,", "", "Sincerely,"])).is_none());
        assert!(find_cover_letter_body(&texts(&["Dear team,", "Text"])).is_none());
        assert!(find_cover_letter_body(&texts(&["Hello,", "Text", "Sincerely,"])).is_none());
    }

    #[test]
    fn test_salutation_requires_whole_word() {
        let t = texts(&["Dearborn office", "Dear Ms. Smith,", "Body", "Yours faithfully,"]);
        assert_eq!(find_cover_letter_body(&t).unwrap().range, 2..3);
    }
}
