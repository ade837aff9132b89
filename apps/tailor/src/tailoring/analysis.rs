//! Job analysis — the structured record extracted from a job description and the
//! parser that recovers it from a free-form model response.
//!
//! Models rarely return bare JSON. The payload may sit inside code fences or be
//! surrounded by prose, so `parse_job_analysis` locates the first balanced JSON
//! object, parses it, and checks every field's shape before building a
//! `JobAnalysis`. It never returns a partially populated record.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::strip_json_fences;

/// The wrapper the language model integration returns for an analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnalysis {
    pub raw_response: String,
}

/// Structured analysis of a job description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAnalysis {
    pub profile_summary: String,
    pub skills: Vec<String>,
    pub experience_highlights: Vec<String>,
    pub keywords_to_emphasize: Vec<String>,
}

impl JobAnalysis {
    /// Keywords followed by skills, deduplicated case-insensitively, blanks dropped.
    pub fn emphasis_terms(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.keywords_to_emphasize
            .iter()
            .chain(self.skills.iter())
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .filter(|term| seen.insert(term.to_lowercase()))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model response")]
    NoPayload,

    #[error("malformed JSON object: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongShape {
        field: &'static str,
        expected: &'static str,
    },
}

const EXPECTED_STRING: &str = "a string";
const EXPECTED_STRING_LIST: &str = "an array of strings";

/// Extracts and validates a `JobAnalysis` from a raw model response.
pub fn parse_job_analysis(raw: &str) -> Result<JobAnalysis, ParseError> {
    let text = strip_json_fences(raw);
    let mut object = locate_json_object(text)?;

    Ok(JobAnalysis {
        profile_summary: take_string(&mut object, "profile_summary")?,
        skills: take_string_list(&mut object, "skills")?,
        experience_highlights: take_string_list(&mut object, "experience_highlights")?,
        keywords_to_emphasize: take_string_list(&mut object, "keywords_to_emphasize")?,
    })
}

/// Returns the first balanced `{ ... }` span in `text` that parses as a JSON object.
///
/// Every `{` is a candidate start, so stray braces in surrounding prose (or an
/// outer brace wrapping the payload) never hide a later object. The first
/// failure is reported only when no candidate parses.
fn locate_json_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    let mut first_error: Option<serde_json::Error> = None;
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let candidate = &text[start..];
        search_from = start + 1;

        // Unterminated spans go to serde whole so the error describes them.
        let span = balanced_object_len(candidate).map_or(candidate, |len| &candidate[..len]);
        match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.map_or(ParseError::NoPayload, ParseError::Malformed))
}

/// Byte length of the object starting at `text[0] == '{'`, or `None` if it never closes.
/// Braces inside JSON strings do not count.
fn balanced_object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn take_string(object: &mut Map<String, Value>, field: &'static str) -> Result<String, ParseError> {
    match object.remove(field) {
        None => Err(ParseError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ParseError::WrongShape {
            field,
            expected: EXPECTED_STRING,
        }),
    }
}

fn take_string_list(
    object: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, ParseError> {
    let wrong_shape = || ParseError::WrongShape {
        field,
        expected: EXPECTED_STRING_LIST,
    };

    match object.remove(field) {
        None => Err(ParseError::MissingField(field)),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(wrong_shape()),
            })
            .collect(),
        Some(_) => Err(wrong_shape()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_ANALYST_PAYLOAD: &str = r#"
        {
            "profile_summary": "Experienced Data Analyst with a strong background in IT and software, specializing in data analysis, optimization, and project management.",
            "skills": ["Data analysis", "Python", "SQL", "Power BI", "Tableau", "Excel"],
            "experience_highlights": ["Performed data analysis to support business strategies", "Created interactive dashboards using Power BI and Tableau"],
            "keywords_to_emphasize": ["data analysis", "optimization", "visualization", "Python", "SQL"]
        }
    "#;

    #[test]
    fn test_parses_bare_payload_exactly() {
        let analysis = parse_job_analysis(DATA_ANALYST_PAYLOAD).unwrap();
        assert!(analysis.profile_summary.starts_with("Experienced Data Analyst"));
        assert_eq!(
            analysis.skills,
            vec!["Data analysis", "Python", "SQL", "Power BI", "Tableau", "Excel"]
        );
        assert_eq!(analysis.experience_highlights.len(), 2);
        assert_eq!(analysis.keywords_to_emphasize[2], "visualization");
    }

    #[test]
    fn test_parses_payload_surrounded_by_prose() {
        let raw = format!(
            "Sure! Here is the analysis you asked for:\n{DATA_ANALYST_PAYLOAD}\nLet me know if you need more."
        );
        let analysis = parse_job_analysis(&raw).unwrap();
        assert_eq!(analysis.skills.len(), 6);
    }

    #[test]
    fn test_parses_payload_in_code_fences() {
        let raw = format!("```json\n{}\n```", DATA_ANALYST_PAYLOAD.trim());
        let analysis = parse_job_analysis(&raw).unwrap();
        assert_eq!(analysis.keywords_to_emphasize.len(), 5);
    }

    #[test]
    fn test_braces_inside_strings_do_not_end_the_object() {
        let raw = r#"{
            "profile_summary": "Writes {templated} SQL } and more",
            "skills": ["C++", "{curly}"],
            "experience_highlights": [],
            "keywords_to_emphasize": ["say \"hi\" }"]
        }"#;
        let analysis = parse_job_analysis(raw).unwrap();
        assert_eq!(analysis.profile_summary, "Writes {templated} SQL } and more");
        assert_eq!(analysis.skills[1], "{curly}");
        assert_eq!(analysis.keywords_to_emphasize[0], "say \"hi\" }");
    }

    #[test]
    fn test_skips_stray_braces_in_leading_prose() {
        let raw = format!("Fields are {{profile_summary, skills}}. Result: {DATA_ANALYST_PAYLOAD}");
        let analysis = parse_job_analysis(&raw).unwrap();
        assert_eq!(analysis.skills[0], "Data analysis");
    }

    #[test]
    fn test_unmatched_brace_in_prose_does_not_hide_payload() {
        let raw = format!(
            "Note: I used the {{schema you gave. Here it is:\n{DATA_ANALYST_PAYLOAD}"
        );
        let analysis = parse_job_analysis(&raw).unwrap();
        assert_eq!(analysis.skills.len(), 6);
    }

    #[test]
    fn test_payload_wrapped_in_braced_prose() {
        let raw = format!("{{Result: {DATA_ANALYST_PAYLOAD}}}");
        let analysis = parse_job_analysis(&raw).unwrap();
        assert!(analysis.profile_summary.starts_with("Experienced Data Analyst"));
        assert_eq!(analysis.keywords_to_emphasize.len(), 5);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let raw = r#"{"profile_summary": "", "skills": [], "experience_highlights": [],
                      "keywords_to_emphasize": [], "seniority": "senior"}"#;
        let analysis = parse_job_analysis(raw).unwrap();
        assert_eq!(analysis, JobAnalysis::default());
    }

    #[test]
    fn test_no_object_is_no_payload() {
        let err = parse_job_analysis("I could not analyze this job description.").unwrap_err();
        assert!(matches!(err, ParseError::NoPayload));
    }

    #[test]
    fn test_empty_response_is_no_payload() {
        assert!(matches!(
            parse_job_analysis("").unwrap_err(),
            ParseError::NoPayload
        ));
    }

    #[test]
    fn test_truncated_object_is_malformed() {
        let raw = r#"{"profile_summary": "Analyst", "skills": ["SQL""#;
        assert!(matches!(
            parse_job_analysis(raw).unwrap_err(),
            ParseError::Malformed(_)
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let raw = "{profile_summary: 'single quotes are not JSON'}";
        assert!(matches!(
            parse_job_analysis(raw).unwrap_err(),
            ParseError::Malformed(_)
        ));
    }

    #[test]
    fn test_missing_field_is_reported_by_name() {
        let raw = r#"{"profile_summary": "Analyst", "skills": ["SQL"], "experience_highlights": []}"#;
        match parse_job_analysis(raw).unwrap_err() {
            ParseError::MissingField(field) => assert_eq!(field, "keywords_to_emphasize"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_skills_as_string_is_wrong_shape() {
        let raw = r#"{"profile_summary": "Analyst", "skills": "SQL, Python",
                      "experience_highlights": [], "keywords_to_emphasize": []}"#;
        match parse_job_analysis(raw).unwrap_err() {
            ParseError::WrongShape { field, expected } => {
                assert_eq!(field, "skills");
                assert_eq!(expected, EXPECTED_STRING_LIST);
            }
            other => panic!("expected WrongShape, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_list_element_is_wrong_shape() {
        let raw = r#"{"profile_summary": "Analyst", "skills": ["SQL", 42],
                      "experience_highlights": [], "keywords_to_emphasize": []}"#;
        assert!(matches!(
            parse_job_analysis(raw).unwrap_err(),
            ParseError::WrongShape { field: "skills", .. }
        ));
    }

    #[test]
    fn test_summary_as_list_is_wrong_shape() {
        let raw = r#"{"profile_summary": ["Analyst"], "skills": [],
                      "experience_highlights": [], "keywords_to_emphasize": []}"#;
        assert!(matches!(
            parse_job_analysis(raw).unwrap_err(),
            ParseError::WrongShape {
                field: "profile_summary",
                ..
            }
        ));
    }

    #[test]
    fn test_null_field_is_wrong_shape() {
        let raw = r#"{"profile_summary": "Analyst", "skills": [],
                      "experience_highlights": null, "keywords_to_emphasize": []}"#;
        assert!(matches!(
            parse_job_analysis(raw).unwrap_err(),
            ParseError::WrongShape {
                field: "experience_highlights",
                ..
            }
        ));
    }

    #[test]
    fn test_emphasis_terms_dedupes_case_insensitively() {
        let analysis = JobAnalysis {
            skills: vec!["Python".into(), "SQL".into(), "Excel".into()],
            keywords_to_emphasize: vec!["python".into(), "  ".into(), "data analysis".into()],
            ..Default::default()
        };
        assert_eq!(
            analysis.emphasis_terms(),
            vec!["python", "data analysis", "SQL", "Excel"]
        );
    }
}
