//! Document updater — turns a job description into a tailored résumé and cover letter.
//!
//! Flow: analyze job description (LLM) → parse/validate analysis →
//!       open template fresh → apply markers and emphasis → atomic write.
//!
//! Templates are only ever read. Each operation re-opens its template, so no
//! document state carries over between calls.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::document::{DocxPackage, Paragraph, TermMatcher};
use crate::errors::TailorError;
use crate::llm_client::LlmError;
use crate::tailoring::analysis::{parse_job_analysis, JobAnalysis};
use crate::tailoring::integration::LanguageModel;
use crate::tailoring::markers::{
    self, CoverLetterBody, SummaryTarget, DATE_FORMAT, DATE_MARKER,
    EXPERIENCE_HIGHLIGHTS_MARKER, PROFILE_SUMMARY_MARKER, SKILLS_MARKER, SKILL_SEPARATOR,
};

/// Paths of both tailored documents plus the analysis that produced them.
#[derive(Debug, Clone)]
pub struct TailoredDocuments {
    pub analysis: JobAnalysis,
    pub cv_path: PathBuf,
    pub cover_letter_path: PathBuf,
}

/// What `tailor_cv` changed, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CvEdits {
    pub summary_placed: bool,
    pub skills_markers: usize,
    pub highlight_paragraphs: usize,
    pub emphasized_paragraphs: usize,
}

pub struct DocumentUpdater {
    cv_template: PathBuf,
    cover_letter_template: PathBuf,
    llm: Arc<dyn LanguageModel>,
}

impl DocumentUpdater {
    pub fn new(
        cv_template: impl Into<PathBuf>,
        cover_letter_template: impl Into<PathBuf>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            cv_template: cv_template.into(),
            cover_letter_template: cover_letter_template.into(),
            llm,
        }
    }

    /// Asks the model for an analysis and validates the embedded JSON.
    /// An empty description is passed through; the model decides what to return.
    pub async fn analyze_job_description(
        &self,
        job_description: &str,
    ) -> Result<JobAnalysis, TailorError> {
        info!(
            "Analyzing job description ({} chars)",
            job_description.chars().count()
        );
        let raw = self.llm.analyze_job_description(job_description).await?;

        let analysis = parse_job_analysis(&raw.raw_response).inspect_err(|e| {
            warn!("Model response did not contain a usable job analysis: {e}");
        })?;

        info!(
            "Job analysis parsed: {} skills, {} highlights, {} keywords",
            analysis.skills.len(),
            analysis.experience_highlights.len(),
            analysis.keywords_to_emphasize.len()
        );
        Ok(analysis)
    }

    /// Writes a tailored résumé to `output_path` and returns that path.
    pub async fn update_cv(
        &self,
        job_description: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<PathBuf, TailorError> {
        let output_path = output_path.as_ref();
        ensure_not_template(&self.cv_template, output_path)?;
        let package = DocxPackage::open(&self.cv_template)?;

        let analysis = self.analyze_job_description(job_description).await?;
        self.write_cv(package, &analysis, output_path)
    }

    /// Writes a tailored cover letter to `output_path` and returns that path.
    pub async fn update_cover_letter(
        &self,
        job_description: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<PathBuf, TailorError> {
        let output_path = output_path.as_ref();
        ensure_not_template(&self.cover_letter_template, output_path)?;
        let package = DocxPackage::open(&self.cover_letter_template)?;

        let analysis = self.analyze_job_description(job_description).await?;
        self.write_cover_letter(package, &analysis, output_path)
            .await
    }

    /// Produces both documents from a single analysis call.
    pub async fn tailor_documents(
        &self,
        job_description: &str,
        cv_output: impl AsRef<Path>,
        cover_letter_output: impl AsRef<Path>,
    ) -> Result<TailoredDocuments, TailorError> {
        let cv_output = cv_output.as_ref();
        let cover_letter_output = cover_letter_output.as_ref();
        ensure_not_template(&self.cv_template, cv_output)?;
        ensure_not_template(&self.cover_letter_template, cover_letter_output)?;
        let cv = DocxPackage::open(&self.cv_template)?;
        let cover_letter = DocxPackage::open(&self.cover_letter_template)?;

        let analysis = self.analyze_job_description(job_description).await?;
        let cv_path = self.write_cv(cv, &analysis, cv_output)?;
        let cover_letter_path = self
            .write_cover_letter(cover_letter, &analysis, cover_letter_output)
            .await?;

        Ok(TailoredDocuments {
            analysis,
            cv_path,
            cover_letter_path,
        })
    }

    fn write_cv(
        &self,
        mut package: DocxPackage,
        analysis: &JobAnalysis,
        output_path: &Path,
    ) -> Result<PathBuf, TailorError> {
        let edits = tailor_cv(&mut package, analysis);
        if !edits.summary_placed {
            warn!(
                "No {} marker or summary heading in {}; profile summary not inserted",
                PROFILE_SUMMARY_MARKER,
                self.cv_template.display()
            );
        }
        info!(
            "CV tailored: {} skills markers, {} highlight paragraphs, {} paragraphs emphasized",
            edits.skills_markers, edits.highlight_paragraphs, edits.emphasized_paragraphs
        );

        package.save(output_path)?;
        Ok(output_path.to_path_buf())
    }

    async fn write_cover_letter(
        &self,
        mut package: DocxPackage,
        analysis: &JobAnalysis,
        output_path: &Path,
    ) -> Result<PathBuf, TailorError> {
        let body = markers::find_cover_letter_body(&package.paragraph_texts()).ok_or_else(|| {
            TailorError::template(
                &self.cover_letter_template,
                "no {{COVER_LETTER_BODY}} marker and no body between salutation and closing",
            )
        })?;

        let prose = self
            .llm
            .tailor_cover_letter(&body.template_text, analysis)
            .await?;
        let blocks = split_blocks(&prose);
        if blocks.is_empty() {
            return Err(LlmError::EmptyContent.into());
        }

        replace_body(&mut package, &body, &blocks);
        let today = chrono::Local::now().format(DATE_FORMAT).to_string();
        fill_marker(&mut package, DATE_MARKER, &today);
        info!("Cover letter body replaced with {} paragraphs", blocks.len());

        package.save(output_path)?;
        Ok(output_path.to_path_buf())
    }
}

/// Applies the résumé marker convention and keyword emphasis to `package`.
pub fn tailor_cv(package: &mut DocxPackage, analysis: &JobAnalysis) -> CvEdits {
    let mut edits = CvEdits::default();
    let texts = package.paragraph_texts();

    match markers::find_summary_target(&texts) {
        Some(SummaryTarget::Marker(_)) => {
            fill_marker(package, PROFILE_SUMMARY_MARKER, &analysis.profile_summary);
            edits.summary_placed = true;
        }
        Some(SummaryTarget::AfterHeading(i)) => {
            if let Some(p) = package.paragraph(i) {
                let replacement = p.with_text(&analysis.profile_summary);
                package.splice_paragraphs(i..i + 1, vec![replacement]);
                edits.summary_placed = true;
            }
        }
        None => {}
    }

    let skills = analysis.skills.join(SKILL_SEPARATOR);
    edits.skills_markers = fill_marker(package, SKILLS_MARKER, &skills);

    // Highest index first so earlier indices stay valid while paragraphs multiply.
    let texts = package.paragraph_texts();
    for i in markers::marker_positions(&texts, EXPERIENCE_HIGHLIGHTS_MARKER)
        .into_iter()
        .rev()
    {
        let Some(proto) = package.paragraph(i).cloned() else {
            continue;
        };
        let replacement: Vec<Paragraph> = analysis
            .experience_highlights
            .iter()
            .map(|h| proto.with_text(&texts[i].replace(EXPERIENCE_HIGHLIGHTS_MARKER, h)))
            .collect();
        edits.highlight_paragraphs += replacement.len();
        package.splice_paragraphs(i..i + 1, replacement);
    }

    if let Some(matcher) = TermMatcher::new(analysis.emphasis_terms()) {
        edits.emphasized_paragraphs = package
            .paragraphs_mut()
            .filter(|p| !p.is_generated())
            .map(|p| p.emphasize(&matcher))
            .filter(|&changed| changed)
            .count();
    }

    edits
}

/// Replaces `marker` with `value` in every paragraph containing it. Returns how many.
fn fill_marker(package: &mut DocxPackage, marker: &str, value: &str) -> usize {
    let mut filled = 0;
    for p in package.paragraphs_mut() {
        let text = p.text();
        if text.contains(marker) {
            *p = p.with_text(&text.replace(marker, value));
            filled += 1;
        }
    }
    filled
}

/// Swaps the cover-letter body for `blocks`, one paragraph each, keeping the
/// template's empty spacer paragraphs if it used them.
fn replace_body(package: &mut DocxPackage, body: &CoverLetterBody, blocks: &[String]) {
    let originals: Vec<Paragraph> = package
        .paragraphs()
        .skip(body.range.start)
        .take(body.range.len())
        .cloned()
        .collect();
    let Some(proto) = originals.iter().find(|p| !p.is_blank()) else {
        return;
    };
    let spacer = originals.iter().find(|p| p.is_blank()).filter(|_| body.spaced);

    let mut replacement = Vec::with_capacity(blocks.len() * 2);
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            if let Some(spacer) = spacer {
                replacement.push(spacer.clone());
            }
        }
        replacement.push(proto.with_text(block));
    }

    package.splice_paragraphs(body.range.clone(), replacement);
}

/// Splits model prose into paragraphs on blank lines; wrapped lines are rejoined.
fn split_blocks(prose: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in prose.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join(" "));
    }

    blocks
}

/// Rejects an output path that resolves to the template itself.
fn ensure_not_template(template: &Path, output: &Path) -> Result<(), TailorError> {
    let Ok(template) = fs::canonicalize(template) else {
        // A missing template is reported when it is opened.
        return Ok(());
    };
    if resolve(output).is_some_and(|out| out == template) {
        return Err(TailorError::io(
            output,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "output path would overwrite the template",
            ),
        ));
    }
    Ok(())
}

/// Canonical form of a path that may not exist yet.
fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(existing) = fs::canonicalize(path) {
        return Some(existing);
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Some(fs::canonicalize(parent).ok()?.join(path.file_name()?))
}
