//! Language model integration — the capability the updater depends on.
//!
//! `LlmClient` is the production implementation. Tests substitute a stub with
//! fixed responses. The updater holds an `Arc<dyn LanguageModel>`.

use async_trait::async_trait;
use tracing::debug;

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::tailoring::analysis::{JobAnalysis, RawAnalysis};
use crate::tailoring::prompts::{
    COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM, JOB_ANALYSIS_PROMPT_TEMPLATE,
    JOB_ANALYSIS_ROLE,
};

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the model's unparsed analysis of `job_description`.
    async fn analyze_job_description(&self, job_description: &str)
        -> Result<RawAnalysis, LlmError>;

    /// Returns replacement cover-letter body text.
    async fn tailor_cover_letter(
        &self,
        template_body: &str,
        analysis: &JobAnalysis,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn analyze_job_description(
        &self,
        job_description: &str,
    ) -> Result<RawAnalysis, LlmError> {
        let prompt = JOB_ANALYSIS_PROMPT_TEMPLATE.replace("{job_description}", job_description);
        let system = format!("{JOB_ANALYSIS_ROLE} {JSON_ONLY_SYSTEM}");
        let raw_response = self.call_text(&prompt, &system).await?;
        debug!("Job analysis response: {} chars", raw_response.len());
        Ok(RawAnalysis { raw_response })
    }

    async fn tailor_cover_letter(
        &self,
        template_body: &str,
        analysis: &JobAnalysis,
    ) -> Result<String, LlmError> {
        let prompt = build_cover_letter_prompt(template_body, analysis)?;
        self.call_text(&prompt, COVER_LETTER_SYSTEM).await
    }
}

fn build_cover_letter_prompt(
    template_body: &str,
    analysis: &JobAnalysis,
) -> Result<String, LlmError> {
    let analysis_json = serde_json::to_string_pretty(analysis)?;

    // Template body last so text inside it is never treated as a placeholder.
    Ok(COVER_LETTER_PROMPT_TEMPLATE
        .replace("{no_invention_instruction}", NO_INVENTION_INSTRUCTION)
        .replace("{analysis_json}", &analysis_json)
        .replace("{template_body}", template_body))
}
