use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailor::config::Config;
use tailor::llm_client::{self, LlmClient};
use tailor::tailoring::updater::DocumentUpdater;

const CV_OUTPUT_FILE: &str = "tailored_cv.docx";
const COVER_LETTER_OUTPUT_FILE: &str = "tailored_cover_letter.docx";
const ANALYSIS_OUTPUT_FILE: &str = "job_analysis.json";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tailor v{}", env!("CARGO_PKG_VERSION"));

    let job_description_path: PathBuf = std::env::args()
        .nth(1)
        .context("usage: tailor <job-description-file>")?
        .into();
    let job_description = std::fs::read_to_string(&job_description_path).with_context(|| {
        format!(
            "Failed to read job description from {}",
            job_description_path.display()
        )
    })?;

    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let updater = DocumentUpdater::new(
        config.cv_template_path.clone(),
        config.cover_letter_template_path.clone(),
        Arc::new(llm),
    );

    let tailored = updater
        .tailor_documents(
            &job_description,
            config.output_dir.join(CV_OUTPUT_FILE),
            config.output_dir.join(COVER_LETTER_OUTPUT_FILE),
        )
        .await?;

    let analysis_path = config.output_dir.join(ANALYSIS_OUTPUT_FILE);
    std::fs::write(
        &analysis_path,
        serde_json::to_string_pretty(&tailored.analysis)?,
    )
    .with_context(|| format!("Failed to write {}", analysis_path.display()))?;

    println!("CV:           {}", tailored.cv_path.display());
    println!("Cover letter: {}", tailored.cover_letter_path.display());
    println!("Analysis:     {}", analysis_path.display());

    Ok(())
}
