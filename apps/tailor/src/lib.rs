//! Tailors a résumé and cover letter (`.docx`) to a job description.
//!
//! `tailoring::updater::DocumentUpdater` is the entry point: it asks a
//! `LanguageModel` for a job analysis, validates it, and writes tailored copies
//! of the templates without touching the originals.

pub mod config;
pub mod document;
pub mod errors;
pub mod llm_client;
pub mod tailoring;
