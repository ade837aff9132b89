// Tailoring: job analysis, the language model seam, the template-marker
// convention and the document updater that ties them together.
// All LLM calls go through llm_client via the LanguageModel trait.

pub mod analysis;
pub mod integration;
pub mod markers;
pub mod prompts;
pub mod updater;
