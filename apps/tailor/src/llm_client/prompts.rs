// Shared prompt constants.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction shared by every prompt that writes text on the candidate's behalf.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Do NOT invent employers, dates, degrees, certifications or metrics. \
    Only rephrase and emphasize what the source material supports.";
