// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System instruction that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every prompt that reads candidate documents.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only report what the provided text supports. \
    If a field is not present in the text, return null or an empty array for it. \
    Never invent employers, dates, degrees or skills.";
