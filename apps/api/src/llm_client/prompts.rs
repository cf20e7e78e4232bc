// Shared prompt fragments. Each feature that calls the completion service keeps
// its own prompts.rs next to it; cross-cutting pieces live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps rewritten documents honest.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the original resume. \
    Do NOT invent employers, titles, dates, degrees, certifications, or metrics. \
    You may reword, reorder bullet points, and emphasize relevant experience.";
