// Cross-cutting prompt fragments. Features that call the LLM keep their own
// prompts.rs next to them and compose these in.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps the model from inventing records that were not provided.
pub const CLOSED_WORLD_INSTRUCTION: &str = "\
    CRITICAL: Only refer to records by the exact `id` values given in the input. \
    Never invent, modify or guess an id. \
    If nothing in the input satisfies the request, return an empty list.";
