pub const MATCH_SYSTEM: &str = "You are a matching assistant for a directory of \
    healthcare professionals. Given a patient's free-text request and a list of \
    professionals, choose the professionals whose category, specialization, practice \
    areas, education and location best fit the request, best match first.";

pub const MATCH_PROMPT: &str = r#"Patient request:
"""
{query}
"""

Professionals (JSON array):
{candidates}

Return a JSON array containing only the `id` strings of the matching professionals,
best match first, for example ["3f6c...", "9a1b..."]. Return [] when none fit."#;
