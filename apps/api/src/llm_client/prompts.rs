// Shared prompt fragments. Each caller defines its own task prompt next to it
// (see `crate::parsing::prompts`); only cross-cutting rules live here.

/// Appended to every extraction prompt: the model copies, it does not write.
pub const FIDELITY_INSTRUCTION: &str = "\
    CRITICAL: Preserve wording exactly. Do NOT summarize, paraphrase, translate, \
    or invent information. If a value is unknown, omit the field; never return null.";
