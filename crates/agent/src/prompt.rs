//! System prompt rendering.

/// The built-in system prompt, used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an advanced reasoning agent. \
Use the prior context when it is relevant. \
Always explain your steps before the final answer.";

/// Render the system prompt with prior context appended as a numbered list.
pub fn render_system_prompt(base: &str, context: &[String]) -> String {
    let block = format_context_block(context);
    if block.is_empty() {
        base.to_string()
    } else {
        format!("{base}{block}")
    }
}

/// Format context entries into a prompt block (empty when there are none).
pub fn format_context_block(context: &[String]) -> String {
    if context.is_empty() {
        return String::new();
    }

    let mut block = String::from("\n\n## Prior Context\n");
    for (i, entry) in context.iter().enumerate() {
        block.push_str(&format!("{}. {}\n", i + 1, entry));
    }
    block
}
