use crate::models::chat::ChatMessage;

/// Flattens a chat into a single completion prompt ending with an
/// `Assistant:` cue for the model to continue.
pub fn build_prompt(messages: &[ChatMessage], system: &str) -> String {
    let mut prompt = String::new();
    if !system.is_empty() {
        prompt.push_str(&format!("System: {}\n", system));
    }
    for msg in messages {
        prompt.push_str(&format!("{}: {}\n", msg.role.prompt_label(), msg.content));
    }
    prompt.push_str("Assistant:");
    prompt
}
