use serde::Serialize;

/// Separator the model is asked to place between suggestions. The relay
/// never checks for it; clients split on it.
pub const SUGGESTION_DELIMITER: &str = "||";

const SYSTEM_PROMPT: &str = "You write short, friendly reply suggestions for an anonymous \
conversation app. Every suggestion must be a complete message. Keep the tone kind, \
encouraging and natural. Do not use emojis unless the user already does. Never repeat \
the user's post back to them. Output exactly 3 suggestions separated by `||`, with no \
numbering, labels or other formatting.";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
}

pub fn build_messages(post_content: &str, user_draft: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: format!(
                "User wrote a post: \"{post_content}\"\n\
                 They are currently typing this reply: \"{user_draft}\"\n\
                 Make suggestions that are relevant to both."
            ),
        },
    ]
}
