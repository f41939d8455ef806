use serde::Serialize;

pub const DONE_SENTINEL: &str = "[DONE]";

/// One event of the chat relay, as delivered to the browser.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Token(String),
    Thinking(String),
    Done,
    Error(String),
}

#[derive(Serialize)]
struct TokenPayload<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct ThinkingPayload<'a> {
    thinking: &'a str,
}

impl RelayEvent {
    /// Body of the `data:` line carrying this event.
    pub fn to_data(&self) -> String {
        match self {
            RelayEvent::Token(token) => serde_json::to_string(&TokenPayload { token })
                .unwrap_or_default(),
            RelayEvent::Thinking(thinking) => serde_json::to_string(&ThinkingPayload { thinking })
                .unwrap_or_default(),
            RelayEvent::Done => DONE_SENTINEL.to_string(),
            RelayEvent::Error(message) => format!("ERROR: {}", message),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayEvent::Done | RelayEvent::Error(_))
    }
}
