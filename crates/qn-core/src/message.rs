use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Remove `<think>...</think>` blocks some local models emit ahead of the answer.
///
/// Returns the cleaned content and the extracted thinking, if any.
pub fn strip_thinking_tags(content: &str) -> (String, Option<String>) {
    let mut clean = String::with_capacity(content.len());
    let mut thinking = String::new();
    let mut remaining = content;

    while let Some(start) = remaining.find("<think>") {
        clean.push_str(&remaining[..start]);
        let after_open = &remaining[start + "<think>".len()..];
        match after_open.find("</think>") {
            Some(end) => {
                thinking.push_str(after_open[..end].trim());
                remaining = &after_open[end + "</think>".len()..];
            }
            None => {
                // Unclosed tag: everything after it is thinking
                thinking.push_str(after_open.trim());
                remaining = "";
            }
        }
    }
    clean.push_str(remaining);

    if thinking.is_empty() && clean.len() == content.len() {
        (content.to_string(), None)
    } else {
        (clean.trim_start().to_string(), Some(thinking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello, world!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, world!");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::System.to_string(), "system");
    }

    #[test]
    fn test_usage_total() {
        assert_eq!(Usage::new(10, 5).total_tokens, 15);
    }

    #[test]
    fn test_strip_thinking_tags() {
        let (clean, thinking) = strip_thinking_tags("<think>plan it</think>\nThe answer.");
        assert_eq!(clean, "The answer.");
        assert_eq!(thinking.as_deref(), Some("plan it"));
    }

    #[test]
    fn test_strip_thinking_tags_untouched() {
        let input = "  Plain paragraph with spacing.\n";
        let (clean, thinking) = strip_thinking_tags(input);
        assert_eq!(clean, input);
        assert!(thinking.is_none());
    }

    #[test]
    fn test_strip_thinking_tags_unclosed() {
        let (clean, thinking) = strip_thinking_tags("Lead. <think>never closed");
        assert_eq!(clean, "Lead. ");
        assert_eq!(thinking.as_deref(), Some("never closed"));
    }
}
