//! Prompt context rendering.

use crate::engine::model::{MessageRole, SessionMessage};

/// Render the most recent `window` messages as a plain-text transcript
/// for prompt injection.
///
/// Format is one line per message, oldest first:
/// `Business Owner: ...` for user turns, `Agent: ...` for assistant turns.
pub fn build_context(history: &[SessionMessage], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    history[start..]
        .iter()
        .map(|msg| {
            let speaker = match msg.role {
                MessageRole::User => "Business Owner",
                MessageRole::Assistant => "Agent",
            };
            format!("{speaker}: {}", msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn msg(role: MessageRole, content: &str, order: i64) -> SessionMessage {
        SessionMessage {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            message_order: order,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_renders_empty() {
        assert_eq!(build_context(&[], 10), "");
    }

    #[test]
    fn renders_speaker_labels_in_order() {
        let history = vec![
            msg(MessageRole::Assistant, "What's your business name?", 1),
            msg(MessageRole::User, "Acme Cleaning", 2),
        ];
        assert_eq!(
            build_context(&history, 10),
            "Agent: What's your business name?\nBusiness Owner: Acme Cleaning"
        );
    }

    #[test]
    fn window_keeps_only_most_recent() {
        let history: Vec<_> = (1..=12)
            .map(|i| msg(MessageRole::User, &format!("turn {i}"), i))
            .collect();
        let rendered = build_context(&history, 10);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "Business Owner: turn 3");
        assert_eq!(lines[9], "Business Owner: turn 12");
    }

    #[test]
    fn window_larger_than_history_keeps_all() {
        let history = vec![msg(MessageRole::User, "only one", 1)];
        assert_eq!(build_context(&history, 10), "Business Owner: only one");
    }
}
