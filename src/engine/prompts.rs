//! Prompt templates for the conversation engine.

use crate::llm::provider::ResponseSchema;

/// Fixed opening question for every new session.
pub const OPENING_QUESTION: &str = "Hi! I'm here to help you discover how AI agents could \
    transform your business operations. Let's start with the basics - what's your business \
    name and what industry are you in?";

/// System prompt for the next-question planner.
pub const PLANNER_SYSTEM_PROMPT: &str = "\
You are a business consultant conducting a discovery interview with a business owner. \
Your job is to learn, across the conversation, about:

1. Their operational challenges
2. Tasks that waste their team's time
3. Customer service bottlenecks
4. Communication inefficiencies
5. Data management issues
6. Scheduling and workflow problems

Ask ONE focused question at a time. Build on what they have already told you instead \
of repeating topics. Keep questions conversational and specific to their situation.

Examples of good follow-ups:
- \"You mentioned scheduling is chaotic - how many hours a week does your team spend on it?\"
- \"What happens when a customer emails you after hours?\"
- \"Which of those manual steps frustrates your staff the most?\"

Respond with the question only, no preamble.";

/// Render the planner's user-role content around a transcript.
pub fn planner_user_content(context: &str) -> String {
    format!(
        "Conversation so far:\n{context}\n\n\
         What should I ask next to learn more about this business?"
    )
}

/// System prompt for the readiness classifier.
pub const READINESS_SYSTEM_PROMPT: &str = "\
You evaluate whether a discovery interview has gathered enough information to \
generate a tailored automation proposal. Sufficient coverage means at least three \
of these five areas are substantively addressed:

1. Business and industry identity
2. Main pain points
3. Time-wasting tasks
4. Customer interaction challenges
5. Operational bottlenecks

Answer with the structured result only.";

/// Render the readiness classifier's user-role content around a transcript.
pub fn readiness_user_content(context: &str) -> String {
    format!(
        "Conversation:\n{context}\n\n\
         Do we have enough information to generate a proposal?"
    )
}

/// Closed schema for the readiness verdict.
pub fn readiness_schema() -> ResponseSchema {
    ResponseSchema {
        name: "readiness_verdict",
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "ready": {
                    "type": "boolean",
                    "description": "true only if enough information has been gathered"
                }
            },
            "required": ["ready"],
            "additionalProperties": false
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_content_embeds_transcript() {
        let content = planner_user_content("Agent: hi\nBusiness Owner: hello");
        assert!(content.starts_with("Conversation so far:\nAgent: hi"));
        assert!(content.ends_with("learn more about this business?"));
    }

    #[test]
    fn readiness_schema_is_closed() {
        let schema = readiness_schema();
        assert_eq!(schema.name, "readiness_verdict");
        assert_eq!(schema.schema["additionalProperties"], false);
        assert_eq!(schema.schema["required"][0], "ready");
    }
}
