//! Configuration types.

/// Conversation-progression engine configuration.
///
/// Injected explicitly into the components that need it — no component
/// reads the environment itself; `main` is the only place that does.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum number of user-authored messages before the readiness
    /// classifier makes any external call.
    pub min_user_messages: usize,
    /// Maximum number of messages rendered into the prompt context.
    pub context_window_messages: usize,
    /// Fixed message returned on the turn where readiness triggers.
    pub handoff_message: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_user_messages: 4,
            context_window_messages: 10,
            handoff_message: "Thank you for sharing all that information! I have a clear \
                picture of your business challenges. Let me analyze everything and create \
                a custom agent system recommendation for you. This will just take a moment..."
                .to_string(),
        }
    }
}
