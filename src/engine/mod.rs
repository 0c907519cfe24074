//! Conversation engine — session lifecycle, question planning, and
//! readiness classification.

pub mod context;
pub mod model;
pub mod planner;
pub mod prompts;
pub mod readiness;
pub mod session;

pub use planner::QuestionPlanner;
pub use readiness::ReadinessClassifier;
pub use session::{SessionController, StartedSession, TurnReply};
