pub mod engine;
pub mod prompts;
pub mod service;
pub mod states;

pub use engine::{parse_decimal, parse_positive, ConversationEngine, DEFAULT_REQUIRED_CHANNEL};
pub use service::ConversationService;
pub use states::{
    BalloonType, ConversationState, InputProblem, KeyboardHint, Reply, ReplyKind, StateKind,
    TransitionOutcome,
};
