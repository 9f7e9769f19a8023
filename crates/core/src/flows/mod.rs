pub mod context;
pub mod engine;
pub mod input;
pub mod messages;
pub mod reply;
pub mod states;

pub use context::ConversationContext;
pub use engine::{BallAdvisorFlow, FlowDefinition, FlowEngine, FlowTransitionError};
pub use input::{DialogInput, ReservedCommand};
pub use reply::{Menu, Reply};
pub use states::{
    DialogAction, DialogEvent, DialogState, FlowContext, FlowType, TransitionOutcome,
};
