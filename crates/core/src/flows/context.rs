use crate::domain::item::{Item, SurfacePreference, Tier};
use crate::flows::states::{DialogState, FlowContext};

/// Per-conversation progress through the dialog. Owned by exactly one conversation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationContext {
    pub state: DialogState,
    pub tier: Option<Tier>,
    pub surface: Option<SurfacePreference>,
    pub recommendations: Vec<Item>,
    pub advisory: Option<String>,
}

impl ConversationContext {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        self.state == DialogState::Idle
    }

    /// Selections the next step needs but the context lacks.
    pub fn flow_context(&self) -> FlowContext {
        let mut missing_selections = Vec::new();
        if self.state == DialogState::SurfaceChoice && self.tier.is_none() {
            missing_selections.push("tier".to_owned());
        }
        FlowContext { missing_selections }
    }
}
