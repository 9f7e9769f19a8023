use std::sync::Arc;

use async_trait::async_trait;
use courtside_agent::DialogRuntime;
use courtside_chat::events::{ConversationService, EventContext, EventHandlerError};
use courtside_core::domain::conversation::ConversationId;
use courtside_core::flows::{DialogInput, Reply};

/// Bridges chat events into the dialog runtime.
#[derive(Clone)]
pub struct DialogService {
    runtime: Arc<DialogRuntime>,
}

impl DialogService {
    pub fn new(runtime: Arc<DialogRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl ConversationService for DialogService {
    async fn converse(
        &self,
        conversation_id: &ConversationId,
        input: DialogInput,
        ctx: &EventContext,
    ) -> Result<Vec<Reply>, EventHandlerError> {
        Ok(self.runtime.handle(conversation_id, input, &ctx.correlation_id).await)
    }
}
