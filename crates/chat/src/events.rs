use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use courtside_core::domain::conversation::ConversationId;
use courtside_core::flows::{DialogInput, ReservedCommand, Reply};
use thiserror::Error;

use crate::{
    blocks::{render_replies, MessageTemplate},
    commands::{normalize_command, parse_command_line, CommandParseError, CommandPayload},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    pub envelope_id: String,
    pub event: ChatEvent,
}

impl ChatEnvelope {
    /// Classifies a raw inbound line as a command or a plain message.
    pub fn from_line(
        envelope_id: impl Into<String>,
        conversation_id: ConversationId,
        user_id: impl Into<String>,
        line: &str,
    ) -> Self {
        let user_id = user_id.into();
        let event = match parse_command_line(&conversation_id, &user_id, line) {
            Some(payload) => ChatEvent::Command(payload),
            None => ChatEvent::Message(MessageEvent {
                conversation_id,
                user_id,
                text: line.trim().to_owned(),
            }),
        };

        Self { envelope_id: envelope_id.into(), event }
    }

    /// True for `/cancel`, which must reach the dialog even while a turn is in flight.
    pub fn is_cancel(&self) -> bool {
        match &self.event {
            ChatEvent::Command(payload) => matches!(
                normalize_command(payload),
                Ok(DialogInput::Command(ReservedCommand::Cancel))
            ),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    Command(CommandPayload),
    Message(MessageEvent),
    Unsupported { event_type: String },
}

impl ChatEvent {
    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::Command(_) => ChatEventType::Command,
            Self::Message(_) => ChatEventType::Message,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            Self::Command(payload) => Some(&payload.conversation_id),
            Self::Message(event) => Some(&event.conversation_id),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    Command,
    Message,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub conversation_id: ConversationId,
    pub user_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Vec<MessageTemplate>),
    Processed,
    Ignored,
}

impl HandlerResult {
    fn from_replies(replies: &[Reply]) -> Self {
        if replies.is_empty() {
            Self::Processed
        } else {
            Self::Responded(render_replies(replies))
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error("conversation handler failure: {0}")]
    Conversation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// The dialog behind the transport: one input in, zero or more replies out.
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn converse(
        &self,
        conversation_id: &ConversationId,
        input: DialogInput,
        ctx: &EventContext,
    ) -> Result<Vec<Reply>, EventHandlerError>;
}

pub fn dispatcher_for<S>(service: Arc<S>) -> EventDispatcher
where
    S: ConversationService + 'static,
{
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(CommandHandler::new(Arc::clone(&service)));
    dispatcher.register(MessageHandler::new(service));
    dispatcher
}

pub struct CommandHandler<S> {
    service: Arc<S>,
}

impl<S> CommandHandler<S>
where
    S: ConversationService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for CommandHandler<S>
where
    S: ConversationService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::Command
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::Command(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let input = normalize_command(payload)?;
        let replies = self.service.converse(&payload.conversation_id, input, ctx).await?;
        Ok(HandlerResult::from_replies(&replies))
    }
}

pub struct MessageHandler<S> {
    service: Arc<S>,
}

impl<S> MessageHandler<S>
where
    S: ConversationService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for MessageHandler<S>
where
    S: ConversationService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::Message
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if event.text.is_empty() {
            return Ok(HandlerResult::Ignored);
        }

        let input = DialogInput::Text(event.text.clone());
        let replies = self.service.converse(&event.conversation_id, input, ctx).await?;
        Ok(HandlerResult::from_replies(&replies))
    }
}
