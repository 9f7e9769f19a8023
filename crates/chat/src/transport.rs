use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use courtside_core::config::ChatConfig;
use courtside_core::domain::conversation::ConversationId;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::blocks::MessageTemplate;
use crate::events::{ChatEnvelope, EventContext, EventDispatcher, HandlerResult};

pub const LOCAL_CONVERSATION_ID: &str = "local";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport delivery failed: {0}")]
    Deliver(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            max_retries: config.reconnect_attempts,
            base_delay_ms: config.reconnect_backoff_ms,
            ..Self::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn deliver(
        &self,
        conversation_id: &ConversationId,
        message: &MessageTemplate,
    ) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl ChatTransport for NoopTransport {
    fn kind(&self) -> &'static str {
        "noop"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn deliver(
        &self,
        _conversation_id: &ConversationId,
        _message: &MessageTemplate,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// One inbound message per line, all under a single conversation; replies are written as text.
pub struct LineTransport<R, W> {
    lines: Mutex<Lines<BufReader<R>>>,
    writer: Mutex<W>,
    conversation_id: ConversationId,
    user_id: String,
    sequence: AtomicU64,
}

pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(reader).lines()),
            writer: Mutex::new(writer),
            conversation_id: ConversationId::new(LOCAL_CONVERSATION_ID),
            user_id: "local-user".to_owned(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn with_conversation_id(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    async fn write_text(&self, text: &str) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(text.as_bytes())
            .await
            .map_err(|error| TransportError::Deliver(error.to_string()))?;
        writer.flush().await.map_err(|error| TransportError::Deliver(error.to_string()))
    }
}

#[async_trait]
impl<R, W> ChatTransport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn kind(&self) -> &'static str {
        "stdio"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError> {
        let mut lines = self.lines.lock().await;
        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|error| TransportError::Receive(error.to_string()))?;
            let Some(line) = line else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }

            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            return Ok(Some(ChatEnvelope::from_line(
                format!("line-{sequence}"),
                self.conversation_id.clone(),
                self.user_id.clone(),
                &line,
            )));
        }
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn deliver(
        &self,
        _conversation_id: &ConversationId,
        message: &MessageTemplate,
    ) -> Result<(), TransportError> {
        self.write_text(&format!("{}\n\n", message.plain_text())).await
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer.flush().await.map_err(|error| TransportError::Disconnect(error.to_string()))
    }
}

pub struct TransportRunner {
    transport: Arc<dyn ChatTransport>,
    dispatcher: Arc<EventDispatcher>,
    reconnect_policy: ReconnectPolicy,
}

/// One ordered queue per conversation, each drained by its own task.
#[derive(Default)]
struct Lanes {
    senders: HashMap<ConversationId, mpsc::UnboundedSender<ChatEnvelope>>,
    tasks: JoinSet<()>,
}

impl Lanes {
    /// Closes every queue and waits for in-flight turns to finish.
    async fn drain(&mut self) {
        self.senders.clear();
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(error) = joined {
                warn!(
                    event_name = "ingress.chat.turn_task_failed",
                    error = %error,
                    "chat turn task ended abnormally"
                );
            }
        }
    }
}

impl TransportRunner {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher: Arc::new(dispatcher), reconnect_policy }
    }

    pub fn transport_kind(&self) -> &'static str {
        self.transport.kind()
    }

    /// Pumps until the transport's stream ends, then waits for in-flight turns. Transport
    /// failures are retried with backoff and never escalate past this loop.
    pub async fn start(&self) -> Result<()> {
        let mut lanes = Lanes::default();
        self.pump_with_reconnect(&mut lanes).await;
        lanes.drain().await;
        Ok(())
    }

    async fn pump_with_reconnect(&self, lanes: &mut Lanes) {
        for attempt in 0..=self.reconnect_policy.max_retries {
            let Err(transport_error) = self.connect_and_pump(attempt, lanes).await else {
                return;
            };
            warn!(
                event_name = "ingress.transport.failed",
                attempt,
                max_retries = self.reconnect_policy.max_retries,
                error = %transport_error,
                "chat transport failed"
            );

            if attempt >= self.reconnect_policy.max_retries {
                warn!(
                    event_name = "ingress.transport.retries_exhausted",
                    max_retries = self.reconnect_policy.max_retries,
                    "chat transport retries exhausted; continuing process without crash"
                );
                return;
            }

            let delay = self.reconnect_policy.backoff(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn connect_and_pump(&self, attempt: u32, lanes: &mut Lanes) -> Result<(), TransportError> {
        info!(attempt, transport = self.transport.kind(), "opening chat transport");
        self.transport.connect().await?;
        info!(attempt, "chat transport connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "chat transport stream closed");
                lanes.drain().await;
                self.transport.disconnect().await?;
                return Ok(());
            };

            info!(
                event_name = "ingress.chat.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                conversation_id = conversation_label(&envelope),
                "received chat envelope"
            );

            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    event_name = "ingress.chat.ack_failed",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    conversation_id = conversation_label(&envelope),
                    error = %error,
                    "failed to acknowledge chat envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.chat.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    "acknowledged chat envelope"
                );
            }

            self.route(lanes, envelope);
        }
    }

    /// Turns within a conversation run in arrival order; conversations run concurrently.
    /// `/cancel` skips the queue so it can reset a conversation whose turn is still running.
    fn route(&self, lanes: &mut Lanes, envelope: ChatEnvelope) {
        let lane = match envelope.event.conversation_id() {
            Some(conversation_id) if !envelope.is_cancel() => conversation_id.clone(),
            _ => {
                let dispatcher = Arc::clone(&self.dispatcher);
                let transport = Arc::clone(&self.transport);
                lanes.tasks.spawn(async move {
                    serve_envelope(&dispatcher, transport.as_ref(), envelope).await;
                });
                return;
            }
        };

        let envelope = match lanes.senders.get(&lane) {
            Some(sender) => match sender.send(envelope) {
                Ok(()) => return,
                Err(mpsc::error::SendError(envelope)) => envelope,
            },
            None => envelope,
        };

        let (sender, queue) = mpsc::unbounded_channel();
        lanes.tasks.spawn(serve_lane(Arc::clone(&self.dispatcher), Arc::clone(&self.transport), queue));
        // The receiver is alive until the lane task ends, so this send cannot fail.
        let _ = sender.send(envelope);
        lanes.senders.insert(lane, sender);
    }
}

async fn serve_lane(
    dispatcher: Arc<EventDispatcher>,
    transport: Arc<dyn ChatTransport>,
    mut queue: mpsc::UnboundedReceiver<ChatEnvelope>,
) {
    while let Some(envelope) = queue.recv().await {
        serve_envelope(&dispatcher, transport.as_ref(), envelope).await;
    }
}

async fn serve_envelope(
    dispatcher: &EventDispatcher,
    transport: &dyn ChatTransport,
    envelope: ChatEnvelope,
) {
    let context = EventContext { correlation_id: envelope.envelope_id.clone() };
    match dispatcher.dispatch(&envelope, &context).await {
        Ok(HandlerResult::Responded(messages)) => {
            let Some(target) = envelope.event.conversation_id() else {
                return;
            };
            for message in &messages {
                if let Err(error) = transport.deliver(target, message).await {
                    warn!(
                        event_name = "egress.chat.delivery_failed",
                        correlation_id = %envelope.envelope_id,
                        conversation_id = %target,
                        error = %error,
                        "failed to deliver reply"
                    );
                    return;
                }
            }
            debug!(
                event_name = "egress.chat.replies_delivered",
                correlation_id = %envelope.envelope_id,
                conversation_id = %target,
                count = messages.len(),
                "delivered replies"
            );
        }
        Ok(HandlerResult::Processed | HandlerResult::Ignored) => {}
        Err(error) => {
            warn!(
                envelope_id = %envelope.envelope_id,
                correlation_id = %envelope.envelope_id,
                conversation_id = conversation_label(&envelope),
                error = %error,
                "event dispatch failed; continuing transport loop"
            );
        }
    }
}

fn conversation_label(envelope: &ChatEnvelope) -> &str {
    envelope.event.conversation_id().map(ConversationId::as_str).unwrap_or("unknown")
}
