//! Chat transport surface for the ball advisor.
//!
//! - **Transport** (`transport`) - connect/receive/deliver loop with reconnection, plus stdio
//!   and no-op transports
//! - **Commands** (`commands`) - `/start`, `/help`, `/cancel`, `/stats`
//! - **Events** (`events`) - routes commands and messages to the conversation service
//! - **Blocks** (`blocks`) - renders dialog replies as typed message blocks
//!
//! ```text
//! Transport → EventDispatcher → Handlers → ConversationService
//!                  ↓
//!          MessageTemplate ← Reply
//! ```

pub mod blocks;
pub mod commands;
pub mod events;
pub mod transport;
