pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod stats;

pub use catalog::{filter_by_surface, Catalog};
pub use domain::conversation::ConversationId;
pub use domain::item::{Item, ItemId, SurfaceAffinity, SurfacePreference, Tier};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{
    ConversationContext, DialogAction, DialogEvent, DialogInput, DialogState, FlowEngine, Menu,
    Reply,
};
pub use stats::{UsageSnapshot, UsageStats};
