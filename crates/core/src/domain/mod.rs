pub mod conversation;
pub mod item;
