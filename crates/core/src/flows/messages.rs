//! User-facing copy.

use crate::domain::item::{Item, SurfacePreference, Tier};

pub const WELCOME: &str = "👋 Welcome! I will help you pick the right handball.\n\n\
                           Choose your level of play:";
pub const SURFACE_QUESTION: &str = "Great! Where are you planning to use the ball?";
pub const DETAILS_QUESTION: &str = "What would you like to know about the recommended balls?";
pub const FOLLOW_UP_QUESTION: &str = "What else would you like to know?";
pub const NO_MATCH: &str =
    "Unfortunately no balls match your criteria. Try changing the search parameters.";
pub const ERROR_GENERIC: &str =
    "Something went wrong while processing your request. Please try again later.";
pub const CANCELLED: &str = "Ball selection finished. Send /start to begin a new search.";
pub const HELP: &str = "🏐 Bot commands:\n\
/start - Start picking a ball\n\
/help - Show this message\n\
/cancel - Cancel the current selection\n\
/stats - Show request statistics\n\
\n\
ℹ️ How to use:\n\
1. Choose your level of play\n\
2. Tell me where you will use the ball\n\
3. Get personal recommendations\n\
4. Browse ball details and photos";

/// Advisory text used when the oracle cannot answer.
pub fn fallback_advisory(tier: Tier, surface: SurfacePreference) -> String {
    format!(
        "Based on your level ({tier}) and where you will play ({surface}) I picked balls that \
         fit you. Each has its own strengths; browse the details below to choose the best one."
    )
}

pub fn format_price(item: &Item) -> String {
    format!("{:.2} €", item.price)
}

pub fn item_card_text(item: &Item) -> String {
    let features =
        item.features.iter().map(|feature| format!("• {feature}")).collect::<Vec<_>>().join("\n");
    format!(
        "🏐 {name}\n📊 Level: {tier}\n💰 Price: {price}\n📏 Size: {size}\n🏭 Material: {material}\n\
         🏟 Surface: {surface}\n\n📝 Description: {description}\n\n✨ Features:\n{features}",
        name = item.name,
        tier = item.tier,
        price = format_price(item),
        size = item.size,
        material = item.material,
        surface = item.surface,
        description = item.description,
    )
}

pub fn photo_caption(item: &Item) -> String {
    format!("🏐 {}\n💰 Price: {}\n📏 Size: {}", item.name, format_price(item), item.size)
}

pub fn photo_unavailable_caption(item: &Item) -> String {
    format!(
        "🏐 The photo of {} is temporarily unavailable\n💰 Price: {}\n📏 Size: {}",
        item.name,
        format_price(item),
        item.size
    )
}
