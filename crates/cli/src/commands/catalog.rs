use courtside_core::catalog::Catalog;
use courtside_core::domain::item::Tier;
use courtside_core::flows::messages::item_card_text;

use super::CommandResult;

const INVALID_TIER_EXIT: u8 = 2;

/// Prints catalog cards, optionally for one tier only.
pub fn run(tier: Option<&str>) -> CommandResult {
    let catalog = Catalog::builtin();

    let tiers = match tier {
        None => Tier::ALL.to_vec(),
        Some(label) => match Tier::from_label(label) {
            Some(tier) => vec![tier],
            None => {
                return CommandResult::failure(
                    "catalog",
                    "invalid_tier",
                    format!("unknown tier `{label}` (expected novice|intermediate|professional)"),
                    INVALID_TIER_EXIT,
                );
            }
        },
    };

    let mut sections = Vec::new();
    for tier in tiers {
        let items = catalog.items_for_tier(tier);
        let mut section = format!("== {tier} ({} items) ==", items.len());
        for item in items {
            section.push_str("\n\n");
            section.push_str(&item_card_text(item));
        }
        sections.push(section);
    }

    CommandResult::text(sections.join("\n\n"))
}
