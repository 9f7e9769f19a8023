//! Read-only ball catalog grouped by tier.

mod builtin;
pub mod filter;

use crate::domain::item::{Item, ItemId, Tier};

pub use filter::filter_by_surface;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    // Indexed by `Tier::index`.
    tiers: [Vec<Item>; 3],
}

impl Catalog {
    /// Groups items by tier, keeping their relative order.
    pub fn new(items: Vec<Item>) -> Self {
        let mut tiers: [Vec<Item>; 3] = Default::default();
        for item in items {
            tiers[item.tier.index()].push(item);
        }
        Self { tiers }
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        Self::new(builtin::builtin_items())
    }

    pub fn items_for_tier(&self, tier: Tier) -> &[Item] {
        &self.tiers[tier.index()]
    }

    pub fn find(&self, item_id: &ItemId) -> Option<&Item> {
        self.iter().find(|item| &item.id == item_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        Tier::ALL.into_iter().flat_map(move |tier| self.items_for_tier(tier).iter())
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
