use std::sync::Arc;

use courtside_core::catalog::{filter_by_surface, Catalog};
use courtside_core::domain::item::{Item, SurfacePreference, Tier};
use courtside_core::flows::messages::fallback_advisory;
use tracing::warn;

use crate::llm::AdvisoryOracle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recommendation {
    pub advisory: String,
    pub items: Vec<Item>,
    /// Set when the advisory text is the canned fallback.
    pub degraded: bool,
}

/// Merges the deterministic catalog filter with oracle advice.
#[derive(Clone)]
pub struct RecommendationCoordinator {
    catalog: Arc<Catalog>,
    oracle: Arc<dyn AdvisoryOracle>,
}

impl RecommendationCoordinator {
    pub fn new(catalog: Arc<Catalog>, oracle: Arc<dyn AdvisoryOracle>) -> Self {
        Self { catalog, oracle }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matching_items(&self, tier: Tier, surface: SurfacePreference) -> Vec<Item> {
        filter_by_surface(self.catalog.items_for_tier(tier), surface)
    }

    /// Never fails: oracle errors are replaced by a fallback built from the two labels.
    pub async fn recommend(&self, tier: Tier, surface: SurfacePreference) -> Recommendation {
        let items = self.matching_items(tier, surface);

        match self.oracle.advise(tier, surface).await {
            Ok(advisory) => Recommendation { advisory, items, degraded: false },
            Err(error) => {
                warn!(
                    event_name = "recommendation.oracle_fallback",
                    tier = tier.label(),
                    surface = surface.label(),
                    error = %error,
                    "advisory oracle failed, using fallback text"
                );
                Recommendation { advisory: fallback_advisory(tier, surface), items, degraded: true }
            }
        }
    }
}
