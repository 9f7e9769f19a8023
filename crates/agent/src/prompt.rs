use courtside_core::domain::item::{SurfacePreference, Tier};

pub const SYSTEM_PROMPT: &str =
    "You are a handball equipment expert. Give a short recommendation in English.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvisoryPrompt {
    pub system: String,
    pub user: String,
}

impl AdvisoryPrompt {
    pub fn for_selection(tier: Tier, surface: SurfacePreference) -> Self {
        let user = format!(
            "Recommend a handball for a {level} level player who will use it {place}. \
             State the optimal ball size for this level, the recommended materials and an \
             approximate price range in euros.",
            level = tier.label().to_lowercase(),
            place = surface_phrase(surface),
        );

        Self { system: SYSTEM_PROMPT.to_owned(), user }
    }
}

fn surface_phrase(surface: SurfacePreference) -> &'static str {
    match surface {
        SurfacePreference::Indoor => "indoors",
        SurfacePreference::Outdoor => "outdoors",
        SurfacePreference::Universal => "in varied conditions",
    }
}
