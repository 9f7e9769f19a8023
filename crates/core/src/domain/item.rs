use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

/// Skill level a ball is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Novice,
    Intermediate,
    Professional,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Novice, Tier::Intermediate, Tier::Professional];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Novice => "Novice",
            Self::Intermediate => "Intermediate",
            Self::Professional => "Professional",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        match normalize_label(text).as_str() {
            "novice" | "beginner" => Some(Self::Novice),
            "intermediate" | "middle" | "amateur" => Some(Self::Intermediate),
            "professional" | "pro" | "expert" => Some(Self::Professional),
            _ => None,
        }
    }

    /// Unrecognized labels resolve to `Novice`.
    pub fn resolve(text: &str) -> Self {
        Self::from_label(text).unwrap_or(Self::Novice)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Novice => 0,
            Self::Intermediate => 1,
            Self::Professional => 2,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a ball is designed to be played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceAffinity {
    Indoor,
    Outdoor,
    Universal,
}

impl SurfaceAffinity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Indoor => "Indoor",
            Self::Outdoor => "Outdoor",
            Self::Universal => "Universal",
        }
    }
}

impl std::fmt::Display for SurfaceAffinity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the user plans to play, as picked from the surface menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfacePreference {
    Indoor,
    Outdoor,
    Universal,
}

impl SurfacePreference {
    pub const ALL: [SurfacePreference; 3] =
        [SurfacePreference::Indoor, SurfacePreference::Outdoor, SurfacePreference::Universal];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Indoor => "Indoor",
            Self::Outdoor => "Outdoor",
            Self::Universal => "Universal use",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        match normalize_label(text).as_str() {
            "indoor" | "indoors" | "hall" | "gym" => Some(Self::Indoor),
            "outdoor" | "outdoors" | "outside" | "street" | "beach" => Some(Self::Outdoor),
            "universal use" | "universal" | "any" | "anywhere" | "both" => Some(Self::Universal),
            _ => None,
        }
    }

    /// Unrecognized labels resolve to `Universal`, which keeps the whole tier on display.
    pub fn resolve(text: &str) -> Self {
        Self::from_label(text).unwrap_or(Self::Universal)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Indoor => 0,
            Self::Outdoor => 1,
            Self::Universal => 2,
        }
    }
}

impl std::fmt::Display for SurfacePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub tier: Tier,
    pub price: Decimal,
    pub material: String,
    pub size: String,
    pub description: String,
    pub surface: SurfaceAffinity,
    /// Image location relative to the configured image root.
    pub image: String,
    pub features: Vec<String>,
}

fn normalize_label(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
