use std::path::PathBuf;

use serde::Serialize;

use crate::domain::item::{Item, SurfacePreference, Tier};

pub const SHOW_DETAILS: &str = "Show details";
pub const SHOW_PHOTOS: &str = "Show photos";
pub const FINISH: &str = "Finish";

/// Selectable labels offered alongside a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub options: Vec<String>,
}

impl Menu {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { options: options.into_iter().map(Into::into).collect() }
    }

    pub fn levels() -> Self {
        Self::new(Tier::ALL.iter().map(Tier::label))
    }

    pub fn surfaces() -> Self {
        Self::new(SurfacePreference::ALL.iter().map(SurfacePreference::label))
    }

    pub fn details() -> Self {
        Self::new([SHOW_DETAILS, SHOW_PHOTOS, FINISH])
    }

    /// Offered after the item cards.
    pub fn photos() -> Self {
        Self::new([SHOW_PHOTOS, FINISH])
    }

    /// Offered after the photos.
    pub fn cards() -> Self {
        Self::new([SHOW_DETAILS, FINISH])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Text { text: String, menu: Option<Menu> },
    ItemCard { item: Item },
    Photo { path: PathBuf, caption: String },
    PhotoUnavailable { caption: String },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into(), menu: None }
    }

    pub fn with_menu(text: impl Into<String>, menu: Menu) -> Self {
        Self::Text { text: text.into(), menu: Some(menu) }
    }

    pub fn menu(&self) -> Option<&Menu> {
        match self {
            Self::Text { menu, .. } => menu.as_ref(),
            _ => None,
        }
    }

    /// Plain-text rendering for transports without rich formatting.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Text { text, .. } => text.clone(),
            Self::ItemCard { item } => crate::flows::messages::item_card_text(item),
            Self::Photo { caption, .. } | Self::PhotoUnavailable { caption } => caption.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Menu, Reply, FINISH, SHOW_DETAILS, SHOW_PHOTOS};

    #[test]
    fn level_and_surface_menus_follow_enum_order() {
        assert_eq!(Menu::levels().options, vec!["Novice", "Intermediate", "Professional"]);
        assert_eq!(Menu::surfaces().options, vec!["Indoor", "Outdoor", "Universal use"]);
    }

    #[test]
    fn follow_up_menus_always_offer_finish() {
        assert_eq!(Menu::details().options, vec![SHOW_DETAILS, SHOW_PHOTOS, FINISH]);
        assert_eq!(Menu::photos().options, vec![SHOW_PHOTOS, FINISH]);
        assert_eq!(Menu::cards().options, vec![SHOW_DETAILS, FINISH]);
    }

    #[test]
    fn menu_accessor_only_reports_text_menus() {
        assert!(Reply::with_menu("pick", Menu::levels()).menu().is_some());
        assert!(Reply::text("plain").menu().is_none());
        assert!(Reply::PhotoUnavailable { caption: "x".to_owned() }.menu().is_none());
    }
}
