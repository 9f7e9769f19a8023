use std::path::PathBuf;

use courtside_core::domain::item::Item;
use courtside_core::flows::messages::{format_price, item_card_text};
use courtside_core::flows::{Menu, Reply};
use serde::Serialize;

pub const MENU_ACTION_ID: &str = "dialog.menu_option.v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { action_id: action_id.into(), text: TextObject::plain(label), value: None }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ButtonElement> },
    Context { block_id: String, elements: Vec<TextObject> },
    Image { block_id: String, image_path: PathBuf, alt_text: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

impl MessageTemplate {
    /// Line-oriented rendering for terminals and logs.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Section { text, .. } => lines.push(text.as_str().to_owned()),
                Block::Context { elements, .. } => {
                    lines.extend(elements.iter().map(|element| element.as_str().to_owned()));
                }
                Block::Actions { elements, .. } => lines.push(
                    elements
                        .iter()
                        .map(|button| format!("[{}]", button.text.as_str()))
                        .collect::<Vec<_>>()
                        .join(" "),
                ),
                Block::Image { image_path, .. } => {
                    lines.push(format!("🖼 {}", image_path.display()));
                }
            }
        }
        lines.join("\n")
    }

    /// Labels of every menu button, in order.
    pub fn menu_labels(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Actions { elements, .. } => Some(elements),
                _ => None,
            })
            .flatten()
            .map(|button| button.text.as_str())
            .collect()
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn image(
        mut self,
        block_id: impl Into<String>,
        image_path: impl Into<PathBuf>,
        alt_text: impl Into<String>,
    ) -> Self {
        self.blocks.push(Block::Image {
            block_id: block_id.into(),
            image_path: image_path.into(),
            alt_text: alt_text.into(),
        });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

pub fn render_reply(reply: &Reply) -> MessageTemplate {
    match reply {
        Reply::Text { text, menu } => text_message(text, menu.as_ref()),
        Reply::ItemCard { item } => item_card_message(item),
        Reply::Photo { path, caption } => MessageBuilder::new(caption.clone())
            .image("dialog.photo.image.v1", path.clone(), caption.clone())
            .context("dialog.photo.caption.v1", |context| {
                context.plain(caption.clone());
            })
            .build(),
        Reply::PhotoUnavailable { caption } => MessageBuilder::new(caption.clone())
            .section("dialog.photo.unavailable.v1", |section| {
                section.plain(caption.clone());
            })
            .build(),
    }
}

pub fn render_replies(replies: &[Reply]) -> Vec<MessageTemplate> {
    replies.iter().map(render_reply).collect()
}

fn text_message(text: &str, menu: Option<&Menu>) -> MessageTemplate {
    let builder = MessageBuilder::new(text).section("dialog.text.v1", |section| {
        section.plain(text);
    });

    match menu {
        Some(menu) => builder
            .actions("dialog.menu.v1", |actions| {
                for option in &menu.options {
                    actions.button(ButtonElement::new(MENU_ACTION_ID, option).value(option));
                }
            })
            .build(),
        None => builder.build(),
    }
}

fn item_card_message(item: &Item) -> MessageTemplate {
    MessageBuilder::new(format!("{} - {}", item.name, format_price(item)))
        .section("dialog.item_card.v1", |section| {
            section.mrkdwn(item_card_text(item));
        })
        .build()
}
