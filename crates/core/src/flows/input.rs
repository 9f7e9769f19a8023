use serde::{Deserialize, Serialize};

use crate::flows::reply::{FINISH, SHOW_DETAILS, SHOW_PHOTOS};
use crate::flows::states::{DialogEvent, DialogState};

pub const COMMAND_PREFIX: char = '/';

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservedCommand {
    Start,
    Help,
    Cancel,
    Stats,
    Unknown(String),
}

impl ReservedCommand {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "cancel" => Self::Cancel,
            "stats" => Self::Stats,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogInput {
    Command(ReservedCommand),
    Text(String),
}

impl DialogInput {
    /// `/name@bot args` is a command; everything else is free text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let Some(rest) = trimmed.strip_prefix(COMMAND_PREFIX) else {
            return Self::Text(trimmed.to_owned());
        };

        let word = rest.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();
        Self::Command(ReservedCommand::from_name(name))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Command(_) => None,
        }
    }

    /// Maps the input onto the event the current state understands.
    pub fn classify(&self, state: DialogState) -> DialogEvent {
        let text = match self {
            Self::Command(ReservedCommand::Start) => return DialogEvent::StartRequested,
            Self::Command(ReservedCommand::Help) => return DialogEvent::HelpRequested,
            Self::Command(ReservedCommand::Cancel) => return DialogEvent::CancelRequested,
            Self::Command(ReservedCommand::Stats) => return DialogEvent::StatsRequested,
            Self::Command(ReservedCommand::Unknown(_)) => return DialogEvent::Unrecognized,
            Self::Text(text) => text,
        };

        match state {
            DialogState::Idle => DialogEvent::Unrecognized,
            DialogState::LevelChoice => DialogEvent::LevelSelected,
            DialogState::SurfaceChoice => DialogEvent::SurfaceSelected,
            DialogState::Details | DialogState::Photos => menu_event(text),
        }
    }
}

fn menu_event(text: &str) -> DialogEvent {
    let choice = text.trim();
    if choice.eq_ignore_ascii_case(SHOW_DETAILS) {
        DialogEvent::DetailsRequested
    } else if choice.eq_ignore_ascii_case(SHOW_PHOTOS) {
        DialogEvent::PhotosRequested
    } else if choice.eq_ignore_ascii_case(FINISH) {
        DialogEvent::FinishRequested
    } else {
        DialogEvent::Unrecognized
    }
}
