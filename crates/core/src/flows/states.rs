use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    BallAdvisor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DialogState {
    #[default]
    Idle,
    LevelChoice,
    SurfaceChoice,
    Details,
    Photos,
}

impl DialogState {
    pub const ALL: [DialogState; 5] = [
        DialogState::Idle,
        DialogState::LevelChoice,
        DialogState::SurfaceChoice,
        DialogState::Details,
        DialogState::Photos,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogEvent {
    StartRequested,
    LevelSelected,
    SurfaceSelected,
    ItemsMatched,
    NoItemsMatched,
    RecommendationFailed,
    DetailsRequested,
    PhotosRequested,
    FinishRequested,
    CancelRequested,
    HelpRequested,
    StatsRequested,
    Unrecognized,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub missing_selections: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    PromptForLevel,
    StoreTier,
    PromptForSurface,
    StoreSurface,
    RecordUsage,
    Recommend,
    PresentRecommendation,
    OfferDetailsMenu,
    RenderItemCards,
    OfferPhotosMenu,
    OfferCardsMenu,
    RenderPhotos,
    NotifyNoMatch,
    NotifyFailure,
    ConfirmCancelled,
    ResetContext,
    ShowHelp,
    ShowStats,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogState,
    pub to: DialogState,
    pub event: DialogEvent,
    pub actions: Vec<DialogAction>,
}
