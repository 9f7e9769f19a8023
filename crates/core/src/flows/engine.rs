use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::flows::states::{
    DialogAction, DialogEvent, DialogState, FlowContext, FlowType, TransitionOutcome,
};

pub trait FlowDefinition {
    fn flow_type(&self) -> FlowType;
    fn initial_state(&self) -> DialogState;
    fn transition(
        &self,
        current: &DialogState,
        event: &DialogEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct BallAdvisorFlow;

impl FlowDefinition for BallAdvisorFlow {
    fn flow_type(&self) -> FlowType {
        FlowType::BallAdvisor
    }

    fn initial_state(&self) -> DialogState {
        DialogState::Idle
    }

    fn transition(
        &self,
        current: &DialogState,
        event: &DialogEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_ball_advisor(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow.flow_type()
    }

    pub fn initial_state(&self) -> DialogState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &DialogState,
        event: &DialogEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &DialogState,
        event: &DialogEvent,
        context: &FlowContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.conversation_id.clone(),
                        audit.correlation_id.clone(),
                        "dialog.transition_applied",
                        AuditCategory::Dialog,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.conversation_id.clone(),
                        audit.correlation_id.clone(),
                        "dialog.transition_rejected",
                        AuditCategory::Dialog,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<BallAdvisorFlow> {
    fn default() -> Self {
        Self::new(BallAdvisorFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("missing selections before transition from {state:?}: {missing:?}")]
    MissingSelections { state: DialogState, missing: Vec<String> },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: DialogState, event: DialogEvent },
}

fn transition_ball_advisor(
    current: &DialogState,
    event: &DialogEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use DialogAction::{
        ConfirmCancelled, NotifyFailure, NotifyNoMatch, OfferCardsMenu, OfferDetailsMenu,
        OfferPhotosMenu, PresentRecommendation, PromptForLevel, PromptForSurface, Recommend,
        RecordUsage, RenderItemCards, RenderPhotos, ResetContext, ShowHelp, ShowStats,
        StoreSurface, StoreTier,
    };
    use DialogEvent::{
        CancelRequested, DetailsRequested, FinishRequested, HelpRequested, ItemsMatched,
        LevelSelected, NoItemsMatched, PhotosRequested, RecommendationFailed, StartRequested,
        StatsRequested, SurfaceSelected,
    };
    use DialogState::{Details, Idle, LevelChoice, Photos, SurfaceChoice};

    let (to, actions) = match (current, event) {
        (Idle, StartRequested) => (LevelChoice, vec![ResetContext, PromptForLevel]),
        (LevelChoice, LevelSelected) => (SurfaceChoice, vec![StoreTier, PromptForSurface]),
        (SurfaceChoice, SurfaceSelected) => {
            if !context.missing_selections.is_empty() {
                return Err(FlowTransitionError::MissingSelections {
                    state: *current,
                    missing: context.missing_selections.clone(),
                });
            }
            (SurfaceChoice, vec![StoreSurface, RecordUsage, Recommend])
        }
        (SurfaceChoice, ItemsMatched) => (Details, vec![PresentRecommendation, OfferDetailsMenu]),
        (SurfaceChoice, NoItemsMatched) => {
            (Idle, vec![PresentRecommendation, NotifyNoMatch, ResetContext])
        }
        (SurfaceChoice, RecommendationFailed) => (Idle, vec![NotifyFailure, ResetContext]),
        (Details, DetailsRequested) => (Photos, vec![RenderItemCards, OfferPhotosMenu]),
        (Details, PhotosRequested) => {
            // Same-turn hand-off to the photo step.
            let delegated = transition_ball_advisor(&Photos, event, context)?;
            return Ok(TransitionOutcome { from: *current, ..delegated });
        }
        (Photos, PhotosRequested) => (Details, vec![RenderPhotos, OfferCardsMenu]),
        (Details, FinishRequested) | (Photos, FinishRequested) => {
            (Idle, vec![ConfirmCancelled, ResetContext])
        }
        (_, CancelRequested) => (Idle, vec![ConfirmCancelled, ResetContext]),
        (_, HelpRequested) => (*current, vec![ShowHelp]),
        (_, StatsRequested) => (*current, vec![ShowStats]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: *current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), actions })
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::domain::conversation::ConversationId;
    use crate::flows::engine::{BallAdvisorFlow, FlowDefinition, FlowEngine, FlowTransitionError};
    use crate::flows::states::{DialogAction, DialogEvent, DialogState, FlowContext, FlowType};

    const EVENTS: [DialogEvent; 13] = [
        DialogEvent::StartRequested,
        DialogEvent::LevelSelected,
        DialogEvent::SurfaceSelected,
        DialogEvent::ItemsMatched,
        DialogEvent::NoItemsMatched,
        DialogEvent::RecommendationFailed,
        DialogEvent::DetailsRequested,
        DialogEvent::PhotosRequested,
        DialogEvent::FinishRequested,
        DialogEvent::CancelRequested,
        DialogEvent::HelpRequested,
        DialogEvent::StatsRequested,
        DialogEvent::Unrecognized,
    ];

    fn listed(state: DialogState, event: &DialogEvent) -> Option<DialogState> {
        use DialogEvent::*;
        use DialogState::*;
        match (state, event) {
            (Idle, StartRequested) => Some(LevelChoice),
            (LevelChoice, LevelSelected) => Some(SurfaceChoice),
            (SurfaceChoice, SurfaceSelected) => Some(SurfaceChoice),
            (SurfaceChoice, ItemsMatched) => Some(Details),
            (SurfaceChoice, NoItemsMatched) | (SurfaceChoice, RecommendationFailed) => Some(Idle),
            (Details, DetailsRequested) => Some(Photos),
            (Details, PhotosRequested) | (Photos, PhotosRequested) => Some(Details),
            (Details, FinishRequested) | (Photos, FinishRequested) => Some(Idle),
            (_, CancelRequested) => Some(Idle),
            (state, HelpRequested) | (state, StatsRequested) => Some(state),
            _ => None,
        }
    }

    #[test]
    fn happy_path_reaches_details_and_photos() {
        let engine = FlowEngine::new(BallAdvisorFlow);
        let context = FlowContext::default();
        let mut state = engine.initial_state();

        for (event, expected) in [
            (DialogEvent::StartRequested, DialogState::LevelChoice),
            (DialogEvent::LevelSelected, DialogState::SurfaceChoice),
            (DialogEvent::SurfaceSelected, DialogState::SurfaceChoice),
            (DialogEvent::ItemsMatched, DialogState::Details),
            (DialogEvent::DetailsRequested, DialogState::Photos),
            (DialogEvent::PhotosRequested, DialogState::Details),
            (DialogEvent::FinishRequested, DialogState::Idle),
        ] {
            state = engine.apply(&state, &event, &context).expect("listed transition").to;
            assert_eq!(state, expected, "after {event:?}");
        }
    }

    #[test]
    fn surface_selection_records_usage_before_recommending() {
        let outcome = FlowEngine::default()
            .apply(&DialogState::SurfaceChoice, &DialogEvent::SurfaceSelected, &FlowContext::default())
            .expect("surface selection");

        assert_eq!(
            outcome.actions,
            vec![DialogAction::StoreSurface, DialogAction::RecordUsage, DialogAction::Recommend]
        );
    }

    #[test]
    fn photos_from_details_are_delegated_in_the_same_turn() {
        let outcome = FlowEngine::default()
            .apply(&DialogState::Details, &DialogEvent::PhotosRequested, &FlowContext::default())
            .expect("details -> photos delegation");

        assert_eq!(outcome.from, DialogState::Details);
        assert_eq!(outcome.to, DialogState::Details);
        assert_eq!(outcome.actions, vec![DialogAction::RenderPhotos, DialogAction::OfferCardsMenu]);
    }

    #[test]
    fn unlisted_pairs_are_rejected_without_moving() {
        let engine = FlowEngine::default();
        let context = FlowContext::default();

        for state in DialogState::ALL {
            for event in &EVENTS {
                let result = engine.apply(&state, event, &context);
                match listed(state, event) {
                    Some(expected) => {
                        assert_eq!(result.expect("listed pair").to, expected, "{state:?}/{event:?}")
                    }
                    None => assert!(
                        matches!(result, Err(FlowTransitionError::InvalidTransition { .. })),
                        "{state:?}/{event:?} should be rejected"
                    ),
                }
            }
        }
    }

    #[test]
    fn cancel_resets_from_every_state() {
        let engine = FlowEngine::default();
        for state in DialogState::ALL {
            let outcome = engine
                .apply(&state, &DialogEvent::CancelRequested, &FlowContext::default())
                .expect("cancel is always available");
            assert_eq!(outcome.to, DialogState::Idle);
            assert!(outcome.actions.contains(&DialogAction::ResetContext));
            assert!(outcome.actions.contains(&DialogAction::ConfirmCancelled));
        }
    }

    #[test]
    fn missing_tier_blocks_surface_selection() {
        let error = FlowEngine::default()
            .apply(
                &DialogState::SurfaceChoice,
                &DialogEvent::SurfaceSelected,
                &FlowContext { missing_selections: vec!["tier".to_owned()] },
            )
            .expect_err("tier must be chosen first");

        assert!(matches!(error, FlowTransitionError::MissingSelections { .. }));
    }

    #[test]
    fn replay_is_deterministic_for_same_event_sequence() {
        let engine = FlowEngine::default();
        let events = [
            DialogEvent::StartRequested,
            DialogEvent::LevelSelected,
            DialogEvent::SurfaceSelected,
            DialogEvent::ItemsMatched,
            DialogEvent::PhotosRequested,
        ];

        let run = |engine: &FlowEngine<BallAdvisorFlow>| {
            let mut state = engine.initial_state();
            let mut actions = Vec::new();
            for event in &events {
                let outcome = engine
                    .apply(&state, event, &FlowContext::default())
                    .expect("deterministic run");
                actions.push(outcome.actions);
                state = outcome.to;
            }
            (state, actions)
        };

        assert_eq!(run(&engine), run(&engine));
        assert_eq!(engine.flow_type(), FlowType::BallAdvisor);
        assert_eq!(BallAdvisorFlow.flow_type(), FlowType::BallAdvisor);
    }

    #[test]
    fn flow_transition_emits_audit_event() {
        let engine = FlowEngine::default();
        let sink = InMemoryAuditSink::default();
        let audit = AuditContext::new(Some(ConversationId::new("chat-9")), "req-42", "dialog");

        let _ = engine
            .apply_with_audit(
                &DialogState::Idle,
                &DialogEvent::StartRequested,
                &FlowContext::default(),
                &sink,
                &audit,
            )
            .expect("transition should succeed");
        let _ = engine.apply_with_audit(
            &DialogState::Idle,
            &DialogEvent::DetailsRequested,
            &FlowContext::default(),
            &sink,
            &audit,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].correlation_id, "req-42");
        assert_eq!(events[0].event_type, "dialog.transition_applied");
        assert_eq!(events[1].event_type, "dialog.transition_rejected");
    }
}
