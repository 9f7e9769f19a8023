use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use courtside_core::audit::{AuditContext, AuditSink, NoopAuditSink};
use courtside_core::domain::conversation::ConversationId;
use courtside_core::domain::item::{SurfacePreference, Tier};
use courtside_core::errors::{ApplicationError, DomainError, InterfaceError};
use courtside_core::flows::messages::{
    CANCELLED, DETAILS_QUESTION, ERROR_GENERIC, FOLLOW_UP_QUESTION, HELP, NO_MATCH,
    SURFACE_QUESTION, WELCOME,
};
use courtside_core::flows::{
    BallAdvisorFlow, ConversationContext, DialogAction, DialogEvent, DialogInput, DialogState,
    FlowEngine, FlowTransitionError, Menu, Reply,
};
use courtside_core::stats::UsageStats;
use tracing::{debug, error, info, warn};

use crate::photos::PhotoLocator;
use crate::recommend::RecommendationCoordinator;

const ACTOR: &str = "dialog-runtime";

#[derive(Clone, Debug, Default)]
struct Session {
    context: ConversationContext,
    /// Bumped on every committed reset so late results from an older cycle are dropped.
    generation: u64,
}

/// Drives each conversation through the ball-advisor dialog.
///
/// Sessions live in one table keyed by conversation id. The table lock is only taken to
/// snapshot or commit a session and is never held across the oracle call.
pub struct DialogRuntime {
    engine: FlowEngine<BallAdvisorFlow>,
    coordinator: RecommendationCoordinator,
    photos: PhotoLocator,
    stats: Arc<UsageStats>,
    audit: Arc<dyn AuditSink>,
    sessions: Mutex<HashMap<ConversationId, Session>>,
}

struct Turn<'a> {
    conversation_id: &'a ConversationId,
    correlation_id: &'a str,
    input: &'a DialogInput,
    generation: u64,
    reset: bool,
    /// Selections to count once the turn commits.
    usage: Option<(Tier, SurfacePreference)>,
    failure: Option<InterfaceError>,
}

impl DialogRuntime {
    pub fn new(
        coordinator: RecommendationCoordinator,
        photos: PhotoLocator,
        stats: Arc<UsageStats>,
    ) -> Self {
        Self {
            engine: FlowEngine::default(),
            coordinator,
            photos,
            stats,
            audit: Arc::new(NoopAuditSink),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn stats(&self) -> &Arc<UsageStats> {
        &self.stats
    }

    pub fn state_of(&self, conversation_id: &ConversationId) -> DialogState {
        self.context_of(conversation_id).map(|context| context.state).unwrap_or_default()
    }

    pub fn context_of(&self, conversation_id: &ConversationId) -> Option<ConversationContext> {
        self.lock_sessions().get(conversation_id).map(|session| session.context.clone())
    }

    pub fn active_conversations(&self) -> usize {
        self.lock_sessions().values().filter(|session| !session.context.is_idle()).count()
    }

    /// Handles one inbound message and returns the replies to send, in order.
    ///
    /// Input the current state does not accept is ignored: no replies, state held.
    pub async fn handle(
        &self,
        conversation_id: &ConversationId,
        input: DialogInput,
        correlation_id: &str,
    ) -> Vec<Reply> {
        let (mut context, generation) = {
            let sessions = self.lock_sessions();
            sessions
                .get(conversation_id)
                .map(|session| (session.context.clone(), session.generation))
                .unwrap_or_default()
        };

        let mut turn = Turn {
            conversation_id,
            correlation_id,
            input: &input,
            generation,
            reset: false,
            usage: None,
            failure: None,
        };
        let mut replies = Vec::new();
        let mut pending = Some(input.classify(context.state));

        while let Some(event) = pending.take() {
            let audit = AuditContext::new(
                Some(conversation_id.clone()),
                correlation_id.to_owned(),
                ACTOR,
            );
            let outcome = match self.engine.apply_with_audit(
                &context.state,
                &event,
                &context.flow_context(),
                self.audit.as_ref(),
                &audit,
            ) {
                Ok(outcome) => outcome,
                Err(FlowTransitionError::InvalidTransition { state, event }) => {
                    debug!(
                        event_name = "dialog.input_ignored",
                        conversation_id = %conversation_id,
                        correlation_id,
                        state = ?state,
                        event = ?event,
                        "input not accepted in current state"
                    );
                    break;
                }
                Err(error @ FlowTransitionError::MissingSelections { .. }) => {
                    pending = Some(fail(&mut turn, DomainError::from(error).into()));
                    continue;
                }
            };

            info!(
                event_name = "dialog.transition",
                conversation_id = %conversation_id,
                correlation_id,
                from = ?outcome.from,
                to = ?outcome.to,
                "dialog transition applied"
            );

            for action in &outcome.actions {
                match self.perform(action, &mut context, &mut turn, &mut replies).await {
                    Step::Continue => {}
                    Step::Follow(next) => pending = Some(next),
                    Step::Superseded => return Vec::new(),
                }
            }
            context.state = outcome.to;
        }

        if !self.commit(&turn, context) {
            return Vec::new();
        }
        if let (Some((tier, surface)), None) = (turn.usage, &turn.failure) {
            self.stats.record(tier, surface);
        }
        replies
    }

    async fn perform(
        &self,
        action: &DialogAction,
        context: &mut ConversationContext,
        turn: &mut Turn<'_>,
        replies: &mut Vec<Reply>,
    ) -> Step {
        match action {
            DialogAction::ResetContext => {
                context.reset();
                turn.reset = true;
            }
            DialogAction::PromptForLevel => replies.push(Reply::with_menu(WELCOME, Menu::levels())),
            DialogAction::StoreTier => {
                let raw = turn.input.text().unwrap_or_default();
                context.tier = Some(resolve_tier(raw, turn));
            }
            DialogAction::PromptForSurface => {
                replies.push(Reply::with_menu(SURFACE_QUESTION, Menu::surfaces()));
            }
            DialogAction::StoreSurface => {
                let raw = turn.input.text().unwrap_or_default();
                context.surface = Some(resolve_surface(raw, turn));
            }
            DialogAction::RecordUsage => {
                if let (Some(tier), Some(surface)) = (context.tier, context.surface) {
                    turn.usage = Some((tier, surface));
                }
            }
            DialogAction::Recommend => return self.recommend(context, turn).await,
            DialogAction::PresentRecommendation => {
                if let Some(advisory) = &context.advisory {
                    replies.push(Reply::text(advisory.clone()));
                }
            }
            DialogAction::OfferDetailsMenu => {
                replies.push(Reply::with_menu(DETAILS_QUESTION, Menu::details()));
            }
            DialogAction::RenderItemCards => replies.extend(
                context.recommendations.iter().cloned().map(|item| Reply::ItemCard { item }),
            ),
            DialogAction::OfferPhotosMenu => {
                replies.push(Reply::with_menu(FOLLOW_UP_QUESTION, Menu::photos()));
            }
            DialogAction::RenderPhotos => {
                replies.extend(self.photos.render_all(&context.recommendations).await);
            }
            DialogAction::OfferCardsMenu => {
                replies.push(Reply::with_menu(FOLLOW_UP_QUESTION, Menu::cards()));
            }
            DialogAction::NotifyNoMatch => replies.push(Reply::text(NO_MATCH)),
            DialogAction::NotifyFailure => replies.push(Reply::text(
                turn.failure.as_ref().map(InterfaceError::user_message).unwrap_or(ERROR_GENERIC),
            )),
            DialogAction::ConfirmCancelled => replies.push(Reply::text(CANCELLED)),
            DialogAction::ShowHelp => replies.push(Reply::text(HELP)),
            DialogAction::ShowStats => replies.push(Reply::text(self.stats.report())),
        }
        Step::Continue
    }

    async fn recommend(&self, context: &mut ConversationContext, turn: &mut Turn<'_>) -> Step {
        let (Some(tier), Some(surface)) = (context.tier, context.surface) else {
            let violation = DomainError::InvariantViolation(
                "recommendation requested without both selections".to_owned(),
            );
            return Step::Follow(fail(turn, violation.into()));
        };

        let coordinator = self.coordinator.clone();
        let task = tokio::spawn(async move { coordinator.recommend(tier, surface).await });
        let recommendation = match task.await {
            Ok(recommendation) => recommendation,
            Err(join_error) => {
                let failure =
                    ApplicationError::Integration(format!("recommendation task failed: {join_error}"));
                return Step::Follow(fail(turn, failure));
            }
        };

        if !self.is_current(turn) {
            info!(
                event_name = "dialog.recommendation_discarded",
                conversation_id = %turn.conversation_id,
                correlation_id = turn.correlation_id,
                "conversation was reset while the recommendation was in flight"
            );
            return Step::Superseded;
        }

        let matched = !recommendation.items.is_empty();
        context.advisory = Some(recommendation.advisory);
        context.recommendations = recommendation.items;
        Step::Follow(if matched { DialogEvent::ItemsMatched } else { DialogEvent::NoItemsMatched })
    }

    fn is_current(&self, turn: &Turn<'_>) -> bool {
        self.lock_sessions()
            .get(turn.conversation_id)
            .map(|session| session.generation)
            .unwrap_or_default()
            == turn.generation
    }

    /// Stores the turn's context unless a reset from another turn got there first.
    fn commit(&self, turn: &Turn<'_>, context: ConversationContext) -> bool {
        let mut sessions = self.lock_sessions();
        if context.is_idle() && !sessions.contains_key(turn.conversation_id) {
            return turn.generation == 0;
        }
        let session = sessions.entry(turn.conversation_id.clone()).or_default();

        if session.generation != turn.generation {
            return false;
        }
        session.context = context;
        if turn.reset {
            session.generation += 1;
        }
        true
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<ConversationId, Session>> {
        match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

enum Step {
    Continue,
    Follow(DialogEvent),
    Superseded,
}

/// Logs an internal failure against the turn and routes the dialog to its apology branch.
fn fail(turn: &mut Turn<'_>, error: ApplicationError) -> DialogEvent {
    let failure = error.into_interface(turn.correlation_id);
    error!(
        event_name = "dialog.internal_failure",
        conversation_id = %turn.conversation_id,
        correlation_id = failure.correlation_id(),
        error = %failure,
        "turn failed, resetting conversation"
    );
    turn.failure = Some(failure);
    DialogEvent::RecommendationFailed
}

fn resolve_tier(raw: &str, turn: &Turn<'_>) -> Tier {
    Tier::from_label(raw).unwrap_or_else(|| {
        warn!(
            event_name = "dialog.tier_defaulted",
            conversation_id = %turn.conversation_id,
            correlation_id = turn.correlation_id,
            raw_input = raw,
            "unrecognized level, defaulting to novice"
        );
        Tier::Novice
    })
}

fn resolve_surface(raw: &str, turn: &Turn<'_>) -> SurfacePreference {
    SurfacePreference::from_label(raw).unwrap_or_else(|| {
        warn!(
            event_name = "dialog.surface_defaulted",
            conversation_id = %turn.conversation_id,
            correlation_id = turn.correlation_id,
            raw_input = raw,
            "unrecognized surface, defaulting to universal use"
        );
        SurfacePreference::Universal
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use courtside_core::audit::InMemoryAuditSink;
    use courtside_core::catalog::Catalog;
    use courtside_core::domain::conversation::ConversationId;
    use courtside_core::domain::item::{SurfaceAffinity, SurfacePreference, Tier};
    use courtside_core::flows::messages::{
        fallback_advisory, CANCELLED, ERROR_GENERIC, HELP, NO_MATCH, WELCOME,
    };
    use courtside_core::flows::{ConversationContext, DialogInput, DialogState, Menu, Reply};
    use courtside_core::stats::UsageStats;
    use tokio::sync::Notify;

    use super::DialogRuntime;
    use crate::llm::{AdvisoryOracle, OracleError};
    use crate::photos::PhotoLocator;
    use crate::recommend::RecommendationCoordinator;

    struct FixedOracle(&'static str);

    #[async_trait]
    impl AdvisoryOracle for FixedOracle {
        async fn advise(&self, _: Tier, _: SurfacePreference) -> Result<String, OracleError> {
            Ok(self.0.to_owned())
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl AdvisoryOracle for FailingOracle {
        async fn advise(&self, _: Tier, _: SurfacePreference) -> Result<String, OracleError> {
            Err(OracleError::Timeout)
        }
    }

    /// Blocks until released, so tests can act while a call is in flight.
    struct GatedOracle {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AdvisoryOracle for GatedOracle {
        async fn advise(&self, _: Tier, _: SurfacePreference) -> Result<String, OracleError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("late advice".to_owned())
        }
    }

    struct PanickingOracle;

    #[async_trait]
    impl AdvisoryOracle for PanickingOracle {
        async fn advise(&self, _: Tier, _: SurfacePreference) -> Result<String, OracleError> {
            panic!("oracle bug")
        }
    }

    fn runtime_with(oracle: impl AdvisoryOracle + 'static, catalog: Catalog) -> DialogRuntime {
        DialogRuntime::new(
            RecommendationCoordinator::new(Arc::new(catalog), Arc::new(oracle)),
            PhotoLocator::new("does-not-exist"),
            Arc::new(UsageStats::new()),
        )
    }

    fn runtime(oracle: impl AdvisoryOracle + 'static) -> DialogRuntime {
        runtime_with(oracle, Catalog::builtin())
    }

    async fn say(runtime: &DialogRuntime, chat: &ConversationId, text: &str) -> Vec<Reply> {
        runtime.handle(chat, DialogInput::parse(text), "test").await
    }

    fn advisory_of(context: &ConversationContext) -> &str {
        context.advisory.as_deref().unwrap_or_default()
    }

    #[tokio::test]
    async fn start_prompts_for_level_with_menu() {
        let runtime = runtime(FixedOracle("Use size 0."));
        let chat = ConversationId::new("chat-1");

        let replies = say(&runtime, &chat, "/start").await;

        assert_eq!(replies, vec![Reply::with_menu(WELCOME, Menu::levels())]);
        assert_eq!(runtime.state_of(&chat), DialogState::LevelChoice);
    }

    #[tokio::test]
    async fn novice_indoor_reaches_details_with_oracle_text() {
        let runtime = runtime(FixedOracle("Use size 0."));
        let chat = ConversationId::new("chat-a");

        say(&runtime, &chat, "/start").await;
        let surface_prompt = say(&runtime, &chat, "Novice").await;
        assert_eq!(surface_prompt[0].menu(), Some(&Menu::surfaces()));

        let replies = say(&runtime, &chat, "Indoor").await;
        let context = runtime.context_of(&chat).expect("session exists");

        assert_eq!(context.state, DialogState::Details);
        assert_eq!(advisory_of(&context), "Use size 0.");
        assert!(!context.recommendations.is_empty());
        assert!(context.recommendations.iter().all(|item| item.tier == Tier::Novice));
        assert_eq!(replies[0], Reply::text("Use size 0."));
        assert_eq!(replies[1].menu(), Some(&Menu::details()));
        assert_eq!(runtime.stats().total(), 1);
    }

    #[tokio::test]
    async fn surface_without_a_match_falls_back_to_the_whole_tier() {
        let indoor_only = Catalog::builtin()
            .iter()
            .filter(|item| item.tier != Tier::Novice || item.surface == SurfaceAffinity::Indoor)
            .cloned()
            .collect::<Vec<_>>();
        let catalog = Catalog::new(indoor_only);
        let novices = catalog.items_for_tier(Tier::Novice).to_vec();
        let runtime = runtime_with(FixedOracle("Use size 0."), catalog);
        let chat = ConversationId::new("chat-b");

        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Novice").await;
        say(&runtime, &chat, "Outdoor").await;

        let context = runtime.context_of(&chat).expect("session exists");
        assert_eq!(context.state, DialogState::Details);
        assert_eq!(context.recommendations, novices);
    }

    #[tokio::test]
    async fn empty_catalog_reports_no_match_and_resets() {
        let runtime = runtime_with(FixedOracle("x"), Catalog::new(vec![]));
        let chat = ConversationId::new("chat-empty");

        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Novice").await;
        let replies = say(&runtime, &chat, "Indoor").await;

        assert_eq!(replies, vec![Reply::text("x"), Reply::text(NO_MATCH)]);
        assert_eq!(runtime.state_of(&chat), DialogState::Idle);
        assert_eq!(runtime.context_of(&chat), Some(ConversationContext::default()));
        assert_eq!(runtime.stats().total(), 1);
    }

    #[tokio::test]
    async fn failing_oracle_yields_fallback_text_for_professional_indoor() {
        let runtime = runtime(FailingOracle);
        let chat = ConversationId::new("chat-c");

        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Professional").await;
        let replies = say(&runtime, &chat, "Indoor").await;
        let context = runtime.context_of(&chat).expect("session exists");

        let expected = fallback_advisory(Tier::Professional, SurfacePreference::Indoor);
        assert_eq!(advisory_of(&context), expected);
        assert!(expected.contains("Professional") && expected.contains("Indoor"));
        assert!(!context.recommendations.is_empty());
        assert_eq!(replies[0], Reply::text(expected));
    }

    #[tokio::test]
    async fn finish_in_details_resets_and_next_start_is_fresh() {
        let runtime = runtime(FixedOracle("Use size 0."));
        let chat = ConversationId::new("chat-d");

        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Novice").await;
        say(&runtime, &chat, "Indoor").await;

        let replies = say(&runtime, &chat, "Finish").await;
        assert_eq!(replies, vec![Reply::text(CANCELLED)]);
        assert_eq!(runtime.state_of(&chat), DialogState::Idle);
        assert_eq!(runtime.context_of(&chat), Some(ConversationContext::default()));

        let restarted = say(&runtime, &chat, "/start").await;
        assert_eq!(restarted, vec![Reply::with_menu(WELCOME, Menu::levels())]);
        let context = runtime.context_of(&chat).expect("session exists");
        assert_eq!(context.tier, None);
        assert_eq!(context.surface, None);
        assert!(context.recommendations.is_empty());
    }

    #[tokio::test]
    async fn details_then_photos_alternate_menus() {
        let runtime = runtime(FixedOracle("Use size 0."));
        let chat = ConversationId::new("chat-e");
        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Intermediate").await;
        say(&runtime, &chat, "Indoor").await;
        let count = runtime.context_of(&chat).expect("session").recommendations.len();

        let cards = say(&runtime, &chat, "Show details").await;
        assert_eq!(cards.len(), count + 1);
        assert!(cards[..count].iter().all(|reply| matches!(reply, Reply::ItemCard { .. })));
        assert_eq!(cards[count].menu(), Some(&Menu::photos()));
        assert_eq!(runtime.state_of(&chat), DialogState::Photos);

        let photos = say(&runtime, &chat, "Show photos").await;
        assert_eq!(photos.len(), count + 1);
        assert!(photos[..count].iter().all(|reply| matches!(reply, Reply::PhotoUnavailable { .. })));
        assert_eq!(photos[count].menu(), Some(&Menu::cards()));
        assert_eq!(runtime.state_of(&chat), DialogState::Details);
    }

    #[tokio::test]
    async fn show_photos_from_details_is_handled_in_the_same_turn() {
        let runtime = runtime(FixedOracle("Use size 0."));
        let chat = ConversationId::new("chat-f");
        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Novice").await;
        say(&runtime, &chat, "Universal use").await;

        let replies = say(&runtime, &chat, "Show photos").await;

        assert!(matches!(replies.first(), Some(Reply::PhotoUnavailable { .. })));
        assert_eq!(replies.last().and_then(Reply::menu), Some(&Menu::cards()));
        assert_eq!(runtime.state_of(&chat), DialogState::Details);
    }

    #[tokio::test]
    async fn unexpected_input_is_ignored_and_state_held() {
        let runtime = runtime(FixedOracle("Use size 0."));
        let chat = ConversationId::new("chat-g");

        assert!(say(&runtime, &chat, "hello there").await.is_empty());
        assert_eq!(runtime.context_of(&chat), None);

        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Novice").await;
        say(&runtime, &chat, "Indoor").await;
        let before = runtime.context_of(&chat);

        assert!(say(&runtime, &chat, "tell me a joke").await.is_empty());
        assert!(say(&runtime, &chat, "/start").await.is_empty());
        assert!(say(&runtime, &chat, "/dance").await.is_empty());
        assert_eq!(runtime.context_of(&chat), before);
    }

    #[tokio::test]
    async fn help_and_stats_leave_state_untouched() {
        let runtime = runtime(FixedOracle("Use size 0."));
        let chat = ConversationId::new("chat-h");
        say(&runtime, &chat, "/start").await;

        assert_eq!(say(&runtime, &chat, "/help").await, vec![Reply::text(HELP)]);
        assert_eq!(runtime.state_of(&chat), DialogState::LevelChoice);

        let stats = say(&runtime, &chat, "/stats").await;
        assert_eq!(stats, vec![Reply::text(runtime.stats().report())]);
        assert_eq!(runtime.state_of(&chat), DialogState::LevelChoice);
    }

    #[tokio::test]
    async fn cancel_clears_context_from_every_active_state() {
        let scripts: [&[&str]; 4] = [
            &["/start"],
            &["/start", "Novice"],
            &["/start", "Novice", "Indoor"],
            &["/start", "Novice", "Indoor", "Show details"],
        ];
        let runtime = runtime(FixedOracle("Use size 0."));

        for (index, script) in scripts.iter().enumerate() {
            let chat = ConversationId::new(format!("chat-cancel-{index}"));
            for text in script.iter() {
                say(&runtime, &chat, text).await;
            }
            assert_ne!(runtime.state_of(&chat), DialogState::Idle);

            assert_eq!(say(&runtime, &chat, "/cancel").await, vec![Reply::text(CANCELLED)]);
            assert_eq!(runtime.context_of(&chat), Some(ConversationContext::default()));
        }
    }

    #[tokio::test]
    async fn unknown_labels_are_normalized() {
        let runtime = runtime(FixedOracle("ok"));
        let chat = ConversationId::new("chat-i");
        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "grandmaster").await;
        say(&runtime, &chat, "on the moon").await;

        let context = runtime.context_of(&chat).expect("session exists");
        assert_eq!(context.tier, Some(Tier::Novice));
        assert_eq!(context.surface, Some(SurfacePreference::Universal));
        assert_eq!(context.recommendations, Catalog::builtin().items_for_tier(Tier::Novice));
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let runtime = runtime(FixedOracle("ok"));
        let first = ConversationId::new("chat-1");
        let second = ConversationId::new("chat-2");

        say(&runtime, &first, "/start").await;
        say(&runtime, &first, "Professional").await;
        say(&runtime, &second, "/start").await;

        assert_eq!(runtime.state_of(&first), DialogState::SurfaceChoice);
        assert_eq!(runtime.state_of(&second), DialogState::LevelChoice);
        assert_eq!(runtime.context_of(&second).and_then(|context| context.tier), None);
        assert_eq!(runtime.active_conversations(), 2);
    }

    #[tokio::test]
    async fn cancel_during_inflight_oracle_call_discards_the_late_result() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let runtime = Arc::new(runtime(GatedOracle {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        }));
        let chat = ConversationId::new("chat-j");
        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Novice").await;

        let pending = {
            let runtime = Arc::clone(&runtime);
            let chat = chat.clone();
            tokio::spawn(async move { say(&runtime, &chat, "Indoor").await })
        };
        entered.notified().await;

        assert_eq!(say(&runtime, &chat, "/cancel").await, vec![Reply::text(CANCELLED)]);
        release.notify_one();

        let late = tokio::time::timeout(Duration::from_secs(5), pending)
            .await
            .expect("recommendation finishes")
            .expect("task joins");
        assert!(late.is_empty());
        assert_eq!(runtime.context_of(&chat), Some(ConversationContext::default()));
        assert_eq!(runtime.stats().total(), 0);
    }

    #[tokio::test]
    async fn hung_oracle_blocks_only_its_own_conversation() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let runtime = Arc::new(runtime(GatedOracle {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        }));
        let stuck = ConversationId::new("chat-stuck");
        say(&runtime, &stuck, "/start").await;
        say(&runtime, &stuck, "Novice").await;

        let pending = {
            let runtime = Arc::clone(&runtime);
            let stuck = stuck.clone();
            tokio::spawn(async move { say(&runtime, &stuck, "Indoor").await })
        };
        entered.notified().await;

        let other = ConversationId::new("chat-free");
        let replies = tokio::time::timeout(Duration::from_secs(1), say(&runtime, &other, "/start"))
            .await
            .expect("other conversation is not blocked");
        assert_eq!(replies, vec![Reply::with_menu(WELCOME, Menu::levels())]);

        release.notify_one();
        let finished = pending.await.expect("task joins");
        assert_eq!(finished.first(), Some(&Reply::text("late advice")));
    }

    #[tokio::test]
    async fn panicking_oracle_sends_apology_and_resets() {
        let runtime = runtime(PanickingOracle);
        let chat = ConversationId::new("chat-k");
        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "Novice").await;

        let replies = say(&runtime, &chat, "Indoor").await;

        assert_eq!(replies, vec![Reply::text(ERROR_GENERIC)]);
        assert_eq!(runtime.context_of(&chat), Some(ConversationContext::default()));
        assert_eq!(runtime.stats().total(), 0);
    }

    #[tokio::test]
    async fn transitions_are_audited() {
        let sink = InMemoryAuditSink::default();
        let runtime = runtime(FixedOracle("ok")).with_audit_sink(Arc::new(sink.clone()));
        let chat = ConversationId::new("chat-l");

        say(&runtime, &chat, "/start").await;
        say(&runtime, &chat, "nonsense in level choice").await;
        say(&runtime, &chat, "Indoor").await;
        say(&runtime, &chat, "Show nothing").await;

        let events = sink.events();
        let applied =
            events.iter().filter(|event| event.event_type == "dialog.transition_applied").count();
        let rejected =
            events.iter().filter(|event| event.event_type == "dialog.transition_rejected").count();
        // start, level, surface + matched follow-up
        assert_eq!(applied, 4);
        assert_eq!(rejected, 1);
        assert!(events.iter().all(|event| event.correlation_id == "test"));
    }
}
