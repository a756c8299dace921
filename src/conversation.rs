//! Conversation controller
//!
//! Owns the message list and session of one visitor conversation and
//! composes intent routing, response generation, reveal and action dispatch
//! on each turn. Only the last message is ever mutated in place, and only
//! while it is being revealed.
//!
//! State lives behind a std mutex that is never held across an await; the
//! reveal re-takes it for every committed character and checks that its
//! turn is still current before touching the list.

mod message;
mod session;
mod state;

pub use message::{Attachments, Message, Role, MAX_ACTION_BUTTONS};
pub use session::{greeting_suggestions, quick_actions, Language, QuickAction, SessionConfig};
pub use state::{transition, Effect, Phase, TransitionError, TurnEvent, TurnState};

use crate::actions::{ActionButton, ActionDispatcher, NavigationTarget, Navigator};
use crate::knowledge::{scan_page, PageContext, PageSnapshot};
use crate::llm::LlmMessage;
use crate::pipeline::{self, Notice, PipelineResult, ResponsePipeline, TurnInput};
use crate::streaming::{Reveal, RevealOutcome, Scheduler};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Buffered events per conversation before slow subscribers start lagging
const EVENT_CAPACITY: usize = 1024;

/// Observable change to a conversation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    MessageAppended { index: usize, message: Message },
    ContentUpdated { index: usize, content: String },
    MessageCompleted { index: usize, message: Message },
    HistoryReset { messages: Vec<Message> },
    Notice { notice: Notice },
    Navigate { target: NavigationTarget },
}

/// Point-in-time view of a conversation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    pub id: String,
    pub messages: Vec<Message>,
    pub session: SessionConfig,
    pub phase: Phase,
    pub turn: TurnState,
    /// A backend call is still outstanding, possibly for a turn a reset abandoned
    pub awaiting_reply: bool,
    pub quick_actions: Vec<QuickAction>,
}

/// Shared collaborators of every conversation
#[derive(Clone)]
pub struct ConversationDeps {
    pub pipeline: Arc<ResponsePipeline>,
    pub scheduler: Arc<dyn Scheduler>,
    pub base_delay: Duration,
}

/// Navigator that forwards targets to the conversation's subscribers
struct EventNavigator {
    events: broadcast::Sender<ConversationEvent>,
}

impl Navigator for EventNavigator {
    fn navigate(&self, target: &NavigationTarget) {
        let _ = self.events.send(ConversationEvent::Navigate {
            target: target.clone(),
        });
    }
}

struct Inner {
    messages: Vec<Message>,
    session: SessionConfig,
    phase: Phase,
    turn: TurnState,
    next_turn: u64,
    /// Turn whose generation request has not returned yet
    in_flight: Option<u64>,
    reveal: Option<CancellationToken>,
    last_active: Instant,
}

impl Inner {
    fn fresh(session: SessionConfig) -> Self {
        let mut inner = Self {
            messages: Vec::new(),
            session,
            phase: Phase::Fresh,
            turn: TurnState::Idle,
            next_turn: 1,
            in_flight: None,
            reveal: None,
            last_active: Instant::now(),
        };
        inner.messages = vec![inner.greeting_message()];
        inner
    }

    fn greeting_message(&self) -> Message {
        Message::assistant(
            self.session.greeting.clone(),
            greeting_suggestions(self.session.language),
        )
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    fn is_busy(&self) -> bool {
        self.turn.is_busy() || self.in_flight.is_some()
    }

    fn halt_reveal(&mut self) -> Option<usize> {
        if let Some(token) = self.reveal.take() {
            token.cancel();
        }
        let index = self.messages.len().checked_sub(1)?;
        let last = self.messages.get_mut(index)?;
        if !last.is_animating {
            return None;
        }
        last.halt();
        Some(index)
    }
}

/// Turn accepted by the controller whose reply has not been produced yet
#[derive(Debug)]
pub struct PendingTurn {
    turn: u64,
    utterance: String,
    session: SessionConfig,
    history: Vec<LlmMessage>,
    page: Option<PageContext>,
}

pub struct Conversation {
    id: String,
    inner: Mutex<Inner>,
    deps: ConversationDeps,
    dispatcher: ActionDispatcher<EventNavigator>,
    events: broadcast::Sender<ConversationEvent>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, session: SessionConfig, deps: ConversationDeps) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: id.into(),
            inner: Mutex::new(Inner::fresh(session)),
            deps,
            dispatcher: ActionDispatcher::new(EventNavigator {
                events: events.clone(),
            }),
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: ConversationEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let mut inner = self.lock();
        inner.touch();
        ConversationSnapshot {
            id: self.id.clone(),
            messages: inner.messages.clone(),
            session: inner.session.clone(),
            phase: inner.phase,
            turn: inner.turn,
            awaiting_reply: inner.in_flight.is_some(),
            quick_actions: Self::quick_actions_for(&inner),
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn session(&self) -> SessionConfig {
        self.lock().session.clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// True while a turn runs or a generation request is outstanding
    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    /// How long the conversation has gone untouched. `None` while it is busy
    /// or someone is subscribed to its events.
    pub fn idle_for(&self) -> Option<Duration> {
        let inner = self.lock();
        if inner.is_busy() || self.events.receiver_count() > 0 {
            return None;
        }
        Some(inner.last_active.elapsed())
    }

    /// First-turn shortcuts, offered only until the visitor sends something
    pub fn quick_actions(&self) -> Vec<QuickAction> {
        Self::quick_actions_for(&self.lock())
    }

    fn quick_actions_for(inner: &Inner) -> Vec<QuickAction> {
        match inner.phase {
            Phase::Fresh => quick_actions(inner.session.language),
            Phase::InProgress => Vec::new(),
        }
    }

    /// Send a visitor message and wait until its reply is fully revealed or
    /// stopped. Empty input and sends during a turn change nothing.
    pub async fn send_user_message(&self, text: &str) -> Result<(), TransitionError> {
        let pending = self.begin_turn(text, None)?;
        self.run_turn(pending).await;
        Ok(())
    }

    /// Explain the supplied page: scan it and run a turn with the result
    /// attached to the prompt.
    pub async fn analyze_page(&self, snapshot: &PageSnapshot) -> Result<(), TransitionError> {
        let pending = self.begin_page_analysis(snapshot)?;
        self.run_turn(pending).await;
        Ok(())
    }

    pub fn begin_page_analysis(&self, snapshot: &PageSnapshot) -> Result<PendingTurn, TransitionError> {
        let page = scan_page(snapshot);
        let language = self.lock().session.language;
        self.begin_turn(pipeline::page_request(language), Some(page))
    }

    /// Accept a turn: append the visitor message and mark generation as in
    /// flight. The reply is produced by [`Conversation::run_turn`].
    pub fn begin_turn(&self, text: &str, page: Option<PageContext>) -> Result<PendingTurn, TransitionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TransitionError::EmptyInput);
        }

        let mut inner = self.lock();
        // at most one backend call per conversation, even across a reset
        if inner.in_flight.is_some() {
            return Err(TransitionError::Busy);
        }
        let turn = inner.next_turn;
        let result = transition(inner.turn, TurnEvent::UserMessage { turn })?;

        // prior turns only; the utterance is added by the prompt builder
        let history = pipeline::history_window(&inner.messages);
        inner.next_turn += 1;
        inner.turn = result.new_state;
        inner.in_flight = Some(turn);
        inner.phase = Phase::InProgress;
        inner.touch();

        for effect in result.effects {
            if effect == Effect::AppendUserMessage {
                let message = Message::user(text);
                inner.messages.push(message.clone());
                self.publish(ConversationEvent::MessageAppended {
                    index: inner.messages.len() - 1,
                    message,
                });
            }
        }

        tracing::info!(conv_id = %self.id, turn, page = page.is_some(), "Turn started");
        Ok(PendingTurn {
            turn,
            utterance: text.to_string(),
            session: inner.session.clone(),
            history,
            page,
        })
    }

    /// Produce and reveal the reply of an accepted turn. A turn abandoned by
    /// a reset in the meantime is dropped without touching the list.
    pub async fn run_turn(&self, pending: PendingTurn) {
        let result = self
            .deps
            .pipeline
            .respond(TurnInput {
                utterance: &pending.utterance,
                session: &pending.session,
                history: &pending.history,
                page: pending.page.as_ref(),
            })
            .await;

        let turn = pending.turn;
        let Some(mut reveal) = self.start_reveal(turn, &result) else {
            return;
        };

        let outcome = reveal
            .start(self.deps.scheduler.as_ref(), self.deps.base_delay, |prefix| {
                self.commit(turn, prefix)
            })
            .await;

        match outcome {
            RevealOutcome::Completed => self.finish_reveal(turn, result),
            RevealOutcome::Cancelled => {
                tracing::info!(
                    conv_id = %self.id,
                    turn,
                    revealed = reveal.revealed_count(),
                    "Reveal stopped"
                );
            }
        }
    }

    fn start_reveal(&self, turn: u64, result: &PipelineResult) -> Option<Reveal> {
        let mut inner = self.lock();
        if inner.in_flight == Some(turn) {
            inner.in_flight = None;
        }
        let transitioned = match transition(inner.turn, TurnEvent::ReplyReady { turn }) {
            Ok(r) => r,
            Err(e) => {
                tracing::info!(conv_id = %self.id, turn, reason = %e, "Discarding reply");
                return None;
            }
        };
        inner.turn = transitioned.new_state;

        if let Some(notice) = &result.notice {
            self.publish(ConversationEvent::Notice {
                notice: notice.clone(),
            });
        }

        let reveal = Reveal::new(&result.text);
        for effect in transitioned.effects {
            if effect == Effect::StartReveal {
                let message = Message::streaming();
                inner.messages.push(message.clone());
                inner.reveal = Some(reveal.cancel_token());
                self.publish(ConversationEvent::MessageAppended {
                    index: inner.messages.len() - 1,
                    message,
                });
            }
        }
        Some(reveal)
    }

    fn commit(&self, turn: u64, prefix: &str) -> bool {
        let mut inner = self.lock();
        if inner.turn != (TurnState::Revealing { turn }) {
            return false;
        }
        let index = inner.messages.len().saturating_sub(1);
        match inner.messages.get_mut(index) {
            Some(last) if last.is_animating => {
                last.content.clear();
                last.content.push_str(prefix);
            }
            _ => return false,
        }
        self.publish(ConversationEvent::ContentUpdated {
            index,
            content: prefix.to_string(),
        });
        true
    }

    fn finish_reveal(&self, turn: u64, result: PipelineResult) {
        let mut inner = self.lock();
        match transition(inner.turn, TurnEvent::RevealFinished { turn }) {
            Ok(r) => inner.turn = r.new_state,
            Err(e) => {
                tracing::debug!(conv_id = %self.id, turn, reason = %e, "Reveal finished late");
                return;
            }
        }
        inner.reveal = None;
        inner.touch();

        let index = inner.messages.len().saturating_sub(1);
        let Some(last) = inner.messages.get_mut(index) else {
            return;
        };
        last.complete(
            result.suggested_replies.unwrap_or_default(),
            result.action_buttons.unwrap_or_default(),
            result.attachments,
        );
        let message = last.clone();
        tracing::info!(conv_id = %self.id, turn, tier = ?result.tier, "Turn completed");
        self.publish(ConversationEvent::MessageCompleted { index, message });
    }

    /// Freeze the message being revealed at its current prefix
    pub fn stop_generating(&self) -> Result<(), TransitionError> {
        let mut inner = self.lock();
        let result = transition(inner.turn, TurnEvent::Stop)?;
        inner.turn = result.new_state;
        inner.touch();

        for effect in result.effects {
            if effect == Effect::HaltReveal {
                if let Some(index) = inner.halt_reveal() {
                    self.publish(ConversationEvent::MessageCompleted {
                        index,
                        message: inner.messages[index].clone(),
                    });
                }
            }
        }
        tracing::info!(conv_id = %self.id, "Generation stopped");
        Ok(())
    }

    /// Replace the whole history with a fresh greeting in `language`
    pub fn reset_conversation(&self, language: Language) {
        let mut inner = self.lock();
        self.reset_locked(&mut inner, language);
    }

    pub fn toggle_language(&self) -> Language {
        let mut inner = self.lock();
        let language = inner.session.language.toggled();
        self.reset_locked(&mut inner, language);
        language
    }

    fn reset_locked(&self, inner: &mut Inner, language: Language) {
        let result = match transition(inner.turn, TurnEvent::Reset) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(conv_id = %self.id, error = %e, "Reset rejected");
                return;
            }
        };
        inner.turn = result.new_state;
        inner.touch();

        for effect in result.effects {
            match effect {
                Effect::HaltReveal => {
                    inner.halt_reveal();
                }
                Effect::ReplaceHistory => {
                    inner.session.set_language(language);
                    inner.messages = vec![inner.greeting_message()];
                    inner.phase = Phase::Fresh;
                    inner.reveal = None;
                }
                Effect::AppendUserMessage | Effect::RequestReply | Effect::StartReveal => {}
            }
        }

        tracing::info!(conv_id = %self.id, language = %language, "Conversation reset");
        self.publish(ConversationEvent::HistoryReset {
            messages: inner.messages.clone(),
        });
    }

    /// Abandon whatever turn is running before the conversation is dropped.
    /// A pending reply is discarded when it arrives.
    pub fn close(&self) {
        let mut inner = self.lock();
        if let Ok(result) = transition(inner.turn, TurnEvent::Reset) {
            inner.turn = result.new_state;
            if result.effects.contains(&Effect::HaltReveal) {
                inner.halt_reveal();
            }
        }
        tracing::debug!(conv_id = %self.id, "Conversation closed");
    }

    /// Execute an action button and record it with an audit message. The
    /// audit entry is appended even when the action is unknown.
    pub fn dispatch_action(&self, button: &ActionButton) -> Result<Option<NavigationTarget>, TransitionError> {
        let mut inner = self.lock();
        if inner.turn.is_busy() {
            return Err(TransitionError::Busy);
        }

        inner.touch();
        let target = self.dispatcher.execute(button);

        let message = Message::audit(&button.label);
        inner.messages.push(message.clone());
        inner.phase = Phase::InProgress;
        self.publish(ConversationEvent::MessageAppended {
            index: inner.messages.len() - 1,
            message,
        });
        Ok(target)
    }
}
