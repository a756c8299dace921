//! Turn lifecycle as a pure state machine
//!
//! A turn moves `Idle -> Generating -> Revealing -> Idle`. New sends are
//! refused while either the backend call or the reveal is in flight. Turn
//! ids let late results of an abandoned turn be recognized and dropped.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    /// Waiting for the response pipeline
    Generating { turn: u64 },
    /// Revealing the reply into the last message
    Revealing { turn: u64 },
}

impl TurnState {
    pub fn is_busy(self) -> bool {
        !matches!(self, TurnState::Idle)
    }
}

/// Whether the visitor has sent anything since the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Fresh,
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    UserMessage { turn: u64 },
    ReplyReady { turn: u64 },
    RevealFinished { turn: u64 },
    Stop,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    AppendUserMessage,
    RequestReply,
    StartReveal,
    HaltReveal,
    ReplaceHistory,
}

#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A reply is still in progress")]
    Busy,
    #[error("Message is empty")]
    EmptyInput,
    #[error("Nothing is being revealed")]
    NothingToStop,
    #[error("Result belongs to an abandoned turn")]
    StaleTurn,
}

pub fn transition(state: TurnState, event: TurnEvent) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (TurnState::Idle, TurnEvent::UserMessage { turn }) => {
            Ok(TransitionResult::new(TurnState::Generating { turn })
                .with_effect(Effect::AppendUserMessage)
                .with_effect(Effect::RequestReply))
        }
        (TurnState::Generating { .. } | TurnState::Revealing { .. }, TurnEvent::UserMessage { .. }) => {
            Err(TransitionError::Busy)
        }

        (TurnState::Generating { turn }, TurnEvent::ReplyReady { turn: done }) if turn == done => {
            Ok(TransitionResult::new(TurnState::Revealing { turn }).with_effect(Effect::StartReveal))
        }
        (_, TurnEvent::ReplyReady { .. }) => Err(TransitionError::StaleTurn),

        (TurnState::Revealing { turn }, TurnEvent::RevealFinished { turn: done }) if turn == done => {
            Ok(TransitionResult::new(TurnState::Idle))
        }
        (_, TurnEvent::RevealFinished { .. }) => Err(TransitionError::StaleTurn),

        (TurnState::Revealing { .. }, TurnEvent::Stop) => {
            Ok(TransitionResult::new(TurnState::Idle).with_effect(Effect::HaltReveal))
        }
        (TurnState::Idle | TurnState::Generating { .. }, TurnEvent::Stop) => {
            Err(TransitionError::NothingToStop)
        }

        (TurnState::Revealing { .. }, TurnEvent::Reset) => Ok(TransitionResult::new(TurnState::Idle)
            .with_effect(Effect::HaltReveal)
            .with_effect(Effect::ReplaceHistory)),
        (TurnState::Idle | TurnState::Generating { .. }, TurnEvent::Reset) => {
            Ok(TransitionResult::new(TurnState::Idle).with_effect(Effect::ReplaceHistory))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_turn() {
        let r = transition(TurnState::Idle, TurnEvent::UserMessage { turn: 1 }).unwrap();
        assert_eq!(r.new_state, TurnState::Generating { turn: 1 });
        assert_eq!(r.effects, vec![Effect::AppendUserMessage, Effect::RequestReply]);

        let r = transition(r.new_state, TurnEvent::ReplyReady { turn: 1 }).unwrap();
        assert_eq!(r.new_state, TurnState::Revealing { turn: 1 });

        let r = transition(r.new_state, TurnEvent::RevealFinished { turn: 1 }).unwrap();
        assert_eq!(r.new_state, TurnState::Idle);
    }

    #[test]
    fn sends_are_refused_while_generating_or_revealing() {
        for state in [TurnState::Generating { turn: 3 }, TurnState::Revealing { turn: 3 }] {
            assert_eq!(
                transition(state, TurnEvent::UserMessage { turn: 4 }).unwrap_err(),
                TransitionError::Busy
            );
        }
    }

    #[test]
    fn late_reply_after_reset_is_stale() {
        let r = transition(TurnState::Generating { turn: 2 }, TurnEvent::Reset).unwrap();
        assert_eq!(r.new_state, TurnState::Idle);
        assert_eq!(
            transition(r.new_state, TurnEvent::ReplyReady { turn: 2 }).unwrap_err(),
            TransitionError::StaleTurn
        );
    }

    #[test]
    fn stop_only_applies_to_reveals() {
        let r = transition(TurnState::Revealing { turn: 1 }, TurnEvent::Stop).unwrap();
        assert_eq!(r.new_state, TurnState::Idle);
        assert_eq!(r.effects, vec![Effect::HaltReveal]);
        assert_eq!(
            transition(TurnState::Generating { turn: 1 }, TurnEvent::Stop).unwrap_err(),
            TransitionError::NothingToStop
        );
    }

    fn arb_state() -> impl Strategy<Value = TurnState> {
        prop_oneof![
            Just(TurnState::Idle),
            (0u64..4).prop_map(|turn| TurnState::Generating { turn }),
            (0u64..4).prop_map(|turn| TurnState::Revealing { turn }),
        ]
    }

    fn arb_event() -> impl Strategy<Value = TurnEvent> {
        prop_oneof![
            (0u64..4).prop_map(|turn| TurnEvent::UserMessage { turn }),
            (0u64..4).prop_map(|turn| TurnEvent::ReplyReady { turn }),
            (0u64..4).prop_map(|turn| TurnEvent::RevealFinished { turn }),
            Just(TurnEvent::Stop),
            Just(TurnEvent::Reset),
        ]
    }

    proptest! {
        #[test]
        fn user_messages_only_accepted_when_idle(state in arb_state(), turn in 0u64..4) {
            let result = transition(state, TurnEvent::UserMessage { turn });
            prop_assert_eq!(result.is_ok(), state == TurnState::Idle);
        }

        #[test]
        fn reset_always_returns_to_idle(state in arb_state()) {
            let r = transition(state, TurnEvent::Reset).unwrap();
            prop_assert_eq!(r.new_state, TurnState::Idle);
            prop_assert!(r.effects.contains(&Effect::ReplaceHistory));
        }

        #[test]
        fn revealing_is_only_entered_from_matching_generation(
            events in proptest::collection::vec(arb_event(), 0..30)
        ) {
            let mut state = TurnState::Idle;
            for event in events {
                if let Ok(r) = transition(state, event) {
                    if let TurnState::Revealing { turn } = r.new_state {
                        prop_assert_eq!(state, TurnState::Generating { turn });
                        prop_assert_eq!(event, TurnEvent::ReplyReady { turn });
                    }
                    if r.effects.contains(&Effect::HaltReveal) {
                        let was_revealing = matches!(state, TurnState::Revealing { .. });
                        prop_assert!(was_revealing);
                    }
                    state = r.new_state;
                }
            }
        }
    }
}
