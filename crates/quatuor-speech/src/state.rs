//! Speech state machine.
//!
//! Enforces the valid transitions between capture and playback:
//! - Idle -> Listening (recognition started)
//! - Listening -> Idle (recognition produced a result, failed, or ended)
//! - Idle -> Speaking (utterance handed to the synthesizer)
//! - Speaking -> Idle (utterance finished, failed, or was cancelled)
//!
//! Listening and Speaking never follow each other directly, so the two can
//! never be active at once.

use std::fmt;

use crate::error::SpeechError;

/// What the voice subsystems are currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SpeechState {
    #[default]
    Idle,
    /// The microphone is open and a recognition session is running.
    Listening,
    /// An utterance is being played back.
    Speaking,
}

impl fmt::Display for SpeechState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechState::Idle => write!(f, "Idle"),
            SpeechState::Listening => write!(f, "Listening"),
            SpeechState::Speaking => write!(f, "Speaking"),
        }
    }
}

impl SpeechState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SpeechState) -> bool {
        matches!(
            (self, target),
            (SpeechState::Idle, SpeechState::Listening)
                | (SpeechState::Listening, SpeechState::Idle)
                | (SpeechState::Idle, SpeechState::Speaking)
                | (SpeechState::Speaking, SpeechState::Idle)
        )
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, SpeechState::Listening)
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, SpeechState::Speaking)
    }
}

/// Validating holder for the current [`SpeechState`].
///
/// Owned by the coordinator; every transition goes through [`transition`],
/// which rejects anything outside the table above.
///
/// [`transition`]: StateMachine::transition
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: SpeechState,
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn current(&self) -> SpeechState {
        self.state
    }

    /// Attempt to transition to the target state.
    pub fn transition(&mut self, target: SpeechState) -> Result<(), SpeechError> {
        if self.state.can_transition_to(&target) {
            tracing::debug!("Speech state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(SpeechError::InvalidTransition {
                from: self.state,
                to: target,
            })
        }
    }

    /// Return to Idle from any state. A no-op when already idle.
    pub fn settle(&mut self) {
        if self.state != SpeechState::Idle {
            tracing::debug!("Speech state: {} -> Idle", self.state);
            self.state = SpeechState::Idle;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
