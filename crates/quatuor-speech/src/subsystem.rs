//! Contracts for the environment-provided speech subsystems.
//!
//! Both subsystems report completion asynchronously by emitting
//! [`SpeechEvent`]s, tagged with the recognition session or utterance they
//! belong to, which the owner feeds back into
//! [`SpeechCoordinator::handle_event`](crate::SpeechCoordinator::handle_event).

use async_trait::async_trait;

use crate::language::Voice;

/// Outcome of asking the environment for microphone access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicrophoneAccess {
    Granted,
    /// The user or the platform refused access.
    Denied,
    /// No usable capture device.
    Unavailable,
}

/// Live speech recognition: one final transcript or an error code per session.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Ask for microphone access. May suspend on a permission prompt.
    async fn request_microphone(&self) -> MicrophoneAccess;

    /// Begin a recognition session in `locale`. Results arrive later as
    /// [`RecognitionEvent`]s tagged with `session`.
    fn start(&mut self, session: u64, locale: &str) -> Result<(), String>;

    /// Request early termination. The session still reports its end.
    fn stop(&mut self);
}

/// Text-to-speech playback.
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices currently installed.
    fn voices(&self) -> Vec<Voice>;

    /// Start playing `utterance`. Completion arrives later as a
    /// [`SynthesisEvent`] tagged with `utterance.id`.
    fn speak(&mut self, utterance: Utterance) -> Result<(), String>;

    /// Stop any playback in progress. Cancelled utterances need not report.
    fn cancel(&mut self);
}

/// A piece of text handed to the synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub voice: Voice,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Final transcript of the session.
    Transcript(String),
    /// Subsystem error code, e.g. `no-speech`.
    Error(String),
    /// The session ended.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    Started,
    Finished,
    Failed(String),
}

/// A completion callback from either subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Recognition { session: u64, event: RecognitionEvent },
    Synthesis { utterance: u64, event: SynthesisEvent },
}
