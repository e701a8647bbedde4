//! Voice interaction for the quatuor client.
//!
//! Arbitrates between microphone capture and spoken playback through a
//! strict state machine (Idle, Listening, Speaking), picks a synthesis voice
//! for the active interface language, and classifies capture failures.

pub mod command;
pub mod coordinator;
pub mod error;
pub mod language;
pub mod state;
pub mod subsystem;
pub mod text;

pub use command::CommandSynthesizer;
pub use coordinator::{Capabilities, SpeechCoordinator, SpeechOutcome, Speaker, VoiceSettings};
pub use error::{CaptureError, SpeechError};
pub use language::{resolve_recognition_locale, resolve_voice, Voice};
pub use state::SpeechState;
pub use subsystem::{
    MicrophoneAccess, RecognitionEvent, SpeechEvent, SpeechRecognizer, SpeechSynthesizer,
    SynthesisEvent, Utterance,
};
pub use text::normalize_for_speech;
