//! Speech coordinator: arbitrates microphone capture and spoken playback.
//!
//! All transitions go through the [`StateMachine`]: operations are called by
//! the UI (mic button, stop button, toggle) and by the conversation layer,
//! and subsystem completions are delivered through [`handle_event`]. Each
//! recognition session and utterance carries an id, so completions of
//! superseded work are ignored.
//!
//! [`handle_event`]: SpeechCoordinator::handle_event

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CaptureError, SpeechError};
use crate::language::{resolve_recognition_locale, resolve_voice, Voice};
use crate::state::{SpeechState, StateMachine};
use crate::subsystem::{
    MicrophoneAccess, RecognitionEvent, SpeechEvent, SpeechRecognizer, SpeechSynthesizer,
    SynthesisEvent, Utterance,
};
use crate::text::normalize_for_speech;

/// Playback parameters applied to every utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    /// Volume in [0, 1].
    pub volume: f32,
    /// Selected voice; re-resolved whenever the interface language changes.
    pub voice: Option<Voice>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 0.8,
            voice: None,
        }
    }
}

impl VoiceSettings {
    pub fn new(rate: f32, pitch: f32, volume: f32) -> Self {
        Self {
            rate,
            pitch,
            volume: volume.clamp(0.0, 1.0),
            voice: None,
        }
    }
}

/// Which speech features the environment supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub recognition: bool,
    pub synthesis: bool,
}

/// Something the UI must act on after a subsystem completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Recognized text, to be placed in the input field.
    Transcript(String),
    /// Capture failed; show the notice to the user.
    CaptureFailed(CaptureError),
}

/// Playback sink used by the conversation layer to read replies aloud.
pub trait Speaker {
    fn speech_enabled(&self) -> bool;
    fn speak_reply(&mut self, text: &str);
}

/// Owns the speech state and both speech subsystems.
pub struct SpeechCoordinator {
    machine: StateMachine,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    settings: VoiceSettings,
    enabled: bool,
    language: String,
    locale: &'static str,
    next_id: u64,
    active_recognition: Option<u64>,
    active_utterance: Option<u64>,
}

impl std::fmt::Debug for SpeechCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCoordinator")
            .field("state", &self.machine.current())
            .field("enabled", &self.enabled)
            .field("language", &self.language)
            .field("locale", &self.locale)
            .field("settings", &self.settings)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

impl SpeechCoordinator {
    /// Create a coordinator with no subsystems attached.
    pub fn new(ui_language: &str, settings: VoiceSettings) -> Self {
        Self {
            machine: StateMachine::new(),
            recognizer: None,
            synthesizer: None,
            settings,
            enabled: true,
            language: ui_language.to_string(),
            locale: resolve_recognition_locale(ui_language),
            next_id: 0,
            active_recognition: None,
            active_utterance: None,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Attach a synthesizer and pick a voice for the current language.
    pub fn with_synthesizer(mut self, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self.refresh_voices();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    // -- Accessors --

    pub fn state(&self) -> SpeechState {
        self.machine.current()
    }

    pub fn is_listening(&self) -> bool {
        self.state().is_listening()
    }

    pub fn is_speaking(&self) -> bool {
        self.state().is_speaking()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            recognition: self.recognizer.is_some(),
            synthesis: self.synthesizer.is_some(),
        }
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }

    pub fn recognition_locale(&self) -> &'static str {
        self.locale
    }

    // -- Capture --

    /// Open the microphone and start a recognition session.
    ///
    /// A no-op while already listening. Microphone access is checked before
    /// anything else; playback in progress is stopped only once access is
    /// granted, so capture never overlaps speech.
    pub async fn start_listening(&mut self) -> Result<(), SpeechError> {
        let access = match self.recognizer.as_deref() {
            Some(_) if self.is_listening() => {
                debug!("Already listening; start request ignored");
                return Ok(());
            }
            Some(recognizer) => recognizer.request_microphone().await,
            None => return Err(SpeechError::Unsupported),
        };
        match access {
            MicrophoneAccess::Granted => {}
            MicrophoneAccess::Denied => {
                warn!("Microphone access denied");
                return Err(CaptureError::PermissionDenied.into());
            }
            MicrophoneAccess::Unavailable => {
                warn!("No microphone available");
                return Err(CaptureError::AudioCaptureFailure.into());
            }
        }

        if self.is_speaking() {
            debug!("Stopping playback before listening");
            self.stop_speaking();
        }

        self.next_id += 1;
        let session = self.next_id;
        if let Some(recognizer) = self.recognizer.as_deref_mut() {
            recognizer.start(session, self.locale).map_err(|e| {
                warn!(error = %e, "Recognizer failed to start");
                SpeechError::Subsystem(e)
            })?;
        }
        self.machine.transition(SpeechState::Listening)?;
        self.active_recognition = Some(session);
        info!(session, locale = self.locale, "Listening started");
        Ok(())
    }

    /// Ask the recognizer to end the current session early.
    ///
    /// The state returns to Idle when the recognizer reports the end, not
    /// here.
    pub fn stop_listening(&mut self) {
        if !self.is_listening() {
            debug!("Not listening; stop request ignored");
            return;
        }
        if let Some(recognizer) = self.recognizer.as_deref_mut() {
            recognizer.stop();
        }
    }

    // -- Playback --

    /// Read `text` aloud, pre-empting any utterance in progress.
    ///
    /// Returns whether an utterance was started. Skipped while disabled,
    /// while listening, without a synthesizer or voice, or when nothing
    /// speakable remains after normalization.
    pub fn speak(&mut self, text: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if self.is_listening() {
            debug!("Listening; playback skipped");
            return false;
        }
        let Some(synthesizer) = self.synthesizer.as_deref_mut() else {
            return false;
        };

        if self.machine.current().is_speaking() {
            synthesizer.cancel();
            self.active_utterance = None;
            self.machine.settle();
        }

        let clean = normalize_for_speech(text);
        if clean.is_empty() {
            return false;
        }

        let voice = match self.settings.voice.clone() {
            Some(voice) => voice,
            None => match resolve_voice(&synthesizer.voices(), &self.language) {
                Some(voice) => {
                    self.settings.voice = Some(voice.clone());
                    voice
                }
                None => {
                    debug!("No synthesis voice available; playback skipped");
                    return false;
                }
            },
        };

        self.next_id += 1;
        let id = self.next_id;
        let utterance = Utterance {
            id,
            text: clean,
            voice,
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
        };
        if let Err(e) = synthesizer.speak(utterance) {
            warn!(error = %e, "Synthesizer rejected utterance");
            return false;
        }
        if let Err(e) = self.machine.transition(SpeechState::Speaking) {
            warn!(error = %e, "Unexpected speech state");
            return false;
        }
        self.active_utterance = Some(id);
        debug!(utterance = id, "Speaking");
        true
    }

    /// Cancel playback. Safe to call in any state.
    pub fn stop_speaking(&mut self) {
        if let Some(synthesizer) = self.synthesizer.as_deref_mut() {
            synthesizer.cancel();
        }
        self.active_utterance = None;
        if self.is_speaking() {
            self.machine.settle();
        }
    }

    /// Flip voice playback on or off. Disabling stops current playback.
    pub fn toggle_enabled(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled && self.is_speaking() {
            self.stop_speaking();
        }
        info!(enabled, "Voice playback toggled");
    }

    // -- Language --

    /// Switch recognition locale and voice to a new interface language.
    pub fn set_language(&mut self, ui_language: &str) {
        self.language = ui_language.to_string();
        self.locale = resolve_recognition_locale(ui_language);
        self.refresh_voices();
        info!(
            language = ui_language,
            locale = self.locale,
            voice = self.settings.voice.as_ref().map(|v| v.name.as_str()),
            "Speech language changed"
        );
    }

    /// Re-pick the voice after the installed voices changed.
    pub fn refresh_voices(&mut self) {
        if let Some(synthesizer) = self.synthesizer.as_deref() {
            self.settings.voice = resolve_voice(&synthesizer.voices(), &self.language);
        }
    }

    // -- Completions --

    /// Apply a subsystem completion. Events for superseded sessions or
    /// utterances are ignored.
    pub fn handle_event(&mut self, event: SpeechEvent) -> Option<SpeechOutcome> {
        match event {
            SpeechEvent::Recognition { session, event } => {
                if self.active_recognition != Some(session) {
                    debug!(session, "Stale recognition event ignored");
                    return None;
                }
                self.active_recognition = None;
                self.machine.settle();
                match event {
                    RecognitionEvent::Transcript(text) => {
                        info!(chars = text.len(), "Transcript received");
                        Some(SpeechOutcome::Transcript(text))
                    }
                    RecognitionEvent::Error(code) => {
                        warn!(code = %code, "Speech recognition error");
                        Some(SpeechOutcome::CaptureFailed(CaptureError::from_code(&code)))
                    }
                    RecognitionEvent::End => None,
                }
            }
            SpeechEvent::Synthesis { utterance, event } => {
                if self.active_utterance != Some(utterance) {
                    debug!(utterance, "Stale synthesis event ignored");
                    return None;
                }
                match event {
                    SynthesisEvent::Started => {}
                    SynthesisEvent::Finished => {
                        self.active_utterance = None;
                        self.machine.settle();
                    }
                    SynthesisEvent::Failed(reason) => {
                        warn!(utterance, reason = %reason, "Speech synthesis error");
                        self.active_utterance = None;
                        self.machine.settle();
                    }
                }
                None
            }
        }
    }
}

impl Speaker for SpeechCoordinator {
    fn speech_enabled(&self) -> bool {
        self.enabled
    }

    fn speak_reply(&mut self, text: &str) {
        self.speak(text);
    }
}

// =============================================================================
// Tests
// =============================================================================
