//! Text-to-speech through an external command (espeak-ng by default).
//!
//! Each utterance runs as a child process. A background task waits for the
//! process and reports the outcome on the event channel; cancelling kills
//! the process and reports nothing.

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::language::Voice;
use crate::subsystem::{SpeechEvent, SpeechSynthesizer, SynthesisEvent, Utterance};

const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const BASE_PITCH: f32 = 50.0;
const MAX_AMPLITUDE: f32 = 200.0;

pub struct CommandSynthesizer {
    program: String,
    voices: Vec<Voice>,
    events: mpsc::UnboundedSender<SpeechEvent>,
    current: Option<oneshot::Sender<()>>,
}

impl CommandSynthesizer {
    pub fn new(
        program: impl Into<String>,
        voices: Vec<Voice>,
        events: mpsc::UnboundedSender<SpeechEvent>,
    ) -> Self {
        Self {
            program: program.into(),
            voices,
            events,
            current: None,
        }
    }

    /// Command-line arguments for one utterance.
    pub fn build_args(utterance: &Utterance) -> Vec<String> {
        let speed = (BASE_WORDS_PER_MINUTE * utterance.rate).round().clamp(80.0, 450.0);
        let pitch = (BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0);
        let amplitude = (MAX_AMPLITUDE * utterance.volume)
            .round()
            .clamp(0.0, MAX_AMPLITUDE);
        vec![
            "-v".to_string(),
            utterance.voice.name.clone(),
            "-s".to_string(),
            format!("{speed}"),
            "-p".to_string(),
            format!("{pitch}"),
            "-a".to_string(),
            format!("{amplitude}"),
            utterance.text.clone(),
        ]
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), String> {
        self.cancel();

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| "speech playback requires an async runtime".to_string())?;
        let mut child = Command::new(&self.program)
            .args(Self::build_args(&utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start {}: {e}", self.program))?;

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        self.current = Some(cancel_tx);
        let events = self.events.clone();
        let id = utterance.id;

        runtime.spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let event = match status {
                        Ok(status) if status.success() => SynthesisEvent::Finished,
                        Ok(status) => SynthesisEvent::Failed(format!("synthesizer exited with {status}")),
                        Err(e) => SynthesisEvent::Failed(e.to_string()),
                    };
                    if events.send(SpeechEvent::Synthesis { utterance: id, event }).is_err() {
                        debug!(utterance = id, "Speech event receiver dropped");
                    }
                }
                _ = cancel_rx => {
                    if let Err(e) = child.kill().await {
                        warn!(utterance = id, error = %e, "Failed to stop synthesizer process");
                    }
                }
            }
        });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.current.take() {
            let _ = cancel.send(());
        }
    }
}
