//! Error types for voice capture and playback.

/// A capture failure, classified from the recognition subsystem's error code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Microphone permission denied. Allow microphone access in your system settings.")]
    PermissionDenied,
    #[error("No speech detected. Try speaking louder or check your microphone.")]
    NoSpeechDetected,
    #[error("Audio capture failed. Check that your microphone is connected and working.")]
    AudioCaptureFailure,
    #[error("Network error during speech recognition. Check your connection.")]
    NetworkFailure,
    #[error("Speech recognition service is not allowed.")]
    ServiceUnavailable,
    #[error("Speech recognition error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Map a recognition subsystem error code to the user-facing taxonomy.
    pub fn from_code(code: &str) -> Self {
        match code {
            "not-allowed" => CaptureError::PermissionDenied,
            "no-speech" => CaptureError::NoSpeechDetected,
            "audio-capture" => CaptureError::AudioCaptureFailure,
            "network" => CaptureError::NetworkFailure,
            "service-not-allowed" => CaptureError::ServiceUnavailable,
            other => CaptureError::Unknown(other.to_string()),
        }
    }
}

/// Errors returned by speech coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech recognition is not supported in this environment")]
    Unsupported,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("speech subsystem error: {0}")]
    Subsystem(String),
    #[error("invalid speech state transition: {from} -> {to}")]
    InvalidTransition {
        from: crate::state::SpeechState,
        to: crate::state::SpeechState,
    },
}
