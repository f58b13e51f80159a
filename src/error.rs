//! Error types for the Solace conversational core
//!
//! Every error is handled at the controller where it occurs and converted to
//! user-facing text before it reaches the rendering layer; raw platform error
//! codes never cross component boundaries.

use thiserror::Error;

/// Kinds of speech recognition failure, mapped from platform error codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionError {
    /// The platform heard nothing before giving up
    NoSpeechDetected,
    /// Microphone missing or capture failed
    MicrophoneUnavailable,
    /// The user (or browser policy) denied microphone access
    PermissionDenied,
    /// Anything else, carrying the raw platform code
    Other(String),
}

impl RecognitionError {
    /// Map a raw platform error code to a taxonomy value.
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => RecognitionError::NoSpeechDetected,
            "audio-capture" => RecognitionError::MicrophoneUnavailable,
            "not-allowed" => RecognitionError::PermissionDenied,
            other => RecognitionError::Other(other.to_string()),
        }
    }
}

/// Kinds of speech synthesis failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SynthesisError {
    /// Benign interruption from our own cancel; never shown to the user
    Interrupted,
    /// The platform reported a network failure while fetching voice data
    NetworkError,
    /// The platform silently dropped the utterance (watchdog fired)
    FailedToStart,
    /// Anything else, carrying the raw platform code
    Other(String),
}

impl SynthesisError {
    /// Whether this error should be suppressed entirely rather than surfaced.
    pub fn is_benign(&self) -> bool {
        matches!(self, SynthesisError::Interrupted)
    }
}

/// Solace conversational core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolaceError {
    /// A requested voice feature is not supported on this platform
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// The user tried to submit blank text
    #[error("Empty input")]
    EmptyInput,

    /// A turn is already active
    #[error("Session is busy")]
    Busy,

    /// Speech recognition failure
    #[error("Recognition error: {0:?}")]
    Recognition(RecognitionError),

    /// Speech synthesis failure
    #[error("Synthesis error: {0:?}")]
    Synthesis(SynthesisError),

    /// Answer service failure (non-2xx, malformed JSON, or transport error)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    Channel(String),
}

impl SolaceError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors let the session keep going; non-recoverable ones
    /// permanently disable the affordance that produced them.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Missing capabilities never come back within a session
            SolaceError::CapabilityUnavailable(_) => false,
            // Local validation, just try again
            SolaceError::EmptyInput => true,
            SolaceError::Busy => true,
            // Speech errors are transient
            SolaceError::Recognition(_) => true,
            SolaceError::Synthesis(_) => true,
            // The user can retry the turn manually
            SolaceError::Backend(_) => true,
            // Channel errors indicate internal wiring problems
            SolaceError::Channel(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    ///
    /// Returns a message suitable for display in the chat view.
    pub fn user_message(&self) -> String {
        match self {
            SolaceError::CapabilityUnavailable(what) => {
                format!("{} is not supported in this browser.", what)
            }
            SolaceError::EmptyInput => {
                "Please enter a question or use the microphone.".to_string()
            }
            SolaceError::Busy => "Please wait for the current response.".to_string(),
            SolaceError::Recognition(kind) => match kind {
                RecognitionError::NoSpeechDetected => {
                    "No speech detected. Please try again.".to_string()
                }
                RecognitionError::MicrophoneUnavailable => {
                    "Audio capture error. Make sure microphone is enabled and permissions are granted."
                        .to_string()
                }
                RecognitionError::PermissionDenied => {
                    "Microphone access denied. Please allow microphone access in browser settings."
                        .to_string()
                }
                RecognitionError::Other(code) => {
                    format!("Speech recognition error: {}", code)
                }
            },
            SolaceError::Synthesis(kind) => match kind {
                SynthesisError::Interrupted => String::new(),
                SynthesisError::NetworkError => {
                    "Network error occurred. Check your connection.".to_string()
                }
                SynthesisError::FailedToStart => {
                    "Speech failed to start. Please try again.".to_string()
                }
                SynthesisError::Other(code) => format!("Speech error: {}", code),
            },
            SolaceError::Backend(msg) => msg.clone(),
            SolaceError::Channel(_) => {
                "Internal communication error. Please reload the page.".to_string()
            }
        }
    }
}

/// Result type alias for Solace operations
pub type Result<T> = std::result::Result<T, SolaceError>;
