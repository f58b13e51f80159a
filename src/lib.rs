//! Solace - Conversational core for a voice-interactive wellness companion
//!
//! This crate provides the engine behind a mental-wellness chat companion:
//! turn arbitration over an append-only message log, voice input and output
//! state machines over pluggable platform speech capabilities, and a worker
//! that exchanges questions with a remote answer service.

pub mod backend;
pub mod capability;
pub mod config;
pub mod content;
pub mod error;
pub mod format;
pub mod input;
pub mod output;
pub mod platform;
pub mod session;

// Re-export error types
pub use error::{RecognitionError, Result, SolaceError, SynthesisError};

// Re-export session types
pub use session::{ConversationSession, Message, MessageGroup, Owner, SessionSnapshot};

// Re-export platform types
pub use platform::{
    Platform, RecognitionLink, RecognitionPort, RecognitionSignal, SynthesisLink, SynthesisPort,
    SynthesisSignal, UtteranceRequest, VoiceInfo,
};

// Re-export the timing configuration
pub use config::Timings;
