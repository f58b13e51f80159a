//! Voice input controller
//!
//! Wraps the platform recognition capability in an `Idle -> Listening -> Idle`
//! state machine that produces finalized transcripts. Platform callbacks
//! arrive as tagged [`RecognitionSignal`]s and are folded into the machine by
//! a single dispatcher, so the whole thing is testable without a browser.

use crate::config::Timings;
use crate::error::{RecognitionError, Result, SolaceError};
use crate::platform::{RecognitionLink, RecognitionSignal};
use std::time::Instant;
use tracing::{debug, warn};

/// Voice capture state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputState {
    /// No capture in progress
    #[default]
    Idle,
    /// A recognition session is open and capturing audio
    Listening,
}

impl InputState {
    pub fn is_listening(&self) -> bool {
        matches!(self, InputState::Listening)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InputState::Idle)
    }
}

impl std::fmt::Display for InputState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputState::Idle => write!(f, "Idle"),
            InputState::Listening => write!(f, "Listening"),
        }
    }
}

/// A finalized transcript held back for the submission debounce.
#[derive(Clone, Debug)]
struct PendingTranscript {
    text: String,
    due: Instant,
}

/// State machine over the platform speech recognition capability.
///
/// At most one recognition session is open at a time; `start()` while already
/// listening is a no-op. Every terminal signal returns the controller to
/// `Idle` regardless of outcome.
pub struct VoiceInputController {
    link: Option<RecognitionLink>,
    state: InputState,
    timings: Timings,
    pending: Option<PendingTranscript>,
    last_error: Option<SolaceError>,
}

impl VoiceInputController {
    pub fn new(link: Option<RecognitionLink>, timings: Timings) -> Self {
        Self {
            link,
            state: InputState::Idle,
            timings,
            pending: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state.is_listening()
    }

    /// Open a recognition session.
    ///
    /// Fails with `CapabilityUnavailable` when recognition is absent and with
    /// `Busy` while the session owns the turn. Clears any previously pending
    /// transcript so the visible input starts fresh.
    pub fn start(&mut self, session_busy: bool, now: Instant) -> Result<()> {
        let _ = now;
        if self.link.is_none() {
            return Err(SolaceError::CapabilityUnavailable("Speech Recognition"));
        }
        if self.state.is_listening() {
            debug!("start() while listening, ignoring");
            return Ok(());
        }
        if session_busy {
            return Err(SolaceError::Busy);
        }

        self.pending = None;
        self.last_error = None;
        if let Some(link) = self.link.as_mut() {
            link.port.start()?;
        }
        self.state = InputState::Listening;
        debug!("recognition started");
        Ok(())
    }

    /// Request a graceful stop.
    ///
    /// The state resets to `Idle` on the request itself, so the controller
    /// cannot stay stuck listening if the platform never fires a completion
    /// event.
    pub fn stop(&mut self) {
        if !self.state.is_listening() {
            return;
        }
        if let Some(link) = self.link.as_mut() {
            link.port.stop();
        }
        self.state = InputState::Idle;
        debug!("recognition stop requested");
    }

    /// Drain platform signals into the dispatcher.
    pub fn pump(&mut self, now: Instant) {
        let signals: Vec<RecognitionSignal> = match self.link.as_ref() {
            Some(link) => link.signals.try_iter().collect(),
            None => return,
        };
        for signal in signals {
            self.dispatch(signal, now);
        }
    }

    /// Fold one tagged platform signal into the state machine.
    pub fn dispatch(&mut self, signal: RecognitionSignal, now: Instant) {
        match signal {
            RecognitionSignal::Transcript(raw) => {
                let transcript = raw.trim();
                if transcript.is_empty() {
                    warn!("empty transcript, ignoring");
                    return;
                }
                debug!(%transcript, "speech recognized");
                // Held back briefly so the visible input can refresh before
                // the session submits it.
                self.pending = Some(PendingTranscript {
                    text: transcript.to_string(),
                    due: now + self.timings.submit_debounce,
                });
            }
            RecognitionSignal::Error(code) => {
                let kind = RecognitionError::from_code(&code);
                warn!(%code, ?kind, "recognition error");
                self.last_error = Some(SolaceError::Recognition(kind));
                self.state = InputState::Idle;
            }
            RecognitionSignal::Ended => {
                self.state = InputState::Idle;
            }
        }
    }

    /// The transcript most recently captured, visible before it submits.
    pub fn draft(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.text.as_str())
    }

    /// Drop a transcript still waiting out its debounce. Used when another
    /// turn claims the session before the transcript submits.
    pub fn discard_draft(&mut self) {
        if self.pending.take().is_some() {
            debug!("pending transcript discarded");
        }
    }

    /// Take the pending transcript once its debounce has elapsed.
    pub fn take_due_transcript(&mut self, now: Instant) -> Option<String> {
        if self.pending.as_ref().is_some_and(|p| now >= p.due) {
            self.pending.take().map(|p| p.text)
        } else {
            None
        }
    }

    /// Take the last recognition error, if any.
    pub fn take_error(&mut self) -> Option<SolaceError> {
        self.last_error.take()
    }
}
