//! Voice output controller
//!
//! Wraps the platform synthesis capability in an `Idle -> Speaking -> Idle`
//! state machine with a transient `Cancelling` sub-phase. A new speak request
//! always supersedes the in-flight utterance: the old one is cancelled at the
//! platform level and the new one starts only after a settling delay, which
//! keeps two audio streams from ever overlapping and keeps the platform's
//! "interrupted" noise out of the user's face.
//!
//! Deferred work (the pause-then-cancel step, the settling delay, the start
//! watchdog, the intentional-cancel flag hold) is modeled as deadlines
//! checked in [`VoiceOutputController::poll`], never as blocking waits.

use crate::capability::SharedVoices;
use crate::config::Timings;
use crate::error::{SolaceError, SynthesisError};
use crate::platform::{SynthesisLink, SynthesisSignal, UtteranceRequest, VoiceInfo};
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Spoken playback state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputState {
    /// Nothing playing, nothing pending
    #[default]
    Idle,
    /// An utterance has been handed to the platform
    Speaking,
    /// Pause issued, platform cancel due shortly
    Cancelling,
}

impl OutputState {
    pub fn is_speaking(&self) -> bool {
        matches!(self, OutputState::Speaking)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, OutputState::Idle)
    }
}

impl std::fmt::Display for OutputState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputState::Idle => write!(f, "Idle"),
            OutputState::Speaking => write!(f, "Speaking"),
            OutputState::Cancelling => write!(f, "Cancelling"),
        }
    }
}

/// A speak request waiting out the settling delay.
#[derive(Clone, Debug)]
struct PendingUtterance {
    text: String,
    start_at: Instant,
}

/// State machine over the platform speech synthesis capability.
pub struct VoiceOutputController {
    link: Option<SynthesisLink>,
    voices: SharedVoices,
    timings: Timings,
    state: OutputState,
    /// The single in-flight utterance reference; at most one live at a time
    current: Option<Uuid>,
    /// Whether the platform confirmed the current utterance actually started
    start_confirmed: bool,
    watchdog: Option<Instant>,
    pending: Option<PendingUtterance>,
    cancel_due: Option<Instant>,
    /// While set, every error callback is treated as benign
    intentional_cancel: bool,
    cancel_flag_clear_at: Option<Instant>,
    last_error: Option<SolaceError>,
}

impl VoiceOutputController {
    /// Build the controller around an optional synthesis link.
    ///
    /// The voice catalog is owned by the capability probe and injected here;
    /// the controller only reads it when selecting a voice.
    pub fn new(link: Option<SynthesisLink>, voices: SharedVoices, timings: Timings) -> Self {
        Self {
            link,
            voices,
            timings,
            state: OutputState::Idle,
            current: None,
            start_confirmed: false,
            watchdog: None,
            pending: None,
            cancel_due: None,
            intentional_cancel: false,
            cancel_flag_clear_at: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> OutputState {
        self.state
    }

    pub fn is_speaking(&self) -> bool {
        self.state.is_speaking()
    }

    /// Whether the controller holds the turn in any form (playing, settling,
    /// or waiting to start).
    pub fn is_active(&self) -> bool {
        !self.state.is_idle() || self.pending.is_some()
    }

    /// Kick off voice enumeration. Called once at session start.
    pub fn begin_voice_load(&mut self, now: Instant) {
        if let Some(link) = self.link.as_ref() {
            self.voices
                .write()
                .begin_load(link.port.as_ref(), now, self.timings.voice_load_timeout);
        }
    }

    /// Request spoken playback of `text`.
    ///
    /// Supersedes any in-flight utterance: that one is cancelled first and
    /// the new one starts only after the settling delay has passed.
    pub fn speak(&mut self, text: &str, now: Instant) -> crate::error::Result<()> {
        if self.link.is_none() {
            return Err(SolaceError::CapabilityUnavailable("Text-to-Speech"));
        }
        if text.trim().is_empty() {
            return Err(SolaceError::EmptyInput);
        }

        self.cancel(now);
        self.pending = Some(PendingUtterance {
            text: text.to_string(),
            start_at: now + self.timings.pre_speak_delay,
        });
        debug!("speak queued behind settling delay");
        Ok(())
    }

    /// Cancel whatever is playing or about to play. Idempotent.
    ///
    /// Sets the intentional-cancel flag before touching the platform, pauses,
    /// and defers the platform cancel briefly; the flag stays up long enough
    /// to cover trailing error callbacks attributable to this cancellation.
    pub fn cancel(&mut self, now: Instant) {
        self.pending = None;

        if self.state.is_idle() && self.current.is_none() {
            return;
        }

        self.intentional_cancel = true;
        self.cancel_flag_clear_at =
            Some(now + self.timings.cancel_pause_delay + self.timings.cancel_flag_hold);
        if let Some(link) = self.link.as_mut() {
            link.port.pause();
        }
        self.state = OutputState::Cancelling;
        self.cancel_due = Some(now + self.timings.cancel_pause_delay);
        debug!("cancel requested, platform cancel deferred");
    }

    /// Drain platform signals into the dispatcher.
    pub fn pump(&mut self, now: Instant) {
        let signals: Vec<SynthesisSignal> = match self.link.as_ref() {
            Some(link) => link.signals.try_iter().collect(),
            None => return,
        };
        for signal in signals {
            self.dispatch(signal, now);
        }
    }

    /// Fold one tagged platform signal into the state machine.
    ///
    /// Terminal signals from an utterance that is no longer current are
    /// stale by definition (it was superseded or cancelled) and are dropped.
    pub fn dispatch(&mut self, signal: SynthesisSignal, now: Instant) {
        let _ = now;
        match signal {
            SynthesisSignal::Started(id) => {
                if self.current != Some(id) {
                    return;
                }
                debug!(%id, "speech started");
                self.start_confirmed = true;
                self.watchdog = None;
            }
            SynthesisSignal::Ended(id) => {
                if self.current != Some(id) {
                    debug!(%id, "stale end signal, ignoring");
                    return;
                }
                debug!(%id, "speech ended normally");
                self.current = None;
                self.start_confirmed = false;
                self.watchdog = None;
                if self.state.is_speaking() {
                    self.state = OutputState::Idle;
                }
            }
            SynthesisSignal::Error { id, code } => {
                if self.current != Some(id) {
                    debug!(%id, %code, "stale error signal, ignoring");
                    return;
                }
                // Interrupted/canceled codes are always benign, as is any
                // error that lands while our own cancel is in flight.
                let benign =
                    code == "interrupted" || code == "canceled" || self.intentional_cancel;
                self.current = None;
                self.start_confirmed = false;
                self.watchdog = None;
                if benign {
                    debug!(%code, "suppressing benign synthesis interruption");
                    if self.state.is_speaking() {
                        self.state = OutputState::Idle;
                    }
                } else {
                    let kind = match code.as_str() {
                        "network" => SynthesisError::NetworkError,
                        other => SynthesisError::Other(other.to_string()),
                    };
                    warn!(%code, ?kind, "synthesis error");
                    self.last_error = Some(SolaceError::Synthesis(kind));
                    self.state = OutputState::Idle;
                }
            }
            SynthesisSignal::VoicesChanged => {
                if let Some(link) = self.link.as_ref() {
                    self.voices.write().on_voices_changed(link.port.as_ref());
                }
            }
        }
    }

    /// Advance every deferred continuation whose deadline has passed.
    pub fn poll(&mut self, now: Instant) {
        let Some(link) = self.link.as_mut() else {
            return;
        };

        // Voice enumeration fallback
        self.voices.write().poll(link.port.as_ref(), now);

        // Deferred platform cancel after the pause
        if self.cancel_due.is_some_and(|due| now >= due) {
            self.cancel_due = None;
            link.port.cancel();
            self.current = None;
            self.start_confirmed = false;
            self.watchdog = None;
            if self.state == OutputState::Cancelling {
                self.state = OutputState::Idle;
            }
            debug!("platform cancel issued");
        }

        // Intentional-cancel flag hold expiry
        if self.cancel_flag_clear_at.is_some_and(|at| now >= at) {
            self.cancel_flag_clear_at = None;
            self.intentional_cancel = false;
        }

        // Settled pending utterance
        let pending_due =
            self.state.is_idle() && self.pending.as_ref().is_some_and(|p| now >= p.start_at);
        if let Some(pending) = self.pending.take_if(|_| pending_due) {
            let voice = select_voice(&self.voices.snapshot()).cloned();
            let utterance = UtteranceRequest::new(pending.text, voice);
            match link.port.speak(&utterance) {
                Ok(()) => {
                    self.current = Some(utterance.id);
                    self.start_confirmed = false;
                    self.state = OutputState::Speaking;
                    // A zero watchdog would fire in this very poll, before
                    // any start confirmation could possibly arrive
                    self.watchdog = if self.timings.speak_watchdog.is_zero() {
                        None
                    } else {
                        Some(now + self.timings.speak_watchdog)
                    };
                    debug!(id = %utterance.id, "utterance issued");
                }
                Err(err) => {
                    warn!(%err, "platform rejected utterance");
                    self.last_error = Some(SolaceError::Synthesis(SynthesisError::FailedToStart));
                }
            }
        }

        // Start watchdog: the platform silently dropped the request
        if self.state.is_speaking()
            && !self.start_confirmed
            && self.watchdog.is_some_and(|at| now >= at)
            && !link.port.is_speaking()
        {
            warn!("speech never started, forcing idle");
            self.watchdog = None;
            self.current = None;
            self.state = OutputState::Idle;
            self.last_error = Some(SolaceError::Synthesis(SynthesisError::FailedToStart));
        }
    }

    /// Take the last non-suppressed synthesis error, if any.
    pub fn take_error(&mut self) -> Option<SolaceError> {
        self.last_error.take()
    }

    #[cfg(test)]
    fn intentional_cancel(&self) -> bool {
        self.intentional_cancel
    }
}

/// Pick the best available voice by a deterministic priority order.
///
/// English premium-quality female first, then any English female, then any
/// English, then the first voice the platform has; `None` means speak with
/// the platform default.
pub fn select_voice(voices: &[VoiceInfo]) -> Option<&VoiceInfo> {
    let premium = voices.iter().find(|v| {
        v.name.contains("Female")
            && v.is_english()
            && (v.name.contains("Natural")
                || v.name.contains("Premium")
                || v.name.contains("Wavenet"))
    });
    premium
        .or_else(|| {
            voices
                .iter()
                .find(|v| v.name.contains("Female") && v.is_english())
        })
        .or_else(|| voices.iter().find(|v| v.is_english()))
        .or_else(|| voices.first())
}
