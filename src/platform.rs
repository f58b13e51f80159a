//! Platform speech capability ports
//!
//! The browser (or any host) plugs in here. Each capability is a command
//! trait paired with a channel of tagged signals: platform callbacks do
//! nothing but forward a signal into the channel, and the controllers turn
//! those signals into state transitions. A capability that does not exist on
//! the platform is simply absent from the [`Platform`] bundle.

use crate::error::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use uuid::Uuid;

/// Buffer size for signal channels
const SIGNAL_BUFFER: usize = 100;

/// One available synthesis voice, as enumerated by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Platform-reported voice name (e.g. "Google UK English Female")
    pub name: String,
    /// BCP-47 language tag (e.g. "en-GB")
    pub lang: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    /// Whether this voice speaks some English variant
    pub fn is_english(&self) -> bool {
        self.lang.contains("en")
    }
}

/// A single request to vocalize one piece of text.
#[derive(Clone, Debug)]
pub struct UtteranceRequest {
    /// Identity of this utterance, for matching terminal signals
    pub id: Uuid,
    /// Text to vocalize
    pub text: String,
    /// Selected voice, or `None` for the platform default
    pub voice: Option<VoiceInfo>,
    /// Speech rate; slightly below 1.0 for clarity
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl UtteranceRequest {
    /// Build an utterance with the fixed rate/pitch/volume defaults.
    pub fn new(text: impl Into<String>, voice: Option<VoiceInfo>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            voice,
            rate: 0.95,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Tagged signals from the speech recognition capability.
#[derive(Clone, Debug)]
pub enum RecognitionSignal {
    /// A finalized transcript for the current capture
    Transcript(String),
    /// A platform error code (`no-speech`, `audio-capture`, `not-allowed`, ...)
    Error(String),
    /// The recognition session ended, with or without a result
    Ended,
}

/// Tagged signals from the speech synthesis capability.
///
/// Terminal signals carry the id of the utterance they belong to, so a late
/// callback from a superseded utterance can never disturb its successor.
#[derive(Clone, Debug)]
pub enum SynthesisSignal {
    /// The platform actually began vocalizing this utterance
    Started(Uuid),
    /// This utterance finished normally
    Ended(Uuid),
    /// A platform error code (`interrupted`, `canceled`, `network`, ...)
    Error { id: Uuid, code: String },
    /// The available voice list changed
    VoicesChanged,
}

/// Control surface of the platform speech recognition capability.
pub trait RecognitionPort: Send {
    /// Open a recognition session. At most one may be open at a time.
    fn start(&mut self) -> Result<()>;
    /// Request a graceful stop of the open session.
    fn stop(&mut self);
}

/// Control surface of the platform speech synthesis capability.
pub trait SynthesisPort: Send {
    /// Hand an utterance to the platform.
    fn speak(&mut self, utterance: &UtteranceRequest) -> Result<()>;
    /// Pause playback; used just before cancelling.
    fn pause(&mut self);
    /// Drop the current utterance and any queued ones.
    fn cancel(&mut self);
    /// Enumerate available voices. May be empty until the platform finishes
    /// loading, in which case a `VoicesChanged` signal follows.
    fn voices(&self) -> Vec<VoiceInfo>;
    /// Whether the platform reports audio currently playing.
    fn is_speaking(&self) -> bool;
}

/// Create a bounded signal channel for a platform adapter.
///
/// The adapter keeps the sender and forwards every platform callback as one
/// tagged signal; the paired receiver goes into the capability link.
pub fn signal_channel<T>() -> (Sender<T>, Receiver<T>) {
    bounded(SIGNAL_BUFFER)
}

/// A recognition port bundled with its signal stream.
pub struct RecognitionLink {
    pub port: Box<dyn RecognitionPort>,
    pub signals: Receiver<RecognitionSignal>,
}

impl RecognitionLink {
    pub fn new(port: Box<dyn RecognitionPort>, signals: Receiver<RecognitionSignal>) -> Self {
        Self { port, signals }
    }
}

/// A synthesis port bundled with its signal stream.
pub struct SynthesisLink {
    pub port: Box<dyn SynthesisPort>,
    pub signals: Receiver<SynthesisSignal>,
}

impl SynthesisLink {
    pub fn new(port: Box<dyn SynthesisPort>, signals: Receiver<SynthesisSignal>) -> Self {
        Self { port, signals }
    }
}

/// The speech capabilities the current environment actually offers.
///
/// Absence is modeled as `None`; everything downstream is polymorphic over
/// presence and degrades to typed-text-only operation.
#[derive(Default)]
pub struct Platform {
    pub recognition: Option<RecognitionLink>,
    pub synthesis: Option<SynthesisLink>,
}

impl Platform {
    /// A platform with neither speech capability (typed chat only).
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn has_recognition(&self) -> bool {
        self.recognition.is_some()
    }

    pub fn has_synthesis(&self) -> bool {
        self.synthesis.is_some()
    }
}
