//! Conversation session
//!
//! The single source of truth for the message log and for turn ownership:
//! at any instant at most one of {listening, pending answer request,
//! speaking} is active, and the session is the only component that cancels
//! one on behalf of another.
//!
//! The session is cooperative and single-threaded: the embedder calls
//! [`ConversationSession::pump`] from its event loop and everything else is
//! state transitions. The only real thread is the answer worker, whose
//! results re-enter through a channel.

use crate::backend::{AnswerBackend, AnswerEvent, AnswerExchange};
use crate::capability::{CapabilityFlags, SharedVoices};
use crate::config::Timings;
use crate::error::{Result, SolaceError};
use crate::format;
use crate::input::VoiceInputController;
use crate::output::VoiceOutputController;
use crate::platform::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    User,
    Assistant,
}

/// One chat message. Immutable once appended; the log is append-only for
/// the lifetime of the session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub owner: Owner,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(owner: Owner, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A maximal run of consecutive messages from the same owner. Derived view,
/// never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageGroup {
    pub owner: Owner,
    pub texts: Vec<String>,
}

/// Project the log into maximal same-owner runs. Pure function of the log.
pub fn group_messages(messages: &[Message]) -> Vec<MessageGroup> {
    let mut groups: Vec<MessageGroup> = Vec::new();
    for message in messages {
        match groups.last_mut() {
            Some(group) if group.owner == message.owner => {
                group.texts.push(message.text.clone());
            }
            _ => groups.push(MessageGroup {
                owner: message.owner,
                texts: vec![message.text.clone()],
            }),
        }
    }
    groups
}

/// An error currently shown to the user.
#[derive(Clone, Debug)]
struct SurfacedError {
    text: String,
    /// When the error was surfaced; it must stay observable for at least
    /// one pump even with a zero dismiss delay
    surfaced_at: Instant,
    /// `None` means the error persists until manual dismissal
    dismiss_at: Option<Instant>,
}

/// Read-only view for the rendering layer.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub groups: Vec<MessageGroup>,
    pub busy: bool,
    pub listening: bool,
    pub speaking: bool,
    pub draft: String,
    pub error: Option<String>,
    pub voices_loaded: bool,
}

/// Owner of the message log and arbiter of the conversational turn.
pub struct ConversationSession {
    flags: CapabilityFlags,
    voices: SharedVoices,
    timings: Timings,
    messages: Vec<Message>,
    busy: bool,
    draft: String,
    input: VoiceInputController,
    output: VoiceOutputController,
    exchange: AnswerExchange,
    worker: Option<JoinHandle<()>>,
    error: Option<SurfacedError>,
}

impl ConversationSession {
    /// Probe the platform, start the answer worker, and wire both voice
    /// controllers. `now` anchors the voice-load fallback deadline.
    pub fn new<B: AnswerBackend + 'static>(
        mut platform: Platform,
        backend: B,
        timings: Timings,
        now: Instant,
    ) -> Self {
        let flags = CapabilityFlags::detect(&platform);
        let voices = SharedVoices::new();
        let input = VoiceInputController::new(platform.recognition.take(), timings);
        let mut output =
            VoiceOutputController::new(platform.synthesis.take(), voices.clone(), timings);
        output.begin_voice_load(now);

        let (exchange, worker) = AnswerExchange::new(backend);
        let worker = Some(worker.start());
        info!(
            recognition = flags.has_recognition,
            synthesis = flags.has_synthesis,
            "conversation session started"
        );

        Self {
            flags,
            voices,
            timings,
            messages: Vec::new(),
            busy: false,
            draft: String::new(),
            input,
            output,
            exchange,
            worker,
            error: None,
        }
    }

    /// Submit one user turn. Typed input and finalized voice transcripts
    /// both land here, so turn semantics are identical for either modality.
    ///
    /// Rejects blank text with `EmptyInput` and re-entry with `Busy`. A new
    /// user turn always interrupts assistant speech and any open capture.
    pub fn submit(&mut self, text: &str, now: Instant) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            let err = SolaceError::EmptyInput;
            self.error = Some(SurfacedError {
                text: err.user_message(),
                surfaced_at: now,
                dismiss_at: None,
            });
            return Err(err);
        }
        if self.busy {
            return Err(SolaceError::Busy);
        }

        // Claim the turn: silence the assistant, close any open capture,
        // and drop a transcript still waiting out its debounce
        self.output.cancel(now);
        self.input.stop();
        self.input.discard_draft();
        self.error = None;

        self.messages.push(Message::new(Owner::User, trimmed));
        self.draft.clear();
        self.busy = true;
        debug!("user turn submitted");

        if let Err(err) = self.exchange.ask(trimmed.to_string()) {
            self.busy = false;
            self.error = Some(SurfacedError {
                text: err.user_message(),
                surfaced_at: now,
                dismiss_at: None,
            });
            return Err(err);
        }
        Ok(())
    }

    /// Open a voice capture. Fails when recognition is absent or another
    /// turn activity owns the session.
    pub fn start_listening(&mut self, now: Instant) -> Result<()> {
        let owned_elsewhere = self.busy || self.output.is_active();
        self.input.start(owned_elsewhere, now)
    }

    /// Gracefully stop an open capture.
    pub fn stop_listening(&mut self) {
        self.input.stop();
    }

    /// Read the last assistant answer aloud, or stop the current playback
    /// if one is running. A no-op when there is no assistant answer yet.
    ///
    /// Refused while a voice capture is open; listening and speaking are
    /// never active at the same time.
    pub fn request_speak_last_answer(&mut self, now: Instant) -> Result<()> {
        if self.output.is_speaking() {
            self.output.cancel(now);
            return Ok(());
        }
        if self.busy || self.input.is_listening() {
            return Err(SolaceError::Busy);
        }
        match self.messages.last() {
            Some(message) if message.owner == Owner::Assistant => {
                let text = format::speakable_text(&message.text);
                self.output.speak(&text, now)
            }
            _ => {
                debug!("no assistant answer to speak");
                Ok(())
            }
        }
    }

    /// Stop spoken playback.
    pub fn stop_speaking(&mut self, now: Instant) {
        self.output.cancel(now);
    }

    /// Drive every deferred continuation and drain all channels. Call this
    /// from the embedding event loop.
    pub fn pump(&mut self, now: Instant) {
        // Recognition signals first; a due transcript converges on submit()
        self.input.pump(now);
        if let Some(transcript) = self.input.take_due_transcript(now) {
            self.draft = transcript.clone();
            // Busy cannot happen here (capture is refused while busy), but
            // submit re-checks; a refused transcript never lingers as a
            // draft that will not send
            if self.submit(&transcript, now).is_err() {
                self.draft.clear();
            }
        }
        if let Some(err) = self.input.take_error() {
            self.surface(err, now);
        }

        // Outcomes of the answer exchange
        while let Some(event) = self.exchange.try_recv_event() {
            match event {
                AnswerEvent::Answered(answer) => {
                    debug!("assistant answer received");
                    self.messages.push(Message::new(Owner::Assistant, answer));
                    self.busy = false;
                }
                AnswerEvent::Failed(text) => {
                    // The user message stays in the log; no assistant reply
                    // is appended and the error persists until dismissed
                    self.error = Some(SurfacedError {
                        text,
                        surfaced_at: now,
                        dismiss_at: None,
                    });
                    self.busy = false;
                }
                AnswerEvent::Shutdown => {}
            }
        }

        // Synthesis signals and deferred output work
        self.output.pump(now);
        self.output.poll(now);
        if let Some(err) = self.output.take_error() {
            self.surface(err, now);
        }

        // Expire auto-dismissing errors, but never one surfaced in this
        // very pump; it has to be observable at least once
        if self.error.as_ref().is_some_and(|e| {
            e.dismiss_at.is_some_and(|at| now >= at) && now > e.surfaced_at
        }) {
            self.error = None;
        }
    }

    fn surface(&mut self, err: SolaceError, now: Instant) {
        let text = err.user_message();
        if text.is_empty() {
            return;
        }
        // Speech errors are transient and clear themselves; everything else
        // waits for the user
        let dismiss_at = match err {
            SolaceError::Recognition(_) | SolaceError::Synthesis(_) => {
                Some(now + self.timings.error_auto_dismiss)
            }
            _ => None,
        };
        self.error = Some(SurfacedError {
            text,
            surfaced_at: now,
            dismiss_at,
        });
    }

    /// Manually dismiss the surfaced error.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // === Read surface ===

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Grouped projection of the log, recomputed on every read.
    pub fn groups(&self) -> Vec<MessageGroup> {
        group_messages(&self.messages)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_listening(&self) -> bool {
        self.input.is_listening()
    }

    pub fn is_speaking(&self) -> bool {
        self.output.is_speaking()
    }

    pub fn capabilities(&self) -> CapabilityFlags {
        self.flags
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.text.as_str())
    }

    /// Snapshot for the rendering layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            groups: self.groups(),
            busy: self.busy,
            listening: self.is_listening(),
            speaking: self.is_speaking(),
            draft: self.draft.clone(),
            error: self.error.as_ref().map(|e| e.text.clone()),
            voices_loaded: self.voices.loaded(),
        }
    }

    /// Shut the answer worker down and wait for it.
    pub fn shutdown(&mut self) {
        let _ = self.exchange.shutdown();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        // Best effort; no join here so a slow exchange cannot block drop
        let _ = self.exchange.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognitionError;
    use crate::platform::{
        signal_channel, RecognitionLink, RecognitionPort, RecognitionSignal, SynthesisLink,
        SynthesisPort, SynthesisSignal, UtteranceRequest, VoiceInfo,
    };
    use crossbeam_channel::Sender;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct ScriptedBackend {
        script: std::result::Result<String, String>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedBackend {
        fn answering(answer: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    script: Ok(answer.to_string()),
                    delay: Duration::ZERO,
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn failing(message: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    script: Err(message.to_string()),
                    delay: Duration::ZERO,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl AnswerBackend for ScriptedBackend {
        fn ask(&self, _question: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            self.script.clone().map_err(SolaceError::Backend)
        }
    }

    struct StubRecognition;

    impl RecognitionPort for StubRecognition {
        fn start(&mut self) -> Result<()> {
            Ok(())
        }
        fn stop(&mut self) {}
    }

    struct StubSynthesis {
        spoken: Arc<Mutex<Vec<String>>>,
        cancels: Arc<AtomicUsize>,
    }

    impl SynthesisPort for StubSynthesis {
        fn speak(&mut self, utterance: &UtteranceRequest) -> Result<()> {
            self.spoken.lock().push(utterance.text.clone());
            Ok(())
        }
        fn pause(&mut self) {}
        fn cancel(&mut self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
        fn voices(&self) -> Vec<VoiceInfo> {
            vec![VoiceInfo::new("Google UK English Female", "en-GB")]
        }
        fn is_speaking(&self) -> bool {
            false
        }
    }

    struct VoicePlatform {
        platform: Platform,
        recognition_tx: Sender<RecognitionSignal>,
        #[allow(dead_code)]
        synthesis_tx: Sender<SynthesisSignal>,
        spoken: Arc<Mutex<Vec<String>>>,
    }

    fn voice_platform() -> VoicePlatform {
        let (recognition_tx, recognition_rx) = signal_channel();
        let (synthesis_tx, synthesis_rx) = signal_channel();
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let platform = Platform {
            recognition: Some(RecognitionLink::new(Box::new(StubRecognition), recognition_rx)),
            synthesis: Some(SynthesisLink::new(
                Box::new(StubSynthesis {
                    spoken: spoken.clone(),
                    cancels: Arc::new(AtomicUsize::new(0)),
                }),
                synthesis_rx,
            )),
        };
        VoicePlatform {
            platform,
            recognition_tx,
            synthesis_tx,
            spoken,
        }
    }

    /// Pump until the outstanding exchange settles or the deadline passes.
    fn settle(session: &mut ConversationSession) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            session.pump(Instant::now());
            if !session.is_busy() || Instant::now() > deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_blank_submit_is_rejected_locally() {
        let (backend, calls) = ScriptedBackend::answering("unused");
        let mut session = ConversationSession::new(
            Platform::headless(),
            backend,
            Timings::immediate(),
            Instant::now(),
        );

        assert_eq!(
            session.submit("  ", Instant::now()),
            Err(SolaceError::EmptyInput)
        );
        assert!(session.messages().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(session.error_message().is_some());
        session.shutdown();
    }

    #[test]
    fn test_successful_turn_appends_user_then_assistant() {
        let (backend, _calls) = ScriptedBackend::answering("Try breathing slowly.");
        let mut session = ConversationSession::new(
            Platform::headless(),
            backend,
            Timings::immediate(),
            Instant::now(),
        );

        session.submit("I feel anxious", Instant::now()).unwrap();
        assert!(session.is_busy());
        settle(&mut session);

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].owner, Owner::User);
        assert_eq!(messages[0].text, "I feel anxious");
        assert_eq!(messages[1].owner, Owner::Assistant);
        assert_eq!(messages[1].text, "Try breathing slowly.");
        assert!(!session.is_busy());
        session.shutdown();
    }

    #[test]
    fn test_submit_while_busy_is_a_no_op() {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = ScriptedBackend {
            script: Ok("answer".to_string()),
            delay: Duration::from_millis(50),
            calls: calls.clone(),
        };
        let mut session = ConversationSession::new(
            Platform::headless(),
            backend,
            Timings::immediate(),
            Instant::now(),
        );

        session.submit("first", Instant::now()).unwrap();
        assert_eq!(
            session.submit("second", Instant::now()),
            Err(SolaceError::Busy)
        );
        // Only the first user message is in the log
        assert_eq!(session.messages().len(), 1);

        settle(&mut session);
        assert_eq!(session.messages().len(), 2);
        // No second exchange was issued
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        session.shutdown();
    }

    #[test]
    fn test_backend_failure_keeps_user_message_and_surfaces_error() {
        let (backend, _calls) = ScriptedBackend::failing("unavailable");
        let mut session = ConversationSession::new(
            Platform::headless(),
            backend,
            Timings::immediate(),
            Instant::now(),
        );

        let _ = session.submit("help me", Instant::now());
        settle(&mut session);

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].owner, Owner::User);
        assert_eq!(session.error_message(), Some("unavailable"));

        // Backend errors persist until manual dismissal
        session.pump(Instant::now() + Duration::from_secs(60));
        assert_eq!(session.error_message(), Some("unavailable"));
        session.dismiss_error();
        assert!(session.error_message().is_none());
        session.shutdown();
    }

    #[test]
    fn test_grouping_of_same_owner_runs() {
        let messages = vec![
            Message::new(Owner::User, "a"),
            Message::new(Owner::User, "b"),
            Message::new(Owner::Assistant, "c"),
        ];
        let groups = group_messages(&messages);
        assert_eq!(
            groups,
            vec![
                MessageGroup {
                    owner: Owner::User,
                    texts: vec!["a".to_string(), "b".to_string()],
                },
                MessageGroup {
                    owner: Owner::Assistant,
                    texts: vec!["c".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_voice_transcript_converges_on_submit() {
        let vp = voice_platform();
        let (backend, _calls) = ScriptedBackend::answering("I hear you.");
        let t0 = Instant::now();
        let mut session =
            ConversationSession::new(vp.platform, backend, Timings::immediate(), t0);

        session.start_listening(t0).unwrap();
        assert!(session.is_listening());

        vp.recognition_tx
            .send(RecognitionSignal::Transcript("I feel alone".into()))
            .unwrap();
        vp.recognition_tx.send(RecognitionSignal::Ended).unwrap();
        settle(&mut session);

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "I feel alone");
        assert!(!session.is_listening());
        session.shutdown();
    }

    #[test]
    fn test_listening_refused_while_busy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = ScriptedBackend {
            script: Ok("answer".to_string()),
            delay: Duration::from_millis(50),
            calls,
        };
        let vp = voice_platform();
        let t0 = Instant::now();
        let mut session =
            ConversationSession::new(vp.platform, backend, Timings::immediate(), t0);

        session.submit("hello", t0).unwrap();
        assert_eq!(session.start_listening(t0), Err(SolaceError::Busy));
        settle(&mut session);
        session.shutdown();
    }

    #[test]
    fn test_speak_refused_while_listening() {
        let vp = voice_platform();
        let (backend, _calls) = ScriptedBackend::answering("answer");
        let t0 = Instant::now();
        let mut session =
            ConversationSession::new(vp.platform, backend, Timings::immediate(), t0);

        session.submit("hi", t0).unwrap();
        settle(&mut session);
        session.start_listening(Instant::now()).unwrap();

        let now = Instant::now();
        assert_eq!(
            session.request_speak_last_answer(now),
            Err(SolaceError::Busy)
        );
        session.pump(now);

        // Capture keeps the turn; nothing reaches the synthesis port
        assert!(session.is_listening());
        assert!(!session.is_speaking());
        assert!(vp.spoken.lock().is_empty());
        session.shutdown();
    }

    #[test]
    fn test_typed_turn_discards_pending_transcript() {
        let vp = voice_platform();
        let (backend, calls) = ScriptedBackend::answering("answer");
        let timings =
            Timings::immediate().with_submit_debounce(Duration::from_millis(100));
        let t0 = Instant::now();
        let mut session = ConversationSession::new(vp.platform, backend, timings, t0);

        session.start_listening(t0).unwrap();
        vp.recognition_tx
            .send(RecognitionSignal::Transcript("spoken words".into()))
            .unwrap();
        vp.recognition_tx.send(RecognitionSignal::Ended).unwrap();
        // Transcript is now held back by its debounce
        session.pump(t0);

        session.submit("typed words", t0).unwrap();
        settle(&mut session);

        // Past the debounce the discarded transcript must not submit
        session.pump(t0 + Duration::from_millis(200));
        settle(&mut session);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "typed words");
        assert!(session.draft().is_empty());
        session.shutdown();
    }

    #[test]
    fn test_zero_dismiss_error_survives_surfacing_pump() {
        let vp = voice_platform();
        let (backend, _calls) = ScriptedBackend::answering("unused");
        let t0 = Instant::now();
        let mut session =
            ConversationSession::new(vp.platform, backend, Timings::immediate(), t0);

        session.start_listening(t0).unwrap();
        vp.recognition_tx
            .send(RecognitionSignal::Error("no-speech".into()))
            .unwrap();
        session.pump(t0);

        // Observable in the pump that surfaced it, even with a zero delay
        assert!(session.error_message().is_some());
        session.pump(t0 + Duration::from_millis(1));
        assert!(session.error_message().is_none());
        session.shutdown();
    }

    #[test]
    fn test_listening_without_capability_fails() {
        let (backend, _calls) = ScriptedBackend::answering("unused");
        let mut session = ConversationSession::new(
            Platform::headless(),
            backend,
            Timings::immediate(),
            Instant::now(),
        );
        assert_eq!(
            session.start_listening(Instant::now()),
            Err(SolaceError::CapabilityUnavailable("Speech Recognition"))
        );
        session.shutdown();
    }

    #[test]
    fn test_speak_last_answer_reads_plain_text() {
        let vp = voice_platform();
        let (backend, _calls) = ScriptedBackend::answering("Try **box breathing**.");
        let t0 = Instant::now();
        let mut session =
            ConversationSession::new(vp.platform, backend, Timings::immediate(), t0);

        session.submit("I feel anxious", t0).unwrap();
        settle(&mut session);

        let now = Instant::now();
        session.request_speak_last_answer(now).unwrap();
        session.pump(now);
        assert!(session.is_speaking());
        assert_eq!(vp.spoken.lock().as_slice(), ["Try box breathing."]);
        session.shutdown();
    }

    #[test]
    fn test_speak_with_no_answer_is_a_no_op() {
        let vp = voice_platform();
        let (backend, _calls) = ScriptedBackend::answering("unused");
        let t0 = Instant::now();
        let mut session =
            ConversationSession::new(vp.platform, backend, Timings::immediate(), t0);

        session.request_speak_last_answer(t0).unwrap();
        session.pump(t0);
        assert!(!session.is_speaking());
        assert!(vp.spoken.lock().is_empty());
        session.shutdown();
    }

    #[test]
    fn test_new_turn_interrupts_assistant_speech() {
        let vp = voice_platform();
        let (backend, _calls) = ScriptedBackend::answering("answer");
        let t0 = Instant::now();
        let mut session =
            ConversationSession::new(vp.platform, backend, Timings::immediate(), t0);

        session.submit("first", t0).unwrap();
        settle(&mut session);
        let now = Instant::now();
        session.request_speak_last_answer(now).unwrap();
        session.pump(now);
        assert!(session.is_speaking());

        // A new user turn claims the session and silences playback
        session.submit("second", Instant::now()).unwrap();
        session.pump(Instant::now());
        assert!(!session.is_speaking());
        settle(&mut session);
        session.shutdown();
    }

    #[test]
    fn test_recognition_error_auto_dismisses() {
        let vp = voice_platform();
        let (backend, _calls) = ScriptedBackend::answering("unused");
        let timings = Timings::immediate().with_error_auto_dismiss(Duration::from_secs(3));
        let t0 = Instant::now();
        let mut session = ConversationSession::new(vp.platform, backend, timings, t0);

        session.start_listening(t0).unwrap();
        vp.recognition_tx
            .send(RecognitionSignal::Error("no-speech".into()))
            .unwrap();
        session.pump(t0);

        assert!(!session.is_listening());
        let msg = session.error_message().unwrap().to_string();
        assert_eq!(
            msg,
            SolaceError::Recognition(RecognitionError::NoSpeechDetected).user_message()
        );
        assert!(session.messages().is_empty());

        session.pump(t0 + Duration::from_secs(3));
        assert!(session.error_message().is_none());
        session.shutdown();
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let (backend, _calls) = ScriptedBackend::answering("hello there");
        let mut session = ConversationSession::new(
            Platform::headless(),
            backend,
            Timings::immediate(),
            Instant::now(),
        );
        session.submit("hi", Instant::now()).unwrap();
        settle(&mut session);

        let snap = session.snapshot();
        assert!(!snap.busy);
        assert!(!snap.listening);
        assert!(!snap.speaking);
        assert_eq!(snap.groups.len(), 2);
        assert!(snap.error.is_none());
        session.shutdown();
    }
}
