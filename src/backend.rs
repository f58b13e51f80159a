//! Answer service exchange
//!
//! The session talks to the remote question-answer service through the
//! [`AnswerBackend`] trait; [`HttpAnswerClient`] is the real transport and
//! [`AnswerExchange`]/[`AnswerWorker`] confine the blocking HTTP call to a
//! dedicated worker thread so the session stays responsive while `Busy`.

use crate::error::{Result, SolaceError};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default endpoint of the answer service
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/api/ask";

/// Request body for the answer exchange
#[derive(Debug, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

/// Response body: exactly one of `answer` or `error` is expected.
#[derive(Debug, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One request/response exchange with the remote answer service.
pub trait AnswerBackend: Send {
    /// Ask a free-text question; blocks until the service responds.
    fn ask(&self, question: &str) -> Result<String>;
}

/// HTTP transport for the answer service.
pub struct HttpAnswerClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpAnswerClient {
    /// Create a client against the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Default for HttpAnswerClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl AnswerBackend for HttpAnswerClient {
    fn ask(&self, question: &str) -> Result<String> {
        debug!(endpoint = %self.endpoint, "asking answer service");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { question })
            .send()
            .map_err(|e| SolaceError::Backend(format!("Failed to reach the AI service: {}", e)))?;

        let ok = response.status().is_success();
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| SolaceError::Backend(format!("Failed to read response: {}", e)))?;
        parse_answer_body(ok, status, &body)
    }
}

/// Map an HTTP status and body to an answer or a `BackendError`.
///
/// Non-2xx and malformed JSON both become `BackendError` with the best
/// available message: the `error` field, then `answer`, then a status line.
pub fn parse_answer_body(ok: bool, status: u16, body: &str) -> Result<String> {
    let parsed: std::result::Result<AskResponse, _> = serde_json::from_str(body);
    match parsed {
        Ok(resp) if ok => resp
            .answer
            .ok_or_else(|| SolaceError::Backend("Answer service returned no answer".to_string())),
        Ok(resp) => {
            let message = resp
                .error
                .or(resp.answer)
                .unwrap_or_else(|| format!("HTTP error! Status: {}", status));
            Err(SolaceError::Backend(message))
        }
        Err(_) if ok => Err(SolaceError::Backend(
            "Malformed response from the AI service".to_string(),
        )),
        Err(_) => Err(SolaceError::Backend(format!("HTTP error! Status: {}", status))),
    }
}

/// Commands accepted by the answer worker
#[derive(Debug)]
pub enum AnswerCommand {
    /// Issue one exchange for this question
    Ask(String),
    /// Shut the worker down
    Shutdown,
}

/// Events emitted by the answer worker
#[derive(Clone, Debug)]
pub enum AnswerEvent {
    /// The service answered
    Answered(String),
    /// The exchange failed; carries user-facing text
    Failed(String),
    /// Worker has shut down
    Shutdown,
}

/// Handle for issuing exchanges and receiving their outcomes.
pub struct AnswerExchange {
    command_tx: Sender<AnswerCommand>,
    event_rx: Receiver<AnswerEvent>,
}

impl AnswerExchange {
    /// Create the exchange/worker pair around a backend.
    ///
    /// The worker must be started with [`AnswerWorker::start`].
    pub fn new<B: AnswerBackend + 'static>(backend: B) -> (Self, AnswerWorker<B>) {
        let (command_tx, command_rx) = bounded(16);
        let (event_tx, event_rx) = bounded(16);

        let exchange = Self {
            command_tx,
            event_rx,
        };
        let worker = AnswerWorker {
            backend,
            command_rx,
            event_tx,
        };
        (exchange, worker)
    }

    /// Issue one exchange. The session guarantees at most one outstanding.
    pub fn ask(&self, question: String) -> Result<()> {
        self.command_tx
            .send(AnswerCommand::Ask(question))
            .map_err(|e| SolaceError::Channel(format!("Failed to send question: {}", e)))
    }

    /// Request shutdown
    pub fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(AnswerCommand::Shutdown)
            .map_err(|e| SolaceError::Channel(format!("Failed to send shutdown: {}", e)))
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<AnswerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> Result<AnswerEvent> {
        self.event_rx
            .recv()
            .map_err(|e| SolaceError::Channel(format!("Failed to receive event: {}", e)))
    }
}

/// Worker that performs the blocking exchanges in a dedicated thread.
pub struct AnswerWorker<B: AnswerBackend> {
    backend: B,
    command_rx: Receiver<AnswerCommand>,
    event_tx: Sender<AnswerEvent>,
}

impl<B: AnswerBackend + 'static> AnswerWorker<B> {
    /// Start the worker thread.
    pub fn start(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(self) {
        info!("answer worker starting");
        loop {
            match self.command_rx.recv() {
                Ok(AnswerCommand::Ask(question)) => {
                    debug!("exchange started");
                    let event = match self.backend.ask(&question) {
                        Ok(answer) => AnswerEvent::Answered(answer),
                        Err(err) => {
                            warn!(%err, "exchange failed");
                            AnswerEvent::Failed(err.user_message())
                        }
                    };
                    if self.event_tx.send(event).is_err() {
                        error!("event channel closed, stopping worker");
                        break;
                    }
                }
                Ok(AnswerCommand::Shutdown) => {
                    let _ = self.event_tx.send(AnswerEvent::Shutdown);
                    break;
                }
                Err(_) => {
                    warn!("command channel disconnected");
                    break;
                }
            }
        }
        info!("answer worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedBackend {
        result: std::result::Result<String, String>,
    }

    impl AnswerBackend for ScriptedBackend {
        fn ask(&self, _question: &str) -> Result<String> {
            self.result
                .clone()
                .map_err(SolaceError::Backend)
        }
    }

    #[test]
    fn test_parse_successful_answer() {
        let out = parse_answer_body(true, 200, r#"{"answer":"Try breathing slowly."}"#);
        assert_eq!(out.unwrap(), "Try breathing slowly.");
    }

    #[test]
    fn test_parse_error_payload_on_500() {
        let out = parse_answer_body(false, 500, r#"{"error":"unavailable"}"#);
        assert_eq!(out, Err(SolaceError::Backend("unavailable".to_string())));
    }

    #[test]
    fn test_parse_error_falls_back_to_answer_field() {
        let out = parse_answer_body(false, 400, r#"{"answer":"bad request"}"#);
        assert_eq!(out, Err(SolaceError::Backend("bad request".to_string())));
    }

    #[test]
    fn test_parse_error_falls_back_to_status() {
        let out = parse_answer_body(false, 503, "not json");
        assert_eq!(
            out,
            Err(SolaceError::Backend("HTTP error! Status: 503".to_string()))
        );
    }

    #[test]
    fn test_parse_malformed_success_body() {
        let out = parse_answer_body(true, 200, "<html>oops</html>");
        assert!(matches!(out, Err(SolaceError::Backend(_))));
    }

    #[test]
    fn test_parse_success_without_answer_field() {
        let out = parse_answer_body(true, 200, "{}");
        assert!(matches!(out, Err(SolaceError::Backend(_))));
    }

    #[test]
    fn test_worker_answered_round_trip() {
        let (exchange, worker) = AnswerExchange::new(ScriptedBackend {
            result: Ok("You are not alone.".to_string()),
        });
        let handle = worker.start();

        exchange.ask("I feel low".to_string()).unwrap();
        match exchange.recv_event().unwrap() {
            AnswerEvent::Answered(answer) => assert_eq!(answer, "You are not alone."),
            other => panic!("expected Answered, got {:?}", other),
        }

        exchange.shutdown().unwrap();
        assert!(matches!(
            exchange.recv_event().unwrap(),
            AnswerEvent::Shutdown
        ));
        handle.join().unwrap();
    }

    #[test]
    fn test_worker_failure_carries_user_text() {
        let (exchange, worker) = AnswerExchange::new(ScriptedBackend {
            result: Err("unavailable".to_string()),
        });
        let handle = worker.start();

        exchange.ask("anything".to_string()).unwrap();
        match exchange.recv_event().unwrap() {
            AnswerEvent::Failed(msg) => assert_eq!(msg, "unavailable"),
            other => panic!("expected Failed, got {:?}", other),
        }

        exchange.shutdown().unwrap();
        handle.join().unwrap();
    }
}
