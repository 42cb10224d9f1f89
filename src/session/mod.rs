//! Session orchestration - one serialized state machine per engine
//!
//! All transitions (start, stop, rotation fire, capture fault) are commands
//! processed by a single [`SessionEngine`] run loop. Callers interact through
//! a [`SessionHandle`], which submits commands over a channel and observes
//! state through a watch; nothing outside the engine task touches session
//! state.

mod engine;

pub use engine::SessionEngine;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::capture::CapturePort;
use crate::config::SessionConfig;
use crate::dispatch::{listener_channel, EventReceiver, EventSender};
use crate::error::ErrorKind;

/// Current state of the session state machine
///
/// The error pseudo-state is transient - a failing session notifies and
/// resolves straight back to `Idle`, so it is never observable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session in progress
    Idle,
    /// Opening the device and the first segment
    Starting,
    /// Recording with at most one open segment
    Active,
    /// Finalizing and tearing down
    Stopping,
}

impl SessionState {
    /// True for every state except `Idle`
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

/// Commands processed by the session engine
#[derive(Debug)]
pub enum SessionCommand {
    /// Start a session, binding the given listener for its lifetime
    Start {
        config: SessionConfig,
        listener: EventSender,
    },
    /// Finalize the current session; a no-op when idle
    Stop,
    /// Asynchronous fault raised by the capture backend
    CaptureFault { kind: ErrorKind, message: String },
    /// Stop any active session and exit the run loop
    Shutdown,
}

/// Caller-side handle to a session engine
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Request a session start and return the event stream for it
    ///
    /// If a session is already active the request is rejected, not queued:
    /// the returned receiver yields a single `ServiceError` event and the
    /// running session is left untouched.
    pub async fn start(&self, config: SessionConfig) -> EventReceiver {
        let (listener, events) = listener_channel();
        let _ = self
            .cmd_tx
            .send(SessionCommand::Start { config, listener })
            .await;
        events
    }

    /// Request a stop; a defined no-op when no session is active
    pub async fn stop(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Stop).await;
    }

    /// Report a fault from the capture backend (or a caller-observed
    /// permission failure)
    pub async fn report_capture_fault(&self, kind: ErrorKind, message: impl Into<String>) {
        let _ = self
            .cmd_tx
            .send(SessionCommand::CaptureFault {
                kind,
                message: message.into(),
            })
            .await;
    }

    /// Stop any active session and shut the engine down
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
    }

    /// Pure read of the current state
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Whether a session is in progress (starting, active, or stopping)
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }
}

/// Wire up an engine and its handle
///
/// The caller owns both halves: run (or spawn) the engine, keep the handle.
/// There is no ambient global session; whoever creates the engine owns the
/// one session slot it serializes.
pub fn create_session<P: CapturePort>(port: P) -> (SessionHandle, SessionEngine<P>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (state_tx, state_rx) = watch::channel(SessionState::Idle);

    let handle = SessionHandle { cmd_tx, state_rx };
    let engine = SessionEngine::new(port, cmd_rx, state_tx);
    (handle, engine)
}
