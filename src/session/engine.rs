//! Session engine - the serialized executor behind the state machine
//!
//! One run loop owns all session state. Commands arrive on a channel, the
//! rotation timer lives inside the same `select!`, and every transition runs
//! to completion before the next one is looked at, so a rotation fire can
//! never interleave with a stop or a fault. Capture port calls are treated
//! as brief blocking I/O on this task.

use std::path::PathBuf;

use chrono::Local;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capture::{CapturePort, SegmentHandle};
use crate::config::SessionConfig;
use crate::dispatch::{EventDispatcher, EventSender, SessionEvent};
use crate::error::{ErrorKind, RecorderError, RecorderResult};
use crate::ledger::{CommittedSegment, StorageLedger};
use crate::rotation::RotationTimer;

use super::{SessionCommand, SessionState};

/// State owned for the lifetime of one session
struct ActiveSession {
    id: Uuid,
    config: SessionConfig,
    /// Location prefix derived from the session start time; combined with
    /// the sequence number it makes locations lexically equal temporal order
    prefix: String,
    /// Next segment sequence number, never reused within the session
    next_seq: u32,
    /// The at-most-one open segment
    open: Option<SegmentHandle>,
    ledger: StorageLedger,
    /// Every committed location in commit order, kept across evictions for
    /// the stop report
    committed: Vec<PathBuf>,
}

impl ActiveSession {
    fn segment_location(&self, seq: u32) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}_seg{:04}.mp4", self.prefix, seq))
    }
}

/// The session state machine and its executor
pub struct SessionEngine<P: CapturePort> {
    port: P,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    state_tx: watch::Sender<SessionState>,
    dispatcher: EventDispatcher,
    session: Option<ActiveSession>,
}

impl<P: CapturePort> SessionEngine<P> {
    pub fn new(
        port: P,
        cmd_rx: mpsc::Receiver<SessionCommand>,
        state_tx: watch::Sender<SessionState>,
    ) -> Self {
        Self {
            port,
            cmd_rx,
            state_tx,
            dispatcher: EventDispatcher::new(),
            session: None,
        }
    }

    /// Run the engine until shutdown
    pub async fn run(&mut self) {
        info!("Session engine running");

        // The rotation timer is selected on alongside commands so a fire is
        // just another serialized event.
        let mut rotation = RotationTimer::new();

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Start { config, listener }) => {
                            self.handle_start(config, listener, &mut rotation);
                        }
                        Some(SessionCommand::Stop) => {
                            self.handle_stop(&mut rotation);
                        }
                        Some(SessionCommand::CaptureFault { kind, message }) => {
                            self.handle_capture_fault(kind, message, &mut rotation);
                        }
                        Some(SessionCommand::Shutdown) | None => {
                            self.handle_stop(&mut rotation);
                            break;
                        }
                    }
                }

                _ = rotation.fired() => {
                    self.handle_rotation(&mut rotation);
                }
            }
        }

        info!("Session engine stopped");
    }

    fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }

    /// Start a session: bind the listener, open the device and segment #0
    fn handle_start(
        &mut self,
        config: SessionConfig,
        listener: EventSender,
        rotation: &mut RotationTimer,
    ) {
        if self.session.is_some() || self.state() != SessionState::Idle {
            // One session at a time. The rejection goes to the new listener
            // only; the bound listener and the running session are untouched.
            warn!("Start requested while a session is active, rejecting");
            let err = RecorderError::SessionActive;
            let _ = listener.send(SessionEvent::Error {
                kind: err.kind(),
                message: err.to_string(),
            });
            return;
        }

        self.dispatcher.bind(listener);
        self.set_state(SessionState::Starting);

        if let Err(err) = config.validate() {
            self.fail_start(err);
            return;
        }

        if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
            self.fail_start(RecorderError::storage(format!(
                "failed to create output directory {:?}: {}",
                config.output_dir, e
            )));
            return;
        }

        if let Err(err) = self.port.open_device(&config) {
            self.fail_start(err);
            return;
        }

        let prefix = format!("rec_{}", Local::now().format("%Y%m%d_%H%M%S"));
        let mut session = ActiveSession {
            id: Uuid::new_v4(),
            ledger: StorageLedger::new(config.max_storage_bytes),
            prefix,
            config,
            next_seq: 0,
            open: None,
            committed: Vec::new(),
        };

        let location = session.segment_location(session.next_seq);
        match self
            .port
            .open_segment(session.next_seq, &location, &session.config.capture)
        {
            Ok(handle) => {
                session.open = Some(handle);
                session.next_seq += 1;
            }
            Err(err) => {
                self.port.release_device();
                self.fail_start(err);
                return;
            }
        }

        if let Some(duration) = session.config.segment_duration {
            rotation.arm(duration);
        }

        info!(
            session = %session.id,
            output_dir = ?session.config.output_dir,
            segment_duration = ?session.config.segment_duration,
            budget = ?session.config.max_storage_bytes,
            "Recording session started"
        );

        self.session = Some(session);
        self.set_state(SessionState::Active);
        self.dispatcher.emit(SessionEvent::Started);
    }

    /// Startup failure: exactly one error event, no session artifacts survive
    fn fail_start(&mut self, err: RecorderError) {
        error!(error = %err, "Session failed to start");
        self.dispatcher.emit(SessionEvent::Error {
            kind: err.kind(),
            message: err.to_string(),
        });
        self.dispatcher.unbind();
        self.session = None;
        self.set_state(SessionState::Idle);
    }

    /// Stop: finalize the open segment, tear down, report the segment list
    fn handle_stop(&mut self, rotation: &mut RotationTimer) {
        let Some(mut session) = self.session.take() else {
            debug!("Stop requested while idle, nothing to do");
            return;
        };

        self.set_state(SessionState::Stopping);
        rotation.cancel();

        if let Some(handle) = session.open.take() {
            let seq = handle.seq;
            let location = handle.location.clone();
            match self.port.close_segment(handle) {
                Ok(size) => Self::commit_segment(
                    &self.dispatcher,
                    &mut session,
                    CommittedSegment {
                        seq,
                        location,
                        size_bytes: size,
                    },
                ),
                Err(e) => {
                    warn!(seq, error = %e, "Failed to finalize segment at stop, discarding")
                }
            }
        }

        self.port.release_device();

        info!(
            session = %session.id,
            segments = session.committed.len(),
            "Recording session stopped"
        );
        self.dispatcher.emit(SessionEvent::Stopped {
            segments: session.committed,
        });
        self.dispatcher.unbind();
        self.set_state(SessionState::Idle);
    }

    /// Rotation boundary: close and commit the current segment, open the next
    fn handle_rotation(&mut self, rotation: &mut RotationTimer) {
        if self.state() != SessionState::Active || self.session.is_none() {
            // A stop or fault won the race; the timer was already cancelled
            // on that transition, this is the second line of defense.
            debug!("Rotation fired outside an active session, ignoring");
            rotation.cancel();
            return;
        }

        if let Err(err) = self.rotate(rotation) {
            // A session must never remain active with no open segment and a
            // live timer; escalate exactly like a startup failure.
            rotation.cancel();
            error!(error = %err, "Rotation failed, terminating session");
            self.terminate_with_error(err.kind(), err.to_string());
        }
    }

    fn rotate(&mut self, rotation: &mut RotationTimer) -> RecorderResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let Some(handle) = session.open.take() else {
            return Err(RecorderError::capture("no open segment at rotation boundary"));
        };

        let seq = handle.seq;
        let location = handle.location.clone();
        let size = self.port.close_segment(handle)?;
        Self::commit_segment(
            &self.dispatcher,
            session,
            CommittedSegment {
                seq,
                location,
                size_bytes: size,
            },
        );

        let next_seq = session.next_seq;
        let next_location = session.segment_location(next_seq);
        let handle = self
            .port
            .open_segment(next_seq, &next_location, &session.config.capture)?;
        session.open = Some(handle);
        session.next_seq += 1;

        if let Some(duration) = session.config.segment_duration {
            rotation.arm(duration);
        }

        debug!(seq = next_seq, "Rotated to new segment");
        Ok(())
    }

    /// Fault raised by the capture backend while a session is in progress
    fn handle_capture_fault(
        &mut self,
        kind: ErrorKind,
        message: String,
        rotation: &mut RotationTimer,
    ) {
        if self.session.is_none() {
            debug!("Capture fault reported while idle, ignoring");
            return;
        }

        warn!(?kind, message, "Capture fault, terminating session");
        rotation.cancel();
        self.terminate_with_error(kind, message);
    }

    /// The error pseudo-state: best-effort finalize, release, notify, idle
    ///
    /// Emits the error event instead of a stop event - the two terminal
    /// notifications are mutually exclusive per session.
    fn terminate_with_error(&mut self, kind: ErrorKind, message: String) {
        if let Some(mut session) = self.session.take() {
            if let Some(handle) = session.open.take() {
                let seq = handle.seq;
                let location = handle.location.clone();
                match self.port.close_segment(handle) {
                    Ok(size) if size > 0 => Self::commit_segment(
                        &self.dispatcher,
                        &mut session,
                        CommittedSegment {
                            seq,
                            location,
                            size_bytes: size,
                        },
                    ),
                    Ok(_) => debug!(seq, "Discarding empty in-flight segment"),
                    Err(e) => {
                        warn!(seq, error = %e, "Could not finalize in-flight segment")
                    }
                }
            }
            self.port.release_device();
        }

        self.dispatcher.emit(SessionEvent::Error { kind, message });
        self.dispatcher.unbind();
        self.set_state(SessionState::Idle);
    }

    /// Commit through the ledger; an eviction failure is a storage-health
    /// signal, reported without terminating the session
    fn commit_segment(
        dispatcher: &EventDispatcher,
        session: &mut ActiveSession,
        segment: CommittedSegment,
    ) {
        session.committed.push(segment.location.clone());
        if let Err(err) = session.ledger.commit(segment, dispatcher) {
            dispatcher.emit(SessionEvent::Error {
                kind: err.kind(),
                message: err.to_string(),
            });
        }
    }
}
