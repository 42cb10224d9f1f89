//! Session event delivery
//!
//! Events travel over an unbounded, typed channel: delivery is asynchronous
//! with respect to the state transition that produced an event, but strictly
//! ordered per session. Exactly one listener is bound per session lifetime;
//! the engine rebinds on each start and unbinds when the state machine
//! returns to idle.

use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ErrorKind;

/// Notifications delivered to the session listener
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session reached the active state
    Started,

    /// The session stopped; carries every committed segment location in
    /// commit order, including segments that were later evicted
    Stopped { segments: Vec<PathBuf> },

    /// A segment's final size became known and it entered the ledger
    SegmentCommitted { location: PathBuf },

    /// The oldest committed segment was deleted to satisfy the budget
    StorageEvicted { location: PathBuf },

    /// A failure; terminal unless `kind` is `Storage` raised by eviction
    Error { kind: ErrorKind, message: String },
}

/// Sending half handed in by the caller on start
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Receiving half the caller consumes events from
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Create a listener channel pair for one session
pub fn listener_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Owns the single bound listener for the active session
#[derive(Default)]
pub struct EventDispatcher {
    listener: Option<EventSender>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { listener: None }
    }

    /// Bind the listener for a new session, replacing any previous binding
    pub fn bind(&mut self, listener: EventSender) {
        self.listener = Some(listener);
    }

    /// Drop the binding; called when the session returns to idle
    pub fn unbind(&mut self) {
        self.listener = None;
    }

    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    /// Queue an event for the bound listener
    ///
    /// A dropped receiver is not an error; the session keeps recording
    /// whether or not anyone is watching.
    pub fn emit(&self, event: SessionEvent) {
        let Some(listener) = &self.listener else {
            debug!(?event, "No listener bound, dropping event");
            return;
        };
        if listener.send(event).is_err() {
            debug!("Listener receiver dropped, event discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_emission_order() {
        let (tx, mut rx) = listener_channel();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.bind(tx);

        dispatcher.emit(SessionEvent::Started);
        dispatcher.emit(SessionEvent::SegmentCommitted {
            location: PathBuf::from("a.mp4"),
        });
        dispatcher.emit(SessionEvent::Stopped {
            segments: vec![PathBuf::from("a.mp4")],
        });

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Started)));
        assert!(matches!(
            rx.try_recv(),
            Ok(SessionEvent::SegmentCommitted { .. })
        ));
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Stopped { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn emit_without_listener_is_silent() {
        let dispatcher = EventDispatcher::new();
        dispatcher.emit(SessionEvent::Started);
    }

    #[test]
    fn rebinding_replaces_the_listener() {
        let (tx1, mut rx1) = listener_channel();
        let (tx2, mut rx2) = listener_channel();
        let mut dispatcher = EventDispatcher::new();

        dispatcher.bind(tx1);
        dispatcher.emit(SessionEvent::Started);
        dispatcher.unbind();
        dispatcher.bind(tx2);
        dispatcher.emit(SessionEvent::Started);

        assert!(matches!(rx1.try_recv(), Ok(SessionEvent::Started)));
        assert!(rx1.try_recv().is_err());
        assert!(matches!(rx2.try_recv(), Ok(SessionEvent::Started)));
    }

    #[test]
    fn events_serialize_to_tagged_json() {
        let event = SessionEvent::Error {
            kind: ErrorKind::Capture,
            message: "display disconnected".to_string(),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"event\":\"error\""));
        assert!(json.contains("\"kind\":\"capture\""));
    }
}
