//! ringcast
//!
//! Core of a continuous recording session: a serialized state machine that
//! rotates time-bounded output segments and keeps their total size under a
//! budget by evicting the oldest committed segments, ring-buffer style.
//!
//! The actual capture and encoding pipeline is an external collaborator
//! behind the [`capture::CapturePort`] trait; callers observe the session
//! through an ordered, typed event stream.
//!
//! ```no_run
//! use ringcast::capture::SimulatedCapturePort;
//! use ringcast::config::SessionConfig;
//! use ringcast::session::create_session;
//!
//! # async fn demo() {
//! let (handle, mut engine) = create_session(SimulatedCapturePort::new(250 * 1024));
//! tokio::spawn(async move { engine.run().await });
//!
//! let mut events = handle.start(SessionConfig::default()).await;
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod rotation;
pub mod session;

pub use config::{Config, SessionConfig};
pub use dispatch::{EventReceiver, SessionEvent};
pub use error::{ErrorKind, RecorderError, RecorderResult};
pub use session::{create_session, SessionHandle, SessionState};
