//! Mindwell session crate - the Session & Diagnosis Manager.
//!
//! Owns the per-thread conversation state: loading a thread's history and
//! diagnosis, appending turns, recording diagnosis updates, and writing the
//! full snapshot back through a `SessionStore`. Turns on the same thread are
//! serialized through `TurnLocks`.

pub mod locks;
pub mod manager;
pub mod session;

pub use locks::TurnLocks;
pub use manager::SessionManager;
pub use session::{DiagnosisState, Session};
