//! Temporal Gesture State
//!
//! - `buffer`: bounded, time-stamped FIFO of keypoint vectors
//! - `session`: session-keyed store so concurrent streams never share history

pub mod buffer;
pub mod session;

pub use buffer::{BufferedFrame, TemporalBuffer};
pub use session::{SessionSnapshot, SessionState, SessionStore, DEFAULT_SESSION};
