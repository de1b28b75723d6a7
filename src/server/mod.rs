//! Client for the CMake server protocol (`cmake -E server`).
//!
//! - [`framing`]: sentinel-delimited JSON message framing
//! - [`message`], [`request`]: the wire messages
//! - [`codemodel`]: the typed code model reply
//! - [`client`]: the session state machine

pub mod client;
pub mod codemodel;
pub mod framing;
pub mod message;
pub mod request;

pub use client::{ServerClient, ServerSettings, SessionState};
pub use codemodel::{CodeModel, FileGroup, Project, Target, TargetType};
pub use message::{CMakeInputs, Message, ReplyKind};
