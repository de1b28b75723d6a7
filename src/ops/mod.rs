//! High-level operations.
//!
//! This module contains the workflows behind the cmake-bridge commands.

pub mod configure;
pub mod interpreter;

pub use configure::{configure, generator_for_backend, ConfigureRequest};
pub use interpreter::{query_session, CMakeInterpreter, InterpreterPaths, SessionResults};
