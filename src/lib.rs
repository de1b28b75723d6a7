//! cmake-bridge - absorb CMake subprojects into a declarative build model
//!
//! This crate drives `cmake -E server`, converts the code model it reports
//! into normalized build targets and emits the equivalent Meson-style build
//! statements.

pub mod ast;
pub mod convert;
pub mod error;
pub mod ops;
pub mod server;
pub mod toolchain;
pub mod util;

/// Test utilities for cmake-bridge unit tests.
///
/// This module is only available when running tests. It provides a scripted
/// CMake server and code model fixtures.
#[cfg(test)]
pub mod test_support;

pub use ast::{render, synthesize, CodeBlock};
pub use convert::{ConvertedProject, ConvertedTarget, RebaseRoots};
pub use error::{BridgeError, BridgeResult};
pub use ops::{CMakeInterpreter, InterpreterPaths};
pub use server::{CodeModel, ServerClient};
