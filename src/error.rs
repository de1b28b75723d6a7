//! Error types for the CMake bridge.
//!
//! Every fatal condition raised by the protocol client, the converter and the
//! statement synthesizer is a [`BridgeError`]. Workflows in [`crate::ops`] wrap
//! these in `anyhow` with extra context.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Result alias used by the core components.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Error raised by the bridge core.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BridgeError {
    /// Transport or schema violation on the server connection.
    #[error("CMake server protocol error: {0}")]
    #[diagnostic(code(cmake_bridge::protocol))]
    Protocol(String),

    #[error("unable to find `{tool}`")]
    #[diagnostic(
        code(cmake_bridge::tool_not_found),
        help("Install CMake and ensure it's in your PATH, or set `cmake.program` in the config")
    )]
    ToolNotFound { tool: String },

    #[error("failed to start the CMake server: {0}")]
    #[diagnostic(code(cmake_bridge::server_start))]
    ServerStartFailed(String),

    #[error("the CMake server was already started")]
    #[diagnostic(code(cmake_bridge::already_started))]
    AlreadyStarted,

    #[error("failed to perform the handshake with the CMake server: {0}")]
    #[diagnostic(code(cmake_bridge::handshake))]
    HandshakeFailed(String),

    #[error("CMake server query `{label}` failed: {message}")]
    #[diagnostic(code(cmake_bridge::query))]
    QueryFailed { label: String, message: String },

    #[error("unsupported target type `{kind}` for target `{target}`")]
    #[diagnostic(code(cmake_bridge::unsupported_target))]
    UnsupportedTargetKind { target: String, kind: String },

    #[error("dependency cycle between CMake targets")]
    #[diagnostic(code(cmake_bridge::cycle))]
    DependencyCycle { targets: Vec<String> },

    #[error("failed to configure the CMake subproject (exit code {code:?})")]
    #[diagnostic(
        code(cmake_bridge::configure),
        help("Run with --verbose to see the full CMake output")
    )]
    ConfigureFailed { code: Option<i32> },

    #[error("no CMake generator for backend `{0}`")]
    #[diagnostic(
        code(cmake_bridge::backend),
        help("Supported backends: ninja, xcode, vs2010, vs2015, vs2017")
    )]
    UnsupportedBackend(String),

    #[error("the CMake interpreter was not initialised")]
    #[diagnostic(code(cmake_bridge::not_initialised))]
    NotInitialised,

    #[error("the CMake interpreter was not analysed")]
    #[diagnostic(code(cmake_bridge::not_analysed))]
    NotAnalysed,

    #[error(transparent)]
    #[diagnostic(code(cmake_bridge::io))]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Shorthand for a [`BridgeError::Protocol`].
    pub fn protocol(message: impl Into<String>) -> Self {
        BridgeError::Protocol(message.into())
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BridgeError::Protocol(message) => {
                Diagnostic::error("CMake server protocol error").with_context(message.clone())
            }

            BridgeError::ServerStartFailed(message) => {
                Diagnostic::error("failed to start the CMake server")
                    .with_context(message.clone())
                    .with_suggestion(suggestions::SERVER_MODE)
            }

            BridgeError::ToolNotFound { tool } => {
                Diagnostic::error(format!("unable to find `{}`", tool))
                    .with_suggestion(format!("Install {} and ensure it's in your PATH", tool))
                    .with_suggestion(suggestions::INSTALL_CMAKE)
            }

            BridgeError::HandshakeFailed(message) => {
                Diagnostic::error("CMake server handshake failed")
                    .with_context(message.clone())
                    .with_suggestion("Request a protocol version listed by the server")
                    .with_suggestion(suggestions::SERVER_MODE)
            }

            BridgeError::QueryFailed { label, message } => {
                Diagnostic::error(format!("{} failed", label)).with_context(message.clone())
            }

            BridgeError::UnsupportedTargetKind { target, kind } => {
                Diagnostic::error(format!("target `{}` has unsupported type `{}`", target, kind))
                    .with_suggestion(
                        "Only executables, static, shared, module and object libraries can be converted",
                    )
            }

            BridgeError::DependencyCycle { targets } => {
                Diagnostic::error("dependency cycle between CMake targets")
                    .with_context(format!("targets in the cycle: {}", targets.join(", ")))
                    .with_suggestion("Break the cycle in the CMake project")
            }

            BridgeError::ConfigureFailed { .. } => Diagnostic::error(self.to_string())
                .with_suggestion(suggestions::CONFIGURE_FAILED),

            BridgeError::UnsupportedBackend(backend) => {
                Diagnostic::error(format!("no CMake generator for backend `{}`", backend))
                    .with_suggestion("Use one of: ninja, xcode, vs2010, vs2015, vs2017")
            }

            other => Diagnostic::error(other.to_string()),
        }
    }
}
