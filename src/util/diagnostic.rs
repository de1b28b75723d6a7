//! User-friendly diagnostic messages.
//!
//! Errors reaching the terminal carry the root cause, any context the
//! workflow attached, and suggested fixes.

use std::fmt;

use crate::error::BridgeError;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when CMake cannot be found.
    pub const INSTALL_CMAKE: &str =
        "Install CMake 3.7 or newer, or set `cmake.program` in .cmake-bridge/config.toml";

    /// Suggestion when the CMake configure step fails.
    pub const CONFIGURE_FAILED: &str = "Run `cmake-bridge convert --verbose` for the full CMake log";

    /// Suggestion when a saved code model cannot be read.
    pub const BAD_CODE_MODEL: &str =
        "Produce the input with `cmake-bridge codemodel <SOURCE> > codemodel.json`";

    /// Suggestion when the server protocol is not available.
    pub const SERVER_MODE: &str =
        "CMake server mode was removed in CMake 3.20; use an older CMake release";
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Build a diagnostic for an error chain.
    ///
    /// When a [`BridgeError`] is part of the chain its own diagnostic is
    /// used, and the outer context messages become context lines.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let Some(bridge) = err.chain().find_map(|e| e.downcast_ref::<BridgeError>()) else {
            let mut chain = err.chain();
            let mut diag = Diagnostic::error(chain.next().map(|e| e.to_string()).unwrap_or_default());
            for cause in chain {
                diag = diag.with_context(cause.to_string());
            }
            return diag;
        };

        let mut diag = bridge.to_diagnostic();
        let outer: Vec<String> = err
            .chain()
            .take_while(|e| e.downcast_ref::<BridgeError>().is_none())
            .map(|e| e.to_string())
            .collect();
        diag.context.splice(0..0, outer);
        diag
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let error_prefix = if color {
            "\x1b[1;31merror\x1b[0m"
        } else {
            "error"
        };

        output.push_str(&format!("{}: {}\n", error_prefix, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  - {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("failed to read code model")
            .with_context("expected value at line 1 column 1")
            .with_suggestion("Regenerate the file");

        let output = diag.format(false);
        assert!(output.contains("error: failed to read code model"));
        assert!(output.contains("  - expected value"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Regenerate the file"));
    }

    #[test]
    fn test_from_bridge_error_chain() {
        let err = Err::<(), _>(BridgeError::UnsupportedBackend("make".into()))
            .context("failed to convert subproject")
            .unwrap_err();

        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.message, "no CMake generator for backend `make`");
        assert_eq!(diag.context, vec!["failed to convert subproject"]);
        assert!(!diag.suggestions.is_empty());
    }

    #[test]
    fn test_from_plain_error_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.message, "outer");
        assert_eq!(diag.context, vec!["inner"]);
    }
}
