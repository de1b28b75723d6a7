//! Configuration file support for cmake-bridge.
//!
//! Two configuration file locations are read:
//! - Global: `~/.cmake-bridge/config.toml` - User-wide defaults
//! - Project: `<source>/.cmake-bridge/config.toml` - Per-subproject overrides
//!
//! Project config takes precedence over global config; command line flags
//! take precedence over both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::server::client::{ServerSettings, DEFAULT_SHUTDOWN_TIMEOUT};

/// Backend used when neither config nor flags name one.
pub const DEFAULT_BACKEND: &str = "ninja";

/// Protocol major version requested in the handshake by default.
pub const DEFAULT_PROTOCOL_MAJOR: u32 = 1;

/// cmake-bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CMake invocation settings
    pub cmake: CMakeSettings,

    /// Compiler overrides
    pub toolchain: ToolchainSettings,
}

/// Settings for the `cmake` process and the server session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CMakeSettings {
    /// Path to the cmake executable (default: search PATH)
    pub program: Option<PathBuf>,

    /// Backend name (ninja, xcode, vs2010, vs2015, vs2017)
    pub backend: Option<String>,

    /// Extra `-D` style options passed when configuring
    pub options: Vec<String>,

    /// How long shutdown waits for the server before killing it
    pub shutdown_timeout_ms: Option<u64>,

    pub protocol_major: Option<u32>,
    pub protocol_minor: Option<u32>,
}

/// Compiler commands used to pre-seed the CMake cache.
///
/// A command may carry a launcher as its first word (e.g. `ccache gcc`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// C compiler command (e.g., /usr/bin/clang)
    pub cc: Option<String>,

    /// C++ compiler command (e.g., /usr/bin/clang++)
    pub cxx: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.cmake.program.is_some() {
            self.cmake.program = other.cmake.program;
        }
        if other.cmake.backend.is_some() {
            self.cmake.backend = other.cmake.backend;
        }
        if !other.cmake.options.is_empty() {
            self.cmake.options = other.cmake.options;
        }
        if other.cmake.shutdown_timeout_ms.is_some() {
            self.cmake.shutdown_timeout_ms = other.cmake.shutdown_timeout_ms;
        }
        if other.cmake.protocol_major.is_some() {
            self.cmake.protocol_major = other.cmake.protocol_major;
        }
        if other.cmake.protocol_minor.is_some() {
            self.cmake.protocol_minor = other.cmake.protocol_minor;
        }

        if other.toolchain.cc.is_some() {
            self.toolchain.cc = other.toolchain.cc;
        }
        if other.toolchain.cxx.is_some() {
            self.toolchain.cxx = other.toolchain.cxx;
        }
    }

    /// Configured backend, or the default.
    pub fn backend(&self) -> &str {
        self.cmake.backend.as_deref().unwrap_or(DEFAULT_BACKEND)
    }

    /// Requested protocol version `(major, minor)`.
    pub fn protocol_version(&self) -> (u32, Option<u32>) {
        (
            self.cmake.protocol_major.unwrap_or(DEFAULT_PROTOCOL_MAJOR),
            self.cmake.protocol_minor,
        )
    }

    /// Session settings derived from this config.
    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            program: self.cmake.program.clone(),
            shutdown_timeout: self
                .cmake
                .shutdown_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.cmake-bridge/config.toml)
/// 2. Global config (~/.cmake-bridge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Load the configuration that applies to the subproject at `source_dir`.
pub fn load_for_source(source_dir: &Path) -> Config {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(source_dir))
}

/// Get the global config directory (~/.cmake-bridge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".cmake-bridge"))
}

/// Get the global config path (~/.cmake-bridge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (<source>/.cmake-bridge/config.toml).
pub fn project_config_path(source_dir: &Path) -> PathBuf {
    source_dir.join(".cmake-bridge").join("config.toml")
}
