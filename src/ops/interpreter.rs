//! Absorb a CMake subproject: configure, query the server, convert.
//!
//! The workflow is split in three steps:
//! 1. [`CMakeInterpreter::initialise`] configures the subproject and reads
//!    the code model from a CMake server session
//! 2. [`CMakeInterpreter::analyse`] converts the code model into targets
//! 3. [`CMakeInterpreter::to_statements`] synthesizes the build statements
//!
//! A code model saved earlier can be converted offline with
//! [`CMakeInterpreter::analyse_code_model`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ast::synth::{synthesize, Synthesis};
use crate::convert::paths::{normalize_lexically, RebaseRoots};
use crate::convert::project::ConvertedProject;
use crate::error::{BridgeError, BridgeResult};
use crate::ops::configure::{configure, generator_for_backend, ConfigureRequest};
use crate::server::client::{ServerClient, ServerSettings};
use crate::server::codemodel::CodeModel;
use crate::server::message::CMakeInputs;
use crate::toolchain::CompilerRegistry;
use crate::util::config::DEFAULT_PROTOCOL_MAJOR;
use crate::util::fs::relative_path;

/// Name of the CMake build directory inside the subproject build dir.
pub const CMAKE_BUILD_DIR_NAME: &str = "__CMake_build";

/// Where the subproject lives and where it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterPaths {
    /// CMake source directory of the subproject.
    pub source_dir: PathBuf,
    /// Build root of the outer build.
    pub build_root: PathBuf,
    /// Subproject directory, relative to the build root.
    pub subdir: PathBuf,
    pub install_prefix: PathBuf,
}

impl InterpreterPaths {
    /// `<build root>/<subdir>/__CMake_build`
    pub fn build_dir(&self) -> PathBuf {
        self.build_root.join(&self.subdir).join(CMAKE_BUILD_DIR_NAME)
    }

    pub fn rebase_roots(&self) -> RebaseRoots {
        RebaseRoots {
            source_root: self.source_dir.clone(),
            build_root: self.build_root.clone(),
            subdir: self.subdir.clone(),
            install_prefix: self.install_prefix.clone(),
        }
    }
}

/// What one server session reports.
#[derive(Debug, Clone)]
pub struct SessionResults {
    pub inputs: CMakeInputs,
    pub code_model: CodeModel,
}

/// Handshake and run the standard query sequence on a started session.
pub fn query_session(
    client: &mut ServerClient,
    source_dir: &Path,
    build_dir: &Path,
    generator: &str,
    protocol: (u32, Option<u32>),
) -> BridgeResult<SessionResults> {
    client.do_handshake(
        &source_dir.to_string_lossy(),
        &build_dir.to_string_lossy(),
        generator,
        protocol.0,
        protocol.1,
    )?;

    client.configure(Vec::new(), "CMake server configure")?;
    client.compute("Generating build system files")?;
    let inputs = client.cmake_inputs("Querying build system files")?;
    let code_model = client.code_model("Querying the CMake code model")?;

    Ok(SessionResults { inputs, code_model })
}

/// Files the subproject's build description is read from.
///
/// CMake's own modules and temporary files are excluded. Paths are made
/// relative to `source_dir`, deduplicated and sorted.
pub fn build_system_files(inputs: &CMakeInputs, source_dir: &Path) -> Vec<PathBuf> {
    let reply_dir = Path::new(&inputs.source_dir);
    let source_dir = normalize_lexically(source_dir);

    inputs
        .build_files
        .iter()
        .filter(|f| !f.is_cmake && !f.is_temporary)
        .map(|f| normalize_lexically(&reply_dir.join(&f.file)))
        .map(|f| relative_path(&source_dir, &f))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Drives the conversion of one CMake subproject.
pub struct CMakeInterpreter {
    paths: InterpreterPaths,
    backend: String,
    server: ServerSettings,
    protocol: (u32, Option<u32>),
    code_model: Option<CodeModel>,
    build_files: Vec<PathBuf>,
    project: Option<ConvertedProject>,
}

impl CMakeInterpreter {
    pub fn new(paths: InterpreterPaths, backend: impl Into<String>) -> Self {
        CMakeInterpreter {
            paths,
            backend: backend.into(),
            server: ServerSettings::default(),
            protocol: (DEFAULT_PROTOCOL_MAJOR, None),
            code_model: None,
            build_files: Vec::new(),
            project: None,
        }
    }

    pub fn with_server_settings(mut self, settings: ServerSettings) -> Self {
        self.server = settings;
        self
    }

    pub fn with_protocol(mut self, major: u32, minor: Option<u32>) -> Self {
        self.protocol = (major, minor);
        self
    }

    pub fn paths(&self) -> &InterpreterPaths {
        &self.paths
    }

    pub fn build_dir(&self) -> PathBuf {
        self.paths.build_dir()
    }

    /// The code model read by [`initialise`](Self::initialise).
    pub fn code_model(&self) -> Option<&CodeModel> {
        self.code_model.as_ref()
    }

    /// Build description files reported by the server.
    pub fn build_system_files(&self) -> &[PathBuf] {
        &self.build_files
    }

    /// The converted targets, once analysed.
    pub fn project(&self) -> Option<&ConvertedProject> {
        self.project.as_ref()
    }

    /// Run CMake once outside server mode to populate the build directory.
    pub fn configure(&self, extra_options: &[String], compilers: &dyn CompilerRegistry) -> Result<()> {
        let generator = generator_for_backend(&self.backend)?;
        let build_dir = self.build_dir();
        let request = ConfigureRequest {
            source_dir: &self.paths.source_dir,
            build_dir: &build_dir,
            install_prefix: &self.paths.install_prefix,
            generator,
            extra_options,
        };
        configure(self.server.program.as_deref(), &request, compilers)
    }

    /// Configure, then read the build files and code model from a server
    /// session.
    pub fn initialise(&mut self, extra_options: &[String], compilers: &dyn CompilerRegistry) -> Result<()> {
        self.configure(extra_options, compilers)?;

        let generator = generator_for_backend(&self.backend)?;
        let build_dir = self.build_dir();
        let source_dir = self.paths.source_dir.clone();
        let protocol = self.protocol;

        let mut client = ServerClient::new(self.server.clone());
        let results = client
            .connect(|c| query_session(c, &source_dir, &build_dir, generator, protocol))
            .context("CMake server session failed")?;

        self.load_session(results);
        Ok(())
    }

    /// Store the results of a server session.
    pub fn load_session(&mut self, results: SessionResults) {
        self.build_files = build_system_files(&results.inputs, &self.paths.source_dir);
        tracing::debug!("Build system files: {:?}", self.build_files);
        self.code_model = Some(results.code_model);
        self.project = None;
    }

    /// Convert the stored code model.
    pub fn analyse(&mut self) -> Result<&ConvertedProject> {
        let model = self.code_model.as_ref().ok_or(BridgeError::NotInitialised)?;
        let project = ConvertedProject::analyse(model, &self.paths.rebase_roots());

        tracing::info!(
            "CMake project {} has {} build targets.",
            project.name,
            project.len()
        );

        Ok(self.project.insert(project))
    }

    /// Store `model` and convert it, without running CMake.
    pub fn analyse_code_model(&mut self, model: CodeModel) -> Result<&ConvertedProject> {
        self.code_model = Some(model);
        self.analyse()
    }

    /// Synthesize statements for the analysed project.
    pub fn to_statements(&self) -> Result<Synthesis> {
        let project = self
            .project
            .as_ref()
            .filter(|p| !p.name.is_empty())
            .ok_or(BridgeError::NotAnalysed)?;
        Ok(synthesize(project)?)
    }
}
