//! The initial out-of-server CMake configure run.

use std::path::Path;

use anyhow::{Context, Result};

use crate::error::{BridgeError, BridgeResult};
use crate::toolchain::{cache_arguments, CompilerRegistry};
use crate::util::fs::ensure_dir;
use crate::util::process::{find_cmake, ProcessBuilder};

/// Backend names and the CMake generators they select.
pub const BACKEND_GENERATORS: [(&str, &str); 5] = [
    ("ninja", "Ninja"),
    ("xcode", "Xcode"),
    ("vs2010", "Visual Studio 10 2010"),
    ("vs2015", "Visual Studio 14 2015"),
    ("vs2017", "Visual Studio 15 2017"),
];

/// Map a backend name to a CMake generator.
pub fn generator_for_backend(backend: &str) -> BridgeResult<&'static str> {
    BACKEND_GENERATORS
        .iter()
        .find(|(name, _)| *name == backend)
        .map(|(_, generator)| *generator)
        .ok_or_else(|| BridgeError::UnsupportedBackend(backend.to_string()))
}

/// Inputs of one configure run.
#[derive(Debug, Clone)]
pub struct ConfigureRequest<'a> {
    pub source_dir: &'a Path,
    pub build_dir: &'a Path,
    pub install_prefix: &'a Path,
    pub generator: &'a str,
    pub extra_options: &'a [String],
}

/// Build the `cmake` command line for `request`.
pub fn configure_command(
    cmake: &Path,
    request: &ConfigureRequest<'_>,
    compilers: &dyn CompilerRegistry,
) -> ProcessBuilder {
    ProcessBuilder::new(cmake)
        .args(cache_arguments(compilers))
        .arg("-G")
        .arg(request.generator)
        .arg(format!(
            "-DCMAKE_INSTALL_PREFIX={}",
            request.install_prefix.display()
        ))
        .args(request.extra_options)
        .arg(request.source_dir)
        .cwd(request.build_dir)
}

/// Run the command, streaming its output to the log.
pub fn run_configure(command: &ProcessBuilder, build_dir: &Path) -> Result<()> {
    ensure_dir(build_dir)?;

    tracing::info!("Running: {}", command.display_command());
    let status = command
        .exec_streaming(|line, is_stderr| {
            if is_stderr {
                tracing::warn!("{}", line);
            } else {
                tracing::info!("{}", line);
            }
        })
        .context("failed to run CMake")?;

    if status.success() {
        tracing::info!("CMake configuration: SUCCEEDED");
        Ok(())
    } else {
        tracing::error!("CMake configuration: FAILED");
        Err(BridgeError::ConfigureFailed {
            code: status.code(),
        }
        .into())
    }
}

/// Locate CMake, then configure `request.build_dir`.
pub fn configure(
    program: Option<&Path>,
    request: &ConfigureRequest<'_>,
    compilers: &dyn CompilerRegistry,
) -> Result<()> {
    let cmake = find_cmake(program).ok_or_else(|| BridgeError::ToolNotFound {
        tool: "cmake".to_string(),
    })?;

    match &cmake.version {
        Some(version) => tracing::info!("Configuring the build directory with CMake version {}", version),
        None => tracing::info!("Configuring the build directory with CMake"),
    }

    let command = configure_command(&cmake.path, request, compilers);
    run_configure(&command, request.build_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::language::Language;
    use crate::toolchain::StaticCompilers;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_generator_map() {
        assert_eq!(generator_for_backend("ninja").unwrap(), "Ninja");
        assert_eq!(generator_for_backend("xcode").unwrap(), "Xcode");
        assert_eq!(generator_for_backend("vs2010").unwrap(), "Visual Studio 10 2010");
        assert_eq!(generator_for_backend("vs2015").unwrap(), "Visual Studio 14 2015");
        assert_eq!(generator_for_backend("vs2017").unwrap(), "Visual Studio 15 2017");
        assert!(matches!(
            generator_for_backend("make"),
            Err(BridgeError::UnsupportedBackend(name)) if name == "make"
        ));
    }

    #[test]
    fn test_configure_command_layout() {
        let extra = vec!["-DBUILD_TESTING=OFF".to_string()];
        let request = ConfigureRequest {
            source_dir: Path::new("/proj/sub"),
            build_dir: Path::new("/proj/build/sub/__CMake_build"),
            install_prefix: Path::new("/usr/local"),
            generator: "Ninja",
            extra_options: &extra,
        };
        let compilers = StaticCompilers::new()
            .with(Language::C, "gcc")
            .with(Language::Cpp, "ccache g++");

        let command = configure_command(Path::new("cmake"), &request, &compilers);
        assert_eq!(command.get_program(), Path::new("cmake"));
        assert_eq!(
            command.get_args(),
            &[
                "-DCMAKE_C_COMPILER=gcc",
                "-DCMAKE_CXX_COMPILER_LAUNCHER=ccache",
                "-DCMAKE_CXX_COMPILER=g++",
                "-G",
                "Ninja",
                "-DCMAKE_INSTALL_PREFIX=/usr/local",
                "-DBUILD_TESTING=OFF",
                "/proj/sub",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_configure_failure() {
        let tmp = TempDir::new().unwrap();
        let build_dir = tmp.path().join("b");
        let command = ProcessBuilder::new("sh").arg("-c").arg("echo configuring; exit 3");

        let err = run_configure(&command, &build_dir).unwrap_err();
        assert!(build_dir.is_dir());
        assert!(matches!(
            err.downcast_ref::<BridgeError>(),
            Some(BridgeError::ConfigureFailed { code: Some(3) })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_configure_success() {
        let tmp = TempDir::new().unwrap();
        let build_dir: PathBuf = tmp.path().join("b");
        let command = ProcessBuilder::new("sh")
            .arg("-c")
            .arg("echo ok; echo warn >&2")
            .cwd(&build_dir);

        run_configure(&command, &build_dir).unwrap();
    }
}
