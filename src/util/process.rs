//! Subprocess execution utilities.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.output()
            .with_context(|| format!("failed to run `{}`", self.program.display()))
    }

    /// Execute and require success.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                self.display_command(),
                output.status.code(),
                stderr
            );
        }
        Ok(output)
    }

    /// Execute, handing every output line to `on_line` as it arrives.
    ///
    /// Stderr is drained on a helper thread so a chatty child cannot block
    /// on a full pipe. Lines are passed without their terminator, with
    /// invalid UTF-8 replaced; the bool is `true` for stderr lines.
    pub fn exec_streaming<F>(&self, mut on_line: F) -> Result<ExitStatus>
    where
        F: FnMut(&str, bool),
    {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        let stderr = child.stderr.take();
        let stderr_pump = std::thread::spawn(move || {
            let mut lines = Vec::new();
            if let Some(stderr) = stderr {
                let _ = for_each_line(BufReader::new(stderr), |line| lines.push(line.to_string()));
            }
            lines
        });

        let read_result = match child.stdout.take() {
            Some(stdout) => for_each_line(BufReader::new(stdout), |line| on_line(line, false)),
            None => Ok(()),
        };

        // A panicking pump only loses diagnostics, not the exit status.
        for line in stderr_pump.join().unwrap_or_default() {
            on_line(&line, true);
        }

        let status = child
            .wait()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;
        read_result
            .with_context(|| format!("failed to read output of `{}`", self.program.display()))?;
        Ok(status)
    }

    /// Spawn with piped stdin and stdout for an interactive session.
    ///
    /// Stderr is inherited so the child's own diagnostics reach the user.
    pub fn spawn_piped(&self) -> std::io::Result<Child> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());
        cmd.spawn()
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Call `f` with every line of `reader`, terminators stripped and invalid
/// UTF-8 replaced.
fn for_each_line<R: BufRead>(mut reader: R, mut f: impl FnMut(&str)) -> std::io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        f(&String::from_utf8_lossy(&buf));
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// A located CMake installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeExecutable {
    pub path: PathBuf,
    pub version: Option<semver::Version>,
}

/// Find CMake.
///
/// An explicitly configured program wins when it exists; otherwise `cmake`
/// is looked up in PATH. The version is informational only.
pub fn find_cmake(configured: Option<&Path>) -> Option<CMakeExecutable> {
    let path = match configured {
        Some(path) if path.is_file() => path.to_path_buf(),
        Some(path) => find_executable(&path.to_string_lossy())?,
        None => find_executable("cmake")?,
    };

    let version = detect_tool_version(&path, parse_cmake_version).ok();
    Some(CMakeExecutable { path, version })
}

/// Detect a tool's version by running it with --version and parsing the output.
pub fn detect_tool_version<F>(tool: &Path, version_parser: F) -> Result<semver::Version>
where
    F: FnOnce(&str) -> Option<semver::Version>,
{
    let output = ProcessBuilder::new(tool).arg("--version").exec_and_check()?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    version_parser(&stdout).ok_or_else(|| {
        anyhow::anyhow!(
            "could not parse {} version from output: {}",
            tool.display(),
            stdout
        )
    })
}

/// Parse "cmake version 3.20.5" (possibly followed by more lines).
pub fn parse_cmake_version(stdout: &str) -> Option<semver::Version> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("cmake version "))
        .and_then(parse_version_flexible)
}

/// Parse a version string, tolerating suffixes and missing components.
///
/// Handles versions like "3.20.5", "3.28.0-rc2" or "3.10".
pub fn parse_version_flexible(version_str: &str) -> Option<semver::Version> {
    let clean = version_str
        .trim()
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()
        .unwrap_or("");

    let mut parts = clean.split('.').map(|p| p.parse::<u64>().ok());
    let major = parts.next().flatten()?;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some(semver::Version::new(major, minor, patch))
}
