//! CMake server session.
//!
//! [`ServerClient`] owns the `cmake -E server` child process and both ends of
//! its stdio pipes. Requests are strictly sequential: one request is written,
//! then messages are read until its reply (or error) arrives. Signals,
//! progress and log messages received in between are logged and dropped.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::Child;
use std::time::{Duration, Instant};

use crate::error::{BridgeError, BridgeResult};
use crate::server::codemodel::CodeModel;
use crate::server::framing::{read_message, write_message};
use crate::server::message::{CMakeInputs, Hello, Message, Reply, ReplyPayload};
use crate::server::request::{CookieJar, Request, RequestBody};
use crate::util::process::{find_cmake, ProcessBuilder};

/// Default time to wait for the server to exit after closing its pipes.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

const COOKIE_PREFIX: &str = "bridge";

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Started,
    Handshaking,
    Ready,
    Closed,
}

impl SessionState {
    fn is_live(&self) -> bool {
        matches!(
            self,
            SessionState::Started | SessionState::Handshaking | SessionState::Ready
        )
    }
}

/// Settings for launching the server.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Explicit CMake executable; looked up in PATH when unset.
    pub program: Option<PathBuf>,
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            program: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// A client session with a CMake server.
pub struct ServerClient {
    settings: ServerSettings,
    command: Option<ProcessBuilder>,
    state: SessionState,
    child: Option<Child>,
    reader: Option<Box<dyn BufRead + Send>>,
    writer: Option<Box<dyn Write + Send>>,
    cookies: CookieJar,
    hello: Option<Hello>,
}

impl ServerClient {
    pub fn new(settings: ServerSettings) -> Self {
        ServerClient {
            settings,
            command: None,
            state: SessionState::Unstarted,
            child: None,
            reader: None,
            writer: None,
            cookies: CookieJar::new(COOKIE_PREFIX),
            hello: None,
        }
    }

    /// Launch `command` instead of locating CMake.
    pub fn with_command(mut self, command: ProcessBuilder) -> Self {
        self.command = Some(command);
        self
    }

    /// A session over already-connected streams, with no child process.
    pub fn from_streams(
        reader: impl BufRead + Send + 'static,
        writer: impl Write + Send + 'static,
    ) -> Self {
        let mut client = ServerClient::new(ServerSettings::default());
        client.reader = Some(Box::new(reader));
        client.writer = Some(Box::new(writer));
        client.state = SessionState::Started;
        client
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The greeting received during the handshake.
    pub fn hello(&self) -> Option<&Hello> {
        self.hello.as_ref()
    }

    /// Build a request carrying this session's next cookie.
    pub fn request(&mut self, body: RequestBody) -> Request {
        Request::new(&mut self.cookies, body)
    }

    /// Spawn the server.
    pub fn startup(&mut self) -> BridgeResult<()> {
        if self.state.is_live() {
            return Err(BridgeError::AlreadyStarted);
        }

        let command = match &self.command {
            Some(command) => command.clone(),
            None => {
                let cmake = find_cmake(self.settings.program.as_deref()).ok_or_else(|| {
                    BridgeError::ToolNotFound {
                        tool: "cmake".to_string(),
                    }
                })?;
                tracing::debug!(
                    "Starting CMake server with {} version {}",
                    cmake.path.display(),
                    cmake
                        .version
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                ProcessBuilder::new(cmake.path).args(["-E", "server", "--experimental", "--debug"])
            }
        };

        let mut child = command.spawn_piped().map_err(|e| {
            BridgeError::ServerStartFailed(format!(
                "failed to spawn `{}`: {}",
                command.display_command(),
                e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::protocol("the CMake server has no stdin pipe"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::protocol("the CMake server has no stdout pipe"))?;

        self.reader = Some(Box::new(BufReader::new(stdout)));
        self.writer = Some(Box::new(stdin));
        self.child = Some(child);
        self.cookies = CookieJar::new(COOKIE_PREFIX);
        self.hello = None;
        self.state = SessionState::Started;
        Ok(())
    }

    /// Run `f` against a started server, shutting it down afterwards.
    ///
    /// The server is shut down on every exit path, including errors
    /// returned by `f`.
    pub fn connect<T, F>(&mut self, f: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut Self) -> BridgeResult<T>,
    {
        self.startup()?;
        let result = f(self);
        self.shutdown();
        result
    }

    /// Read and decode the next message.
    pub fn read_message(&mut self) -> BridgeResult<Message> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| BridgeError::protocol("not connected to a CMake server"))?;
        Message::decode(read_message(reader)?)
    }

    fn write_request(&mut self, request: &Request) -> BridgeResult<()> {
        let json = request.to_json()?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| BridgeError::protocol("not connected to a CMake server"))?;
        write_message(writer, &json)
    }

    /// Perform the protocol handshake.
    ///
    /// The server greets with an unsolicited `hello`; anything else first is a
    /// protocol error.
    pub fn do_handshake(
        &mut self,
        source_dir: &str,
        build_dir: &str,
        generator: &str,
        major: u32,
        minor: Option<u32>,
    ) -> BridgeResult<()> {
        if self.state != SessionState::Started {
            return Err(BridgeError::protocol(format!(
                "cannot handshake in state {:?}",
                self.state
            )));
        }
        self.state = SessionState::Handshaking;

        let result = self.exchange_handshake(source_dir, build_dir, generator, major, minor);
        self.state = match result {
            Ok(()) => SessionState::Ready,
            Err(_) => SessionState::Started,
        };
        result
    }

    fn exchange_handshake(
        &mut self,
        source_dir: &str,
        build_dir: &str,
        generator: &str,
        major: u32,
        minor: Option<u32>,
    ) -> BridgeResult<()> {
        let hello = match self.read_message()? {
            Message::Hello(hello) => hello,
            other => {
                return Err(BridgeError::protocol(format!(
                    "received an unexpected {} message instead of hello",
                    other.kind()
                )))
            }
        };

        if !hello.supports(major, minor) {
            tracing::warn!(
                "CMake server does not list protocol version {}.{}",
                major,
                minor.map(|m| m.to_string()).unwrap_or_else(|| "x".into())
            );
        }
        self.hello = Some(hello);

        let request = self.request(RequestBody::handshake(
            source_dir, build_dir, generator, major, minor,
        ));

        match self.query(&request)? {
            Message::Reply(Reply {
                payload: ReplyPayload::Handshake,
                ..
            }) => {
                tracing::info!("CMake server handshake SUCCEEDED");
                Ok(())
            }
            other => {
                other.log();
                tracing::info!("CMake server handshake FAILED");
                let reason = match other {
                    Message::Error { message, .. } => message,
                    Message::Reply(reply) => {
                        format!("unexpected reply to {}", reply.in_reply_to())
                    }
                    other => format!("unexpected {} message", other.kind()),
                };
                Err(BridgeError::HandshakeFailed(reason))
            }
        }
    }

    /// Send `request` and wait for its reply or error.
    pub fn query(&mut self, request: &Request) -> BridgeResult<Message> {
        if !matches!(self.state, SessionState::Handshaking | SessionState::Ready) {
            return Err(BridgeError::protocol(format!(
                "cannot send {} request in state {:?}",
                request.body.reply_kind(),
                self.state
            )));
        }

        self.write_request(request)?;

        loop {
            let message = self.read_message()?;
            let answers = matches!(message, Message::Reply(_) | Message::Error { .. });
            if answers && message.cookie() == request.cookie {
                return Ok(message);
            }
            message.log();
        }
    }

    /// Like [`query`](Self::query), but an error reply is fatal.
    pub fn query_checked(&mut self, request: &Request, label: &str) -> BridgeResult<Reply> {
        match self.query(request)? {
            Message::Reply(reply) => {
                if reply.in_reply_to() != request.body.reply_kind() {
                    return Err(BridgeError::protocol(format!(
                        "expected a reply to {}, got a reply to {}",
                        request.body.reply_kind(),
                        reply.in_reply_to()
                    )));
                }
                tracing::info!("{} SUCCEEDED", label);
                Ok(reply)
            }
            Message::Error { message, .. } => {
                tracing::info!("{} FAILED", label);
                tracing::error!("CMake server error: {}", message);
                Err(BridgeError::QueryFailed {
                    label: label.to_string(),
                    message,
                })
            }
            other => Err(BridgeError::protocol(format!(
                "unexpected {} message in reply",
                other.kind()
            ))),
        }
    }

    /// Re-run the configure step inside the server.
    pub fn configure(&mut self, cache_arguments: Vec<String>, label: &str) -> BridgeResult<()> {
        let request = self.request(RequestBody::configure(cache_arguments));
        self.query_checked(&request, label).map(|_| ())
    }

    /// Generate the build system.
    pub fn compute(&mut self, label: &str) -> BridgeResult<()> {
        let request = self.request(RequestBody::Compute);
        self.query_checked(&request, label).map(|_| ())
    }

    /// Fetch the files CMake read while configuring.
    pub fn cmake_inputs(&mut self, label: &str) -> BridgeResult<CMakeInputs> {
        let request = self.request(RequestBody::CMakeInputs);
        match self.query_checked(&request, label)?.payload {
            ReplyPayload::CMakeInputs(inputs) => {
                tracing::debug!("{} build files reported", inputs.build_files.len());
                Ok(inputs)
            }
            other => Err(BridgeError::protocol(format!(
                "unexpected reply to {}",
                other.kind()
            ))),
        }
    }

    /// Fetch the code model.
    pub fn code_model(&mut self, label: &str) -> BridgeResult<CodeModel> {
        let request = self.request(RequestBody::CodeModel);
        match self.query_checked(&request, label)?.payload {
            ReplyPayload::CodeModel(model) => Ok(model),
            other => Err(BridgeError::protocol(format!(
                "unexpected reply to {}",
                other.kind()
            ))),
        }
    }

    /// Close the connection and stop the server.
    ///
    /// Closing both pipes signals EOF to the server. If it has not exited
    /// within the shutdown timeout it is killed. Calling this on a session
    /// that is not running does nothing.
    pub fn shutdown(&mut self) {
        if !self.state.is_live() {
            return;
        }

        tracing::debug!("Shutting down the CMake server");

        self.writer = None;
        self.reader = None;

        if let Some(mut child) = self.child.take() {
            let deadline = Instant::now() + self.settings.shutdown_timeout;
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        tracing::debug!("CMake server exited with {}", status);
                        break;
                    }
                    Ok(None) if Instant::now() < deadline => {
                        std::thread::sleep(Duration::from_millis(20));
                    }
                    Ok(None) | Err(_) => {
                        tracing::debug!("CMake server did not exit in time, terminating it");
                        if let Err(e) = child.kill() {
                            tracing::warn!("failed to terminate the CMake server: {}", e);
                        }
                        match child.wait() {
                            Ok(status) => tracing::debug!("CMake server exited with {}", status),
                            Err(e) => tracing::warn!("failed to reap the CMake server: {}", e),
                        }
                        break;
                    }
                }
            }
        }

        self.state = SessionState::Closed;
    }
}

impl Drop for ServerClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
