//! Test utilities for unit tests.
//!
//! Provides a scripted in-memory CMake server and code-model fixture
//! builders, so the session and the converter can be exercised without a
//! CMake installation.

pub mod fixtures;

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::server::client::ServerClient;
use crate::server::framing::{read_message, BEGIN_SENTINEL, END_SENTINEL};

pub use fixtures::*;

/// Wrap a JSON value in server framing.
pub fn frame(value: Value) -> String {
    format!(
        "{}\n{}\n{}\n",
        BEGIN_SENTINEL,
        serde_json::to_string_pretty(&value).unwrap(),
        END_SENTINEL
    )
}

/// A framed `hello` offering the given `(major, minor)` versions.
pub fn hello_frame(versions: &[(u32, u32)]) -> String {
    let versions: Vec<Value> = versions
        .iter()
        .map(|(major, minor)| json!({"major": major, "minor": minor}))
        .collect();
    frame(json!({"type": "hello", "supportedProtocolVersions": versions}))
}

/// A write sink whose contents stay observable after it is moved.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    /// Decode every framed message written so far.
    pub fn messages(&self) -> Vec<Value> {
        let mut cursor = Cursor::new(self.contents());
        let mut out = Vec::new();
        while let Ok(value) = read_message(&mut cursor) {
            out.push(value);
        }
        out
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Canned server output, replayed in order regardless of what is sent.
#[derive(Debug, Default)]
pub struct ScriptedServer {
    output: String,
    written: SharedBuffer,
}

impl ScriptedServer {
    pub fn new() -> Self {
        ScriptedServer::default()
    }

    /// Append raw server output.
    pub fn push(mut self, chunk: impl AsRef<str>) -> Self {
        self.output.push_str(chunk.as_ref());
        self
    }

    /// Handle to everything the client writes.
    pub fn written(&self) -> SharedBuffer {
        self.written.clone()
    }

    /// A started client reading this script.
    pub fn client(self) -> ServerClient {
        ServerClient::from_streams(Cursor::new(self.output.into_bytes()), self.written)
    }
}
