//! Messages received from the CMake server.
//!
//! Raw JSON documents are decoded into [`Message`], a sum type over the
//! message kinds the protocol defines. Every kind has a fixed set of required
//! fields; a missing field or an unknown kind is a protocol error.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};
use crate::server::codemodel::CodeModel;

/// Kind of a server message, taken from its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Error,
    Hello,
    Message,
    Progress,
    Reply,
    Signal,
}

impl MessageKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "error" => Some(MessageKind::Error),
            "hello" => Some(MessageKind::Hello),
            "message" => Some(MessageKind::Message),
            "progress" => Some(MessageKind::Progress),
            "reply" => Some(MessageKind::Reply),
            "signal" => Some(MessageKind::Signal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Error => "error",
            MessageKind::Hello => "hello",
            MessageKind::Message => "message",
            MessageKind::Progress => "progress",
            MessageKind::Reply => "reply",
            MessageKind::Signal => "signal",
        }
    }

    /// Fields that must be present on a message of this kind.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            MessageKind::Error => &["cookie", "errorMessage"],
            MessageKind::Hello => &["supportedProtocolVersions"],
            MessageKind::Message => &["cookie", "message"],
            MessageKind::Progress => &["cookie"],
            MessageKind::Reply => &["cookie", "inReplyTo"],
            MessageKind::Signal => &["cookie", "name"],
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request kind a reply answers, taken from its `inReplyTo` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    Handshake,
    Configure,
    Compute,
    CMakeInputs,
    CodeModel,
}

impl ReplyKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "handshake" => Some(ReplyKind::Handshake),
            "configure" => Some(ReplyKind::Configure),
            "compute" => Some(ReplyKind::Compute),
            "cmakeInputs" => Some(ReplyKind::CMakeInputs),
            "codemodel" => Some(ReplyKind::CodeModel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyKind::Handshake => "handshake",
            ReplyKind::Configure => "configure",
            ReplyKind::Compute => "compute",
            ReplyKind::CMakeInputs => "cmakeInputs",
            ReplyKind::CodeModel => "codemodel",
        }
    }

    /// Payload fields that must be present on a reply of this kind.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ReplyKind::Handshake | ReplyKind::Configure | ReplyKind::Compute => &[],
            ReplyKind::CMakeInputs => &["buildFiles", "cmakeRootDirectory", "sourceDirectory"],
            ReplyKind::CodeModel => &["configurations"],
        }
    }
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol version offered by the server or requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolVersion {
    pub major: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u32>,
    #[serde(default, skip_serializing)]
    pub is_experimental: bool,
}

impl ProtocolVersion {
    pub fn new(major: u32, minor: Option<u32>) -> Self {
        ProtocolVersion {
            major,
            minor,
            is_experimental: false,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

/// The unsolicited greeting sent by the server on startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub supported_protocol_versions: Vec<ProtocolVersion>,
}

impl Hello {
    /// Whether the server offers `major` (and `minor`, when given).
    pub fn supports(&self, major: u32, minor: Option<u32>) -> bool {
        self.supported_protocol_versions
            .iter()
            .any(|v| v.major == major && (minor.is_none() || v.minor == minor))
    }
}

/// Progress notification for a pending request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub cookie: String,
    #[serde(default)]
    pub progress_message: Option<String>,
    #[serde(default)]
    pub progress_minimum: Option<i64>,
    #[serde(default)]
    pub progress_current: Option<i64>,
    #[serde(default)]
    pub progress_maximum: Option<i64>,
}

/// One CMake input file reported by the `cmakeInputs` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFile {
    pub file: String,
    pub is_cmake: bool,
    pub is_temporary: bool,
}

/// Payload of a `cmakeInputs` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CMakeInputs {
    pub cmake_root: String,
    pub source_dir: String,
    pub build_files: Vec<BuildFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBuildFileGroup {
    #[serde(rename = "isCMake")]
    is_cmake: bool,
    is_temporary: bool,
    sources: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCMakeInputs {
    build_files: Vec<RawBuildFileGroup>,
    cmake_root_directory: String,
    source_directory: String,
}

impl From<RawCMakeInputs> for CMakeInputs {
    fn from(raw: RawCMakeInputs) -> Self {
        let build_files = raw
            .build_files
            .into_iter()
            .flat_map(|group| {
                let (is_cmake, is_temporary) = (group.is_cmake, group.is_temporary);
                group.sources.into_iter().map(move |file| BuildFile {
                    file,
                    is_cmake,
                    is_temporary,
                })
            })
            .collect();

        CMakeInputs {
            cmake_root: raw.cmake_root_directory,
            source_dir: raw.source_directory,
            build_files,
        }
    }
}

/// Kind-specific reply payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
    Handshake,
    Configure,
    Compute,
    CMakeInputs(CMakeInputs),
    CodeModel(CodeModel),
}

impl ReplyPayload {
    pub fn kind(&self) -> ReplyKind {
        match self {
            ReplyPayload::Handshake => ReplyKind::Handshake,
            ReplyPayload::Configure => ReplyKind::Configure,
            ReplyPayload::Compute => ReplyKind::Compute,
            ReplyPayload::CMakeInputs(_) => ReplyKind::CMakeInputs,
            ReplyPayload::CodeModel(_) => ReplyKind::CodeModel,
        }
    }
}

/// A reply to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub cookie: String,
    pub payload: ReplyPayload,
}

impl Reply {
    pub fn in_reply_to(&self) -> ReplyKind {
        self.payload.kind()
    }
}

/// A decoded server message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Error { cookie: String, message: String },
    Hello(Hello),
    Message { cookie: String, message: String },
    Progress(Progress),
    Reply(Reply),
    Signal { cookie: String, name: String },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Error { .. } => MessageKind::Error,
            Message::Hello(_) => MessageKind::Hello,
            Message::Message { .. } => MessageKind::Message,
            Message::Progress(_) => MessageKind::Progress,
            Message::Reply(_) => MessageKind::Reply,
            Message::Signal { .. } => MessageKind::Signal,
        }
    }

    /// Correlation cookie; empty for `hello`.
    pub fn cookie(&self) -> &str {
        match self {
            Message::Hello(_) => "",
            Message::Error { cookie, .. }
            | Message::Message { cookie, .. }
            | Message::Signal { cookie, .. } => cookie,
            Message::Progress(p) => &p.cookie,
            Message::Reply(r) => &r.cookie,
        }
    }

    /// Decode a raw JSON document.
    pub fn decode(raw: Value) -> BridgeResult<Message> {
        let type_name = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::protocol("the \"type\" attribute is missing from the message"))?;

        let kind = MessageKind::parse(type_name).ok_or_else(|| {
            BridgeError::protocol(format!("received unknown message type \"{}\"", type_name))
        })?;

        require_fields(&raw, kind.required_fields(), kind.as_str())?;

        Ok(match kind {
            MessageKind::Error => Message::Error {
                cookie: string_field(&raw, "cookie")?,
                message: string_field(&raw, "errorMessage")?,
            },
            MessageKind::Hello => Message::Hello(from_value(raw, "hello")?),
            MessageKind::Message => Message::Message {
                cookie: string_field(&raw, "cookie")?,
                message: string_field(&raw, "message")?,
            },
            MessageKind::Progress => Message::Progress(from_value(raw, "progress")?),
            MessageKind::Reply => Message::Reply(decode_reply(raw)?),
            MessageKind::Signal => Message::Signal {
                cookie: string_field(&raw, "cookie")?,
                name: string_field(&raw, "name")?,
            },
        })
    }

    /// Log this message as an out-of-band notification.
    pub fn log(&self) {
        match self {
            Message::Error { message, .. } => tracing::error!("CMake server error: {}", message),
            Message::Hello(hello) => {
                let versions: Vec<String> = hello
                    .supported_protocol_versions
                    .iter()
                    .map(|v| v.to_string())
                    .collect();
                tracing::debug!("CMake server hello, protocol versions: {}", versions.join(", "));
            }
            Message::Message { message, .. } => tracing::debug!("CMake: {}", message),
            Message::Progress(p) => tracing::trace!(
                "CMake progress: {} ({:?}/{:?})",
                p.progress_message.as_deref().unwrap_or(""),
                p.progress_current,
                p.progress_maximum
            ),
            Message::Reply(reply) => match &reply.payload {
                ReplyPayload::CMakeInputs(inputs) => {
                    tracing::info!("CMake root: {}", inputs.cmake_root);
                    tracing::info!("Source dir: {}", inputs.source_dir);
                    tracing::info!("Build files: {}", inputs.build_files.len());
                    for file in &inputs.build_files {
                        tracing::debug!(
                            "  {}; cmake={}; temp={}",
                            file.file,
                            file.is_cmake,
                            file.is_temporary
                        );
                    }
                }
                other => tracing::debug!("CMake server reply to {}", other.kind()),
            },
            Message::Signal { name, .. } => tracing::info!("CMake signal: {}", name),
        }
    }
}

fn decode_reply(raw: Value) -> BridgeResult<Reply> {
    let cookie = string_field(&raw, "cookie")?;
    let in_reply_to = string_field(&raw, "inReplyTo")?;
    let kind = ReplyKind::parse(&in_reply_to).ok_or_else(|| {
        BridgeError::protocol(format!("received unknown reply type \"{}\"", in_reply_to))
    })?;

    require_fields(&raw, kind.required_fields(), &format!("reply to {}", kind))?;

    let payload = match kind {
        ReplyKind::Handshake => ReplyPayload::Handshake,
        ReplyKind::Configure => ReplyPayload::Configure,
        ReplyKind::Compute => ReplyPayload::Compute,
        ReplyKind::CMakeInputs => {
            let inputs: RawCMakeInputs = from_value(raw, "cmakeInputs reply")?;
            ReplyPayload::CMakeInputs(inputs.into())
        }
        ReplyKind::CodeModel => ReplyPayload::CodeModel(from_value(raw, "codemodel reply")?),
    };

    Ok(Reply { cookie, payload })
}

fn require_fields(raw: &Value, fields: &[&str], what: &str) -> BridgeResult<()> {
    for field in fields {
        if raw.get(field).is_none() {
            return Err(BridgeError::protocol(format!(
                "key \"{}\" is missing from CMake server message type {}",
                field, what
            )));
        }
    }
    Ok(())
}

fn string_field(raw: &Value, field: &str) -> BridgeResult<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BridgeError::protocol(format!("key \"{}\" is not a string", field)))
}

fn from_value<T: DeserializeOwned>(raw: Value, what: &str) -> BridgeResult<T> {
    serde_json::from_value(raw)
        .map_err(|e| BridgeError::protocol(format!("malformed {}: {}", what, e)))
}
