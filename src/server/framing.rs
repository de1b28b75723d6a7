//! Message framing for the CMake server protocol.
//!
//! Every message is one JSON document wrapped between two sentinel lines:
//!
//! ```text
//! [== "CMake Server" ==[
//! {"type": "hello", ...}
//! ]== "CMake Server" ==]
//! ```
//!
//! The sentinels never occur inside payloads used by this protocol.

use std::io::{BufRead, Write};

use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};

/// Line opening a message.
pub const BEGIN_SENTINEL: &str = "[== \"CMake Server\" ==[";

/// Line closing a message.
pub const END_SENTINEL: &str = "]== \"CMake Server\" ==]";

/// Read one framed JSON document from `reader`.
///
/// Lines before the begin sentinel are skipped. Fails if the stream ends
/// before a complete frame has been read.
pub fn read_message<R: BufRead + ?Sized>(reader: &mut R) -> BridgeResult<Value> {
    let mut body: Vec<String> = Vec::new();
    let mut in_frame = false;
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| BridgeError::protocol(format!("failed to read from the CMake server: {}", e)))?;

        if read == 0 {
            let what = if in_frame {
                "stream closed before the end of a message"
            } else {
                "stream closed before a message was received"
            };
            return Err(BridgeError::protocol(what));
        }

        let trimmed = line.trim();
        if in_frame {
            if trimmed == END_SENTINEL {
                break;
            }
            body.push(line.trim_end_matches(['\r', '\n']).to_string());
        } else if trimmed == BEGIN_SENTINEL {
            in_frame = true;
        }
    }

    if body.iter().all(|l| l.trim().is_empty()) {
        return Err(BridgeError::protocol("received an empty message"));
    }

    serde_json::from_str(&body.join("\n"))
        .map_err(|e| BridgeError::protocol(format!("message is not valid JSON: {}", e)))
}

/// Write one framed JSON document to `writer` and flush it.
pub fn write_message<W: Write + ?Sized>(writer: &mut W, message: &Value) -> BridgeResult<()> {
    let json = serde_json::to_string_pretty(message)
        .map_err(|e| BridgeError::protocol(format!("failed to encode message: {}", e)))?;

    let frame = format!("\n{}\n{}\n{}\n", BEGIN_SENTINEL, json, END_SENTINEL);
    writer
        .write_all(frame.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| BridgeError::protocol(format!("failed to write to the CMake server: {}", e)))
}
