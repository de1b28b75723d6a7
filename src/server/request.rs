//! Requests sent to the CMake server.

use serde::Serialize;
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};
use crate::server::message::{ProtocolVersion, ReplyKind};

/// Generates correlation cookies for one session.
///
/// Cookies are `<prefix>_<n>` with `n` strictly increasing from 1.
#[derive(Debug, Clone)]
pub struct CookieJar {
    prefix: String,
    counter: u64,
}

impl CookieJar {
    pub fn new(prefix: impl Into<String>) -> Self {
        CookieJar {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    /// Produce the next cookie.
    pub fn next_cookie(&mut self) -> String {
        self.counter += 1;
        format!("{}_{}", self.prefix, self.counter)
    }
}

impl Default for CookieJar {
    fn default() -> Self {
        CookieJar::new("bridge")
    }
}

/// Kind-specific request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestBody {
    #[serde(rename_all = "camelCase")]
    Handshake {
        source_directory: String,
        build_directory: String,
        generator: String,
        protocol_version: ProtocolVersion,
    },
    #[serde(rename_all = "camelCase")]
    Configure {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        cache_arguments: Vec<String>,
    },
    Compute,
    #[serde(rename = "cmakeInputs")]
    CMakeInputs,
    #[serde(rename = "codemodel")]
    CodeModel,
}

impl RequestBody {
    /// The reply kind expected for this request.
    pub fn reply_kind(&self) -> ReplyKind {
        match self {
            RequestBody::Handshake { .. } => ReplyKind::Handshake,
            RequestBody::Configure { .. } => ReplyKind::Configure,
            RequestBody::Compute => ReplyKind::Compute,
            RequestBody::CMakeInputs => ReplyKind::CMakeInputs,
            RequestBody::CodeModel => ReplyKind::CodeModel,
        }
    }

    pub fn handshake(
        source_directory: impl Into<String>,
        build_directory: impl Into<String>,
        generator: impl Into<String>,
        major: u32,
        minor: Option<u32>,
    ) -> Self {
        RequestBody::Handshake {
            source_directory: source_directory.into(),
            build_directory: build_directory.into(),
            generator: generator.into(),
            protocol_version: ProtocolVersion::new(major, minor),
        }
    }

    pub fn configure(cache_arguments: Vec<String>) -> Self {
        RequestBody::Configure { cache_arguments }
    }
}

/// A request with its correlation cookie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub cookie: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

impl Request {
    /// Create a request, taking the next cookie from `cookies`.
    pub fn new(cookies: &mut CookieJar, body: RequestBody) -> Self {
        Request {
            cookie: cookies.next_cookie(),
            body,
        }
    }

    pub fn to_json(&self) -> BridgeResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| BridgeError::protocol(format!("failed to encode request: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cookies_are_unique_and_increasing() {
        let mut jar = CookieJar::new("s");
        let cookies: Vec<String> = (0..50).map(|_| jar.next_cookie()).collect();

        let unique: std::collections::HashSet<_> = cookies.iter().collect();
        assert_eq!(unique.len(), cookies.len());
        assert_eq!(cookies[0], "s_1");
        assert_eq!(cookies[49], "s_50");
    }

    #[test]
    fn test_independent_jars() {
        let mut a = CookieJar::default();
        let mut b = CookieJar::default();
        a.next_cookie();
        assert_eq!(b.next_cookie(), "bridge_1");
        assert_eq!(a.next_cookie(), "bridge_2");
    }

    #[test]
    fn test_handshake_json() {
        let mut jar = CookieJar::new("t");
        let req = Request::new(
            &mut jar,
            RequestBody::handshake("/src", "/build", "Ninja", 1, None),
        );
        assert_eq!(
            req.to_json().unwrap(),
            json!({
                "type": "handshake",
                "cookie": "t_1",
                "sourceDirectory": "/src",
                "buildDirectory": "/build",
                "generator": "Ninja",
                "protocolVersion": {"major": 1}
            })
        );

        let req = Request::new(
            &mut jar,
            RequestBody::handshake("/src", "/build", "Ninja", 1, Some(2)),
        );
        assert_eq!(req.to_json().unwrap()["protocolVersion"], json!({"major": 1, "minor": 2}));
    }

    #[test]
    fn test_simple_request_json() {
        let mut jar = CookieJar::new("t");
        assert_eq!(
            Request::new(&mut jar, RequestBody::CMakeInputs).to_json().unwrap(),
            json!({"type": "cmakeInputs", "cookie": "t_1"})
        );
        assert_eq!(
            Request::new(&mut jar, RequestBody::CodeModel).to_json().unwrap(),
            json!({"type": "codemodel", "cookie": "t_2"})
        );
        assert_eq!(
            Request::new(&mut jar, RequestBody::configure(vec![])).to_json().unwrap(),
            json!({"type": "configure", "cookie": "t_3"})
        );
        assert_eq!(
            Request::new(&mut jar, RequestBody::configure(vec!["-DX=1".into()]))
                .to_json()
                .unwrap(),
            json!({"type": "configure", "cookie": "t_4", "cacheArguments": ["-DX=1"]})
        );
    }
}
