//! Client for the officer chat backend.
//!
//! `POST {base}/chat` with `{message, session_id?, language}` returns
//! `{reply, session_id, provider}`; `GET {base}/` is a health check and
//! `POST {base}/reset` clears the server-side conversation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ChatConfig;
use crate::error::{AvatarError, Result};
use crate::voice::Language;

const UNREACHABLE: &str = "Unable to connect. Please ensure the server is running";

/// Request body for `/chat`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    pub language: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub officer: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResetRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Blocking chat client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base: Url,
    session_id: Option<String>,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let mut base = Url::parse(&config.base_url)
            .map_err(|e| {
                AvatarError::Config(format!("invalid chat base_url '{}': {e}", config.base_url))
            })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("holo-avatar/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AvatarError::Chat(format!("client error: {e}")))?;
        Ok(Self {
            base,
            session_id: config.session_id.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn set_session_id(&mut self, id: Option<String>) {
        self.session_id = id;
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| AvatarError::Config(format!("bad endpoint {path}: {e}")))
    }

    /// Send one message. Blank messages are rejected without a request.
    pub fn send(&self, message: &str, language: Language) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AvatarError::EmptyMessage);
        }
        let body = ChatRequest {
            message,
            session_id: self.session_id.as_deref(),
            language: language.code(),
        };
        let response = self
            .client
            .post(self.endpoint("chat")?)
            .json(&body)
            .send()
            .map_err(|e| AvatarError::Chat(format!("request failed: {e}")))?;
        decode(response)
    }

    /// `GET {base}/`: backend status, officer name and active provider.
    pub fn health(&self) -> Result<Health> {
        let response = self
            .client
            .get(self.base.clone())
            .send()
            .map_err(|e| AvatarError::Chat(format!("request failed: {e}")))?;
        decode(response)
    }

    /// Clear the server-side history for this session.
    pub fn reset(&self) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("reset")?)
            .json(&ResetRequest {
                session_id: self.session_id.as_deref(),
            })
            .send()
            .map_err(|e| AvatarError::Chat(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AvatarError::Chat(format!("HTTP {status}")));
        }
        Ok(())
    }

    /// Line shown and spoken when the backend cannot be reached.
    pub fn fallback_reply(&self) -> String {
        let host = self.base.host_str().unwrap_or("localhost");
        let host = if host == "127.0.0.1" { "localhost" } else { host };
        match self.base.port_or_known_default() {
            Some(port) => format!("{UNREACHABLE} at {host}:{port}."),
            None => format!("{UNREACHABLE} at {host}."),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T> {
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| AvatarError::Chat(format!("failed to read body: {e}")))?;
    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        return Err(AvatarError::Chat(format!("HTTP {status}: {detail}")));
    }
    serde_json::from_str(&text).map_err(|e| AvatarError::Chat(format!("bad response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    fn config(base: &str) -> ChatConfig {
        ChatConfig {
            base_url: base.to_string(),
            timeout_seconds: 5,
            session_id: None,
        }
    }

    /// Answer a single HTTP request with `status` and `body`, handing the
    /// raw request back through the channel.
    fn one_shot_server(
        status: &'static str,
        body: &'static str,
    ) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let len = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + len {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(String::from_utf8_lossy(&buf).to_string()).unwrap();
        });
        (format!("http://{addr}"), rx)
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            message: "Pension status",
            session_id: None,
            language: "hi-IN",
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, serde_json::json!({"message": "Pension status", "language": "hi-IN"}));

        let with_session = ChatRequest {
            session_id: Some("abc123"),
            ..body
        };
        assert_eq!(serde_json::to_value(&with_session).unwrap()["session_id"], "abc123");
    }

    #[test]
    fn reply_parses_with_optional_fields() {
        let r: ChatReply = serde_json::from_str(r#"{"reply":"Visit the NSP portal."}"#).unwrap();
        assert_eq!(r.reply, "Visit the NSP portal.");
        assert_eq!(r.session_id, None);
        let r: ChatReply =
            serde_json::from_str(r#"{"reply":"ok","session_id":"s1","provider":"anthropic"}"#)
                .unwrap();
        assert_eq!(r.provider.as_deref(), Some("anthropic"));
    }

    #[test]
    fn blank_message_is_rejected_locally() {
        let client = ChatClient::new(&config("http://127.0.0.1:5000")).unwrap();
        assert!(matches!(client.send("   ", Language::English), Err(AvatarError::EmptyMessage)));
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        assert!(matches!(ChatClient::new(&config("not a url")), Err(AvatarError::Config(_))));
    }

    #[test]
    fn endpoints_join_under_base_path() {
        let client = ChatClient::new(&config("http://example.org/api")).unwrap();
        assert_eq!(client.endpoint("chat").unwrap().as_str(), "http://example.org/api/chat");
    }

    #[test]
    fn fallback_names_the_server() {
        let client = ChatClient::new(&config("http://127.0.0.1:5000")).unwrap();
        assert_eq!(
            client.fallback_reply(),
            "Unable to connect. Please ensure the server is running at localhost:5000."
        );
    }

    #[test]
    fn send_posts_json_and_reads_reply() {
        let (base, rx) = one_shot_server(
            "200 OK",
            r#"{"reply":"Apply on scholarships.gov.in","session_id":"default"}"#,
        );
        let client = ChatClient::new(&config(&base)).unwrap();
        let reply = client.send("  Scholarship apply ", Language::Tamil).unwrap();
        assert_eq!(reply.reply, "Apply on scholarships.gov.in");
        assert_eq!(reply.session_id.as_deref(), Some("default"));

        let request = rx.recv().unwrap();
        assert!(request.starts_with("POST /chat "));
        assert!(request.contains(r#""message":"Scholarship apply""#));
        assert!(request.contains(r#""language":"ta-IN""#));
    }

    #[test]
    fn health_reads_backend_status() {
        let (base, rx) = one_shot_server(
            "200 OK",
            r#"{"status":"online","officer":"Rajiv Sharma IAS","provider":"groq"}"#,
        );
        let client = ChatClient::new(&config(&base)).unwrap();
        let health = client.health().unwrap();
        assert_eq!(health.status, "online");
        assert_eq!(health.provider.as_deref(), Some("groq"));
        assert_eq!(health.version, None);
        assert!(rx.recv().unwrap().starts_with("GET / "));
    }

    #[test]
    fn server_error_surfaces_message() {
        let (base, _rx) = one_shot_server("400 Bad Request", r#"{"error":"Empty message"}"#);
        let client = ChatClient::new(&config(&base)).unwrap();
        match client.send("hi", Language::English) {
            Err(AvatarError::Chat(msg)) => assert!(msg.contains("Empty message"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unreachable_server_is_a_chat_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = ChatClient::new(&config(&format!("http://{addr}"))).unwrap();
        assert!(matches!(client.send("hello", Language::English), Err(AvatarError::Chat(_))));
    }
}
