//! STOMP 1.2 frames
//!
//! Only the commands used to follow a broker topic are modelled. Frames are
//! text: a command line, `name:value` header lines, a blank line, the body,
//! and a NUL terminator. A frame made of end-of-line characters alone is a
//! heart-beat.

use super::NotificationError;
use std::fmt;

/// Frame command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "CONNECT" | "STOMP" => Self::Connect,
            "CONNECTED" => Self::Connected,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            _ => return None,
        })
    }

    /// CONNECT and CONNECTED headers are sent unescaped
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A STOMP frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header; repeated headers keep their first occurrence
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Decode one frame; `Ok(None)` is a heart-beat
    pub fn decode(text: &str) -> Result<Option<Self>, NotificationError> {
        let text = text.trim_start_matches(['\r', '\n']);
        if text.is_empty() {
            return Ok(None);
        }

        let (head, body) = text
            .split_once("\n\n")
            .or_else(|| text.split_once("\r\n\r\n"))
            .ok_or_else(|| NotificationError::Frame("missing header terminator".into()))?;

        let mut lines = head.lines();
        let command_line = lines.next().unwrap_or_default().trim_end_matches('\r');
        let command = Command::parse(command_line)
            .ok_or_else(|| NotificationError::Frame(format!("unknown command {command_line:?}")))?;

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| NotificationError::Frame(format!("malformed header {line:?}")))?;
            if command.escapes_headers() {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let body = match body.find('\0') {
            Some(end) => &body[..end],
            None => body,
        };

        Ok(Some(Self {
            command,
            headers,
            body: body.to_string(),
        }))
    }
}

fn escape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_header(s: &str) -> Result<String, NotificationError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(NotificationError::Frame(format!(
                    "invalid header escape \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

/// Negotiated heart-beat intervals in milliseconds, zero meaning none
pub fn negotiate_heartbeat(client: (u64, u64), server: Option<&str>) -> (u64, u64) {
    let (server_send, server_recv) = server
        .and_then(|v| v.split_once(','))
        .and_then(|(a, b)| Some((a.trim().parse().ok()?, b.trim().parse().ok()?)))
        .unwrap_or((0, 0));
    let outgoing = if client.0 == 0 || server_recv == 0 {
        0
    } else {
        client.0.max(server_recv)
    };
    let incoming = if client.1 == 0 || server_send == 0 {
        0
    } else {
        client.1.max(server_send)
    };
    (outgoing, incoming)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_frame_decodes() {
        let raw = "MESSAGE\ndestination:/topic/albums\nsubscription:sub-0\nmessage-id:1\ncontent-type:application/json\n\n{\"type\":\"NEW_ALBUM\"}\0";
        let frame = Frame::decode(raw).unwrap().unwrap();
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.get("destination"), Some("/topic/albums"));
        assert_eq!(frame.body, "{\"type\":\"NEW_ALBUM\"}");
    }

    #[test]
    fn heartbeats_decode_to_nothing() {
        assert_eq!(Frame::decode("\n").unwrap(), None);
        assert_eq!(Frame::decode("\r\n").unwrap(), None);
    }

    #[test]
    fn subscribe_headers_are_escaped() {
        let frame = Frame::new(Command::Subscribe).header("id", "a:b");
        let encoded = frame.encode();
        assert!(encoded.starts_with("SUBSCRIBE\nid:a\\cb\n\n"));
        assert!(encoded.ends_with('\0'));
        assert_eq!(Frame::decode(&encoded).unwrap(), Some(frame));
    }

    #[test]
    fn connect_headers_are_sent_verbatim() {
        let encoded = Frame::new(Command::Connect)
            .header("Authorization", "Bearer a:b")
            .encode();
        assert!(encoded.contains("Authorization:Bearer a:b\n"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Frame::decode("BOGUS\n\n\0").is_err());
    }

    #[test]
    fn heartbeat_negotiation() {
        assert_eq!(negotiate_heartbeat((4000, 4000), Some("10000,10000")), (10000, 10000));
        assert_eq!(negotiate_heartbeat((4000, 4000), Some("0,0")), (0, 0));
        assert_eq!(negotiate_heartbeat((4000, 4000), None), (0, 0));
    }
}
