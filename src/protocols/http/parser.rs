//! HTTP/1.1 request parser.
//!
//! Reads the request line and header block from a buffered stream. The
//! body is left unread; callers that need it read exactly
//! `content_length` bytes from the same stream afterwards.

use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Method token, e.g. `GET`.
    pub method: String,
    /// Request target as sent, starting with `/`.
    pub path: String,
    /// Protocol version token. Not validated.
    pub version: String,
    /// Header map keyed by exact header name; the last duplicate wins.
    pub headers: HashMap<String, String>,
    /// Declared body length, 0 when absent or not a number.
    pub content_length: u64,
}

impl Request {
    /// Look up a header by its exact (case-sensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Raw `Accept-Encoding` value, if sent.
    pub fn accept_encoding(&self) -> Option<&str> {
        self.header("Accept-Encoding")
    }

    /// `User-Agent` value, if sent.
    pub fn user_agent(&self) -> Option<&str> {
        self.header("User-Agent")
    }
}

/// Request parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Stream ended before the request line was terminated, or it was not
    /// `method path version`
    MalformedRequestLine,
    /// Stream ended or failed inside the header block
    MalformedHeaders,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MalformedRequestLine => write!(f, "Malformed request line"),
            ParseError::MalformedHeaders => write!(f, "Malformed headers"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a request head from `reader`.
pub async fn parse<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::with_capacity(256);

    if !read_line(reader, &mut line).await {
        return Err(ParseError::MalformedRequestLine);
    }
    let (method, path, version) =
        parse_request_line(&line).ok_or(ParseError::MalformedRequestLine)?;

    let mut headers = HashMap::new();
    let mut content_length = 0;

    loop {
        line.clear();
        if !read_line(reader, &mut line).await {
            return Err(ParseError::MalformedHeaders);
        }

        // Non-UTF-8 header lines are skipped like separator-less ones
        let text = match std::str::from_utf8(&line) {
            Ok(text) => text.trim(),
            Err(_) => continue,
        };
        if text.is_empty() {
            break;
        }

        if let Some((name, value)) = text.split_once(": ") {
            if name == "Content-Length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.insert(name.to_string(), value.to_string());
        }
    }

    Ok(Request {
        method,
        path,
        version,
        headers,
        content_length,
    })
}

/// Read one `\n`-terminated line into `buf`. Returns false on EOF before
/// the terminator or on a read error.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> bool
where
    R: AsyncBufRead + Unpin,
{
    match reader.read_until(b'\n', buf).await {
        Ok(_) => buf.last() == Some(&b'\n'),
        Err(_) => false,
    }
}

/// Split a request line into exactly three whitespace-separated tokens.
fn parse_request_line(line: &[u8]) -> Option<(String, String, String)> {
    let text = std::str::from_utf8(line).ok()?;
    let mut parts = text.split_whitespace();

    let method = parts.next()?;
    let path = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    Some((method.to_string(), path.to_string(), version.to_string()))
}
