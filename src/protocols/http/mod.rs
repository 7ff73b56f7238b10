//! HTTP/1.1 protocol implementation.
//!
//! A restricted subset of HTTP/1.1: one request per connection, no
//! keep-alive, no chunked transfer encoding, no pipelining.
//!
//! ## Routes
//!
//! ```text
//! GET  /                -> 200, empty body
//! GET  /echo/{text}     -> 200, body = {text} as sent (not URL-decoded)
//! GET  /user-agent      -> 200, body = User-Agent header value
//! GET  /files/{name}    -> 200 + file bytes, or 404 when absent
//! POST /files/{name}    -> 201 after storing exactly Content-Length bytes
//! anything else         -> 404
//! ```
//!
//! Bodies of the echo, user-agent and file download routes are gzip
//! compressed when `Accept-Encoding` mentions `gzip`.
//!
//! ## Response Format
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain\r\n
//! Content-Encoding: gzip\r\n        (only when compressed)
//! Content-Length: 23\r\n
//! \r\n
//! <body>
//! ```

pub mod encoding;
pub mod handler;
pub mod parser;
pub mod response;
pub mod router;

pub use handler::handle_connection;
