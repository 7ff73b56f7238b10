//! HTTP/1.1 response building and serialization.
//!
//! A `Response` is finalized into a `Frame` (head bytes + body bytes)
//! once. Compression happens during finalization so that
//! `Content-Length` always describes the bytes actually sent.

use bytes::{Bytes, BytesMut};
use std::fmt;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use super::encoding::{self, ContentEncoding};

/// Response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    NotFound,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::NotFound => 404,
            Status::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// Response media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    TextPlain,
    OctetStream,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::TextPlain => "text/plain",
            ContentType::OctetStream => "application/octet-stream",
        }
    }
}

/// What to send when compressing the body fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFallback {
    /// Keep the status, send an empty identity-encoded body.
    EmptyBody,
    /// Replace the whole response with an empty 500.
    InternalError,
}

/// A response ready to be finalized and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: ContentType,
    pub encoding: ContentEncoding,
    pub body: Bytes,
    pub fallback: CompressionFallback,
}

impl Response {
    /// A `text/plain` response.
    pub fn text(status: Status, body: impl Into<Bytes>) -> Self {
        Response {
            status,
            content_type: ContentType::TextPlain,
            encoding: ContentEncoding::Identity,
            body: body.into(),
            fallback: CompressionFallback::EmptyBody,
        }
    }

    /// A `text/plain` response with no body.
    pub fn empty(status: Status) -> Self {
        Self::text(status, Bytes::new())
    }

    /// A successful file download.
    pub fn file(data: impl Into<Bytes>) -> Self {
        Response {
            status: Status::Ok,
            content_type: ContentType::OctetStream,
            encoding: ContentEncoding::Identity,
            body: data.into(),
            fallback: CompressionFallback::InternalError,
        }
    }

    pub fn with_encoding(mut self, encoding: ContentEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Apply the content encoding and render the head.
    pub fn finalize(self) -> Frame {
        self.finalize_with(encoding::gzip)
    }

    fn finalize_with<F>(self, compress: F) -> Frame
    where
        F: FnOnce(&[u8]) -> io::Result<Vec<u8>>,
    {
        let response = match self.encoding {
            ContentEncoding::Identity => self,
            ContentEncoding::Gzip => match compress(&self.body) {
                Ok(compressed) => Response {
                    body: Bytes::from(compressed),
                    ..self
                },
                Err(e) => {
                    warn!(error = %e, status = %self.status, "Error compressing response");
                    self.compression_failed()
                }
            },
        };

        let head = response.render_head();
        Frame {
            status: response.status,
            head,
            body: response.body,
        }
    }

    fn compression_failed(self) -> Response {
        match self.fallback {
            CompressionFallback::EmptyBody => Response {
                encoding: ContentEncoding::Identity,
                body: Bytes::new(),
                ..self
            },
            CompressionFallback::InternalError => Response::empty(Status::InternalServerError),
        }
    }

    /// Status line; Content-Type; Content-Encoding (when set); Content-Length; blank line.
    fn render_head(&self) -> BytesMut {
        let mut head = BytesMut::with_capacity(128);
        head.extend_from_slice(b"HTTP/1.1 ");
        head.extend_from_slice(self.status.to_string().as_bytes());
        head.extend_from_slice(b"\r\nContent-Type: ");
        head.extend_from_slice(self.content_type.as_str().as_bytes());
        head.extend_from_slice(b"\r\n");
        if let Some(value) = self.encoding.header_value() {
            head.extend_from_slice(b"Content-Encoding: ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }
        head.extend_from_slice(b"Content-Length: ");
        head.extend_from_slice(self.body.len().to_string().as_bytes());
        head.extend_from_slice(b"\r\n\r\n");
        head
    }

    /// Finalize and write onto `writer`. Returns the status actually sent.
    pub async fn write_to<W>(self, writer: &mut W) -> io::Result<Status>
    where
        W: AsyncWrite + Unpin,
    {
        self.finalize().write_to(writer).await
    }
}

/// A serialized response.
#[derive(Debug)]
pub struct Frame {
    pub status: Status,
    pub head: BytesMut,
    pub body: Bytes,
}

impl Frame {
    /// Write the head, then the body.
    pub async fn write_to<W>(&self, writer: &mut W) -> io::Result<Status>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.head).await?;
        if !self.body.is_empty() {
            writer.write_all(&self.body).await?;
        }
        writer.flush().await?;
        Ok(self.status)
    }
}
