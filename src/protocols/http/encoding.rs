//! Content-encoding negotiation and gzip compression.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// Encoding applied to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    #[default]
    Identity,
    Gzip,
}

impl ContentEncoding {
    /// Pick an encoding from a raw `Accept-Encoding` value.
    ///
    /// Any occurrence of `gzip` selects gzip. Quality values and other
    /// codings are not considered.
    pub fn negotiate(accept_encoding: Option<&str>) -> Self {
        match accept_encoding {
            Some(value) if value.contains("gzip") => ContentEncoding::Gzip,
            _ => ContentEncoding::Identity,
        }
    }

    /// Value for the `Content-Encoding` header, if one is sent.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            ContentEncoding::Identity => None,
            ContentEncoding::Gzip => Some("gzip"),
        }
    }
}

/// Compress `data` into a gzip container at the default level.
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let buffer = Vec::with_capacity(data.len() / 2 + 32);
    let mut encoder = GzEncoder::new(buffer, Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
