//! HTTP connection handler for the Tokio runtime.

use bytes::Bytes;
use chrono::Local;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, trace};

use super::encoding::ContentEncoding;
use super::parser::{self, Request};
use super::response::{Response, Status};
use super::router::Route;
use crate::storage::{FileStore, StoreError};

const ACCESS_LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle one HTTP connection: a single request and response, then close.
///
/// A request that cannot be parsed is dropped without a response.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    store: Arc<FileStore>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let request = match parser::parse(&mut reader).await {
        Ok(request) => request,
        Err(e) => {
            debug!(peer = %peer, error = %e, "Dropping malformed request");
            return Ok(());
        }
    };

    trace!(
        peer = %peer,
        method = %request.method,
        path = %request.path,
        version = %request.version,
        "Processing request"
    );

    let status = respond(&request, &mut reader, &mut writer, &store).await?;

    info!(
        timestamp = %Local::now().format(ACCESS_LOG_TIME_FORMAT),
        peer = %peer,
        method = %request.method,
        path = %request.path,
        status = %status,
        "Request handled"
    );

    Ok(())
}

/// Dispatch `request` and write the response. Returns the status sent.
pub async fn respond<R, W>(
    request: &Request,
    body: &mut R,
    writer: &mut W,
    store: &FileStore,
) -> io::Result<Status>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    dispatch(request, body, store).await.write_to(writer).await
}

/// Build the response for `request`. `body` is only read by file uploads.
pub async fn dispatch<R>(request: &Request, body: &mut R, store: &FileStore) -> Response
where
    R: AsyncRead + Unpin,
{
    let negotiated = ContentEncoding::negotiate(request.accept_encoding());

    match Route::resolve(&request.method, &request.path) {
        Route::Root => Response::empty(Status::Ok),

        Route::Echo(text) => Response::text(Status::Ok, Bytes::copy_from_slice(text.as_bytes()))
            .with_encoding(negotiated),

        Route::UserAgent => {
            let agent = request.user_agent().unwrap_or_default().to_string();
            Response::text(Status::Ok, agent).with_encoding(negotiated)
        }

        Route::FileGet(filename) => match store.read(filename).await {
            Ok(data) => Response::file(data).with_encoding(negotiated),
            Err(StoreError::NotFound(path)) => {
                debug!(path = %path.display(), "File not found");
                Response::empty(Status::NotFound)
            }
            Err(_) => Response::empty(Status::InternalServerError),
        },

        Route::FilePost(filename) => {
            match store.write(filename, body, request.content_length).await {
                Ok(()) => Response::empty(Status::Created),
                Err(_) => Response::empty(Status::InternalServerError),
            }
        }

        Route::NotFound => Response::empty(Status::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::http::response::ContentType;
    use flate2::read::GzDecoder;
    use std::io::Read;

    async fn parse_request(raw: &[u8]) -> (Request, Vec<u8>) {
        let mut input = raw;
        let request = parser::parse(&mut input).await.unwrap();
        (request, input.to_vec())
    }

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[tokio::test]
    async fn test_root_ignores_accept_encoding() {
        let store = FileStore::new(".");
        let (request, body) =
            parse_request(b"GET / HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n").await;

        let response = dispatch(&request, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.encoding, ContentEncoding::Identity);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_echo_is_raw() {
        let store = FileStore::new(".");
        let (request, body) = parse_request(b"GET /echo/hello%20there HTTP/1.1\r\n\r\n").await;

        let response = dispatch(&request, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.content_type, ContentType::TextPlain);
        assert_eq!(&response.body[..], b"hello%20there");
    }

    #[tokio::test]
    async fn test_echo_gzip_negotiated() {
        let store = FileStore::new(".");
        let (request, body) = parse_request(
            b"GET /echo/abc HTTP/1.1\r\nAccept-Encoding: deflate, gzip\r\n\r\n",
        )
        .await;

        let response = dispatch(&request, &mut &body[..], &store).await;
        assert_eq!(response.encoding, ContentEncoding::Gzip);

        let frame = response.finalize();
        assert_eq!(gunzip(&frame.body), b"abc");
    }

    #[tokio::test]
    async fn test_user_agent_reflected() {
        let store = FileStore::new(".");
        let (request, body) =
            parse_request(b"GET /user-agent HTTP/1.1\r\nUser-Agent: foobar/1.2.3\r\n\r\n").await;

        let response = dispatch(&request, &mut &body[..], &store).await;
        assert_eq!(&response.body[..], b"foobar/1.2.3");
    }

    #[tokio::test]
    async fn test_user_agent_missing_is_empty() {
        let store = FileStore::new(".");
        let (request, body) = parse_request(b"GET /user-agent HTTP/1.1\r\n\r\n").await;

        let response = dispatch(&request, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::Ok);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_file_post_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let (post, body) = parse_request(
            b"POST /files/report.txt HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world",
        )
        .await;
        let response = dispatch(&post, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::Created);

        let (get, body) = parse_request(b"GET /files/report.txt HTTP/1.1\r\n\r\n").await;
        let response = dispatch(&get, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.content_type, ContentType::OctetStream);
        assert_eq!(&response.body[..], b"hello world");
    }

    #[tokio::test]
    async fn test_file_post_short_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let (post, body) =
            parse_request(b"POST /files/x HTTP/1.1\r\nContent-Length: 50\r\n\r\nonly a bit").await;
        let response = dispatch(&post, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::InternalServerError);
    }

    #[tokio::test]
    async fn test_file_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let (request, body) = parse_request(b"GET /files/missing.txt HTTP/1.1\r\n\r\n").await;
        let response = dispatch(&request, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::NotFound);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_file_get_unreadable_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("folder")).unwrap();
        let store = FileStore::new(dir.path());

        let (request, body) = parse_request(b"GET /files/folder HTTP/1.1\r\n\r\n").await;
        let response = dispatch(&request, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::InternalServerError);
    }

    #[tokio::test]
    async fn test_file_other_method_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let (request, body) = parse_request(b"PUT /files/x HTTP/1.1\r\n\r\n").await;
        let response = dispatch(&request, &mut &body[..], &store).await;
        assert_eq!(response.status, Status::NotFound);
    }

    #[tokio::test]
    async fn test_respond_writes_full_response() {
        let store = FileStore::new(".");
        let (request, body) = parse_request(b"GET /unknown/path HTTP/1.1\r\n\r\n").await;

        let mut out = Vec::new();
        let status = respond(&request, &mut &body[..], &mut out, &store)
            .await
            .unwrap();

        assert_eq!(status, Status::NotFound);
        assert_eq!(
            out,
            b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 0\r\n\r\n"
        );
    }
}
