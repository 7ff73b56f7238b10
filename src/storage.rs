//! File storage backing the `/files/` routes.
//!
//! Every file lives directly under a single root directory chosen at
//! startup. Filenames are joined onto the root verbatim; there is no
//! traversal protection and no locking, so concurrent writers to the same
//! name race and the last one to finish wins.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{trace, warn};

/// Errors produced by file storage operations
#[derive(Debug)]
pub enum StoreError {
    /// The requested file does not exist
    NotFound(PathBuf),
    /// Any other filesystem failure
    Io(PathBuf, io::Error),
    /// The upload stream ended before the declared length was copied
    ShortBody {
        path: PathBuf,
        expected: u64,
        copied: u64,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            StoreError::Io(path, e) => write!(f, "I/O error on '{}': {}", path.display(), e),
            StoreError::ShortBody {
                path,
                expected,
                copied,
            } => write!(
                f,
                "Short body for '{}': expected {} bytes, copied {}",
                path.display(),
                expected,
                copied
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// Directory-rooted file store
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is not created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a filename against the root directory.
    pub fn resolve(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Read the full contents of `filename`.
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(filename);

        match tokio::fs::read(&path).await {
            Ok(data) => {
                trace!(path = %path.display(), bytes = data.len(), "Read file");
                Ok(data)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(path)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error reading file");
                Err(StoreError::Io(path, e))
            }
        }
    }

    /// Create or truncate `filename` and copy exactly `length` bytes from `source` into it.
    ///
    /// The source is read no further than `length` bytes, so anything after
    /// the body stays in the stream.
    pub async fn write<R>(
        &self,
        filename: &str,
        source: &mut R,
        length: u64,
    ) -> Result<(), StoreError>
    where
        R: AsyncRead + Unpin,
    {
        let path = self.resolve(filename);

        let mut file = match File::create(&path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error creating file");
                return Err(StoreError::Io(path, e));
            }
        };

        let mut limited = source.take(length);
        let copied = match tokio::io::copy(&mut limited, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error writing to file");
                return Err(StoreError::Io(path, e));
            }
        };

        if copied < length {
            warn!(path = %path.display(), expected = length, copied, "Upload ended early");
            return Err(StoreError::ShortBody {
                path,
                expected: length,
                copied,
            });
        }

        if let Err(e) = file.flush().await {
            return Err(StoreError::Io(path, e));
        }

        trace!(path = %path.display(), bytes = copied, "Stored file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut body: &[u8] = b"hello world";
        store.write("report.txt", &mut body, 11).await.unwrap();

        let data = store.read("report.txt").await.unwrap();
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn test_read_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        match store.read("missing.txt").await {
            Err(StoreError::NotFound(path)) => assert_eq!(path, dir.path().join("missing.txt")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(store.read("sub").await, Err(StoreError::Io(..))));
    }

    #[tokio::test]
    async fn test_write_copies_only_declared_length() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut body: &[u8] = b"abcdefgh";
        store.write("part.bin", &mut body, 3).await.unwrap();

        assert_eq!(store.read("part.bin").await.unwrap(), b"abc");
        assert_eq!(body, b"defgh");
    }

    #[tokio::test]
    async fn test_write_short_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut body: &[u8] = b"abc";
        match store.write("short.bin", &mut body, 10).await {
            Err(StoreError::ShortBody {
                expected, copied, ..
            }) => {
                assert_eq!(expected, 10);
                assert_eq!(copied, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut first: &[u8] = b"first version";
        store.write("x", &mut first, 13).await.unwrap();
        let mut second: &[u8] = b"v2";
        store.write("x", &mut second, 2).await.unwrap();

        assert_eq!(store.read("x").await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_write_zero_length() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut body: &[u8] = b"";
        store.write("empty", &mut body, 0).await.unwrap();

        assert!(store.read("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nope"));

        let mut body: &[u8] = b"data";
        assert!(matches!(
            store.write("f", &mut body, 4).await,
            Err(StoreError::Io(..))
        ));
    }
}
