//! Route table.
//!
//! Every request maps to exactly one `Route`. Rules are checked top to
//! bottom and the first match wins:
//!
//! | Rule                                  | Route       |
//! |---------------------------------------|-------------|
//! | path is `/`                           | `Root`      |
//! | path starts with `/echo/`             | `Echo`      |
//! | path is `/user-agent`                 | `UserAgent` |
//! | `GET` and path starts with `/files/`  | `FileGet`   |
//! | `POST` and path starts with `/files/` | `FilePost`  |
//! | anything else                         | `NotFound`  |

const ECHO_PREFIX: &str = "/echo/";
const FILES_PREFIX: &str = "/files/";

/// A resolved route, borrowing any path parameter from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Health check
    Root,
    /// Echo the remainder of the path
    Echo(&'a str),
    /// Reflect the `User-Agent` header
    UserAgent,
    /// Download a stored file
    FileGet(&'a str),
    /// Upload a file
    FilePost(&'a str),
    NotFound,
}

impl<'a> Route<'a> {
    pub fn resolve(method: &str, path: &'a str) -> Self {
        if path == "/" {
            return Route::Root;
        }
        if let Some(text) = path.strip_prefix(ECHO_PREFIX) {
            return Route::Echo(text);
        }
        if path == "/user-agent" {
            return Route::UserAgent;
        }
        if let Some(filename) = path.strip_prefix(FILES_PREFIX) {
            match method {
                "GET" => return Route::FileGet(filename),
                "POST" => return Route::FilePost(filename),
                _ => {}
            }
        }
        Route::NotFound
    }
}
