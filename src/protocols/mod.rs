//! Protocol implementations.
//!
//! Each protocol has a parser and a per-connection handler used by the
//! server's accept loop.
//!
//! - `http`: HTTP/1.1 with echo, user-agent and file storage routes

pub mod http;
