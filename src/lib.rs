//! This crate serves purely as an rest api abstraction for a download relay server.
//! Additionally there is a canonical server implementation in the same repository.
//!
//! The server accepts either a URL or an uploaded file, hands it to an external
//! command line tool as its single argument and relays what the tool printed.
//!
//! ## Usage
//! For the complete usage, see the serde structs in [`api`].
//! * `POST /download` takes a `multipart/form-data` body with an optional `file`
//!   part and an optional `url` field. A file always wins over a url.
//!   Responds with [`api::DownloadResponse`] or, for missing input, [`api::ErrorResponse`].
//! * `GET /health` returns `OK`.
//! * Every other path is served from the static asset directory.
//!
//! ## Long running jobs
//! There is no timeout on the tool invocation, the call just waits until the tool terminates.
//! Its output is buffered completely before the response is sent.
//!
//! ## Security
//! The api does not include any security measures. The submitted url is passed to the tool
//! unchecked (as a separate argument, never through a shell).
//! Make sure it is only reachable from trusted hosts.

pub mod api;
