//! # healthz
//!
//! Liveness and readiness endpoints for a process, built from named checks.
//!
//! Subsystems contribute checks (is the cache synced, is the API server
//! reachable); healthz runs them per request and answers with one status:
//!
//! - `GET /healthz` runs every check. `200 ok` when all pass, otherwise
//!   `500` and one line per check. The failure cause stays in the log.
//! - `GET /healthz?verbose` lists every check even when all pass.
//! - `GET /healthz?exclude=cache` skips `cache` for this request.
//! - `GET /healthz/cache` runs just `cache` and shows its error, if any.
//!
//! Checks are assembled once into an immutable [`Checks`] registry before
//! the server starts; after that they are only read.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use healthz::{CheckError, Checks, Healthz, Request, Router, Server};
//!
//! fn cache_synced(_req: &Request) -> Result<(), CheckError> {
//!     Err("informer cache not synced".into())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), healthz::Error> {
//!     let checks = Checks::builder()
//!         .check("cache", cache_synced)
//!         .build()?;
//!
//!     let app = Router::new()
//!         .healthz("/healthz", Healthz::new(Checks::builder().build()?))
//!         .healthz("/readyz", Healthz::named("readyz", checks));
//!
//!     Server::bind("0.0.0.0:8081")?.serve(app).await
//! }
//! ```

mod checks;
mod error;
mod healthz;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub use checks::{CheckError, Checker, Checks, ChecksBuilder, Ping};
pub use error::Error;
pub use healthz::{CheckOutcome, Evaluation, Healthz, PING};
pub use request::Request;
pub use response::{Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
