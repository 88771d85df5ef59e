//! Liveness and readiness probes for a pretend controller.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example probes
//!
//! Try:
//!   curl -i  http://localhost:8081/healthz
//!   curl -i 'http://localhost:8081/readyz?verbose'
//!   curl -i 'http://localhost:8081/readyz?exclude=cache'
//!   curl -i  http://localhost:8081/readyz/cache
//!
//! The bind address comes from `HEALTHZ_ADDR` (default `0.0.0.0:8081`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use healthz::{CheckError, Checks, Healthz, Ping, Request, Router, Server};

#[tokio::main]
async fn main() -> Result<(), healthz::Error> {
    tracing_subscriber::fmt::init();

    // Flips to true a few seconds after start, like an informer cache.
    let synced = Arc::new(AtomicBool::new(false));
    tokio::spawn({
        let synced = Arc::clone(&synced);
        async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            synced.store(true, Ordering::Release);
        }
    });

    let readiness = Checks::builder()
        .check("ping", Ping)
        .check("cache", move |_: &Request| -> Result<(), CheckError> {
            if synced.load(Ordering::Acquire) {
                Ok(())
            } else {
                Err("informer cache not synced".into())
            }
        })
        .check("api-server", api_server_reachable)
        .build()?;

    let app = Router::new()
        .healthz("/healthz", Healthz::new(Checks::builder().build()?))
        .healthz("/readyz", Healthz::named("readyz", readiness));

    let addr = std::env::var("HEALTHZ_ADDR").unwrap_or_else(|_| "0.0.0.0:8081".to_owned());
    Server::bind(&addr)?.serve(app).await
}

fn api_server_reachable(req: &Request) -> Result<(), CheckError> {
    // Probes may carry a header telling the check to fail, for trying out
    // the single-check endpoint.
    match req.header("x-fail-api-server") {
        Some(reason) => Err(format!("api server unreachable: {reason}").into()),
        None => Ok(()),
    }
}
