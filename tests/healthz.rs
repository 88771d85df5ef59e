//! Aggregate and single-check behavior through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use healthz::{CheckError, Checker, Checks, Healthz, Request, Status};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn get(uri: &str) -> Request {
    Request::from(http::Request::get(uri).body(()).unwrap())
}

fn ok(_: &Request) -> Result<(), CheckError> {
    Ok(())
}

fn fail(cause: &'static str) -> impl Checker {
    move |_: &Request| -> Result<(), CheckError> { Err(cause.into()) }
}

/// A check that panics when run, to prove exclusion skips it.
fn must_not_run(_: &Request) -> Result<(), CheckError> {
    panic!("excluded check was invoked");
}

#[test]
fn authz_cache_example() {
    init_tracing();
    let h = Healthz::new(
        Checks::builder()
            .check("cache", ok)
            .check("authz", fail("denied"))
            .build()
            .unwrap(),
    );

    let res = h.handle(&get("/?verbose=true"));
    assert_eq!(res.status_code(), Status::InternalServerError);
    assert_eq!(
        res.body_text(),
        "[-]authz failed: reason withheld\n[+]cache ok\nhealthz check failed\n",
    );
    assert!(!res.body_text().contains("denied"));

    let res = h.handle(&get("/authz"));
    assert_eq!(res.status_code(), Status::InternalServerError);
    assert_eq!(res.body_text(), "internal server error: denied\n");
}

#[test]
fn excluding_every_failing_check_passes() {
    init_tracing();
    let h = Healthz::new(
        Checks::builder()
            .check("etcd", must_not_run)
            .check("webhook", must_not_run)
            .check("cache", ok)
            .build()
            .unwrap(),
    );

    let res = h.handle(&get("/?exclude=etcd&exclude=webhook"));
    assert_eq!(res.status_code(), Status::Ok);
    assert_eq!(res.body_text(), "ok");
}

#[test]
fn unknown_exclude_is_quoted_in_warning() {
    init_tracing();
    let h = Healthz::new(Checks::builder().check("cache", ok).build().unwrap());
    let res = h.handle(&get("/?exclude=has%20space&verbose"));
    assert_eq!(res.status_code(), Status::Ok);
    assert!(
        res.body_text()
            .contains("warning: some health checks cannot be excluded: no matches for \"has space\"\n"),
        "{}",
        res.body_text(),
    );
}

#[test]
fn every_check_runs_once_per_aggregate_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut builder = Checks::builder();
    for name in ["a", "b", "c"] {
        let calls = Arc::clone(&calls);
        builder = builder.check(name, move |_: &Request| -> Result<(), CheckError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
    let h = Healthz::new(builder.build().unwrap());

    assert_eq!(h.handle(&get("/")).body_text(), "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn checks_see_the_request() {
    let h = Healthz::new(
        Checks::builder()
            .check("probe-header", |req: &Request| -> Result<(), String> {
                match req.header("x-probe") {
                    Some("kubelet") => Ok(()),
                    other => Err(format!("unexpected prober {other:?}")),
                }
            })
            .build()
            .unwrap(),
    );

    let kubelet = Request::from(
        http::Request::get("/probe-header").header("x-probe", "kubelet").body(()).unwrap(),
    );
    assert_eq!(h.handle(&kubelet).status_code(), Status::Ok);

    let res = h.handle(&get("/probe-header"));
    assert_eq!(res.body_text(), "internal server error: unexpected prober None\n");
}

#[test]
fn empty_registry_answers_ping_everywhere() {
    let h = Healthz::new(Checks::builder().build().unwrap());
    assert_eq!(h.handle(&get("/")).body_text(), "ok");
    assert_eq!(h.handle(&get("/ping")).body_text(), "ok");
    assert_eq!(h.handle(&get("/other")).status_code(), Status::NotFound);
}
