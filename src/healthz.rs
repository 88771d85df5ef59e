//! The aggregated health endpoint.
//!
//! A [`Healthz`] answers two kinds of request, relative to wherever it is
//! mounted:
//!
//! | Path | Answer |
//! |---|---|
//! | `/` | every registered check, combined. `?exclude=<name>` skips a check, `?verbose` lists them all. |
//! | `/<name>` | that one check. `ok`, or `internal server error: <cause>`. |
//!
//! The aggregate endpoint never shows why a check failed. It is usually
//! reachable without authentication, so the cause only goes to the log
//! (`debug`). Asking for a check by name does show the cause.
//!
//! ```text
//! $ curl -i 'localhost:8081/healthz?verbose'
//! HTTP/1.1 500 Internal Server Error
//! content-type: text/plain; charset=utf-8
//! x-content-type-options: nosniff
//!
//! [-]authz failed: reason withheld
//! [+]cache ok
//! healthz check failed
//! ```

use std::collections::BTreeSet;

use percent_encoding::percent_decode_str;
use tracing::{debug, info};

use crate::checks::{Checker, Checks, Ping};
use crate::request::Request;
use crate::response::{self, Response};
use crate::status::Status;

/// Name of the check synthesized when the registry is empty.
pub const PING: &str = "ping";

const NOSNIFF: (&str, &str) = ("x-content-type-options", "nosniff");

/// Serves the status of a [`Checks`] registry as plain text.
///
/// Cheap to clone: the registry is shared, never copied.
#[derive(Clone, Debug)]
pub struct Healthz {
    name: String,
    checks: Checks,
}

/// One line of the aggregate report.
///
/// An excluded check is never run and is always reported healthy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub healthy: bool,
    pub excluded: bool,
}

/// Result of running a registry once for one request.
#[derive(Clone, Debug)]
pub struct Evaluation {
    outcomes: Vec<CheckOutcome>,
    failed: bool,
    unknown_excludes: BTreeSet<String>,
}

impl Evaluation {
    /// Outcomes sorted by name, ascending.
    pub fn outcomes(&self) -> &[CheckOutcome] { &self.outcomes }

    /// True when at least one check that was run failed.
    pub fn failed(&self) -> bool { self.failed }

    /// Requested exclusions that matched no registered check, ascending.
    pub fn unknown_excludes(&self) -> impl Iterator<Item = &str> {
        self.unknown_excludes.iter().map(String::as_str)
    }
}

impl Healthz {
    /// An endpoint reporting as `healthz`.
    pub fn new(checks: Checks) -> Self {
        Self::named("healthz", checks)
    }

    /// An endpoint reporting under another name, e.g. `readyz` or `livez`.
    /// The name shows up in the last line of verbose output and in logs.
    pub fn named(name: impl Into<String>, checks: Checks) -> Self {
        Self { name: name.into(), checks }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn checks(&self) -> &Checks { &self.checks }

    /// Answers one request. `req.path()` is relative to the mount point.
    ///
    /// The path is percent-decoded before matching, so `/cache%20sync` reaches
    /// the check named `cache sync`. A path that does not decode to UTF-8
    /// matches nothing.
    pub fn handle(&self, req: &Request) -> Response {
        let Ok(decoded) = percent_decode_str(req.path()).decode_utf8() else {
            return response::not_found();
        };
        let path = clean_path(&decoded);
        if path == "/" {
            return self.serve_aggregate(req);
        }

        let name = &path[1..];
        if self.checks.is_empty() && name == PING {
            return serve_single(name, &Ping, req);
        }
        match self.checks.get(name) {
            Some(checker) => serve_single(name, checker, req),
            None => response::not_found(),
        }
    }

    /// Runs every check not named in an `exclude` query parameter.
    pub fn evaluate(&self, req: &Request) -> Evaluation {
        let mut excludes: BTreeSet<String> = req.query_values("exclude").into_iter().collect();
        let mut outcomes = Vec::with_capacity(self.checks.len().max(1));
        let mut failed = false;

        for (name, checker) in self.checks.iter() {
            if excludes.remove(name) {
                outcomes.push(CheckOutcome { name: name.to_owned(), healthy: true, excluded: true });
                continue;
            }
            let healthy = match checker.check(req) {
                Ok(()) => true,
                Err(error) => {
                    debug!(checker = name, %error, "health check failed");
                    failed = true;
                    false
                }
            };
            outcomes.push(CheckOutcome { name: name.to_owned(), healthy, excluded: false });
        }

        if self.checks.is_empty() {
            outcomes.push(CheckOutcome { name: PING.to_owned(), healthy: true, excluded: false });
        }

        for name in &excludes {
            debug!(checker = %name, "cannot exclude health check, no matches for it");
        }

        // Registry iteration is already ordered; the sort keeps the output
        // order independent of how checks are run.
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));

        Evaluation { outcomes, failed, unknown_excludes: excludes }
    }

    fn serve_aggregate(&self, req: &Request) -> Response {
        let evaluation = self.evaluate(req);
        render_text(&self.name, &evaluation, req.has_query("verbose"))
    }
}

fn serve_single(name: &str, checker: &dyn Checker, req: &Request) -> Response {
    match checker.check(req) {
        Ok(()) => Response::builder()
            .header(NOSNIFF.0, NOSNIFF.1)
            .text("ok"),
        Err(error) => {
            debug!(checker = name, %error, "health check failed");
            Response::builder()
                .status(Status::InternalServerError)
                .header(NOSNIFF.0, NOSNIFF.1)
                .text(format!("internal server error: {error}\n"))
        }
    }
}

/// Writes an evaluation in the line-per-check text format.
///
/// Healthy and not verbose: the body is exactly `ok`. Otherwise one line per
/// outcome, an optional warning about unknown excludes, and a trailer.
fn render_text(endpoint: &str, evaluation: &Evaluation, force_verbose: bool) -> Response {
    let status = if evaluation.failed { Status::InternalServerError } else { Status::Ok };
    let builder = Response::builder()
        .status(status)
        .header(NOSNIFF.0, NOSNIFF.1);

    if !evaluation.failed && !force_verbose {
        return builder.text("ok");
    }

    let mut body = String::new();
    for outcome in &evaluation.outcomes {
        let line = match outcome {
            CheckOutcome { excluded: true, .. } => format!("[+]{} excluded: ok\n", outcome.name),
            CheckOutcome { healthy: true, .. } => format!("[+]{} ok\n", outcome.name),
            _ => format!("[-]{} failed: reason withheld\n", outcome.name),
        };
        body.push_str(&line);
    }

    if !evaluation.unknown_excludes.is_empty() {
        let quoted: Vec<String> = evaluation.unknown_excludes.iter().map(|n| quote(n)).collect();
        body.push_str("warning: some health checks cannot be excluded: no matches for ");
        body.push_str(&quoted.join(","));
        body.push('\n');
    }

    if evaluation.failed {
        info!(checker = endpoint, statuses = ?evaluation.outcomes, "healthz check failed");
        body.push_str(&format!("{endpoint} check failed\n"));
    } else {
        body.push_str(&format!("{endpoint} check passed\n"));
    }

    builder.text(body)
}

/// Double-quotes `s` with Go-style escapes: `\"`, `\\`, the C escapes, then
/// `\xHH` for other ASCII controls and `\uHHHH`/`\UHHHHHHHH` for non-ASCII
/// ones. Everything else passes through.
fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\u{07}' => quoted.push_str("\\a"),
            '\u{08}' => quoted.push_str("\\b"),
            '\u{0C}' => quoted.push_str("\\f"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{0B}' => quoted.push_str("\\v"),
            c if c.is_ascii_control() => quoted.push_str(&format!("\\x{:02x}", c as u32)),
            c if c.is_control() && (c as u32) < 0x10000 => {
                quoted.push_str(&format!("\\u{:04x}", c as u32));
            }
            c if c.is_control() => quoted.push_str(&format!("\\U{:08x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Lexically normalizes a request path.
///
/// Always rooted, no `.` or `..` segments, no repeated or trailing slashes.
/// `..` above the root stays at the root. Idempotent.
pub(crate) fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return "/".to_owned();
    }
    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    cleaned
}
