//! Radix-tree router for mounted health endpoints.
//!
//! O(path-length) lookup. Each [`Router::healthz`] call claims a prefix;
//! everything at or below it goes to that endpoint.

use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::healthz::Healthz;
use crate::request::Request;
use crate::response::Response;

/// The probe router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every registration returns `self` so calls chain naturally.
///
/// # Panics
///
/// Registration panics on a malformed or conflicting mount path. Mounts are
/// fixed at assembly time, so this surfaces on the first start, not under
/// traffic.
pub struct Router {
    routes: MatchitRouter<Arc<Mounted>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: MatchitRouter::new() }
    }

    /// Mounts `healthz` at `mount`.
    ///
    /// The mount path answers the aggregate status and `{mount}/<name>` a
    /// single check. The handler sees paths with `mount` stripped. The
    /// server routes `GET` and `HEAD` here and answers anything else `405`.
    ///
    /// ```rust,no_run
    /// # use healthz::{Checks, Healthz, Router};
    /// # let checks = Checks::builder().build().unwrap();
    /// let app = Router::new()
    ///     .healthz("/healthz", Healthz::new(checks.clone()))
    ///     .healthz("/readyz", Healthz::named("readyz", checks));
    /// ```
    pub fn healthz(mut self, mount: &str, healthz: Healthz) -> Self {
        let prefix = mount.trim_end_matches('/').to_owned();
        let root = if prefix.is_empty() { "/".to_owned() } else { prefix.clone() };
        let nested = format!("{prefix}/{{*rest}}");
        let mounted = Arc::new(Mounted { prefix, healthz });

        for path in [&root, &nested] {
            self.routes
                .insert(path.as_str(), Arc::clone(&mounted))
                .unwrap_or_else(|e| panic!("invalid mount `{path}`: {e}"));
        }
        self
    }

    /// Finds the endpoint for `path`. A trailing slash falls back to the
    /// route without it, so `/healthz/` reaches the `/healthz` mount.
    pub(crate) fn lookup(&self, path: &str) -> Option<&Mounted> {
        let matched = self.routes.at(path).ok().or_else(|| {
            let trimmed = path.strip_suffix('/').filter(|p| !p.is_empty())?;
            self.routes.at(trimmed).ok()
        })?;
        Some(matched.value.as_ref())
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// A [`Healthz`] below a path prefix.
pub(crate) struct Mounted {
    prefix: String,
    healthz: Healthz,
}

impl Mounted {
    pub(crate) fn serve(&self, req: &Request) -> Response {
        let relative = req.path().strip_prefix(self.prefix.as_str()).unwrap_or(req.path());
        self.healthz.handle(&req.with_path(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckError, Checks};
    use crate::status::Status;

    fn ok(_: &Request) -> Result<(), CheckError> {
        Ok(())
    }

    fn router() -> Router {
        let checks = Checks::builder().check("cache", ok).build().unwrap();
        Router::new()
            .healthz("/healthz", Healthz::new(checks.clone()))
            .healthz("/readyz/", Healthz::named("readyz", checks))
    }

    fn call(router: &Router, uri: &str) -> Option<Response> {
        let req = Request::from(http::Request::get(uri).body(()).unwrap());
        Some(router.lookup(req.path())?.serve(&req))
    }

    #[test]
    fn mount_serves_aggregate_and_single_checks() {
        let router = router();
        for uri in ["/healthz", "/healthz/", "/readyz", "/readyz/"] {
            let res = call(&router, uri).unwrap();
            assert_eq!(res.status_code(), Status::Ok, "{uri}");
            assert_eq!(res.body_text(), "ok");
        }

        let res = call(&router, "/readyz?verbose").unwrap();
        assert_eq!(res.body_text(), "[+]cache ok\nreadyz check passed\n");

        let res = call(&router, "/healthz/cache").unwrap();
        assert_eq!(res.status_code(), Status::Ok);

        let res = call(&router, "/healthz/nope").unwrap();
        assert_eq!(res.status_code(), Status::NotFound);
    }

    #[test]
    fn paths_outside_every_mount_are_unrouted() {
        let router = router();
        assert!(call(&router, "/healthzz").is_none());
        assert!(call(&router, "/version").is_none());
    }

    #[test]
    fn root_mount() {
        let checks = Checks::builder().build().unwrap();
        let router = Router::new().healthz("/", Healthz::new(checks));
        assert_eq!(call(&router, "/").unwrap().body_text(), "ok");
        assert_eq!(call(&router, "/ping").unwrap().body_text(), "ok");
    }

    #[test]
    #[should_panic(expected = "invalid mount")]
    fn mounting_twice_panics() {
        let checks = Checks::builder().build().unwrap();
        let _ = Router::new()
            .healthz("/healthz", Healthz::new(checks.clone()))
            .healthz("/healthz", Healthz::new(checks));
    }
}
