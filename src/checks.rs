//! The check registry.
//!
//! A [`Checks`] value maps check names to [`Checker`]s. It is assembled once
//! through [`ChecksBuilder`] and is read-only afterwards: every clone shares
//! the same map, so handing it to a server that answers requests on many
//! threads needs no locking.
//!
//! ```rust
//! use healthz::{CheckError, Checks, Request};
//!
//! fn cache_synced(_req: &Request) -> Result<(), CheckError> {
//!     Ok(())
//! }
//!
//! let checks = Checks::builder()
//!     .check("cache", cache_synced)
//!     .check("ping", healthz::Ping)
//!     .build()
//!     .unwrap();
//! assert_eq!(checks.names().collect::<Vec<_>>(), ["cache", "ping"]);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;

/// Why a check failed. Rendered with `Display` wherever it is shown.
pub type CheckError = Box<dyn std::error::Error + Send + Sync>;

/// A single named health probe.
///
/// Implemented for every `Fn(&Request) -> Result<(), E>` whose error converts
/// into a [`CheckError`] (`String`, `&str`, `std::io::Error`, ...).
///
/// `check` is called synchronously on the request path. A checker that
/// blocks stalls that request; bound any slow probe inside the checker.
pub trait Checker: Send + Sync + 'static {
    fn check(&self, req: &Request) -> Result<(), CheckError>;
}

impl<F, E> Checker for F
where
    F: Fn(&Request) -> Result<(), E> + Send + Sync + 'static,
    E: Into<CheckError>,
{
    fn check(&self, req: &Request) -> Result<(), CheckError> {
        self(req).map_err(Into::into)
    }
}

/// A checker that always succeeds.
///
/// Served as `ping` by a handler whose registry is empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ping;

impl Checker for Ping {
    fn check(&self, _req: &Request) -> Result<(), CheckError> {
        Ok(())
    }
}

pub(crate) type SharedChecker = Arc<dyn Checker>;

/// An immutable registry of named checks, ordered by name.
#[derive(Clone, Default)]
pub struct Checks {
    inner: Arc<BTreeMap<String, SharedChecker>>,
}

impl Checks {
    pub fn builder() -> ChecksBuilder {
        ChecksBuilder { entries: Vec::new() }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Checker> {
        self.inner.get(name).map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize { self.inner.len() }
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

    /// Registered names, ascending.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &dyn Checker)> {
        self.inner.iter().map(|(name, c)| (name.as_str(), c.as_ref()))
    }
}

impl fmt::Debug for Checks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Collects `(name, checker)` pairs, then validates them into a [`Checks`].
///
/// Checks may come from several subsystems; hand the builder to each in turn
/// and call [`build`](ChecksBuilder::build) once, before serving traffic.
pub struct ChecksBuilder {
    entries: Vec<(String, SharedChecker)>,
}

impl ChecksBuilder {
    /// Registers `checker` under `name`. Returns `self` for chaining.
    pub fn check(mut self, name: impl Into<String>, checker: impl Checker) -> Self {
        self.entries.push((name.into(), Arc::new(checker)));
        self
    }

    /// Finalizes the registry.
    ///
    /// Names must be non-empty, must not contain `/` (they double as URL path
    /// segments), and must be unique.
    pub fn build(self) -> Result<Checks, Error> {
        let mut map = BTreeMap::new();
        for (name, checker) in self.entries {
            let reason = if name.is_empty() {
                Some("name is empty")
            } else if name.contains('/') {
                Some("name contains `/`")
            } else if map.contains_key(&name) {
                Some("name is registered more than once")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(Error::InvalidCheckName { name, reason });
            }
            map.insert(name, checker);
        }
        Ok(Checks { inner: Arc::new(map) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_: &Request) -> Result<(), CheckError> {
        Ok(())
    }

    fn request() -> Request {
        Request::from(http::Request::get("/").body(()).unwrap())
    }

    #[test]
    fn names_iterate_sorted_regardless_of_registration_order() {
        let checks = Checks::builder()
            .check("zeta", ok)
            .check("alpha", ok)
            .check("mid", ok)
            .build()
            .unwrap();
        assert_eq!(checks.names().collect::<Vec<_>>(), ["alpha", "mid", "zeta"]);
        assert_eq!(checks.len(), 3);
    }

    #[test]
    fn closures_with_string_errors_are_checkers() {
        let checks = Checks::builder()
            .check("denied", |_: &Request| -> Result<(), String> { Err("denied".into()) })
            .build()
            .unwrap();
        let err = checks.get("denied").unwrap().check(&request()).unwrap_err();
        assert_eq!(err.to_string(), "denied");
    }

    #[test]
    fn rejects_bad_names() {
        for bad in ["", "a/b", "/"] {
            let err = Checks::builder().check(bad, ok).build().unwrap_err();
            assert!(matches!(err, Error::InvalidCheckName { .. }), "{bad:?}");
        }
        let dup = Checks::builder().check("db", ok).check("db", Ping).build();
        assert!(matches!(dup, Err(Error::InvalidCheckName { ref name, .. }) if name == "db"));
    }

    #[test]
    fn empty_registry_is_valid() {
        let checks = Checks::builder().build().unwrap();
        assert!(checks.is_empty());
        assert!(checks.get("ping").is_none());
    }

    #[test]
    fn clones_share_the_map() {
        let a = Checks::builder().check("db", ok).build().unwrap();
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
        assert_eq!(format!("{b:?}"), r#"{"db"}"#);
    }
}
