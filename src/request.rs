//! Incoming HTTP request type.

use url::form_urlencoded;

/// An incoming HTTP request, as seen by a handler or a health check.
///
/// The body is never read: health endpoints are answered from the request
/// line and headers alone.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
}

impl Request {
    pub(crate) fn from_parts(parts: &http::request::Parts) -> Self {
        let headers = parts.headers.iter()
            .map(|(k, v)| (k.as_str().to_owned(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        Self {
            method: parts.method.as_str().to_owned(),
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers,
        }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every decoded value of the query key `key`, in the order they appear.
    ///
    /// `?exclude=a&exclude=b%2Fc` yields `["a", "b/c"]` for `"exclude"`.
    pub fn query_values(&self, key: &str) -> Vec<String> {
        let Some(query) = self.query.as_deref() else { return Vec::new() };
        form_urlencoded::parse(query.as_bytes())
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    /// True when `key` appears in the query string at all, with or without a value.
    pub fn has_query(&self, key: &str) -> bool {
        let Some(query) = self.query.as_deref() else { return false };
        form_urlencoded::parse(query.as_bytes()).any(|(k, _)| k == key)
    }

    /// The same request, seen from a handler mounted below a path prefix.
    pub(crate) fn with_path(&self, path: &str) -> Self {
        Self { path: path.to_owned(), ..self.clone() }
    }
}

/// Build a [`Request`] from any `http::Request`, dropping its body.
///
/// ```rust
/// let req = healthz::Request::from(http::Request::get("/healthz?verbose").body(()).unwrap());
/// assert!(req.has_query("verbose"));
/// ```
impl<T> From<http::Request<T>> for Request {
    fn from(req: http::Request<T>) -> Self {
        let (parts, _body) = req.into_parts();
        Self::from_parts(&parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> Request {
        Request::from(http::Request::get(uri).body(()).unwrap())
    }

    #[test]
    fn repeated_query_keys_are_decoded_in_order() {
        let req = get("/?exclude=b&verbose&exclude=a%2Fc&exclude=x+y");
        assert_eq!(req.query_values("exclude"), ["b", "a/c", "x y"]);
        assert!(req.query_values("missing").is_empty());
    }

    #[test]
    fn presence_only_keys_count() {
        assert!(get("/?verbose").has_query("verbose"));
        assert!(get("/?verbose=false").has_query("verbose"));
        assert!(!get("/?verbosee=1").has_query("verbose"));
        assert!(!get("/").has_query("verbose"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::from(
            http::Request::get("/").header("X-Probe", "kubelet").body(()).unwrap(),
        );
        assert_eq!(req.header("x-probe"), Some("kubelet"));
        assert_eq!(req.method(), "GET");
    }
}
