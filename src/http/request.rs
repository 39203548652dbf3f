use std::collections::HashMap;

use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method};
use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Read-only view of an inbound request.
///
/// Transport adapters build one of these from whatever their runtime
/// delivers; the body is expected to be parsed already.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{Method, Request};
///
/// let request = Request::new(Method::GET, "/search?q=rust%20lang&page=2")
///     .with_header("X-Request-Id", "abc");
///
/// assert_eq!(request.path(), "/search");
/// assert_eq!(request.query_param("q"), Some("rust lang"));
/// assert_eq!(request.header("x-request-id"), Some("abc"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: HashMap<String, String>,
    route_params: HashMap<String, String>,
    body: Value,
}

impl Request {
    /// Builds a request from a method and a target (`path[?query]`).
    pub fn new(method: Method, target: impl AsRef<str>) -> Self {
        let target = target.as_ref();
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, HashMap::new()),
        };
        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            headers: HeaderMap::new(),
            query,
            route_params: HashMap::new(),
            body: Value::Null,
        }
    }

    /// Adds a header; invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::debug!(header = name, "ignoring invalid request header"),
        }
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets the parsed body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8. Names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Parameters captured by the matched route, already percent-decoded.
    pub fn route_params(&self) -> &HashMap<String, String> {
        &self.route_params
    }

    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub(crate) fn set_route_params(&mut self, params: HashMap<String, String>) {
        self.route_params = params;
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            // Split on the first '=' only so values may contain '='
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
