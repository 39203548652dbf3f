use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{HeaderMap, StatusCode};
use serde_json::Value;

/// Body written to a [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Html(String),
    Text(String),
}

impl Body {
    /// The body as it would go on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Body::Json(value) => serde_json::to_vec(value).unwrap_or_default(),
            Body::Html(s) | Body::Text(s) => s.as_bytes().to_vec(),
        }
    }
}

/// Mutable view of the outbound response.
///
/// The body can be written exactly once. `send`, `json`, `html` and `end`
/// return `true` when they wrote and are silent no-ops once the response is
/// sent.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{Response, StatusCode};
///
/// let mut response = Response::new();
/// response.set_status(StatusCode::CREATED);
/// assert!(response.json(serde_json::json!({"id": 1})));
/// assert!(!response.send("ignored"));
///
/// assert!(response.is_sent());
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.body_text().as_deref(), Some(r#"{"id":1}"#));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    status_set: bool,
    headers: HeaderMap,
    body: Option<Body>,
    sent: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            status_set: false,
            headers: HeaderMap::new(),
            body: None,
            sent: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code and remembers that it was chosen explicitly.
    ///
    /// Ignored once the response is sent.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        if !self.sent {
            self.status = status;
            self.status_set = true;
        }
        self
    }

    /// Whether a handler or middleware chose the status explicitly.
    pub fn status_explicitly_set(&self) -> bool {
        self.status_set
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets (replaces) a header. Returns `false` for invalid names or values
    /// or when the response is already sent.
    pub fn set_header(&mut self, name: &str, value: &str) -> bool {
        if self.sent {
            return false;
        }
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
                true
            }
            _ => false,
        }
    }

    /// Writes a plain-text body.
    pub fn send(&mut self, text: impl Into<String>) -> bool {
        self.write(Body::Text(text.into()), "text/plain; charset=utf-8")
    }

    /// Writes a JSON body.
    pub fn json(&mut self, value: impl Into<Value>) -> bool {
        self.write(Body::Json(value.into()), "application/json")
    }

    /// Writes an HTML body.
    pub fn html(&mut self, html: impl Into<String>) -> bool {
        self.write(Body::Html(html.into()), "text/html; charset=utf-8")
    }

    /// Finalizes the response without a body.
    pub fn end(&mut self) -> bool {
        if self.sent {
            return false;
        }
        self.sent = true;
        true
    }

    /// Sets `Location` and a redirect status, then ends the response.
    pub fn redirect(&mut self, status: StatusCode, location: &str) -> bool {
        if self.sent || !self.set_header(LOCATION.as_str(), location) {
            return false;
        }
        self.set_status(status);
        self.end()
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// The written body as text (JSON bodies are serialized).
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|body| String::from_utf8_lossy(&body.to_bytes()).into_owned())
    }

    fn write(&mut self, body: Body, content_type: &'static str) -> bool {
        if self.sent {
            return false;
        }
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        self.body = Some(body);
        self.sent = true;
        true
    }
}
