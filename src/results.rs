//! Action results that write the response themselves.
//!
//! Return one from an action with [`Outcome::result`](crate::Outcome::result)
//! when a plain JSON value is not enough.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BoxError;
use crate::http::{RequestContext, StatusCode};

/// A value that knows how to write itself to the response.
#[async_trait]
pub trait ActionResult: Send + 'static {
    async fn execute(self: Box<Self>, ctx: &mut RequestContext) -> Result<(), BoxError>;
}

/// JSON body with an optional status.
#[derive(Debug, Clone)]
pub struct Json {
    value: Value,
    status: Option<StatusCode>,
}

impl Json {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            status: None,
        }
    }

    /// Serializes `value`; fails for maps with non-string keys and similar.
    pub fn serialize<T: serde::Serialize>(value: &T) -> Result<Self, BoxError> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

#[async_trait]
impl ActionResult for Json {
    async fn execute(self: Box<Self>, ctx: &mut RequestContext) -> Result<(), BoxError> {
        if let Some(status) = self.status {
            ctx.response.set_status(status);
        }
        ctx.response.json(self.value);
        Ok(())
    }
}

/// Bodiless response with the given status.
#[derive(Debug, Clone, Copy)]
pub struct Status(pub StatusCode);

#[async_trait]
impl ActionResult for Status {
    async fn execute(self: Box<Self>, ctx: &mut RequestContext) -> Result<(), BoxError> {
        ctx.response.set_status(self.0);
        ctx.response.end();
        Ok(())
    }
}

/// `204 No Content`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

#[async_trait]
impl ActionResult for NoContent {
    async fn execute(self: Box<Self>, ctx: &mut RequestContext) -> Result<(), BoxError> {
        ctx.response.set_status(StatusCode::NO_CONTENT);
        ctx.response.end();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Html,
    Text,
}

/// HTML or plain-text body.
#[derive(Debug, Clone)]
pub struct Content {
    body: String,
    kind: ContentKind,
    status: Option<StatusCode>,
}

impl Content {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            kind: ContentKind::Html,
            status: None,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            kind: ContentKind::Text,
            status: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

#[async_trait]
impl ActionResult for Content {
    async fn execute(self: Box<Self>, ctx: &mut RequestContext) -> Result<(), BoxError> {
        if let Some(status) = self.status {
            ctx.response.set_status(status);
        }
        match self.kind {
            ContentKind::Html => ctx.response.html(self.body),
            ContentKind::Text => ctx.response.send(self.body),
        };
        Ok(())
    }
}

/// Redirect with a `Location` header; `302 Found` unless made permanent.
#[derive(Debug, Clone)]
pub struct Redirect {
    location: String,
    status: StatusCode,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: StatusCode::FOUND,
        }
    }

    pub fn permanent(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: StatusCode::MOVED_PERMANENTLY,
        }
    }

    pub fn see_other(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: StatusCode::SEE_OTHER,
        }
    }
}

#[async_trait]
impl ActionResult for Redirect {
    async fn execute(self: Box<Self>, ctx: &mut RequestContext) -> Result<(), BoxError> {
        if ctx.response.is_sent() {
            return Ok(());
        }
        if !ctx.response.redirect(self.status, &self.location) {
            return Err(format!("invalid redirect location {:?}", self.location).into());
        }
        Ok(())
    }
}
