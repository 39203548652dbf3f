//! Action argument binding.
//!
//! Each route declares an ordered list of [`ParameterBinding`]s. At dispatch
//! time [`bind`] turns them into [`Arguments`] by reading the request,
//! coercing primitive values and resolving services from the request scope.
//!
//! ```
//! use ferrous_mvc::binding::{coerce, ParamType};
//! use serde_json::json;
//!
//! assert_eq!(coerce(&json!("42"), ParamType::Number), Some(json!(42)));
//! assert_eq!(coerce(&json!("not-a-number"), ParamType::Number), None);
//! assert_eq!(coerce(&json!("1"), ParamType::Boolean), Some(json!(true)));
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use crate::descriptors::AnyArc;
use crate::error::{BoxError, DispatchError};
use crate::http::RequestContext;
use crate::token::Token;
use crate::traits::Resolver;

/// Where a parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingSource {
    /// The whole request body, verbatim.
    Body,
    /// A query-string value.
    Query,
    /// A captured route parameter.
    Route,
    /// A request header (case-insensitive).
    Header,
    /// Marker for the request context itself.
    Context,
    /// Marker for the inbound request.
    Request,
    /// Marker for the outbound response.
    Response,
    /// A service resolved from the request scope.
    Service(Token),
}

/// Declared target type of a primitive parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Json,
    #[default]
    Any,
}

impl ParamType {
    /// Lookup key used when a binding carries no explicit name.
    pub fn literal(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Json | ParamType::Any => "object",
        }
    }
}

/// Binding metadata for one action parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    source: BindingSource,
    name: Option<String>,
    target: ParamType,
}

impl ParameterBinding {
    pub fn new(source: BindingSource) -> Self {
        Self {
            source,
            name: None,
            target: ParamType::Any,
        }
    }

    pub fn body() -> Self {
        Self::new(BindingSource::Body)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(BindingSource::Query).named(name)
    }

    pub fn route(name: impl Into<String>) -> Self {
        Self::new(BindingSource::Route).named(name)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(BindingSource::Header).named(name)
    }

    pub fn context() -> Self {
        Self::new(BindingSource::Context)
    }

    pub fn request() -> Self {
        Self::new(BindingSource::Request)
    }

    pub fn response() -> Self {
        Self::new(BindingSource::Response)
    }

    /// Resolves the concrete type `T` from the request scope.
    pub fn service<T: Send + Sync + 'static>() -> Self {
        Self::new(BindingSource::Service(Token::of::<T>()))
    }

    /// Resolves the trait binding `T` from the request scope.
    pub fn service_trait<T: ?Sized + 'static>() -> Self {
        Self::new(BindingSource::Service(Token::of_trait::<T>()))
    }

    /// Resolves an explicit token from the request scope.
    pub fn service_token(token: impl Into<Token>) -> Self {
        Self::new(BindingSource::Service(token.into()))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn typed(mut self, target: ParamType) -> Self {
        self.target = target;
        self
    }

    pub fn string(self) -> Self {
        self.typed(ParamType::String)
    }

    pub fn number(self) -> Self {
        self.typed(ParamType::Number)
    }

    pub fn boolean(self) -> Self {
        self.typed(ParamType::Boolean)
    }

    pub fn json(self) -> Self {
        self.typed(ParamType::Json)
    }

    pub fn source(&self) -> &BindingSource {
        &self.source
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn target(&self) -> ParamType {
        self.target
    }

    /// The key used to look the value up: the explicit name, else the type literal.
    pub fn key(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.target.literal().to_string(),
        }
    }
}

/// A single bound argument.
#[derive(Clone)]
pub enum Argument {
    /// The source had no value for the key.
    Missing,
    Value(Value),
    Context,
    Request,
    Response,
    Service(AnyArc),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Missing => f.write_str("Missing"),
            Argument::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Argument::Context => f.write_str("Context"),
            Argument::Request => f.write_str("Request"),
            Argument::Response => f.write_str("Response"),
            Argument::Service(_) => f.write_str("Service(..)"),
        }
    }
}

/// Ordered arguments for one action invocation.
///
/// Context, request and response markers are placeholders: the action
/// receives the live [`RequestContext`] alongside the arguments.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    pub fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    pub fn is_missing(&self, index: usize) -> bool {
        matches!(self.values.get(index), None | Some(Argument::Missing))
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.values.get(index)? {
            Argument::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn string(&self, index: usize) -> Option<&str> {
        self.value(index)?.as_str()
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        self.value(index)?.as_f64()
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        self.value(index)?.as_i64()
    }

    pub fn boolean(&self, index: usize) -> Option<bool> {
        self.value(index)?.as_bool()
    }

    /// Deserializes a value argument into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self, index: usize) -> Result<T, BoxError> {
        let value = self
            .value(index)
            .ok_or_else(|| format!("argument {} has no value", index))?;
        Ok(T::deserialize(value)?)
    }

    /// The service bound at `index`, downcast to `T`.
    pub fn service<T: Send + Sync + 'static>(&self, index: usize) -> Option<Arc<T>> {
        match self.values.get(index)? {
            Argument::Service(any) => any.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// The trait binding bound at `index`.
    pub fn service_trait<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Option<Arc<T>> {
        match self.values.get(index)? {
            Argument::Service(any) => any.downcast_ref::<Arc<T>>().cloned(),
            _ => None,
        }
    }

    /// Like [`service`](Self::service) but reports what went wrong.
    pub fn require_service<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        self.service::<T>(index)
            .ok_or_else(|| format!("argument {} is not a {}", index, type_name::<T>()).into())
    }
}

/// Converts a raw value to the declared target type.
///
/// `None` means the value is absent: a number that does not parse, or a
/// JSON `null`. Booleans are true only for `true`, `"true"`, `1` and `"1"`.
/// A JSON target falls back to the raw string when it does not parse.
pub fn coerce(raw: &Value, target: ParamType) -> Option<Value> {
    if raw.is_null() {
        return None;
    }
    match target {
        ParamType::Any => Some(raw.clone()),
        ParamType::String => Some(match raw {
            Value::String(_) => raw.clone(),
            other => Value::String(other.to_string()),
        }),
        ParamType::Number => match raw {
            Value::Number(_) => Some(raw.clone()),
            Value::String(s) => parse_number(s),
            _ => None,
        },
        ParamType::Boolean => Some(Value::Bool(match raw {
            Value::Bool(b) => *b,
            Value::String(s) => s == "true" || s == "1",
            Value::Number(n) => n.as_f64() == Some(1.0),
            _ => false,
        })),
        ParamType::Json => match raw {
            Value::String(s) => Some(serde_json::from_str(s).unwrap_or_else(|_| raw.clone())),
            other => Some(other.clone()),
        },
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn lookup(source: Option<&str>, target: ParamType) -> Argument {
    match source.and_then(|raw| coerce(&Value::String(raw.to_string()), target)) {
        Some(value) => Argument::Value(value),
        None => Argument::Missing,
    }
}

/// Produces the argument list for `bindings` against the current request.
///
/// Only service bindings can fail; a missing primitive is
/// [`Argument::Missing`].
pub async fn bind(bindings: &[ParameterBinding], ctx: &RequestContext) -> Result<Arguments, DispatchError> {
    let mut values = Vec::with_capacity(bindings.len());
    for (index, binding) in bindings.iter().enumerate() {
        let request = &ctx.request;
        let argument = match binding.source() {
            BindingSource::Body => Argument::Value(request.body().clone()),
            BindingSource::Query => lookup(request.query_param(&binding.key()), binding.target()),
            BindingSource::Route => lookup(request.route_param(&binding.key()), binding.target()),
            BindingSource::Header => lookup(request.header(&binding.key()), binding.target()),
            BindingSource::Context => Argument::Context,
            BindingSource::Request => Argument::Request,
            BindingSource::Response => Argument::Response,
            BindingSource::Service(token) => {
                let service = ctx
                    .services()
                    .resolve(token)
                    .await
                    .map_err(|source| DispatchError::Binding { index, source })?;
                Argument::Service(service)
            }
        };
        values.push(argument);
    }
    Ok(Arguments::new(values))
}
