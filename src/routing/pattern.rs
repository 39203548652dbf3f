//! Path templates with `:name` placeholders, compiled to anchored regexes.

use std::collections::HashMap;
use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::{Regex, RegexBuilder};

use crate::error::RouteError;

/// Maximum template length accepted by [`PathPattern::parse`].
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum compiled regex size.
const MAX_REGEX_SIZE: usize = 1 << 20;

/// Characters escaped when a parameter value is written into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route template such as `/users/:id/posts/:post`.
///
/// Each `:name` segment matches exactly one non-empty path segment; literal
/// segments match exactly. Captured values are percent-decoded.
///
/// ```
/// use ferrous_mvc::routing::PathPattern;
///
/// let pattern = PathPattern::parse("/files/:name").unwrap();
/// let params = pattern.matches("/files/annual%20report.pdf").unwrap();
/// assert_eq!(params["name"], "annual report.pdf");
/// assert!(pattern.matches("/files/a/b").is_none());
/// ```
#[derive(Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    regex: Regex,
}

impl PathPattern {
    /// Compiles a template. The template is normalized with [`join`] first.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let template = join("", template);
        let invalid = |reason: String| RouteError::InvalidPattern {
            pattern: template.clone(),
            reason,
        };

        if template.len() > MAX_PATTERN_LENGTH {
            return Err(invalid(format!("longer than {} bytes", MAX_PATTERN_LENGTH)));
        }

        let mut segments = Vec::new();
        let mut source = String::from("^");
        for raw in template.split('/').filter(|s| !s.is_empty()) {
            source.push('/');
            match raw.strip_prefix(':') {
                Some(name) => {
                    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(invalid(format!("invalid parameter name {:?}", name)));
                    }
                    if segments.iter().any(|s| matches!(s, Segment::Param(p) if p == name)) {
                        return Err(invalid(format!("parameter {:?} declared twice", name)));
                    }
                    source.push_str("([^/]+)");
                    segments.push(Segment::Param(name.to_string()));
                }
                None => {
                    source.push_str(&regex::escape(raw));
                    segments.push(Segment::Literal(raw.to_string()));
                }
            }
        }
        if segments.is_empty() {
            source.push('/');
        }
        source.push('$');

        let regex = RegexBuilder::new(&source)
            .size_limit(MAX_REGEX_SIZE)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            template,
            segments,
            regex,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parameter names in template order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the template has no parameters.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Matches an already normalized path, returning the decoded parameters.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        Some(
            self.params()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, value)| {
                    let value = value?;
                    Some((
                        name.to_string(),
                        percent_decode_str(value.as_str()).decode_utf8_lossy().into_owned(),
                    ))
                })
                .collect(),
        )
    }

    /// Whether some path could match both patterns.
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                _ => true,
            })
    }

    /// Fills the placeholders, percent-encoding each value.
    pub fn build<'a, I>(&self, params: I) -> Result<String, String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let params: HashMap<&str, &str> = params.into_iter().collect();
        if self.segments.is_empty() {
            return Ok("/".to_string());
        }
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param(name) => {
                    let value = params
                        .get(name.as_str())
                        .filter(|v| !v.is_empty())
                        .ok_or_else(|| format!("missing parameter {:?}", name))?;
                    path.extend(utf8_percent_encode(value, SEGMENT));
                }
            }
        }
        Ok(path)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.template).finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Concatenates a prefix and a relative path into a normalized template.
///
/// Duplicate separators collapse and a trailing separator is stripped; the
/// root path stays `/`.
///
/// ```
/// use ferrous_mvc::routing::join;
///
/// assert_eq!(join("/api/", "/users/"), "/api/users");
/// assert_eq!(join("", ""), "/");
/// assert_eq!(join("users", ":id"), "/users/:id");
/// ```
pub fn join(prefix: &str, path: &str) -> String {
    let mut joined = String::with_capacity(prefix.len() + path.len() + 1);
    for segment in prefix.split('/').chain(path.split('/')).filter(|s| !s.is_empty()) {
        joined.push('/');
        joined.push_str(segment);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

/// Strips a single trailing separator from a request path, keeping `/`.
pub fn normalize_request_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}
