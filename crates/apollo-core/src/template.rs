//! Path templates with ordered placeholders.
//!
//! Admin service endpoints are written as `apps/{appId}/clusters/{clusterName}`.
//! A [`PathTemplate`] is expanded positionally: the first argument fills the
//! first placeholder, and so on. Each argument becomes exactly one path segment
//! so values containing `/` or spaces are percent-encoded by the URL layer
//! rather than changing the shape of the path.

use std::fmt::Display;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed, reusable path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template.
    ///
    /// Leading and trailing slashes are ignored. A segment is either literal
    /// text or a single `{name}` placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for empty segments, unbalanced braces,
    /// or placeholders mixed with literal text inside one segment.
    pub fn parse(template: &str) -> Result<Self> {
        let trimmed = template.trim_matches('/');
        let mut segments = Vec::new();

        if !trimmed.is_empty() {
            for part in trimmed.split('/') {
                segments.push(parse_segment(template, part)?);
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// Returns the template text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns placeholder names in substitution order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute `args` into the placeholders in order and return the
    /// resulting path segments (not yet percent-encoded).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the number of arguments does not
    /// match the number of placeholders.
    pub fn expand(&self, args: &[&dyn Display]) -> Result<Vec<String>> {
        let expected = self.placeholders().len();
        if args.len() != expected {
            return Err(Error::InvalidRequest(format!(
                "path template `{}` takes {expected} argument(s), got {}",
                self.raw,
                args.len()
            )));
        }

        let mut args = args.iter();
        Ok(self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                // Length checked above.
                Segment::Placeholder(_) => {
                    args.next().map(|arg| arg.to_string()).unwrap_or_default()
                }
            })
            .collect())
    }
}

fn parse_segment(template: &str, part: &str) -> Result<Segment> {
    if part.is_empty() {
        return Err(Error::InvalidRequest(format!(
            "path template `{template}` contains an empty segment"
        )));
    }

    if let Some(inner) = part.strip_prefix('{') {
        let name = inner.strip_suffix('}').ok_or_else(|| {
            Error::InvalidRequest(format!(
                "path template `{template}` has an unterminated placeholder `{part}`"
            ))
        })?;
        if name.is_empty() || name.contains(['{', '}']) {
            return Err(Error::InvalidRequest(format!(
                "path template `{template}` has a malformed placeholder `{part}`"
            )));
        }
        return Ok(Segment::Placeholder(name.to_string()));
    }

    if part.contains(['{', '}']) {
        return Err(Error::InvalidRequest(format!(
            "path template `{template}` mixes text and placeholder in `{part}`"
        )));
    }

    Ok(Segment::Literal(part.to_string()))
}
