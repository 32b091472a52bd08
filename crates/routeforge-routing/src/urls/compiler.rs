//! Path template compilation.
//!
//! Turns a template such as `/users/{id:\d+}/{tab?}` into an anchored regex
//! with one named capture per placeholder. Templates without placeholders are
//! static and get no regex at all; they are matched by exact lookup.
//!
//! Placeholder forms:
//!
//! - `{name}` matches one path segment (`[^/]+`)
//! - `{name:pattern}` matches `pattern`, used verbatim (braces may nest)
//! - `{name?}` / `{name?:pattern}` makes the segment and the `/` before it optional

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Write as _;

use regex::Regex;

use routeforge_core::{RouterError, RouterResult};

use crate::route::ParamSpec;

/// The constraint used by placeholders that don't specify one.
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

/// A placeholder parsed out of a path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The full placeholder text, braces included.
    pub raw: &'a str,
    /// The parameter name.
    pub name: &'a str,
    /// The explicit constraint, if any.
    pub constraint: Option<&'a str>,
    /// Whether the placeholder was marked with `?`.
    pub optional: bool,
}

/// A piece of a tokenized path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, matched exactly.
    Literal(&'a str),
    /// A `{...}` placeholder.
    Placeholder(Placeholder<'a>),
}

/// The derived form of a path template.
#[derive(Debug, Clone)]
pub struct CompiledPath {
    regex: Option<Regex>,
    parameters: Vec<ParamSpec>,
}

impl CompiledPath {
    /// Returns `true` if the template had no placeholders.
    pub const fn is_static(&self) -> bool {
        self.regex.is_none()
    }

    /// Returns the anchored regex of a dynamic template.
    pub const fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    /// Returns the parameter specs in capture-group order.
    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    /// Rebuilds a compiled path from previously derived parts.
    ///
    /// Only the regex engine runs here; the template is not re-parsed.
    pub(crate) fn from_parts(
        regex_source: Option<&str>,
        parameters: Vec<ParamSpec>,
    ) -> Result<Self, String> {
        let regex = match regex_source {
            Some(source) => Some(Regex::new(source).map_err(|e| e.to_string())?),
            None if parameters.is_empty() => None,
            None => return Err("static route carries parameters".to_string()),
        };
        Ok(Self { regex, parameters })
    }

    /// Matches `path` against the regex and extracts parameter values.
    ///
    /// Returns `None` for static paths and for paths the regex rejects.
    /// Optional parameters that did not participate in the match are left out
    /// of the map rather than mapped to an empty string.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.as_ref()?.captures(path)?;
        Some(
            self.parameters
                .iter()
                .filter_map(|param| {
                    captures
                        .name(&param.name)
                        .map(|m| (param.name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

/// Normalizes trailing slashes.
///
/// With `trailing_slash` every path ends in exactly one `/`; without it
/// trailing slashes are trimmed. The root path is always `/`.
pub fn normalize_path(path: &str, trailing_slash: bool) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trailing_slash {
        format!("{trimmed}/")
    } else {
        trimmed.to_string()
    }
}

/// Splits a template into literal and placeholder segments.
///
/// # Errors
///
/// Returns [`RouterError::InvalidRoutePath`] for an empty path, a path not
/// starting with `/`, unbalanced braces, empty or invalid parameter names,
/// empty constraints, and parameter names used twice.
pub fn tokenize(path: &str) -> RouterResult<Vec<Segment<'_>>> {
    if path.is_empty() {
        return Err(RouterError::invalid_path(path, "path is empty"));
    }
    if !path.starts_with('/') {
        return Err(RouterError::invalid_path(path, "path must start with '/'"));
    }

    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut seen = HashSet::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                if literal_start < i {
                    segments.push(Segment::Literal(&path[literal_start..i]));
                }
                let end = closing_brace(path, i)?;
                let placeholder = parse_placeholder(path, &path[i..=end])?;
                if !seen.insert(placeholder.name) {
                    return Err(RouterError::invalid_path(
                        path,
                        format!("duplicate parameter '{}'", placeholder.name),
                    ));
                }
                segments.push(Segment::Placeholder(placeholder));
                i = end + 1;
                literal_start = i;
            }
            b'}' => {
                return Err(RouterError::invalid_path(
                    path,
                    format!("unmatched '}}' at byte {i}"),
                ));
            }
            _ => i += 1,
        }
    }

    if literal_start < bytes.len() {
        segments.push(Segment::Literal(&path[literal_start..]));
    }
    Ok(segments)
}

/// Compiles a template into its static/dynamic form.
///
/// # Examples
///
/// ```
/// use routeforge_routing::urls::compiler::compile;
///
/// let compiled = compile("/articles/{year:\\d{4}}/{slug}").unwrap();
/// assert_eq!(
///     compiled.regex().unwrap().as_str(),
///     r"^/articles/(?P<year>\d{4})/(?P<slug>[^/]+)$"
/// );
///
/// assert!(compile("/about").unwrap().is_static());
/// ```
///
/// # Errors
///
/// Returns [`RouterError::InvalidRoutePath`] if the template is malformed or a
/// constraint is not a valid regex.
pub fn compile(path: &str) -> RouterResult<CompiledPath> {
    let segments = tokenize(path)?;
    if !segments
        .iter()
        .any(|segment| matches!(segment, Segment::Placeholder(_)))
    {
        return Ok(CompiledPath {
            regex: None,
            parameters: Vec::new(),
        });
    }

    let mut pattern = String::from("^");
    let mut parameters = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(text) => {
                // A '/' right before an optional placeholder moves into its group.
                let text = if next_is_optional(&segments, index) {
                    text.strip_suffix('/').unwrap_or(text)
                } else {
                    text
                };
                pattern.push_str(&regex::escape(text));
            }
            Segment::Placeholder(placeholder) => {
                let constraint = placeholder.constraint.unwrap_or(DEFAULT_CONSTRAINT);
                let name = placeholder.name;
                if placeholder.optional {
                    let separator = if previous_ends_with_slash(&segments, index) {
                        "/"
                    } else {
                        ""
                    };
                    write!(pattern, "(?:{separator}(?P<{name}>{constraint}))?").ok();
                } else {
                    write!(pattern, "(?P<{name}>{constraint})").ok();
                }
                parameters.push(ParamSpec {
                    name: name.to_string(),
                    constraint: constraint.to_string(),
                    optional: placeholder.optional,
                });
            }
        }
    }

    pattern.push('$');
    let regex = Regex::new(&pattern)
        .map_err(|e| RouterError::invalid_path(path, format!("invalid constraint: {e}")))?;

    Ok(CompiledPath {
        regex: Some(regex),
        parameters,
    })
}

/// Finds the `}` closing the placeholder opened at `open`.
fn closing_brace(path: &str, open: usize) -> RouterResult<usize> {
    let bytes = path.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(RouterError::invalid_path(
        path,
        format!("unclosed '{{' at byte {open}"),
    ))
}

fn parse_placeholder<'a>(path: &str, raw: &'a str) -> RouterResult<Placeholder<'a>> {
    let inner = &raw[1..raw.len() - 1];
    let (head, constraint) = inner
        .split_once(':')
        .map_or((inner, None), |(head, constraint)| (head, Some(constraint)));
    let (name, optional) = head
        .strip_suffix('?')
        .map_or((head, false), |name| (name, true));

    if name.is_empty() {
        return Err(RouterError::invalid_path(path, "empty parameter name"));
    }
    if !is_valid_name(name) {
        return Err(RouterError::invalid_path(
            path,
            format!("invalid parameter name '{name}'"),
        ));
    }
    if constraint.is_some_and(str::is_empty) {
        return Err(RouterError::invalid_path(
            path,
            format!("empty constraint for parameter '{name}'"),
        ));
    }

    Ok(Placeholder {
        raw,
        name,
        constraint,
        optional,
    })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn next_is_optional(segments: &[Segment<'_>], index: usize) -> bool {
    matches!(
        segments.get(index + 1),
        Some(Segment::Placeholder(placeholder)) if placeholder.optional
    )
}

fn previous_ends_with_slash(segments: &[Segment<'_>], index: usize) -> bool {
    index
        .checked_sub(1)
        .and_then(|prev| segments.get(prev))
        .is_some_and(|segment| matches!(segment, Segment::Literal(text) if text.ends_with('/')))
}
