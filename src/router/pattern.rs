//! URI template compilation.
//!
//! Templates are compiled once, when a route is registered, into an anchored
//! [`Regex`] plus the ordered list of placeholders it captures. Matching a
//! request path against a route never recompiles anything.
//!
//! ## Template syntax
//!
//! | Token        | Meaning                                                    |
//! |--------------|------------------------------------------------------------|
//! | `lead`       | literal text, matched verbatim                             |
//! | `:id`        | one path segment (`[^/]+`)                                 |
//! | `:path+`     | one or more segments joined by `/` (`.+`), split on match  |
//! | `(` ... `)`  | optional group, e.g. `/foo(/bar)` matches `/foo` and `/foo/bar` |
//!
//! A doubled colon (`::id`) is accepted and normalized to `:id`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Scans a template for placeholder tokens: `:name`, `::name`, `:name+`.
#[allow(clippy::expect_used)]
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::?([A-Za-z0-9_]+)(\+)?").expect("placeholder scanner is valid"));

/// Error produced when a URI template cannot be compiled.
///
/// Returned at registration time so a malformed route fails at startup
/// instead of silently never matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A `)` without a matching `(`, or a `(` that is never closed.
    UnbalancedGroup {
        /// The offending template
        pattern: String,
    },
    /// The same placeholder name appears twice in one template.
    DuplicateParam {
        /// The offending template
        pattern: String,
        /// The repeated placeholder name
        name: String,
    },
    /// The generated expression was rejected by the regex engine.
    Regex {
        /// The offending template
        pattern: String,
        /// Message reported by the regex engine
        message: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::UnbalancedGroup { pattern } => {
                write!(f, "route pattern '{pattern}' has unbalanced optional groups")
            }
            PatternError::DuplicateParam { pattern, name } => {
                write!(
                    f,
                    "route pattern '{pattern}' declares placeholder ':{name}' more than once"
                )
            }
            PatternError::Regex { pattern, message } => {
                write!(f, "route pattern '{pattern}' failed to compile: {message}")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// A named capture in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Name without the leading `:` or trailing `+`
    pub name: Arc<str>,
    /// `true` for `:name+` placeholders spanning several segments
    pub greedy: bool,
}

/// Template compiled into an anchored expression.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    placeholders: Vec<Placeholder>,
}

impl CompiledPattern {
    /// Compile the literal-plus-placeholder form of a template.
    ///
    /// Capture group `i + 1` of the resulting expression belongs to
    /// `placeholders()[i]`; optional groups are non-capturing.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let mut expr = String::with_capacity(template.len() * 2 + 4);
        expr.push('^');

        let mut placeholders: Vec<Placeholder> = Vec::new();
        let mut depth = 0usize;
        let mut last = 0usize;

        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            push_literal(&mut expr, &template[last..whole.start()], &mut depth, template)?;

            let name = &caps[1];
            let greedy = caps.get(2).is_some();
            if placeholders.iter().any(|p| p.name.as_ref() == name) {
                return Err(PatternError::DuplicateParam {
                    pattern: template.to_string(),
                    name: name.to_string(),
                });
            }
            expr.push_str(if greedy { "(.+)" } else { "([^/]+)" });
            placeholders.push(Placeholder {
                name: Arc::from(name),
                greedy,
            });
            last = whole.end();
        }
        push_literal(&mut expr, &template[last..], &mut depth, template)?;

        if depth != 0 {
            return Err(PatternError::UnbalancedGroup {
                pattern: template.to_string(),
            });
        }
        // Trailing-slash tolerance: only reachable for `/` and group-wrapped slashes.
        if template.ends_with('/') {
            expr.push('?');
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| PatternError::Regex {
            pattern: template.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            regex,
            placeholders,
        })
    }

    /// Placeholders in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// The anchored expression, for diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Run the expression against `path`, returning one raw capture per
    /// placeholder (`None` where an optional group did not participate).
    pub(crate) fn captures<'p>(&self, path: &'p str) -> Option<Vec<Option<&'p str>>> {
        let caps = self.regex.captures(path)?;
        Some(
            (1..=self.placeholders.len())
                .map(|i| caps.get(i).map(|m| m.as_str()))
                .collect(),
        )
    }
}

fn push_literal(
    expr: &mut String,
    text: &str,
    depth: &mut usize,
    template: &str,
) -> Result<(), PatternError> {
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        match ch {
            '(' => {
                *depth += 1;
                expr.push_str("(?:");
            }
            ')' => {
                if *depth == 0 {
                    return Err(PatternError::UnbalancedGroup {
                        pattern: template.to_string(),
                    });
                }
                *depth -= 1;
                expr.push_str(")?");
            }
            _ => expr.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }
    Ok(())
}

/// Normalize a raw template: trim it, drop one trailing `/` unless the
/// template is the root, and fall back to `/` when nothing is left.
#[must_use]
pub fn normalize_pattern(raw: &str) -> String {
    let mut uri = raw.trim();
    if uri.len() > 1 {
        if let Some(stripped) = uri.strip_suffix('/') {
            uri = stripped.trim();
        }
    }
    if uri.is_empty() {
        "/".to_string()
    } else {
        uri.to_string()
    }
}

/// Split a normalized template into its `/`-delimited segments, collapsing
/// `::name` to `:name`.
#[must_use]
pub fn split_segments(pattern: &str) -> Vec<String> {
    pattern
        .split('/')
        .map(|segment| {
            if PLACEHOLDER.is_match(segment) {
                segment.replace("::", ":")
            } else {
                segment.to_string()
            }
        })
        .collect()
}

/// Percent-decode a captured value the way form decoding does: `+` becomes a
/// space, `%XX` escapes are expanded, invalid UTF-8 is replaced lossily.
#[must_use]
pub fn url_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned(),
    }
}
