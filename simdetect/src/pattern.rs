//! Name pattern compilation and matching.
//!
//! Object names are matched against patterns in one of two dialects:
//!
//! | Dialect | Syntax | Example |
//! |---------|--------|---------|
//! | Glob (default) | `*` any run, `?` one char, `[a-z]` / `[!a-z]` classes | `Cylinder*` |
//! | Regex | `regex:` prefix, full `regex` crate syntax | `regex:Cyl(inder)?_\d+` |
//!
//! Both dialects match the **whole** name. Matching is case-insensitive
//! unless [`MatchOptions::case_sensitive`] is set. Patterns are compiled once
//! when added to a filter, so a malformed pattern is rejected up front rather
//! than silently matching nothing at query time.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::{DetectionError, DetectionResult};

/// Prefix selecting the regex dialect.
pub const REGEX_PREFIX: &str = "regex:";

/// Options applied when compiling name patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    /// Match letter case exactly. Defaults to `false`.
    pub case_sensitive: bool,
}

impl MatchOptions {
    /// Case-sensitive matching.
    pub fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Glob(glob::Pattern),
    Regex(Regex),
}

/// A compiled object-name pattern.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    matcher: Matcher,
    case_sensitive: bool,
}

impl NamePattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// - [`DetectionError::EmptyPattern`] for an empty pattern or a bare
    ///   `regex:` prefix
    /// - [`DetectionError::InvalidPattern`] if the glob or regex fails to compile
    pub fn compile(source: &str, options: MatchOptions) -> DetectionResult<Self> {
        if source.is_empty() {
            return Err(DetectionError::EmptyPattern);
        }

        let matcher = match source.strip_prefix(REGEX_PREFIX) {
            Some(body) => Matcher::Regex(compile_regex(source, body, options)?),
            None => Matcher::Glob(compile_glob(source)?),
        };

        Ok(Self {
            source: source.to_string(),
            matcher,
            case_sensitive: options.case_sensitive,
        })
    }

    /// The pattern text as supplied by the caller.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether this pattern uses the regex dialect.
    pub fn is_regex(&self) -> bool {
        matches!(self.matcher, Matcher::Regex(_))
    }

    /// Test a name against this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::Glob(pattern) => pattern.matches_with(
                name,
                glob::MatchOptions {
                    case_sensitive: self.case_sensitive,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                },
            ),
            Matcher::Regex(regex) => regex.is_match(name),
        }
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.case_sensitive == other.case_sensitive
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn compile_glob(source: &str) -> DetectionResult<glob::Pattern> {
    // Object names are not paths; `**` means the same as `*` here, but the
    // glob crate only accepts it as a whole path component.
    let collapsed = collapse_stars(source);
    glob::Pattern::new(&collapsed).map_err(|e| DetectionError::InvalidPattern {
        pattern: source.to_string(),
        reason: e.to_string(),
    })
}

fn compile_regex(source: &str, body: &str, options: MatchOptions) -> DetectionResult<Regex> {
    if body.is_empty() {
        return Err(DetectionError::EmptyPattern);
    }

    RegexBuilder::new(&format!("^(?:{})$", body))
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|e| DetectionError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })
}

fn collapse_stars(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut previous_star = false;
    for c in source.chars() {
        if c == '*' {
            if !previous_star {
                out.push(c);
            }
            previous_star = true;
        } else {
            out.push(c);
            previous_star = false;
        }
    }
    out
}
