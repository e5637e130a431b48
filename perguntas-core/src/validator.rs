//! Static, token-level safety check for generated SQL.
//!
//! This is deliberately not a parser. A statement passes when it is a single
//! statement starting with `SELECT`, contains none of the mutating keywords as
//! a whole word, and ends up with a top-level `LIMIT` no larger than the cap.
//! The read-only database role remains the second line of defence.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::PipelineError;
use crate::types::GeneratedSql;

const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "MERGE", "DROP", "ALTER", "TRUNCATE", "CREATE", "GRANT",
    "REVOKE", "COPY", "CALL", "INTO",
];

static FORBIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", FORBIDDEN_KEYWORDS.join("|")))
        .expect("keyword pattern is a literal")
});

static LIMIT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\b").expect("LIMIT pattern is a literal"));

static LIMIT_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s+(ALL\b|\d+\b)").expect("LIMIT value pattern is a literal")
});

/// SQL that passed [`SafetyValidator::validate`]; only the validator builds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSql(String);

impl ValidatedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SafetyValidator {
    limit_cap: u64,
}

impl SafetyValidator {
    pub fn new(limit_cap: u64) -> Self {
        Self { limit_cap }
    }

    pub fn limit_cap(&self) -> u64 {
        self.limit_cap
    }

    /// Accepts, rewrites the LIMIT of, or rejects `sql`.
    ///
    /// Comments are removed first, so neither a commented-out LIMIT nor a
    /// trailing `--` comment can hide the row bound. A missing top-level
    /// LIMIT is then appended once as `LIMIT {cap}` after dropping a trailing
    /// semicolon. A literal LIMIT above the cap, or `LIMIT ALL`, is lowered
    /// to the cap.
    pub fn validate(&self, sql: &GeneratedSql) -> Result<ValidatedSql, PipelineError> {
        let text = sql.as_str().trim();
        let uncommented =
            strip_comments(text).ok_or_else(|| reject("unterminated block comment", text))?;
        let uncommented = uncommented.trim();
        let body = uncommented
            .strip_suffix(';')
            .unwrap_or(uncommented)
            .trim_end();

        if body.is_empty() {
            return Err(reject("empty statement", text));
        }

        if !starts_with_select(body) {
            return Err(reject("statement does not start with SELECT", text));
        }

        if body.contains(';') {
            return Err(reject("more than one statement", text));
        }

        if let Some(found) = FORBIDDEN.find(body) {
            return Err(reject(
                &format!("forbidden keyword {}", found.as_str().to_uppercase()),
                text,
            ));
        }

        let rewritten = self.apply_limit(body).map_err(|reason| reject(reason, text))?;
        Ok(ValidatedSql(rewritten))
    }

    fn apply_limit(&self, body: &str) -> Result<String, &'static str> {
        let top_level: Vec<usize> = LIMIT_KEYWORD
            .find_iter(body)
            .filter(|m| is_top_level(body, m.start()))
            .map(|m| m.end())
            .collect();

        if top_level.is_empty() {
            tracing::debug!(cap = self.limit_cap, "Adding LIMIT to query");
            return Ok(format!("{} LIMIT {}", body, self.limit_cap));
        }

        let mut rewritten = String::with_capacity(body.len());
        let mut copied = 0;
        for keyword_end in top_level {
            let value = LIMIT_VALUE
                .captures(&body[keyword_end..])
                .and_then(|c| c.get(1))
                .ok_or("LIMIT must be a literal row count")?;
            let (start, end) = (keyword_end + value.start(), keyword_end + value.end());
            let literal = value.as_str();

            let within_cap = !literal.eq_ignore_ascii_case("ALL")
                && literal
                    .parse::<u64>()
                    .map(|n| n <= self.limit_cap)
                    .unwrap_or(false);

            if !within_cap {
                tracing::debug!(
                    requested = literal,
                    cap = self.limit_cap,
                    "Clamping LIMIT to cap"
                );
                rewritten.push_str(&body[copied..start]);
                rewritten.push_str(&self.limit_cap.to_string());
                copied = end;
            }
        }
        rewritten.push_str(&body[copied..]);
        Ok(rewritten)
    }
}

fn reject(reason: &str, sql: &str) -> PipelineError {
    tracing::warn!(reason, sql, "Rejected generated SQL");
    PipelineError::unsafe_query(reason)
}

fn starts_with_select(body: &str) -> bool {
    match body.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("SELECT") => body[6..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_')),
        _ => false,
    }
}

/// Replaces `-- …` line comments and (nested) `/* … */` block comments that
/// sit outside string literals and quoted identifiers with a single space.
/// `None` when a block comment is never closed.
fn strip_comments(sql: &str) -> Option<String> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_string = false;
    let mut in_identifier = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_identifier => {
                in_string = !in_string;
                out.push(c);
            }
            '"' if !in_string => {
                in_identifier = !in_identifier;
                out.push(c);
            }
            '-' if !in_string && !in_identifier && chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                out.push(' ');
            }
            '/' if !in_string && !in_identifier && chars.peek() == Some(&'*') => {
                chars.next();
                let mut depth = 1;
                while depth > 0 {
                    match chars.next()? {
                        '*' if chars.peek() == Some(&'/') => {
                            chars.next();
                            depth -= 1;
                        }
                        '/' if chars.peek() == Some(&'*') => {
                            chars.next();
                            depth += 1;
                        }
                        _ => {}
                    }
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    Some(out)
}

/// True when `position` is outside parentheses, string literals and quoted
/// identifiers
fn is_top_level(sql: &str, position: usize) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut in_identifier = false;
    for c in sql[..position].chars() {
        match c {
            '\'' if !in_identifier => in_string = !in_string,
            '"' if !in_string => in_identifier = !in_identifier,
            '(' if !in_string && !in_identifier => depth += 1,
            ')' if !in_string && !in_identifier => depth -= 1,
            _ => {}
        }
    }
    depth == 0 && !in_string && !in_identifier
}
