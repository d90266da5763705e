//! Strippers for the vendors' three non-JSON envelopes.
//!
//! Everything funnels through [`json_slice`]: find the first `{` or `[`,
//! keep through the last matching closer, and let the JSON parser judge the
//! rest. The callback / variable-assignment variants exist so call sites
//! say which envelope they expect and error messages stay precise.

use kline_types::KlineError;

/// Cut a body down to its JSON payload.
///
/// # Errors
/// `KlineError::Parse` (carrying a body fragment) when no JSON payload is
/// present.
pub fn json_slice(body: &str) -> Result<&str, KlineError> {
    let start = body
        .find(['{', '['])
        .ok_or_else(|| KlineError::parse("no JSON payload in body", body))?;
    let closer = if body.as_bytes()[start] == b'{' { '}' } else { ']' };
    let end = body
        .rfind(closer)
        .ok_or_else(|| KlineError::parse("unterminated JSON payload", body))?;
    if end < start {
        return Err(KlineError::parse("unterminated JSON payload", body));
    }
    Ok(&body[start..=end])
}

/// Strip a `callback(...)` / `callback(...);` JSONP envelope.
///
/// # Errors
/// `KlineError::Parse` when there is no callback invocation to strip.
pub fn strip_jsonp(body: &str) -> Result<&str, KlineError> {
    let open = body
        .find('(')
        .ok_or_else(|| KlineError::parse("no JSONP callback in body", body))?;
    json_slice(&body[open + 1..])
}

/// Strip a `var name=...` / `name=...` assignment envelope.
///
/// # Errors
/// `KlineError::Parse` when there is no assignment to strip.
pub fn strip_var_assign(body: &str) -> Result<&str, KlineError> {
    let eq = body
        .find('=')
        .ok_or_else(|| KlineError::parse("no variable assignment in body", body))?;
    json_slice(&body[eq + 1..])
}

/// Some vendors prepend a comment block before the callback; drop it.
#[must_use]
pub fn skip_leading_comment(body: &str) -> &str {
    match body.split_once("*/") {
        Some((_, rest)) => rest.trim_start(),
        None => body,
    }
}
