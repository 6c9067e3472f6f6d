//! Output filename patterns
//!
//! Supported tokens: `{date}` (YYYYMMDD), `{time}` (HHMMSS),
//! `{datetime}` (YYYYMMDD_HHMMSS), `{region}` and `{account}`.
//! Unrecognised tokens are left as written. Substituted region and account
//! values are reduced to `[A-Za-z0-9_-]` so they cannot form a path.

use chrono::NaiveDateTime;

const UNKNOWN_ACCOUNT: &str = "unknown";

/// Values substituted into a filename pattern
#[derive(Debug, Clone, Copy)]
pub struct FilenameContext<'a> {
    /// Local wall-clock time of the run
    pub timestamp: NaiveDateTime,
    pub region: &'a str,
    pub account: Option<&'a str>,
}

/// Expand `pattern` into a base filename without extension
pub fn expand_pattern(pattern: &str, ctx: &FilenameContext<'_>) -> String {
    let replacements = [
        ("{datetime}", ctx.timestamp.format("%Y%m%d_%H%M%S").to_string()),
        ("{date}", ctx.timestamp.format("%Y%m%d").to_string()),
        ("{time}", ctx.timestamp.format("%H%M%S").to_string()),
        ("{region}", path_safe(ctx.region)),
        ("{account}", path_safe(ctx.account.unwrap_or(UNKNOWN_ACCOUNT))),
    ];

    replacements
        .iter()
        .fold(pattern.to_string(), |name, (token, value)| {
            name.replace(*token, value)
        })
}

fn path_safe(value: &str) -> String {
    let safe: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe != value {
        tracing::warn!(value, substituted = %safe, "Replaced unsafe characters in filename value");
    }
    safe
}
