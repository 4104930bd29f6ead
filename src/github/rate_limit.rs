use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use std::time::Duration;

// -------------------------------------------------------------------------------------------------
// RateLimitState
// -------------------------------------------------------------------------------------------------
/// The primary rate limit as reported by the `x-ratelimit-*` headers of one response.
///
/// This is recomputed from every response and never carried across calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Calls left in the current window
    pub remaining: Option<u64>,

    /// Window capacity
    pub limit: Option<u64>,

    /// Calls used in the current window
    pub used: Option<u64>,

    /// When the window refreshes
    pub reset: Option<DateTime<Utc>>,

    /// Which rate limit bucket applies, e.g., `core` or `search`
    pub resource: Option<String>,

    /// The server's notion of the current time, from the `Date` header
    pub server_time: Option<DateTime<Utc>>,
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name).and_then(|v| atoi::atoi::<u64>(v.as_bytes()))
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl RateLimitState {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let reset = header_str(headers, "x-ratelimit-reset")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        let server_time = header_str(headers, "date")
            .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
            .map(|d| d.with_timezone(&Utc));

        RateLimitState {
            remaining: header_u64(headers, "x-ratelimit-remaining"),
            limit: header_u64(headers, "x-ratelimit-limit"),
            used: header_u64(headers, "x-ratelimit-used"),
            reset,
            resource: header_str(headers, "x-ratelimit-resource").map(str::to_string),
            server_time,
        }
    }

    /// Is the primary rate limit exhausted, i.e., is `remaining` present and zero?
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// How long until the window resets, measured against the server's clock when available.
    ///
    /// Returns `None` if the reset instant is unknown. A reset instant in the past gives zero.
    pub fn wait(&self) -> Option<Duration> {
        let reset = self.reset?;
        let now = self.server_time.unwrap_or_else(Utc::now);
        Some((reset - now).to_std().unwrap_or(Duration::ZERO))
    }
}

impl std::fmt::Display for RateLimitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_opt = |v: Option<u64>| v.map_or_else(|| "?".to_string(), |v| v.to_string());
        write!(f, "{}/{}", fmt_opt(self.remaining), fmt_opt(self.limit))?;
        if let Some(reset) = self.reset {
            write!(f, " - resets at {}", reset.to_rfc3339())?;
        }
        Ok(())
    }
}
