use std::time::Duration;

// -------------------------------------------------------------------------------------------------
// ClientConfig
// -------------------------------------------------------------------------------------------------
/// The tunables of the transport and retry policy.
///
/// This is an immutable value handed to the `Client` when it is built; nothing in the crate reads
/// these settings from global state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Attempts per logical operation (one page, one create, one update)
    pub retries: u32,

    /// Delay after every request that was not rate-limited, to stay under secondary limits
    pub request_delay: Duration,

    /// How long to sleep on primary rate limiting when `x-ratelimit-reset` cannot be parsed
    pub rate_limit_fallback: Duration,

    /// How long to sleep on secondary rate limiting when no `Retry-After` header is given
    pub secondary_backoff: Duration,

    /// Page size for list endpoints
    pub per_page: u32,

    /// Value of the `X-GitHub-Api-Version` header
    pub api_version: String,

    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl ClientConfig {
    pub const DEFAULT_RETRIES: u32 = 5;
    pub const MAX_PER_PAGE: u32 = 100;
    pub const API_VERSION: &'static str = "2022-11-28";
    pub const USER_AGENT: &'static str = concat!("ghas-cli/", env!("CARGO_PKG_VERSION"));

    /// A configuration that never sleeps, for driving the client against a local mock server.
    pub fn without_delays() -> Self {
        ClientConfig {
            request_delay: Duration::ZERO,
            rate_limit_fallback: Duration::ZERO,
            secondary_backoff: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn rate_limit_fallback(mut self, wait: Duration) -> Self {
        self.rate_limit_fallback = wait;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            retries: Self::DEFAULT_RETRIES,
            request_delay: Duration::from_secs(1),
            rate_limit_fallback: Duration::from_secs(60),
            secondary_backoff: Duration::from_secs(60),
            per_page: Self::MAX_PER_PAGE,
            api_version: Self::API_VERSION.to_string(),
            user_agent: Self::USER_AGENT.to_string(),
        }
    }
}
