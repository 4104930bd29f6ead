use reqwest::StatusCode;

use super::RateLimitState;

// -------------------------------------------------------------------------------------------------
// Disposition
// -------------------------------------------------------------------------------------------------
/// What a response means for the caller, independent of which endpoint produced it.
///
/// This is the one place where HTTP statuses are sorted into retryable and terminal outcomes; both
/// the transport and the retry policy are driven from it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// A 2xx response
    Success,

    /// A non-2xx response while the primary rate limit is exhausted
    PrimaryRateLimit,

    /// A 403 or 429 response without the primary limit being exhausted
    SecondaryRateLimit,

    /// A server-side or timeout failure that may go away on its own
    Retryable,

    /// The credential was rejected
    Unauthorized,

    /// Anything else; retrying will not change the answer
    Terminal,
}

impl Disposition {
    pub fn classify(status: StatusCode, rate_limit: &RateLimitState) -> Self {
        if status.is_success() {
            return Disposition::Success;
        }
        if rate_limit.is_exhausted() {
            return Disposition::PrimaryRateLimit;
        }
        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Disposition::SecondaryRateLimit,
            StatusCode::UNAUTHORIZED => Disposition::Unauthorized,
            StatusCode::REQUEST_TIMEOUT => Disposition::Retryable,
            s if s.is_server_error() => Disposition::Retryable,
            _ => Disposition::Terminal,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Disposition::PrimaryRateLimit | Disposition::SecondaryRateLimit)
    }

    /// Should the retry policy spend another attempt on this?
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limited() || *self == Disposition::Retryable
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn exhausted() -> RateLimitState {
        RateLimitState {
            remaining: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn success_wins_over_exhausted_limit() {
        assert_eq!(Disposition::classify(StatusCode::OK, &exhausted()), Disposition::Success);
        assert_eq!(Disposition::classify(StatusCode::CREATED, &Default::default()), Disposition::Success);
    }

    #[test]
    fn primary_rate_limit() {
        let d = Disposition::classify(StatusCode::FORBIDDEN, &exhausted());
        assert_eq!(d, Disposition::PrimaryRateLimit);
        assert!(d.is_retryable());
    }

    #[test]
    fn secondary_rate_limit() {
        let d = Disposition::classify(StatusCode::FORBIDDEN, &Default::default());
        assert_eq!(d, Disposition::SecondaryRateLimit);
        assert_eq!(
            Disposition::classify(StatusCode::TOO_MANY_REQUESTS, &Default::default()),
            Disposition::SecondaryRateLimit
        );
    }

    #[test]
    fn unauthorized() {
        let d = Disposition::classify(StatusCode::UNAUTHORIZED, &Default::default());
        assert_eq!(d, Disposition::Unauthorized);
        assert!(!d.is_retryable());
    }

    #[test]
    fn server_errors_are_retryable() {
        for status in [StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY, StatusCode::REQUEST_TIMEOUT] {
            assert_eq!(Disposition::classify(status, &Default::default()), Disposition::Retryable);
        }
    }

    #[test]
    fn client_errors_are_terminal() {
        for status in [StatusCode::NOT_FOUND, StatusCode::UNPROCESSABLE_ENTITY, StatusCode::CONFLICT] {
            let d = Disposition::classify(status, &Default::default());
            assert_eq!(d, Disposition::Terminal);
            assert!(!d.is_retryable());
        }
    }
}
