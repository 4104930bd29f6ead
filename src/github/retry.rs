use reqwest::StatusCode;
use tracing::{debug, warn};

use super::client::pause;
use super::{ApiRequest, ApiResponse, Client, Disposition, Error, Result};

impl Client {
    /// Issue a request under the retry policy, succeeding only on one of the `expected` statuses.
    ///
    /// At most `config().retries` attempts are made. Rate limiting, 5xx responses, and network
    /// errors consume an attempt; the transport has already slept as appropriate before the next
    /// one is made, and a network error is followed by the inter-request delay. A status that
    /// retrying cannot change (e.g., 404 or 422), or a success status other than the expected
    /// ones, ends the operation right away with `Error::UnexpectedStatus`. A 401 ends it with
    /// `Error::Unauthorized`.
    pub async fn send_with_retry(
        &self,
        request: &ApiRequest,
        expected: &[StatusCode],
    ) -> Result<ApiResponse> {
        let attempts = self.config.retries.max(1);
        let mut last_status = None;

        for attempt in 1..=attempts {
            let response = match self.send(request).await {
                Ok(response) => response,
                Err(Error::ReqwestError(e)) => {
                    warn!(
                        "Attempt {attempt}/{attempts} of {} failed: {e}",
                        request.describe()
                    );
                    if attempt < attempts {
                        pause(self.config.request_delay).await;
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            if expected.contains(&response.status) {
                return Ok(response);
            }
            last_status = Some(response.status);

            match response.disposition {
                d if d.is_retryable() => {
                    debug!(
                        "Attempt {attempt}/{attempts} of {} got {}; retrying",
                        request.describe(),
                        response.status
                    );
                }
                Disposition::Unauthorized => {
                    // `send` already turns 401 into an error
                    return Err(Error::Unauthorized {
                        message: response.message().unwrap_or_default(),
                    });
                }
                _ => {
                    debug!("{} got {}", request.describe(), response.status);
                    return Err(Error::UnexpectedStatus {
                        status: response.status,
                        message: response.message(),
                    });
                }
            }
        }

        warn!("Giving up on {} after {attempts} attempts", request.describe());
        Err(Error::RetriesExhausted {
            attempts,
            last_status,
        })
    }
}
