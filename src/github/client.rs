use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Url;
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

use super::{
    ApiRequest, ApiResponse, Auth, ClientBuilder, ClientConfig, Disposition, Error,
    RateLimitState, Result,
};

// -------------------------------------------------------------------------------------------------
// Client
// -------------------------------------------------------------------------------------------------
pub struct Client {
    pub(super) base_url: Url,
    pub(super) inner: reqwest::Client,
    pub(super) auth: Auth,
    pub(super) config: ClientConfig,
}

impl Client {
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issue a single request and apply the rate-limit policy to the response.
    ///
    /// The policy, in order:
    ///
    /// 1. If `x-ratelimit-remaining` is `0`, sleep until `x-ratelimit-reset` (or for the fallback
    ///    duration if that header is unusable) before returning, whatever the status.
    /// 2. A 403 or 429 otherwise is secondary rate limiting: log the API's message and back off
    ///    for `Retry-After` seconds, or the configured backoff.
    /// 3. A 401 is logged and returned as `Error::Unauthorized`.
    /// 4. Anything else: sleep the inter-request delay and return.
    ///
    /// HTTP-level failures other than 401 are not errors here; the response is returned along with
    /// its `Disposition` and the caller decides.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.make_url(&request.path, &request.params)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Ok(version) = HeaderValue::from_str(&self.config.api_version) {
            headers.insert("X-GitHub-Api-Version", version);
        }
        for (name, value) in request.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        // build request, handling authentication if any
        let request_builder = self
            .inner
            .request(request.method.clone(), url)
            .headers(headers);
        let request_builder = match &self.auth {
            Auth::BearerToken(token) => request_builder.bearer_auth(token.expose_secret()),
            Auth::Unauthenticated => request_builder,
        };
        let request_builder = match &request.body {
            Some(body) => request_builder.json(body),
            None => request_builder,
        };

        // send request and read the whole response
        let response = request_builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        let rate_limit = RateLimitState::from_headers(&headers);
        let disposition = Disposition::classify(status, &rate_limit);
        trace!("{} -> {status} ({rate_limit})", request.describe());

        let response = ApiResponse {
            status,
            headers,
            body,
            rate_limit,
            disposition,
        };

        if response.rate_limit.is_exhausted() {
            let wait = match response.rate_limit.wait() {
                Some(wait) => wait,
                None => {
                    debug!("Unusable x-ratelimit-reset header; using fallback wait");
                    self.config.rate_limit_fallback
                }
            };
            warn!("Rate limit reached: {}; waiting {wait:?}", response.rate_limit);
            pause(wait).await;
            return Ok(response);
        }

        match response.disposition {
            Disposition::SecondaryRateLimit => {
                let message = response.message().unwrap_or_default();
                let wait = response
                    .headers
                    .get(header::RETRY_AFTER)
                    .and_then(|v| atoi::atoi::<u64>(v.as_bytes()))
                    .map(Duration::from_secs)
                    .unwrap_or(self.config.secondary_backoff);
                warn!(
                    "Secondary rate limit on {} ({status}): {message}; waiting {wait:?}",
                    request.describe()
                );
                pause(wait).await;
                Ok(response)
            }

            Disposition::Unauthorized => {
                let message = response.message().unwrap_or_else(|| response.text());
                error!("Unauthorized request to {}: {message}", request.describe());
                Err(Error::Unauthorized { message })
            }

            _ => {
                pause(self.config.request_delay).await;
                Ok(response)
            }
        }
    }
}

pub(super) async fn pause(wait: Duration) {
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
}

/// Create a URL from the given base, path parts, and parameters.
///
/// The path parts should not contain slashes.
fn url_from_path_parts_and_params<S: AsRef<str>>(
    base_url: Url,
    path_parts: &[S],
    params: &[(String, String)],
) -> Result<Url> {
    if base_url.cannot_be_a_base() {
        return Err(Error::UrlBaseError(base_url));
    }

    let mut buf = base_url.path().to_string();
    if !buf.ends_with('/') {
        buf.push('/');
    }

    for (i, p) in path_parts.iter().enumerate() {
        let p = p.as_ref();
        if p.contains('/') {
            return Err(Error::UrlSlashError(p.to_string()));
        }
        if i > 0 {
            // do not add a leading slash for the very first path part, or the result comes out
            // wrong, as it is unintentionally treated as an absolute path
            buf.push('/');
        }
        buf.push_str(p);
    }
    let url = base_url.join(&buf)?;
    let url = if params.is_empty() {
        Url::parse(url.as_str())
    } else {
        Url::parse_with_params(url.as_str(), params)
    }?;
    Ok(url)
}


// private implementation
impl Client {
    /// Construct a `Url` from the given path parts and query parameters.
    fn make_url(&self, path_parts: &[String], params: &[(String, String)]) -> Result<Url> {
        url_from_path_parts_and_params(self.base_url.clone(), path_parts, params)
    }
}
