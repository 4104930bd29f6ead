use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::ClientError;
use super::{Disposition, RateLimitState, Result};

// -------------------------------------------------------------------------------------------------
// ApiRequest
// -------------------------------------------------------------------------------------------------
/// One REST call, described independently of the base URL and credential.
///
/// The path is a list of segments; none of them may contain a slash.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: Vec<String>,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new<S: AsRef<str>>(method: Method, path: &[S]) -> Self {
        ApiRequest {
            method,
            path: path.iter().map(|p| p.as_ref().to_string()).collect(),
            params: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get<S: AsRef<str>>(path: &[S]) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post<S: AsRef<str>>(path: &[S]) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put<S: AsRef<str>>(path: &[S]) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch<S: AsRef<str>>(path: &[S]) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn param<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// A copy of this request with `page` and `per_page` set.
    pub(super) fn for_page(&self, page: u32, per_page: u32) -> Self {
        let mut req = self.clone();
        req.params.retain(|(k, _)| k != "page" && k != "per_page");
        req.params.push(("per_page".to_string(), per_page.to_string()));
        req.params.push(("page".to_string(), page.to_string()));
        req
    }

    /// A short `METHOD /path` description for log messages.
    pub fn describe(&self) -> String {
        format!("{} /{}", self.method, self.path.join("/"))
    }
}

// -------------------------------------------------------------------------------------------------
// ApiResponse
// -------------------------------------------------------------------------------------------------
/// A fully-read response, along with what the transport made of it.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub rate_limit: RateLimitState,
    pub disposition: Disposition,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The body as untyped JSON, or `Value::Null` if it is empty or not JSON.
    pub fn json_value(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// The `message` field of a GitHub error body, if there is one.
    pub fn message(&self) -> Option<String> {
        serde_json::from_slice::<ClientError>(&self.body)
            .ok()
            .map(|e| e.message)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
