use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiRequest, Client, Error, Result};

// -------------------------------------------------------------------------------------------------
// Collected
// -------------------------------------------------------------------------------------------------
/// The items gathered from a list endpoint.
///
/// `complete` is false when the walk was cut short by an error rather than an empty page; the
/// items gathered up to that point are still returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub complete: bool,
}

impl<T> Collected<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Collected {
            items: Vec::new(),
            complete: true,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Paginator
// -------------------------------------------------------------------------------------------------
/// Walks a `page`/`per_page` list endpoint one page at a time.
///
/// Every page is one logical operation under the retry policy. The walk ends on the first empty
/// page, or on the first page that fails. A fresh `Paginator` always starts over at page 1.
pub struct Paginator<'c> {
    client: &'c Client,
    request: ApiRequest,
    item_key: Option<String>,
    page: u32,
    done: bool,
    complete: bool,
}

impl<'c> Paginator<'c> {
    pub fn new(client: &'c Client, request: ApiRequest) -> Self {
        Paginator {
            client,
            request,
            item_key: None,
            page: 1,
            done: false,
            complete: true,
        }
    }

    /// Read items from this field of each page rather than from a top-level array.
    ///
    /// Some endpoints wrap their results, e.g., `{"total_count": 3, "workflow_runs": [...]}`.
    pub fn item_key(mut self, key: &str) -> Self {
        self.item_key = Some(key.to_string());
        self
    }

    /// Has the walk so far ended without error?
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Fetch the next page of items.
    ///
    /// Returns `Ok(None)` once the walk is over. Errors other than `Unauthorized` end the walk and
    /// mark it incomplete rather than being returned.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.done {
            return Ok(None);
        }

        let per_page = self.client.config().per_page;
        let request = self.request.for_page(self.page, per_page);
        let response = match self.client.send_with_retry(&request, &[StatusCode::OK]).await {
            Ok(response) => response,
            Err(e @ Error::Unauthorized { .. }) => {
                self.stop(false);
                return Err(e);
            }
            Err(e) => {
                warn!("Stopping at page {} of {}: {e}", self.page, self.request.describe());
                self.stop(false);
                return Ok(None);
            }
        };

        let body = response.json_value();
        let items = match &self.item_key {
            Some(key) => body.get(key).cloned().unwrap_or(Value::Null),
            None => body,
        };
        let items = match items {
            Value::Array(items) => items,
            other => {
                warn!(
                    "Stopping at page {} of {}: expected an array, got {}",
                    self.page,
                    self.request.describe(),
                    json_kind(&other)
                );
                self.stop(false);
                return Ok(None);
            }
        };

        if items.is_empty() {
            debug!("{} drained after {} pages", self.request.describe(), self.page - 1);
            self.stop(true);
            return Ok(None);
        }

        self.page += 1;
        Ok(Some(items))
    }

    /// Drain the endpoint, returning every item as raw JSON.
    pub async fn collect(mut self) -> Result<Collected<Value>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(Collected {
            items,
            complete: self.complete,
        })
    }

    /// Drain the endpoint, decoding every item as `T`.
    ///
    /// An item that does not decode is logged and skipped, and the result is marked incomplete.
    pub async fn collect_as<T: DeserializeOwned>(self) -> Result<Collected<T>> {
        let raw = self.collect().await?;
        let mut complete = raw.complete;
        let mut items = Vec::with_capacity(raw.items.len());
        for item in raw.items {
            match serde_json::from_value(item) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!("Skipping item that failed to decode: {e}");
                    complete = false;
                }
            }
        }
        Ok(Collected { items, complete })
    }

    fn stop(&mut self, complete: bool) {
        self.done = true;
        self.complete = complete;
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::github::{ClientBuilder, ClientConfig};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Client {
        ClientBuilder::new()
            .base_url(server.uri())
            .unwrap()
            .config(ClientConfig::without_delays())
            .build()
            .unwrap()
    }

    async fn mount_page(server: &MockServer, page: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/orgs/Acme/teams"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn stops_on_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, "1", json!([{"slug": "a"}, {"slug": "b"}])).await;
        mount_page(&server, "2", json!([{"slug": "c"}])).await;
        mount_page(&server, "3", json!([])).await;

        let client = client(&server);
        let collected = Paginator::new(&client, ApiRequest::get(&["orgs", "Acme", "teams"]))
            .collect()
            .await
            .unwrap();
        assert_eq!(collected.len(), 3);
        assert!(collected.complete);
        assert_eq!(collected.items[2]["slug"], "c");
    }

    #[tokio::test]
    async fn error_truncates_and_marks_incomplete() {
        let server = MockServer::start().await;
        mount_page(&server, "1", json!([{"slug": "a"}])).await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let collected = Paginator::new(&client, ApiRequest::get(&["orgs", "Acme", "teams"]))
            .collect()
            .await
            .unwrap();
        assert_eq!(collected.len(), 1);
        assert!(!collected.complete);
    }

    #[tokio::test]
    async fn unauthorized_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let res = Paginator::new(&client, ApiRequest::get(&["orgs", "Acme", "teams"]))
            .collect()
            .await;
        assert!(matches!(res, Err(Error::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn wrapped_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/actions/runs"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"total_count": 2, "workflow_runs": [{"id": 1}, {"id": 2}]}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/Acme/demo/actions/runs"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"total_count": 2, "workflow_runs": []})),
            )
            .mount(&server)
            .await;

        #[derive(serde::Deserialize)]
        struct Run {
            id: u64,
        }

        let client = client(&server);
        let collected: Collected<Run> =
            Paginator::new(&client, ApiRequest::get(&["repos", "Acme", "demo", "actions", "runs"]))
                .item_key("workflow_runs")
                .collect_as()
                .await
                .unwrap();
        assert!(collected.complete);
        assert_eq!(collected.items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
