//! Fluent assertions over one completed exchange.

use std::fmt;
use std::sync::Arc;

use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::error::{AssertionFailure, ClientError, Result};
use crate::http_client::{Exchange, Headers, Request, Response};
use crate::namespaces::Namespaces;
use crate::retry::RetryPolicy;
use crate::xpath;

/// Headers that describe a request body and are not carried to the next hop
const BODY_HEADERS: [&str; 2] = ["Content-Type", "Content-Length"];

/// Wrapper around exactly one [`Response`], the [`Request`] that produced it
/// and the namespace registry of its lineage.
///
/// Every `assert_*` method either hands the wrapper back for chaining or
/// fails with a [`ClientError`]; none of them touch the wrapped response.
pub struct TestResponse {
    exchange: Arc<dyn Exchange>,
    request: Request,
    response: Response,
    namespaces: Namespaces,
}

impl TestResponse {
    pub fn new(
        exchange: Arc<dyn Exchange>,
        request: Request,
        response: Response,
        namespaces: Namespaces,
    ) -> Self {
        Self {
            exchange,
            request,
            response,
            namespaces,
        }
    }

    /// Run `request` through `exchange` and wrap the outcome
    pub async fn execute(
        exchange: Arc<dyn Exchange>,
        request: Request,
        namespaces: Namespaces,
    ) -> Result<Self> {
        let response = exchange.execute(&request).await?;
        Ok(Self::new(exchange, request, response, namespaces))
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Status code and reason phrase, e.g. `404 Not Found`
    pub fn status_line(&self) -> String {
        match StatusCode::from_u16(self.status())
            .ok()
            .and_then(|code| code.canonical_reason())
        {
            Some(reason) => format!("{} {}", self.status(), reason),
            None => self.status().to_string(),
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.response.headers
    }

    /// All values of the named header, `None` when absent
    pub fn header(&self, name: &str) -> Option<Vec<String>> {
        let values = self.response.headers.get_all(name);
        if values.is_empty() { None } else { Some(values) }
    }

    pub fn body(&self) -> String {
        self.response.text()
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.response.body
    }

    pub fn uri(&self) -> &Url {
        &self.request.uri
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Give up the wrapper, keeping only the raw response
    pub fn into_response(self) -> Response {
        self.response
    }

    /// Values matched by `query` against the body parsed as XML
    pub fn xpath(&self, query: &str) -> Result<Vec<String>> {
        xpath::evaluate(&self.body(), query, &self.namespaces)
    }

    /// Relative `fields` read once per node matched by `items`; see
    /// [`xpath::evaluate_fields`]
    pub fn xpath_fields(&self, items: &str, fields: &[&str]) -> Result<Vec<Vec<Option<String>>>> {
        xpath::evaluate_fields(&self.body(), items, fields, &self.namespaces)
    }

    /// Register a namespace prefix for this wrapper and everything it spawns
    pub fn register_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.register(prefix, uri);
        self
    }

    /// GET the target of the `Location` header
    pub async fn follow(&self) -> Result<TestResponse> {
        let location = self
            .response
            .headers
            .get("Location")
            .ok_or_else(|| ClientError::NoRedirect {
                uri: self.request.uri.to_string(),
            })?;
        let target = self.resolve(location)?;
        debug!(from = %self.request.uri, to = %target, "following Location header");
        self.hop(target).await
    }

    /// GET the link found by `query` (first match) in the body
    pub async fn rel(&self, query: &str) -> Result<TestResponse> {
        let link = self
            .xpath(query)?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::LinkNotFound {
                query: query.to_string(),
                uri: self.request.uri.to_string(),
            })?;
        let target = self.resolve(&link)?;
        debug!(from = %self.request.uri, to = %target, query, "following link");
        self.hop(target).await
    }

    pub fn assert_status(self, expected: u16) -> Result<Self> {
        if self.status() == expected {
            Ok(self)
        } else {
            Err(self.mismatch("HTTP status", expected, self.status()))
        }
    }

    /// Predicate form of [`assert_status`](Self::assert_status); `description`
    /// names the expectation in the failure
    pub fn assert_status_that<F>(self, description: &str, predicate: F) -> Result<Self>
    where
        F: Fn(u16) -> bool,
    {
        if predicate(self.status()) {
            Ok(self)
        } else {
            Err(self.mismatch("HTTP status", description, self.status()))
        }
    }

    /// Fails when the header is absent or its values fail `predicate`
    pub fn assert_header<F>(self, name: &str, predicate: F) -> Result<Self>
    where
        F: Fn(&[String]) -> bool,
    {
        match self.header(name) {
            None => Err(self.mismatch(
                &format!("HTTP header '{}'", name),
                "present",
                "absent",
            )),
            Some(values) if predicate(&values) => Ok(self),
            Some(values) => Err(self.mismatch(
                &format!("HTTP header '{}'", name),
                "values matching predicate",
                values.join(", "),
            )),
        }
    }

    pub fn assert_body<F>(self, predicate: F) -> Result<Self>
    where
        F: Fn(&str) -> bool,
    {
        let body = self.body();
        if predicate(&body) {
            Ok(self)
        } else {
            Err(self.mismatch("HTTP body", "body matching predicate", abbreviate(&body)))
        }
    }

    /// Fails unless `query` matches at least one node
    pub fn assert_xpath(self, query: &str) -> Result<Self> {
        if self.xpath(query)?.is_empty() {
            Err(self.mismatch(
                "XPath query",
                format!("at least one match for {}", query),
                format!("no match in {}", abbreviate(&self.body())),
            ))
        } else {
            Ok(self)
        }
    }

    /// Re-run this wrapper's request under `policy` until its query matches.
    ///
    /// The current response counts as the first attempt.
    pub async fn assert_eventually(self, policy: &RetryPolicy) -> Result<Self> {
        let exchange = Arc::clone(&self.exchange);
        let request = self.request.clone();
        let namespaces = self.namespaces.clone();
        let mut first = Some(self);
        policy
            .apply(|| {
                let ready = first.take();
                let exchange = Arc::clone(&exchange);
                let request = request.clone();
                let namespaces = namespaces.clone();
                async move {
                    match ready {
                        Some(current) => Ok(current),
                        None => TestResponse::execute(exchange, request, namespaces).await,
                    }
                }
            })
            .await
    }

    /// Unconditionally fail with `reason`
    pub fn fail<T>(&self, reason: impl Into<String>) -> Result<T> {
        Err(AssertionFailure::new(reason).into())
    }

    fn mismatch(
        &self,
        reason: &str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> ClientError {
        AssertionFailure::mismatch(
            format!("{} {} {}", reason, self.request.method, self.request.uri),
            expected,
            actual,
        )
        .into()
    }

    fn resolve(&self, target: &str) -> Result<Url> {
        self.request
            .uri
            .join(target)
            .map_err(|e| ClientError::InvalidUri {
                uri: target.to_string(),
                details: e.to_string(),
            })
    }

    async fn hop(&self, target: Url) -> Result<TestResponse> {
        let request = Request::get(target).with_headers(self.request.headers.without(&BODY_HEADERS));
        TestResponse::execute(Arc::clone(&self.exchange), request, self.namespaces.clone()).await
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("namespaces", &self.namespaces)
            .finish()
    }
}

fn abbreviate(body: &str) -> String {
    const LIMIT: usize = 200;
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(LIMIT).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
