//! Request side of an assertion chain.

use std::sync::Arc;

use reqwest::{Method, Url};

use crate::error::{ClientError, Result};
use crate::http_client::{Exchange, Headers, Request};
use crate::namespaces::Namespaces;
use crate::response::TestResponse;

/// Fluent request builder that produces [`TestResponse`] wrappers
///
/// ```no_run
/// # use std::sync::Arc;
/// # use markup_check::{HttpClientConfig, HttpExchange, TestClient};
/// # async fn run() -> markup_check::Result<()> {
/// let exchange = Arc::new(HttpExchange::new(HttpClientConfig::default())?);
/// TestClient::parse(exchange, "http://localhost:8080/")?
///     .header("Accept", "application/xml")
///     .get()
///     .await?
///     .assert_status(200)?
///     .assert_xpath("/page/title")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TestClient {
    exchange: Arc<dyn Exchange>,
    uri: Url,
    headers: Headers,
    namespaces: Namespaces,
}

impl TestClient {
    pub fn new(exchange: Arc<dyn Exchange>, uri: Url) -> Self {
        Self {
            exchange,
            uri,
            headers: Headers::new(),
            namespaces: Namespaces::new(),
        }
    }

    /// Like [`new`](Self::new), parsing `uri` first
    pub fn parse(exchange: Arc<dyn Exchange>, uri: &str) -> Result<Self> {
        let uri = Url::parse(uri).map_err(|e| ClientError::InvalidUri {
            uri: uri.to_string(),
            details: e.to_string(),
        })?;
        Ok(Self::new(exchange, uri))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.append(name, value.to_string());
        self
    }

    /// Pre-register a namespace for the responses this client produces
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.register(prefix, uri);
        self
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub async fn get(&self) -> Result<TestResponse> {
        self.send(Method::GET, Vec::new()).await
    }

    pub async fn post(&self, body: impl Into<Vec<u8>>) -> Result<TestResponse> {
        self.send(Method::POST, body.into()).await
    }

    pub async fn put(&self, body: impl Into<Vec<u8>>) -> Result<TestResponse> {
        self.send(Method::PUT, body.into()).await
    }

    pub async fn delete(&self) -> Result<TestResponse> {
        self.send(Method::DELETE, Vec::new()).await
    }

    async fn send(&self, method: Method, body: Vec<u8>) -> Result<TestResponse> {
        let request = Request::new(method, self.uri.clone())
            .with_headers(self.headers.clone())
            .with_body(body);
        TestResponse::execute(Arc::clone(&self.exchange), request, self.namespaces.clone()).await
    }
}
