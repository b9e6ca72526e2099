use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Url};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("markup-check/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Case-insensitive, ordered, multi-valued header map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping any earlier values of the same header
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// All values of a header, in arrival order
    pub fn get_all(&self, name: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// First value of a header
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy without the named headers
    pub fn without(&self, names: &[&str]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(n, _)| !names.iter().any(|x| n.eq_ignore_ascii_case(x)))
                .cloned()
                .collect(),
        }
    }
}

/// One outgoing HTTP request. A new value is built for every hop.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub uri: Url,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, uri: Url) -> Self {
        Self {
            method,
            uri,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn get(uri: Url) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: Url, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::POST, uri).with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.append(name, value.to_string());
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// A fully received HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The single point of network I/O: one request, one response.
///
/// Implementations never fail on a non-2xx status and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<Response>;
}

/// `reqwest`-backed exchange
pub struct HttpExchange {
    client: Client,
    config: HttpClientConfig,
}

impl HttpExchange {
    /// Create a new HTTP exchange with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .redirect(Policy::none())
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::transport("<client>", e))?;

        Ok(Self { client, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl Exchange for HttpExchange {
    async fn execute(&self, request: &Request) -> Result<Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.uri.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let uri = request.uri.as_str();
        let limit = Duration::from_secs(self.config.timeout_seconds);
        let response = timeout(limit, builder.send())
            .await
            .map_err(|_| {
                ClientError::transport(
                    uri,
                    format!("timed out after {} seconds", self.config.timeout_seconds),
                )
            })?
            .map_err(|e| ClientError::transport(uri, describe(&e)))?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.append(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::transport(uri, describe(&e)))?;

        debug!(
            method = %request.method,
            uri,
            status,
            bytes = body.len(),
            "exchange completed"
        );
        Ok(Response::new(status, headers, body.to_vec()))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timeout: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_body() || error.is_decode() {
        format!("failed reading body: {}", error)
    } else {
        error.to_string()
    }
}
