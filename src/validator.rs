//! Remote markup/CSS validation over SOAP.
//!
//! Each concrete validator (see [`crate::html_validator`] and
//! [`crate::css_validator`]) holds a [`BaseValidator`] that knows how to build
//! the multipart payload, send it, read the SOAP answer into a
//! [`ValidationResult`], and turn any failure into a negative result.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ClientError, Result};
use crate::http_client::{Exchange, Request};
use crate::multipart::{self, DEFAULT_BOUNDARY, Part};
use crate::namespaces::Namespaces;
use crate::response::TestResponse;
use crate::retry::RetryPolicy;

/// Media type requested from the remote validators
pub const SOAP_MEDIA_TYPE: &str = "application/soap+xml";

/// Capability shared by the HTML and CSS validators.
///
/// `validate` never fails: problems reaching or understanding the remote
/// service come back as an invalid result with one diagnostic.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, content: &str) -> ValidationResult;
}

/// Severity of a single diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One message reported by the validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// Outcome of one `validate` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub checked_at: DateTime<Utc>,
    /// Identifier of the service that answered (or was asked)
    pub checked_by: String,
    pub doctype: Option<String>,
    pub charset: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Shared send/build/failure helpers, held by each concrete validator
pub struct BaseValidator {
    exchange: Arc<dyn Exchange>,
    user_agent: String,
    boundary: String,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl BaseValidator {
    pub fn new(exchange: Arc<dyn Exchange>) -> Self {
        Self {
            exchange,
            user_agent: format!("markup-check/{}", env!("CARGO_PKG_VERSION")),
            boundary: DEFAULT_BOUNDARY.to_string(),
            retry_attempts: RetryPolicy::DEFAULT_ATTEMPTS,
            retry_delay: RetryPolicy::DEFAULT_DELAY,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Multipart payload holding `content` as a single uploaded file
    pub fn entity(&self, name: &str, filename: &str, content: &str, content_type: &str) -> Vec<u8> {
        multipart::encode(
            &self.boundary,
            &[Part::file(name, filename, content_type, content)],
        )
    }

    /// POST `entity` to `uri` and require HTTP 200
    pub async fn send(&self, uri: &Url, entity: &[u8]) -> Result<TestResponse> {
        let request = Request::post(uri.clone(), entity)
            .with_header("User-Agent", &self.user_agent)
            .with_header("Accept", SOAP_MEDIA_TYPE)
            .with_header("Content-Length", entity.len())
            .with_header("Content-Type", multipart::content_type(&self.boundary));
        TestResponse::execute(Arc::clone(&self.exchange), request, Namespaces::new())
            .await?
            .assert_status(200)
    }

    pub fn retry_policy(&self, query: &str) -> RetryPolicy {
        RetryPolicy::new(query)
            .with_max_attempts(self.retry_attempts)
            .with_delay(self.retry_delay)
    }

    /// Read a SOAP answer whose `m` prefix is bound to the validator namespace
    pub fn build(&self, soap: &TestResponse) -> Result<ValidationResult> {
        let valid = first(soap, "//m:validity")?.is_some_and(|v| v == "true");
        let checked_by = first(soap, "//m:checkedby")?.unwrap_or_default();
        let mut diagnostics = read_diagnostics(soap, "//m:errors/m:errorlist/m:error", Severity::Error)?;
        diagnostics.extend(read_diagnostics(
            soap,
            "//m:warnings/m:warninglist/m:warning",
            Severity::Warning,
        )?);

        Ok(ValidationResult {
            valid,
            checked_at: Utc::now(),
            checked_by,
            doctype: first(soap, "//m:doctype")?,
            charset: first(soap, "//m:charset")?,
            diagnostics,
        })
    }

    /// Negative result describing `error`
    pub fn failure(&self, uri: &Url, error: &ClientError) -> ValidationResult {
        warn!(%uri, %error, "validation call failed");
        ValidationResult {
            valid: false,
            checked_at: Utc::now(),
            checked_by: uri.to_string(),
            doctype: None,
            charset: None,
            diagnostics: vec![Diagnostic::error(0, 0, error.to_string())],
        }
    }
}

fn first(soap: &TestResponse, query: &str) -> Result<Option<String>> {
    Ok(soap
        .xpath(query)?
        .into_iter()
        .map(|value| value.trim().to_string())
        .next())
}

fn read_diagnostics(soap: &TestResponse, list: &str, severity: Severity) -> Result<Vec<Diagnostic>> {
    let number = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    };
    let rows = soap.xpath_fields(list, &["m:line", "m:col", "m:message"])?;
    Ok(rows
        .iter()
        .map(|row| Diagnostic {
            line: number(&row[0]),
            column: number(&row[1]),
            message: row[2].as_deref().map(str::trim).unwrap_or_default().to_string(),
            severity,
        })
        .collect())
}
