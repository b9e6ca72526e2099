//! # markup-check Library
//!
//! A fluent, async HTTP test client (status/header/body/XPath assertions,
//! redirect and link following, retry until an XPath matches) and, built on
//! top of it, HTML and CSS validators that talk to the W3C SOAP services.

pub mod cli;
pub mod client;
pub mod config;
pub mod css_validator;
pub mod error;
pub mod file_discovery;
pub mod html_validator;
pub mod http_client;
pub mod multipart;
pub mod namespaces;
pub mod output;
pub mod response;
pub mod retry;
pub mod validator;
pub mod xpath;

pub use cli::{Cli, ContentKind, OutputFormat, VerbosityLevel};
pub use client::TestClient;
pub use config::{Config, ConfigError, ConfigManager};
pub use css_validator::CssValidator;
pub use error::{AssertionFailure, ClientError, Result};
pub use file_discovery::{DiscoveredFile, FileDiscovery};
pub use html_validator::HtmlValidator;
pub use http_client::{Exchange, Headers, HttpClientConfig, HttpExchange, Request, Response};
pub use multipart::Part;
pub use namespaces::Namespaces;
pub use output::Output;
pub use response::TestResponse;
pub use retry::RetryPolicy;
pub use validator::{BaseValidator, Diagnostic, Severity, ValidationResult, Validator};
