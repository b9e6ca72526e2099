//! CSS validation through the W3C (Jigsaw) CSS validator SOAP API.
//!
//! Two author directives are honoured in the stylesheet:
//!
//! * a line consisting of `/* JIGSAW: <note> */` is removed before upload;
//! * a line consisting of `/* JIGSAW IGNORE: <note> */` anywhere in the
//!   submitted stylesheet forces the result to be valid.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use tracing::info;

use crate::error::{ClientError, Result};
use crate::namespaces::{CSS_VALIDATOR_NS, SOAP_12_NS};
use crate::validator::{BaseValidator, ValidationResult, Validator};

/// Public W3C CSS validator endpoint, asking for SOAP 1.2 output
pub const DEFAULT_CSS_VALIDATOR_URI: &str =
    "http://jigsaw.w3.org/css-validator/validator?output=soap12";

const FIELD: &str = "file";
const FILENAME: &str = "file.css";
const MEDIA_TYPE: &str = "text/css";
const RESPONSE_QUERY: &str = "/env:Envelope/env:Body/m:cssvalidationresponse";

static IGNORE_LINE_REGEX: OnceLock<Regex> = OnceLock::new();
static SUPPRESS_REGEX: OnceLock<Regex> = OnceLock::new();

fn ignore_line_regex() -> &'static Regex {
    IGNORE_LINE_REGEX.get_or_init(|| {
        Regex::new(r"(?m)^/\* JIGSAW: [^\n]+\*/\r?$").expect("Failed to compile ignore regex")
    })
}

fn suppress_regex() -> &'static Regex {
    SUPPRESS_REGEX.get_or_init(|| {
        Regex::new(r"(?m)^/\* JIGSAW IGNORE: [^\n]+\*/\r?$")
            .expect("Failed to compile suppress regex")
    })
}

/// Stylesheet with every ignore-marker line blanked out
pub fn strip_ignored_lines(css: &str) -> String {
    ignore_line_regex().replace_all(css, "").into_owned()
}

/// Whether the stylesheet carries a suppress marker
pub fn is_suppressed(css: &str) -> bool {
    suppress_regex().is_match(css)
}

pub struct CssValidator {
    base: BaseValidator,
    uri: Url,
}

impl CssValidator {
    pub fn new(base: BaseValidator, uri: Url) -> Self {
        Self { base, uri }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    async fn check(&self, css: &str) -> Result<ValidationResult> {
        let entity = self
            .base
            .entity(FIELD, FILENAME, &strip_ignored_lines(css), MEDIA_TYPE);
        let base = &self.base;
        let uri = &self.uri;
        let payload = entity.as_slice();
        let soap = base
            .retry_policy(RESPONSE_QUERY)
            .apply(move || async move {
                Ok::<_, ClientError>(base
                    .send(uri, payload)
                    .await?
                    .register_namespace("env", SOAP_12_NS)
                    .register_namespace("m", CSS_VALIDATOR_NS))
            })
            .await?
            .assert_xpath("//m:validity")?
            .assert_xpath("//m:checkedby")?;
        base.build(&soap)
    }
}

#[async_trait]
impl Validator for CssValidator {
    async fn validate(&self, css: &str) -> ValidationResult {
        let mut result = match self.check(css).await {
            Ok(result) => result,
            Err(error) => self.base.failure(&self.uri, &error),
        };
        // Checked against the stylesheet as submitted, before stripping.
        if is_suppressed(css) {
            result.valid = true;
        }
        info!(
            uri = %self.uri,
            valid = result.valid,
            diagnostics = result.diagnostics.len(),
            "CSS validated"
        );
        result
    }
}
