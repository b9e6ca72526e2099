//! (X)HTML validation through the W3C markup validator SOAP API.

use async_trait::async_trait;
use reqwest::Url;
use tracing::info;

use crate::error::Result;
use crate::namespaces::{MARKUP_VALIDATOR_NS, SOAP_12_NS};
use crate::validator::{BaseValidator, ValidationResult, Validator};

/// Public W3C markup validator endpoint, asking for SOAP 1.2 output
pub const DEFAULT_HTML_VALIDATOR_URI: &str = "http://validator.w3.org/check?output=soap12";

const FIELD: &str = "uploaded_file";
const FILENAME: &str = "index.html";
const MEDIA_TYPE: &str = "text/html";

pub struct HtmlValidator {
    base: BaseValidator,
    uri: Url,
}

impl HtmlValidator {
    pub fn new(base: BaseValidator, uri: Url) -> Self {
        Self { base, uri }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    async fn check(&self, html: &str) -> Result<ValidationResult> {
        let entity = self.base.entity(FIELD, FILENAME, html, MEDIA_TYPE);
        let soap = self
            .base
            .send(&self.uri, &entity)
            .await?
            .register_namespace("env", SOAP_12_NS)
            .register_namespace("m", MARKUP_VALIDATOR_NS)
            .assert_xpath("/env:Envelope/env:Body")?
            .assert_xpath("/*/env:Body/m:markupvalidationresponse")?
            .assert_xpath("//m:validity")?
            .assert_xpath("//m:checkedby")?
            .assert_xpath("//m:doctype")?
            .assert_xpath("//m:charset")?;
        self.base.build(&soap)
    }
}

#[async_trait]
impl Validator for HtmlValidator {
    async fn validate(&self, html: &str) -> ValidationResult {
        let result = match self.check(html).await {
            Ok(result) => result,
            Err(error) => self.base.failure(&self.uri, &error),
        };
        info!(
            uri = %self.uri,
            valid = result.valid,
            diagnostics = result.diagnostics.len(),
            "HTML validated"
        );
        result
    }
}
