mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{PENDING_SOAP, StubExchange, css_soap, markup_soap};
use markup_check::http_client::{Headers, Response};
use markup_check::{BaseValidator, CssValidator, HtmlValidator, Severity, Validator};
use reqwest::Url;

fn html_validator(exchange: Arc<StubExchange>) -> HtmlValidator {
    HtmlValidator::new(
        BaseValidator::new(exchange),
        Url::parse("http://localhost/check?output=soap12").unwrap(),
    )
}

fn css_validator(exchange: Arc<StubExchange>, attempts: u32) -> CssValidator {
    CssValidator::new(
        BaseValidator::new(exchange).with_retry(attempts, Duration::from_millis(1)),
        Url::parse("http://localhost/css-validator/validator?output=soap12").unwrap(),
    )
}

fn body_text(exchange: &StubExchange) -> String {
    String::from_utf8(exchange.requests()[0].body.clone()).unwrap()
}

#[tokio::test]
async fn test_minimal_document_is_valid() {
    let soap = markup_soap(true, &[]);
    let exchange = StubExchange::new(move |_, _| Ok(Response::new(200, Headers::new(), soap.clone())));
    let validator = html_validator(Arc::clone(&exchange));

    let result = validator.validate("<html></html>").await;

    assert!(result.valid);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.checked_by, "http://validator.w3.org/");
    assert_eq!(result.doctype.as_deref(), Some("HTML5"));
    assert_eq!(exchange.calls(), 1);

    let body = body_text(&exchange);
    assert!(body.contains("name=\"uploaded_file\"; filename=\"index.html\""));
    assert!(body.contains("Content-Type: text/html"));
    assert!(body.contains("<html></html>"));
}

#[tokio::test]
async fn test_errors_are_reported_with_positions() {
    let soap = markup_soap(false, &[(4, 12, "element \"blink\" undefined")]);
    let exchange = StubExchange::new(move |_, _| Ok(Response::new(200, Headers::new(), soap.clone())));

    let result = html_validator(exchange).validate("<blink>").await;

    assert!(!result.valid);
    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert_eq!((diagnostic.line, diagnostic.column), (4, 12));
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.message, "element \"blink\" undefined");
}

#[tokio::test]
async fn test_unavailable_service_yields_invalid_result() {
    let exchange = StubExchange::replying(503, "Service Unavailable");
    let result = html_validator(Arc::clone(&exchange)).validate("<html></html>").await;

    assert!(!result.valid);
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].message.contains("503"));
    assert_eq!(exchange.calls(), 1);
}

#[tokio::test]
async fn test_unexpected_reply_shape_yields_invalid_result() {
    let exchange = StubExchange::replying(200, PENDING_SOAP);
    let result = html_validator(exchange).validate("<p>").await;

    assert!(!result.valid);
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].message.contains("markupvalidationresponse"));
}

#[tokio::test]
async fn test_transport_failure_yields_invalid_result() {
    let exchange = StubExchange::new(|_, request| {
        Err(markup_check::ClientError::transport(
            request.uri.as_str(),
            "connection refused",
        ))
    });
    let result = html_validator(exchange).validate("<p>").await;

    assert!(!result.valid);
    assert!(result.diagnostics[0].message.contains("connection refused"));
}

#[tokio::test]
async fn test_css_ignore_marker_not_uploaded() {
    let soap = css_soap(true, &[]);
    let exchange = StubExchange::new(move |_, _| Ok(Response::new(200, Headers::new(), soap.clone())));
    let css = "a { color: red }\n/* JIGSAW: vendor hack */\nb { zoom: 1 }\n";

    let result = css_validator(Arc::clone(&exchange), 3).validate(css).await;

    assert!(result.valid);
    let body = body_text(&exchange);
    assert!(!body.contains("JIGSAW"));
    assert!(body.contains("a { color: red }"));
    assert!(body.contains("b { zoom: 1 }"));
    assert!(body.contains("name=\"file\"; filename=\"file.css\""));
    assert!(body.contains("Content-Type: text/css"));
}

#[tokio::test]
async fn test_css_errors_reported() {
    let soap = css_soap(false, &[(2, "Property zoom doesn't exist")]);
    let exchange = StubExchange::new(move |_, _| Ok(Response::new(200, Headers::new(), soap.clone())));

    let result = css_validator(exchange, 3).validate("b { zoom: 1 }").await;

    assert!(!result.valid);
    assert_eq!(result.errors().count(), 1);
    assert_eq!(result.diagnostics[0].line, 2);
    assert_eq!(result.diagnostics[0].column, 0);
    assert_eq!(result.checked_by, "http://jigsaw.w3.org/css-validator/");
    assert_eq!(result.doctype, None);
}

#[tokio::test]
async fn test_css_suppress_marker_forces_valid() {
    let soap = css_soap(false, &[(1, "Parse error")]);
    let exchange = StubExchange::new(move |_, _| Ok(Response::new(200, Headers::new(), soap.clone())));
    let css = "/* JIGSAW IGNORE: known false positive */\np { color: rgb(0 0 0 / 50%) }\n";

    let result = css_validator(Arc::clone(&exchange), 3).validate(css).await;

    assert!(result.valid);
    assert_eq!(result.diagnostics.len(), 1);
    assert!(body_text(&exchange).contains("JIGSAW IGNORE"));
}

#[tokio::test]
async fn test_css_suppress_marker_applies_to_failures() {
    let exchange = StubExchange::replying(503, "busy");
    let css = "/* JIGSAW IGNORE: offline build */\np {}\n";

    let result = css_validator(Arc::clone(&exchange), 3).validate(css).await;

    assert!(result.valid);
    assert_eq!(exchange.calls(), 1);
}

#[tokio::test]
async fn test_css_waits_for_settled_reply() {
    let settled = css_soap(true, &[]);
    let exchange = StubExchange::new(move |n, _| {
        let body = if n < 2 { PENDING_SOAP.to_string() } else { settled.clone() };
        Ok(Response::new(200, Headers::new(), body))
    });

    let result = css_validator(Arc::clone(&exchange), 5).validate("p {}").await;

    assert!(result.valid);
    assert_eq!(exchange.calls(), 3);
}

#[tokio::test]
async fn test_css_not_well_formed_reply_is_retried() {
    let settled = css_soap(true, &[]);
    let exchange = StubExchange::new(move |n, _| {
        let body = if n == 0 { "<html><body>busy".to_string() } else { settled.clone() };
        Ok(Response::new(200, Headers::new(), body))
    });

    let result = css_validator(Arc::clone(&exchange), 3).validate("p {}").await;

    assert!(result.valid);
    assert_eq!(exchange.calls(), 2);
}

#[tokio::test]
async fn test_css_retry_budget_exhausted() {
    let exchange = StubExchange::replying(200, PENDING_SOAP);

    let result = css_validator(Arc::clone(&exchange), 4).validate("p {}").await;

    assert!(!result.valid);
    assert_eq!(exchange.calls(), 4);
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].message.contains("4 attempts"));
}

#[tokio::test]
async fn test_validators_share_one_exchange_concurrently() {
    let markup = markup_soap(true, &[]);
    let css = css_soap(true, &[]);
    let exchange = StubExchange::new(move |_, request| {
        let body = if request.uri.path().contains("css") {
            css.clone()
        } else {
            markup.clone()
        };
        Ok(Response::new(200, Headers::new(), body))
    });
    let html = html_validator(Arc::clone(&exchange));
    let css = css_validator(Arc::clone(&exchange), 2);

    let (a, b) = tokio::join!(html.validate("<p>"), css.validate("p {}"));

    assert!(a.valid);
    assert!(b.valid);
    assert_eq!(exchange.calls(), 2);
}
