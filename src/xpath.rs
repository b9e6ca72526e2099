//! Namespace-aware XPath evaluation over response bodies.

use std::sync::OnceLock;

use regex::Regex;
use sxd_document::{Package, parser};
use sxd_xpath::{Context, Factory, Value, XPath};

use crate::error::{ClientError, Result};
use crate::namespaces::Namespaces;

static DOCTYPE_REGEX: OnceLock<Regex> = OnceLock::new();

fn doctype_regex() -> &'static Regex {
    DOCTYPE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\A(\s*<\?xml[^>]*\?>)?\s*<!DOCTYPE[^>\[]*(\[[^\]]*\])?\s*>")
            .expect("Failed to compile doctype regex")
    })
}

/// Evaluate `query` against `body` parsed as XML.
///
/// The query is compiled first, so a syntax error is reported as
/// [`ClientError::Query`] even when the body is not well-formed either.
/// Node-sets yield the string-value of each node in document order; a
/// `false` boolean and an empty string yield nothing.
pub fn evaluate(body: &str, query: &str, namespaces: &Namespaces) -> Result<Vec<String>> {
    let xpath = compile(query)?;
    let package = parse(body)?;
    let document = package.as_document();
    let context = context(namespaces);

    let value = xpath
        .evaluate(&context, document.root())
        .map_err(|e| query_error(query, e))?;
    Ok(strings(value))
}

/// For every node matched by `items`, the first value of each relative
/// query in `fields`, `None` where a field matches nothing.
///
/// The body is parsed once and each field is evaluated with the matched
/// node as context, so fields never bleed across items.
pub fn evaluate_fields(
    body: &str,
    items: &str,
    fields: &[&str],
    namespaces: &Namespaces,
) -> Result<Vec<Vec<Option<String>>>> {
    let items_xpath = compile(items)?;
    let field_xpaths = fields
        .iter()
        .map(|field| compile(field))
        .collect::<Result<Vec<_>>>()?;
    let package = parse(body)?;
    let document = package.as_document();
    let context = context(namespaces);

    let nodes = match items_xpath
        .evaluate(&context, document.root())
        .map_err(|e| query_error(items, e))?
    {
        Value::Nodeset(nodes) => nodes.document_order(),
        _ => {
            return Err(ClientError::Query {
                query: items.to_string(),
                details: "expression does not select nodes".to_string(),
            });
        }
    };

    nodes
        .into_iter()
        .map(|node| {
            field_xpaths
                .iter()
                .zip(fields)
                .map(|(xpath, field)| {
                    let value = xpath
                        .evaluate(&context, node)
                        .map_err(|e| query_error(field, e))?;
                    Ok(strings(value).into_iter().next())
                })
                .collect()
        })
        .collect()
}

fn compile(query: &str) -> Result<XPath> {
    Factory::new()
        .build(query)
        .map_err(|e| query_error(query, e))?
        .ok_or_else(|| ClientError::Query {
            query: query.to_string(),
            details: "empty expression".to_string(),
        })
}

// The parser rejects document type declarations, which carry nothing a
// query can select, so a prolog DOCTYPE is dropped before parsing.
fn parse(body: &str) -> Result<Package> {
    let body = doctype_regex().replace(body, "$1");
    parser::parse(body.trim_start()).map_err(|e| ClientError::MalformedContent {
        details: format!("body is not well-formed XML: {:?}", e),
    })
}

fn context<'d>(namespaces: &Namespaces) -> Context<'d> {
    let mut context = Context::new();
    for (prefix, uri) in namespaces.iter() {
        context.set_namespace(prefix, uri);
    }
    context
}

fn query_error(query: &str, error: impl std::fmt::Debug) -> ClientError {
    ClientError::Query {
        query: query.to_string(),
        details: format!("{:?}", error),
    }
}

fn strings(value: Value<'_>) -> Vec<String> {
    match value {
        Value::Nodeset(nodes) => nodes
            .document_order()
            .iter()
            .map(|node| node.string_value())
            .collect(),
        Value::Boolean(true) => vec!["true".to_string()],
        Value::Boolean(false) => Vec::new(),
        Value::Number(number) => vec![format_number(number)],
        Value::String(text) if text.is_empty() => Vec::new(),
        Value::String(text) => vec![text],
    }
}

fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}
