//! Prefix to namespace URI registry consulted by every XPath evaluation.

use std::collections::BTreeMap;

/// SOAP 1.2 envelope namespace
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
/// W3C markup validator response namespace
pub const MARKUP_VALIDATOR_NS: &str = "http://www.w3.org/2005/10/markup-validator";
/// W3C CSS validator response namespace
pub const CSS_VALIDATOR_NS: &str = "http://www.w3.org/2005/07/css-validator";
/// XHTML namespace
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Namespace registry carried by value along an assertion chain.
///
/// Every `follow`/`rel` hop receives a copy, so registrations made later on
/// one wrapper are never visible to wrappers produced earlier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    entries: BTreeMap<String, String>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a prefix
    pub fn register(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.entries.insert(prefix.into(), uri.into());
    }

    /// Builder-style registration
    pub fn with(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.register(prefix, uri);
        self
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
