//! `multipart/form-data` body construction.
//!
//! Encoding is deterministic: the same parts under the same boundary always
//! produce the same bytes, which some remote validators depend on.

/// Boundary shared by the validators and the `Content-Type` header they send
pub const DEFAULT_BOUNDARY: &str = "vV9olNqRj00PC4OIlM7";

const CRLF: &[u8] = b"\r\n";

/// One named part of a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub content: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl Part {
    /// Plain form field
    pub fn field(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: value.into(),
            filename: None,
            content_type: None,
        }
    }

    /// File-like part with a filename and a media type
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
        }
    }
}

/// Value of the `Content-Type` request header for a body encoded under `boundary`
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", boundary)
}

/// Serialize `parts`, in order, under `boundary`
pub fn encode(boundary: &str, parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(CRLF);

        let mut disposition = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quoted(&part.name)
        );
        if let Some(filename) = &part.filename {
            disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(CRLF);

        if let Some(content_type) = &part.content_type {
            body.extend_from_slice(format!("Content-Type: {}", content_type).as_bytes());
            body.extend_from_slice(CRLF);
        }

        body.extend_from_slice(CRLF);
        body.extend_from_slice(&part.content);
        body.extend_from_slice(CRLF);
    }
    body.extend_from_slice(b"--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"--");
    body.extend_from_slice(CRLF);
    body
}

// Quotes and line breaks cannot appear inside a quoted header parameter.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
