//! Shared test doubles: a scripted in-process exchange, a hyper-backed
//! HTTP/1.1 server on a loopback port, and SOAP reply fixtures.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Request as HttpRequest;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use markup_check::{Exchange, Headers, Request, Response};

type Script = dyn Fn(usize, &Request) -> markup_check::Result<Response> + Send + Sync;

/// Exchange answering from a closure given the zero-based call number
pub struct StubExchange {
    script: Box<Script>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Request>>,
}

impl StubExchange {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(usize, &Request) -> markup_check::Result<Response> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Same reply on every call
    pub fn replying(status: u16, body: &'static str) -> Arc<Self> {
        Self::new(move |_, _| Ok(Response::new(status, Headers::new(), body)))
    }

    /// Replies in order, repeating the last one once the list runs out
    pub fn sequence(replies: Vec<(u16, &'static str)>) -> Arc<Self> {
        Self::new(move |n, _| {
            let (status, body) = replies[n.min(replies.len() - 1)];
            Ok(Response::new(status, Headers::new(), body))
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exchange for StubExchange {
    async fn execute(&self, request: &Request) -> markup_check::Result<Response> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.script)(n, request)
    }
}

/// A request as seen on the wire by [`TestServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Reply produced by a [`TestServer`] handler
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// HTTP/1.1 server on a loopback port, answering every request through a handler
pub struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let log = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let io = TokioIo::new(stream);
                let log = Arc::clone(&log);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let service = service_fn(move |req: HttpRequest<Incoming>| {
                        let log = Arc::clone(&log);
                        let handler = Arc::clone(&handler);
                        async move { respond(req, &log, handler.as_ref()).await }
                    });
                    let _ = http1::Builder::new().serve_connection(io, service).await;
                });
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond<F>(
    req: HttpRequest<Incoming>,
    log: &Mutex<Vec<RecordedRequest>>,
    handler: &F,
) -> Result<hyper::Response<Full<Bytes>>, Infallible>
where
    F: Fn(&RecordedRequest) -> Reply,
{
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(_) => Vec::new(),
    };
    let request = RecordedRequest {
        method: parts.method.to_string(),
        path: parts
            .uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".to_string()),
        headers: parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body,
    };

    let reply = handler(&request);
    log.lock().unwrap().push(request);

    let mut response = hyper::Response::builder().status(reply.status);
    for (name, value) in &reply.headers {
        response = response.header(name.as_str(), value.as_str());
    }
    Ok(response.body(Full::new(Bytes::from(reply.body))).unwrap())
}

/// Markup validator SOAP reply; each error is `(line, column, message)`
pub fn markup_soap(valid: bool, errors: &[(u32, u32, &str)]) -> String {
    let items: String = errors
        .iter()
        .map(|(line, col, message)| {
            format!(
                "<m:error><m:line>{}</m:line><m:col>{}</m:col><m:message>{}</m:message></m:error>",
                line, col, message
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
<env:Body>
<m:markupvalidationresponse env:encodingStyle="http://www.w3.org/2003/05/soap-encoding" xmlns:m="http://www.w3.org/2005/10/markup-validator">
<m:uri>upload://Form Submission</m:uri>
<m:checkedby>http://validator.w3.org/</m:checkedby>
<m:doctype>HTML5</m:doctype>
<m:charset>utf-8</m:charset>
<m:validity>{}</m:validity>
<m:errors><m:errorcount>{}</m:errorcount><m:errorlist>{}</m:errorlist></m:errors>
<m:warnings><m:warningcount>0</m:warningcount><m:warninglist></m:warninglist></m:warnings>
</m:markupvalidationresponse>
</env:Body>
</env:Envelope>"#,
        valid,
        errors.len(),
        items
    )
}

/// CSS validator SOAP reply; each error is `(line, message)`
pub fn css_soap(valid: bool, errors: &[(u32, &str)]) -> String {
    let items: String = errors
        .iter()
        .map(|(line, message)| {
            format!(
                "<m:error><m:line>{}</m:line><m:message>{}</m:message></m:error>",
                line, message
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
<env:Body>
<m:cssvalidationresponse env:encodingStyle="http://www.w3.org/2003/05/soap-encoding" xmlns:m="http://www.w3.org/2005/07/css-validator">
<m:uri>file://localhost/TextArea</m:uri>
<m:checkedby>http://jigsaw.w3.org/css-validator/</m:checkedby>
<m:csslevel>css3</m:csslevel>
<m:validity>{}</m:validity>
<m:result>
<m:errors><m:errorcount>{}</m:errorcount><m:errorlist>{}</m:errorlist></m:errors>
<m:warnings><m:warningcount>0</m:warningcount></m:warnings>
</m:result>
</m:cssvalidationresponse>
</env:Body>
</env:Envelope>"#,
        valid,
        errors.len(),
        items
    )
}

/// Well-formed SOAP envelope that is not a validation response yet
pub const PENDING_SOAP: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body/></env:Envelope>"#;

/// XHTML 1.0 Strict page with an XML declaration and a DOCTYPE
pub const XHTML_HOME: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN"
  "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
  <title>Home</title>
</head>
<body>
  <ul>
    <li><a rel="next" href="/news/1">Latest news</a></li>
    <li><a href="/about">About</a></li>
  </ul>
</body>
</html>"#;

