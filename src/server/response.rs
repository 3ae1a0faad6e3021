use serde_json::Value;
use std::io::{self, Write};

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Destination a result producer writes into.
pub trait ResponseSink {
    fn status(&mut self, code: u16);
    fn header(&mut self, name: &str, value: &str);
    /// Append to the body
    fn body(&mut self, chunk: &[u8]);
}

/// Deferred result returned by a handler.
///
/// The dispatcher emits it into the sink exactly once, after the handler
/// returns. Producers that emit nothing are fine.
pub trait Responder {
    fn emit(self: Box<Self>, sink: &mut dyn ResponseSink);
}

impl Responder for () {
    fn emit(self: Box<Self>, _sink: &mut dyn ResponseSink) {}
}

impl Responder for Box<dyn Responder> {
    fn emit(self: Box<Self>, sink: &mut dyn ResponseSink) {
        (*self).emit(sink);
    }
}

/// Plain response: status, headers and a text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Response {
    /// `200 OK` with a `text/plain` body
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    #[must_use]
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), TEXT_CONTENT_TYPE.to_string())],
            body: body.into(),
        }
    }

    /// Add a header, replacing an earlier one with the same name.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn body_str(&self) -> &str {
        &self.body
    }
}

impl Responder for Response {
    fn emit(self: Box<Self>, sink: &mut dyn ResponseSink) {
        sink.status(self.status);
        for (name, value) in &self.headers {
            sink.header(name, value);
        }
        sink.body(self.body.as_bytes());
    }
}

/// JSON response.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    status: u16,
    body: Value,
}

impl JsonResponse {
    #[must_use]
    pub fn new(body: Value) -> Self {
        Self::with_status(200, body)
    }

    #[must_use]
    pub fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }
}

impl Responder for JsonResponse {
    fn emit(self: Box<Self>, sink: &mut dyn ResponseSink) {
        sink.status(self.status);
        sink.header("Content-Type", JSON_CONTENT_TYPE);
        sink.body(self.body.to_string().as_bytes());
    }
}

/// Producer backed by a closure.
pub struct Emit<F>(pub F);

impl<F> Responder for Emit<F>
where
    F: FnOnce(&mut dyn ResponseSink),
{
    fn emit(self: Box<Self>, sink: &mut dyn ResponseSink) {
        (self.0)(sink);
    }
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// In-memory [`ResponseSink`].
///
/// Status defaults to `200` when a producer writes headers or a body without
/// setting one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseBuffer {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding a JSON error body
    #[must_use]
    pub fn json_error(status: u16, body: &Value) -> Self {
        let mut buf = Self::new();
        buf.status(status);
        buf.header("Content-Type", JSON_CONTENT_TYPE);
        buf.body(body.to_string().as_bytes());
        buf
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.unwrap_or(200)
    }

    /// Header value by name (case-insensitive)
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `true` when nothing at all was written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.headers.is_empty() && self.body.is_empty()
    }

    /// Serialize as an HTTP/1.1 response. `Content-Length` is always set
    /// from the buffered body.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        let status = self.status_code();
        write!(out, "HTTP/1.1 {status} {}\r\n", status_reason(status))?;
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            write!(out, "{name}: {value}\r\n")?;
        }
        write!(out, "Content-Length: {}\r\n\r\n", self.body.len())?;
        out.write_all(&self.body)?;
        out.flush()
    }

    /// Convert into an `http::Response`.
    pub fn into_http(self) -> Result<http::Response<Vec<u8>>, http::Error> {
        let mut builder = http::Response::builder().status(self.status_code());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(self.body)
    }
}

impl ResponseSink for ResponseBuffer {
    fn status(&mut self, code: u16) {
        self.status = Some(code);
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}
