use http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE, HOST, REFERER, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method};
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::debug;

use crate::ids::RequestId;

const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Read-only view of the current request, threaded explicitly through
/// matching and invocation.
///
/// The router never mutates the context.
pub trait RequestContext {
    /// HTTP method
    fn method(&self) -> &Method;
    /// Request path, already normalized (no query string, no trailing `/`)
    fn path(&self) -> &str;
    /// Header value by name (case-insensitive)
    fn header(&self, name: &str) -> Option<&str>;
    /// Union of query and body parameters
    fn params(&self) -> &HashMap<String, String>;
    /// Raw request body
    fn raw_body(&self) -> &[u8];
    /// Identifier used to correlate log lines for this request
    fn request_id(&self) -> RequestId;
}

/// Concrete request environment.
///
/// Built from an `http::Request` (or a bare method and target) and then
/// only read. Beyond the [`RequestContext`] accessors it exposes the usual
/// request helpers: media type, charset, host, client IP and friends.
#[derive(Debug, Clone)]
pub struct RequestEnv {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    params: HashMap<String, String>,
    headers: HeaderMap,
    body: Vec<u8>,
    remote_addr: Option<IpAddr>,
    server_port: u16,
    request_id: RequestId,
}

/// Parse query string parameters from a request target
///
/// Extracts everything after the `?` character and URL-decodes parameter
/// names and values.
///
/// # Arguments
///
/// * `target` - The request target (e.g., `/users?limit=10&offset=20`)
#[must_use]
pub fn parse_query_params(target: &str) -> HashMap<String, String> {
    match target.split_once('?') {
        Some((_, query)) => parse_urlencoded(query.as_bytes()),
        None => HashMap::new(),
    }
}

fn parse_urlencoded(input: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(input)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Strip the query string, trim, and drop one trailing `/` unless the path
/// is the root.
#[must_use]
pub fn normalize_request_path(target: &str) -> String {
    let path = target.split('?').next().unwrap_or_default().trim();
    if path.len() > 1 {
        if let Some(stripped) = path.strip_suffix('/') {
            return stripped.trim().to_string();
        }
    }
    path.to_string()
}

impl RequestEnv {
    /// Environment for a bare method and request target, no headers or body.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        Self::from_parts(method, target, HeaderMap::new(), Vec::new())
    }

    /// Environment for an `http::Request`.
    #[must_use]
    pub fn from_request(req: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = req.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        Self::from_parts(parts.method, &target, parts.headers, body)
    }

    fn from_parts(method: Method, target: &str, headers: HeaderMap, body: Vec<u8>) -> Self {
        let path = normalize_request_path(target);
        let query = parse_query_params(target);

        let is_form = media_type_of(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()))
            .is_some_and(|mt| mt == FORM_MEDIA_TYPE);
        let form = if is_form {
            parse_urlencoded(&body)
        } else {
            HashMap::new()
        };

        // Body parameters win over query parameters with the same name.
        let mut params = query.clone();
        params.extend(form.iter().map(|(k, v)| (k.clone(), v.clone())));

        let request_id = RequestId::from_header_or_new(
            headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
        );

        debug!(
            method = %method,
            path = %path,
            request_id = %request_id,
            header_count = headers.len(),
            query_count = query.len(),
            form_count = form.len(),
            body_size_bytes = body.len(),
            "Request environment built"
        );

        Self {
            method,
            path,
            query,
            form,
            params,
            headers,
            body,
            remote_addr: None,
            server_port: 80,
            request_id,
        }
    }

    /// Add or replace a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(header_value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            if name == REQUEST_ID_HEADER {
                self.request_id = RequestId::from_header_or_new(Some(value));
            }
            self.headers.insert(name, header_value);
        }
        self
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Port reported when the `Host` header does not carry one.
    #[must_use]
    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    pub fn is_put(&self) -> bool {
        self.method == Method::PUT
    }

    pub fn is_delete(&self) -> bool {
        self.method == Method::DELETE
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    pub fn is_options(&self) -> bool {
        self.method == Method::OPTIONS
    }

    /// `true` when the `isajax` parameter is set or the request carries
    /// `X-Requested-With: XMLHttpRequest`.
    #[must_use]
    pub fn is_ajax(&self) -> bool {
        let flagged = self
            .param("isajax")
            .is_some_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"));
        flagged || self.header("x-requested-with") == Some("XMLHttpRequest")
    }

    /// Alias of [`is_ajax`](Self::is_ajax)
    #[must_use]
    pub fn is_xhr(&self) -> bool {
        self.is_ajax()
    }

    /// One query-or-body parameter
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Query string parameters only
    #[must_use]
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Form body parameters only (empty unless the body is form-encoded)
    #[must_use]
    pub fn form(&self) -> &HashMap<String, String> {
        &self.form
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body as UTF-8 text (lossy)
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_value(CONTENT_TYPE)
    }

    /// Lowercased `type/subtype` part of `Content-Type`
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        media_type_of(self.content_type())
    }

    /// `Content-Type` parameters, keys lowercased
    #[must_use]
    pub fn media_type_params(&self) -> HashMap<String, String> {
        let Some(content_type) = self.content_type() else {
            return HashMap::new();
        };
        content_type
            .split([';', ','])
            .skip(1)
            .filter_map(|part| {
                let (key, value) = part.trim().split_once('=')?;
                Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect()
    }

    #[must_use]
    pub fn content_charset(&self) -> Option<String> {
        self.media_type_params().remove("charset")
    }

    /// `Content-Length` header, or 0 when absent or invalid
    #[must_use]
    pub fn content_length(&self) -> u64 {
        self.header_value(CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// `Host` header without its port
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.header_value(HOST)
            .map(|host| host.split(':').next().unwrap_or(host))
    }

    /// Port from the `Host` header, else the configured server port
    #[must_use]
    pub fn port(&self) -> u16 {
        self.header_value(HOST)
            .and_then(|host| host.split_once(':'))
            .and_then(|(_, port)| port.parse().ok())
            .unwrap_or(self.server_port)
    }

    #[must_use]
    pub fn host_with_port(&self) -> Option<String> {
        self.host().map(|host| format!("{host}:{}", self.port()))
    }

    /// Always `http`; TLS terminates outside this layer.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        "http"
    }

    /// Scheme and host, plus the port when it is not the default one
    #[must_use]
    pub fn url(&self) -> Option<String> {
        let host = self.host()?;
        let port = self.port();
        if port == 80 {
            Some(format!("{}://{host}", self.scheme()))
        } else {
            Some(format!("{}://{host}:{port}", self.scheme()))
        }
    }

    /// `X-Forwarded-For`, else `Client-IP`, else the peer address
    #[must_use]
    pub fn client_ip(&self) -> Option<String> {
        self.header("x-forwarded-for")
            .or_else(|| self.header("client-ip"))
            .map(str::to_string)
            .or_else(|| self.remote_addr.map(|ip| ip.to_string()))
    }

    #[must_use]
    pub fn referrer(&self) -> Option<&str> {
        self.header_value(REFERER)
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.header_value(USER_AGENT)
    }

    fn header_value(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

fn media_type_of(content_type: Option<&str>) -> Option<String> {
    let content_type = content_type?;
    let media = content_type.split([';', ',']).next()?.trim();
    if media.is_empty() {
        None
    } else {
        Some(media.to_ascii_lowercase())
    }
}

impl RequestContext for RequestEnv {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    fn raw_body(&self) -> &[u8] {
        &self.body
    }

    fn request_id(&self) -> RequestId {
        self.request_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/p?x=1&y=a%20b");
        assert_eq!(q.get("x"), Some(&"1".to_string()));
        assert_eq!(q.get("y"), Some(&"a b".to_string()));
        assert!(parse_query_params("/p").is_empty());
    }

    #[test]
    fn test_normalize_request_path() {
        assert_eq!(normalize_request_path("/lead/"), "/lead");
        assert_eq!(normalize_request_path("/lead/?x=1"), "/lead");
        assert_eq!(normalize_request_path("/"), "/");
        assert_eq!(normalize_request_path(""), "");
    }

    #[test]
    fn test_media_type_of() {
        assert_eq!(
            media_type_of(Some("Application/JSON; charset=UTF-8")),
            Some("application/json".to_string())
        );
        assert_eq!(media_type_of(Some("")), None);
        assert_eq!(media_type_of(None), None);
    }
}
