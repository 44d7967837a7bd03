//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The client
//! builds `HttpRequest` values and parses `HttpResponse` values without ever
//! touching the network; a `Transport` (see `remote`) or a test harness
//! executes the actual I/O. Query parameters stay unencoded key/value pairs
//! so the executor applies its own encoding.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// Built by `PetflyClient::build_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: String) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: String, body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            query: Vec::new(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}
