// ABOUTME: Axum HTTP testing utilities for integration tests
// ABOUTME: Provides helpers to test Axum routes without running a full server

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde::Serialize;
use tower::ServiceExt;

/// Helper to build and execute HTTP requests against Axum routers
pub struct AxumTestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    body: Option<String>,
}

impl AxumTestRequest {
    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_owned(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    /// Create a new GET request
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Create a new POST request
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Create a new DELETE request
    /// Note: Used by the middleware tests, but not all tests use it
    #[allow(dead_code)]
    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Create a new PUT request
    /// Note: Used by the middleware tests, but not all tests use it
    #[allow(dead_code)]
    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// Add a header to the request
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Add a cookie to the request.
    ///
    /// All cookies are joined into a single `Cookie` header at send time,
    /// matching what browsers put on the wire.
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Add JSON body to the request
    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        self.body = Some(serde_json::to_string(data).expect("Failed to serialize JSON"));
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_owned(),
            "application/json".to_owned(),
        ));
        self
    }

    /// Add a URL-encoded form body to the request
    pub fn form<T: Serialize>(mut self, data: &T) -> Self {
        self.body = Some(serde_urlencoded::to_string(data).expect("Failed to serialize form"));
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_owned(),
            "application/x-www-form-urlencoded".to_owned(),
        ));
        self
    }

    /// Add a raw body with an explicit content type (multipart payloads, etc.)
    #[allow(dead_code)]
    pub fn raw_body(mut self, content_type: &str, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_owned(),
            content_type.to_owned(),
        ));
        self
    }

    /// Execute the request against an Axum router
    pub async fn send(self, app: Router) -> AxumTestResponse {
        let mut builder = Request::builder().method(self.method).uri(self.uri);

        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }

        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE.as_str(), cookie_header);
        }

        let body = self.body.unwrap_or_default();
        let request = builder
            .body(Body::from(body))
            .expect("Failed to build request");

        let response = app
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        AxumTestResponse::from_response(response).await
    }
}

/// Wrapper around Axum HTTP response for testing
pub struct AxumTestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl AxumTestResponse {
    /// Create from response by eagerly reading the body
    async fn from_response(response: axum::http::Response<Body>) -> Self {
        use axum::body::to_bytes;
        let (parts, body) = response.into_parts();
        let body = to_bytes(body, usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Get the response status code as u16 for easy assertion
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get the response status code as `StatusCode`
    #[allow(dead_code)]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Get the first value of a response header, if present
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    /// Get every `Set-Cookie` header value on the response
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_owned)
            .collect()
    }

    /// Get the value of a cookie set by the response, if present.
    ///
    /// Parses each `Set-Cookie` header as `name=value; attributes...` and
    /// returns the value of the first cookie matching `name`.
    pub fn set_cookie_value(&self, name: &str) -> Option<String> {
        self.set_cookies().iter().find_map(|raw| {
            let pair = raw.split(';').next()?;
            let (cookie_name, value) = pair.split_once('=')?;
            (cookie_name.trim() == name).then(|| value.to_owned())
        })
    }

    /// Get the response body as bytes
    #[allow(dead_code)]
    pub fn bytes(self) -> Vec<u8> {
        self.body
    }

    /// Get the response body as a JSON value
    pub fn json<T: serde::de::DeserializeOwned>(self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to deserialize JSON response")
    }

    /// Get the response body as a string
    pub fn text(self) -> String {
        String::from_utf8(self.body).expect("Failed to decode response as UTF-8")
    }

    /// Assert that the status code matches
    #[allow(dead_code)]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}",
            expected, self.status
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Json;

    #[tokio::test]
    async fn test_axum_test_request_get() {
        let app = Router::new().route("/test", get(|| async { "Hello" }));
        let response = AxumTestRequest::get("/test").send(app).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text(), "Hello");
    }

    #[tokio::test]
    async fn test_axum_test_request_post_with_json() {
        let app = Router::new().route(
            "/test",
            axum::routing::post(|Json(body): Json<serde_json::Value>| async move {
                Json(serde_json::json!({"received": body}))
            }),
        );
        let response = AxumTestRequest::post("/test")
            .json(&serde_json::json!({"key": "value"}))
            .send(app)
            .await;
        assert_eq!(response.status(), 200);
        let json: serde_json::Value = response.json();
        assert_eq!(json["received"]["key"], "value");
    }

    #[tokio::test]
    async fn test_axum_test_request_with_header() {
        let app = Router::new().route(
            "/test",
            get(|headers: HeaderMap| async move {
                headers
                    .get("x-custom")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("missing")
                    .to_owned()
            }),
        );
        let response = AxumTestRequest::get("/test")
            .header("x-custom", "test-value")
            .send(app)
            .await;
        assert_eq!(response.text(), "test-value");
    }

    #[tokio::test]
    async fn test_axum_test_request_cookies_joined() {
        let app = Router::new().route(
            "/test",
            get(|headers: HeaderMap| async move {
                headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("missing")
                    .to_owned()
            }),
        );
        let response = AxumTestRequest::get("/test")
            .cookie("first", "1")
            .cookie("second", "2")
            .send(app)
            .await;
        assert_eq!(response.text(), "first=1; second=2");
    }

    #[tokio::test]
    async fn test_axum_test_request_form_body() {
        let app = Router::new().route(
            "/test",
            axum::routing::post(|body: String| async move { body }),
        );
        let response = AxumTestRequest::post("/test")
            .form(&[("name", "alice"), ("role", "admin")])
            .send(app)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text(), "name=alice&role=admin");
    }

    #[tokio::test]
    async fn test_axum_test_response_set_cookie_parsing() {
        let app = Router::new().route(
            "/test",
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.append(
                    header::SET_COOKIE,
                    "session=abc123; Path=/; HttpOnly".parse().unwrap(),
                );
                headers.append(
                    header::SET_COOKIE,
                    "theme=dark; Path=/".parse().unwrap(),
                );
                (headers, "ok")
            }),
        );
        let response = AxumTestRequest::get("/test").send(app).await;
        assert_eq!(response.set_cookies().len(), 2);
        assert_eq!(response.set_cookie_value("session").as_deref(), Some("abc123"));
        assert_eq!(response.set_cookie_value("theme").as_deref(), Some("dark"));
        assert_eq!(response.set_cookie_value("missing"), None);
    }

    #[tokio::test]
    async fn test_axum_test_response_methods() {
        let app = Router::new().route("/test", get(|| async { "test response" }));
        let response = AxumTestRequest::get("/test").send(app).await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.status_code(), StatusCode::OK);
        let bytes = response.bytes();
        assert_eq!(bytes, b"test response");
    }

    #[tokio::test]
    async fn test_axum_test_response_assert_status() {
        let app = Router::new().route("/test", get(|| async { "ok" }));
        let response = AxumTestRequest::get("/test").send(app).await;
        let response = response.assert_status(StatusCode::OK);
        assert_eq!(response.text(), "ok");
    }
}
