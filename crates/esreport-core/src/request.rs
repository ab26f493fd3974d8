//! HTTP request reports

use esreport_security::{Redactor, format_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::Collection;
use crate::report::{DataContext, Document, ExceptionInfo, Report, ReportBase, format_datetime};

/// Appended to request and response bodies cut at the size limit
pub const TRUNCATION_MARKER: &str = "...TRUNCATED";

/// Cut `text` to at most `limit` characters and append the truncation marker.
pub fn truncate_body(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let kept: String = text.chars().take(limit).collect();
    format!("{}{}", kept.trim_end(), TRUNCATION_MARKER)
}

/// Redact, truncate and pretty-print a body for storage
fn format_body(redactor: &Redactor, body: &str, limit: usize) -> String {
    let redacted = redactor.redact_serialized_json(body);
    format_json(&truncate_body(&redacted, limit))
}

/// An incoming request as seen by the host framework
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub protocol: String,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub body: String,
    pub ip: Option<String>,
    pub user: Option<Value>,
    pub action: Option<String>,
    pub action_method: Option<String>,
}

impl HttpRequest {
    pub fn new(
        method: impl Into<String>,
        scheme: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            scheme: scheme.into(),
            host: host.into(),
            path: path.into(),
            query: Vec::new(),
            protocol: "HTTP/1.1".to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: String::new(),
            ip: None,
            user: None,
            action: None,
            action_method: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>, method: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self.action_method = Some(method.into());
        self
    }

    /// Path without surrounding slashes, `/` for the root
    pub fn route_path(&self) -> String {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        }
    }

    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }

        Some(
            self.query
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&"),
        )
    }

    /// URL without the query string or a trailing slash
    pub fn url(&self) -> String {
        let path = self.path.trim_matches('/');
        let url = format!("{}://{}/{}", self.scheme, self.host, path);
        url.trim_end_matches('/').to_string()
    }

    pub fn full_url(&self) -> String {
        match self.query_string() {
            Some(qs) => format!("{}?{}", self.url(), qs),
            None => self.url(),
        }
    }

    pub fn request_uri(&self) -> String {
        let path = format!("/{}", self.path.trim_start_matches('/'));
        match self.query_string() {
            Some(qs) => format!("{}?{}", path, qs),
            None => path,
        }
    }

    /// Header values grouped by lowercased name, joined with `; `
    fn header_map(&self) -> Value {
        let mut grouped: Vec<(String, Vec<&str>)> = Vec::new();
        for (name, value) in &self.headers {
            let name = name.to_ascii_lowercase();
            match grouped.iter().position(|(n, _)| *n == name) {
                Some(i) => grouped[i].1.push(value.as_str()),
                None => grouped.push((name, vec![value.as_str()])),
            }
        }

        Value::Object(
            grouped
                .into_iter()
                .map(|(name, values)| (name, Value::String(values.join("; "))))
                .collect(),
        )
    }

    fn query_map(&self) -> Value {
        Value::Object(
            self.query
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    fn format(&self, redactor: &Redactor, limit: usize) -> String {
        let mut out = format!(
            "{} {} {}\n",
            self.method.to_uppercase(),
            self.request_uri(),
            self.protocol
        );

        if !self.cookies.is_empty() {
            let cookies = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            out.push_str(&format!("Cookie: {}\n", cookies));
        }
        out.push('\n');

        let headers = redactor.redact_headers(self.headers.iter().map(|(k, v)| (k, v)));
        if !headers.is_empty() {
            out.push_str(&headers);
            out.push('\n');
        }
        out.push('\n');

        out.push_str(&format_body(redactor, &self.body, limit));
        out
    }
}

/// The response produced for a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub exception: Option<ExceptionInfo>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            version: "1.1".to_string(),
            headers: Vec::new(),
            body: String::new(),
            exception: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn status_text(&self) -> &'static str {
        http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown")
    }

    fn format(&self, redactor: &Redactor, limit: usize) -> String {
        let mut out = format!(
            "HTTP/{} {} {}\n",
            self.version,
            self.status,
            self.status_text()
        );

        let headers = redactor.redact_headers(self.headers.iter().map(|(k, v)| (k, v)));
        if !headers.is_empty() {
            out.push_str(&headers);
            out.push('\n');
        }
        out.push('\n');

        out.push_str(&format_body(redactor, &self.body, limit));
        out
    }
}

#[derive(Debug, Clone)]
pub struct RequestReport {
    base: ReportBase,
    request: HttpRequest,
    response: Option<HttpResponse>,
}

impl RequestReport {
    /// `name` identifies the request in the logs, defaulting to its path.
    pub fn new(request: HttpRequest, name: Option<String>) -> Self {
        let mut base = ReportBase::new();
        if let Some(name) = name {
            base.set_context_name(name);
        }

        Self {
            base,
            request,
            response: None,
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    pub fn namespace(&self) -> String {
        self.base
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| self.request.route_path())
    }

    /// Store the response. Success and exception are only taken from the
    /// response when they were not set explicitly beforehand.
    pub fn set_response(&mut self, response: HttpResponse) -> &mut Self {
        if self.base.success().is_none() {
            self.base.set_success(response.is_successful());
        }

        if self.base.exception().is_none() && response.exception.is_some() {
            self.base.set_exception(response.exception.clone());
        }

        self.response = Some(response);
        self
    }
}

impl Report for RequestReport {
    fn base(&self) -> &ReportBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ReportBase {
        &mut self.base
    }

    fn collection(&self) -> Collection {
        Collection::Requests
    }

    fn data(&self, ctx: &DataContext<'_>) -> Document {
        let mut doc = Document::new();
        let name = self.namespace();

        self.base.write_context_data(&name, &mut doc);
        self.base.write_output_data(&mut doc);
        self.base.write_success_data(&mut doc);
        self.base.write_duration_data(&mut doc);
        ctx.app.write_to(&mut doc);

        doc.insert(
            "created_at".into(),
            format_datetime(Some(self.base.created_at())),
        );
        doc.insert("display_name".into(), name.into());
        doc.insert(
            "user".into(),
            self.request.user.clone().unwrap_or(Value::Null),
        );
        doc.insert("ip".into(), self.request.ip.clone().into());
        doc.insert(
            "status".into(),
            self.response.as_ref().map(|r| r.status).into(),
        );
        doc.insert("method".into(), self.request.method.to_uppercase().into());
        doc.insert("domain".into(), self.request.host.clone().into());
        doc.insert("full_url".into(), self.request.full_url().into());
        doc.insert("url".into(), self.request.url().into());
        doc.insert("path".into(), self.request.route_path().into());
        doc.insert("query".into(), self.request.query_map());
        doc.insert("query_string".into(), self.request.query_string().into());
        doc.insert("headers".into(), self.request.header_map());
        doc.insert(
            "request".into(),
            self.request.format(ctx.redactor, ctx.max_request).into(),
        );
        doc.insert(
            "response".into(),
            self.response
                .as_ref()
                .map(|r| r.format(ctx.redactor, ctx.max_response))
                .into(),
        );
        doc.insert("action".into(), self.request.action.clone().into());
        doc.insert(
            "action_method".into(),
            self.request.action_method.clone().into(),
        );

        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppInfo;
    use serde_json::json;

    fn sample_request() -> HttpRequest {
        HttpRequest::new("post", "https", "api.example.com", "/users/42/")
            .with_query("page", "2")
            .with_header("Content-Type", "application/json")
            .with_header("Authorization", "Bearer abcdef123")
            .with_header("Accept", "application/json")
            .with_header("Accept", "text/plain")
            .with_cookie("session", "xyz")
            .with_body(r#"{"name":"Jane","password":"hunter22"}"#)
            .with_ip("10.0.0.1")
            .with_user(json!(7))
            .with_action("UserController@update", "update")
    }

    fn data_of(report: &RequestReport, limit: usize) -> Document {
        let app = AppInfo::new("staging", "staging", Some("api".into())).with_host("web-1");
        let redactor = Redactor::default();
        report.data(&DataContext {
            app: &app,
            redactor: &redactor,
            max_request: limit,
            max_response: limit,
        })
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short", 10), "short");
        assert_eq!(truncate_body("abcdef", 3), "abc...TRUNCATED");
        assert_eq!(truncate_body("ab   cdef", 4), "ab...TRUNCATED");
        assert_eq!(truncate_body("ééé", 2), "éé...TRUNCATED");
    }

    #[test]
    fn test_url_parts() {
        let request = sample_request();

        assert_eq!(request.route_path(), "users/42");
        assert_eq!(request.url(), "https://api.example.com/users/42");
        assert_eq!(request.full_url(), "https://api.example.com/users/42?page=2");
        assert_eq!(request.request_uri(), "/users/42/?page=2");

        let root = HttpRequest::new("GET", "http", "localhost", "/");
        assert_eq!(root.route_path(), "/");
        assert_eq!(root.url(), "http://localhost");
        assert_eq!(root.query_string(), None);
    }

    #[test]
    fn test_set_response_derives_success() {
        let mut report = RequestReport::new(sample_request(), None);
        report.set_response(HttpResponse::new(500));
        assert_eq!(report.base().success(), Some(false));

        let mut report = RequestReport::new(sample_request(), None);
        report.base_mut().set_success(false);
        report.set_response(HttpResponse::new(200));
        assert_eq!(report.base().success(), Some(false));
    }

    #[test]
    fn test_set_response_keeps_explicit_exception() {
        let mut report = RequestReport::new(sample_request(), None);
        report
            .base_mut()
            .set_exception(Some(ExceptionInfo::new("Explicit", "set in handler")));
        report.set_response(
            HttpResponse::new(500).with_exception(ExceptionInfo::new("FromResponse", "boom")),
        );

        assert_eq!(report.base().exception().unwrap().class, "Explicit");

        let mut report = RequestReport::new(sample_request(), None);
        report.set_response(
            HttpResponse::new(500).with_exception(ExceptionInfo::new("FromResponse", "boom")),
        );
        assert_eq!(report.base().exception().unwrap().class, "FromResponse");
    }

    #[test]
    fn test_request_data() {
        let mut report = RequestReport::new(sample_request(), None);
        report.set_response(
            HttpResponse::new(201)
                .with_header("Content-Type", "application/json")
                .with_body(r#"{"id":42,"email":"jane@example.com"}"#),
        );

        let data = data_of(&report, 200_000);

        assert_eq!(data["display_name"], "users/42");
        assert_eq!(data["namespace"], "users/42");
        assert_eq!(data["status"], 201);
        assert_eq!(data["method"], "POST");
        assert_eq!(data["domain"], "api.example.com");
        assert_eq!(data["user"], 7);
        assert_eq!(data["query"], json!({"page": "2"}));
        assert_eq!(data["headers"]["accept"], "application/json; text/plain");
        assert_eq!(data["success"], true);
        assert_eq!(data["action"], "UserController@update");
        assert_eq!(data["app_name"], "api");
    }

    #[test]
    fn test_formatted_request_is_redacted() {
        let report = RequestReport::new(sample_request(), Some("update-user".into()));
        let data = data_of(&report, 200_000);
        let request = data["request"].as_str().unwrap();

        assert!(request.starts_with("POST /users/42/?page=2 HTTP/1.1\nCookie: session=xyz\n\n"));
        assert!(request.contains("authorization : Be[--REDACTED--]23"));
        assert!(request.contains("\"password\": \"hu[--REDACTED--]22\""));
        assert!(!request.contains("hunter22"));
        assert_eq!(data["display_name"], "update-user");
    }

    #[test]
    fn test_formatted_response() {
        let mut report = RequestReport::new(sample_request(), None);
        report.set_response(HttpResponse::new(404).with_body("not found"));

        let data = data_of(&report, 200_000);
        assert_eq!(data["response"], "HTTP/1.1 404 Not Found\n\nnot found");

        let mut report = RequestReport::new(sample_request(), None);
        report.set_response(HttpResponse::new(299));
        let data = data_of(&report, 200_000);
        assert!(data["response"].as_str().unwrap().starts_with("HTTP/1.1 299 Unknown"));
    }

    #[test]
    fn test_large_body_truncated() {
        let body = format!("{{\"data\":\"{}\"}}", "x".repeat(100));
        let report = RequestReport::new(sample_request().with_body(body), None);

        let data = data_of(&report, 20);
        assert!(data["request"].as_str().unwrap().ends_with("...TRUNCATED"));
    }

    #[test]
    fn test_non_json_body_passes_through() {
        let request = sample_request().with_body("password=hunter22");
        let report = RequestReport::new(request, None);

        let data = data_of(&report, 200_000);
        assert!(data["request"].as_str().unwrap().ends_with("\n\npassword=hunter22"));
    }

    #[test]
    fn test_data_without_response() {
        let report = RequestReport::new(sample_request(), None);
        let data = data_of(&report, 200_000);

        assert_eq!(data["status"], Value::Null);
        assert_eq!(data["response"], Value::Null);
        assert_eq!(data["success"], Value::Null);
    }
}
