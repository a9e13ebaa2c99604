//! Blocking HTTP transport for metric sets.
//!
//! One GET per collection cycle, no retries: a transport failure is a fetch
//! error for the cycle, which is what a golden test wants to see.

use std::io::Read;
use std::time::Duration;

use url::Url;

use crate::error::FetchError;

// ── Constants ───────────────────────────────────────────────────────

const MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024; // 10 MB
const USER_AGENT: &str = concat!("mbgolden/", env!("CARGO_PKG_VERSION"));

// ── Client ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::blocking::Client,
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct HttpBody {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl HttpBody {
    /// Body as text. Bytes that are not UTF-8 are read as Latin-1, the
    /// charset plain-text metric endpoints declare.
    pub fn text(&self) -> String {
        match std::str::from_utf8(&self.bytes) {
            Ok(s) => s.to_string(),
            Err(_) => self.bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            // Scrapes go straight to the host, never through an env proxy
            .no_proxy()
            .build()
            .map_err(|e| FetchError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// GET `url` and return the body of a 2xx response.
    pub fn get(&self, url: &Url) -> Result<HttpBody, FetchError> {
        let resp = self
            .http
            .get(url.clone())
            .header("Accept", "text/plain")
            .send()
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        resp.take(MAX_RESPONSE_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError::Body {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        if bytes.len() as u64 > MAX_RESPONSE_BYTES {
            return Err(FetchError::Body {
                url: url.to_string(),
                message: format!("response exceeds {MAX_RESPONSE_BYTES} bytes"),
            });
        }

        Ok(HttpBody { content_type, bytes })
    }
}

/// Turn a configured host into a URL.
///
/// Hosts without a scheme get `http://`; hosts without a path get
/// `default_path`.
pub fn host_url(host: &str, default_path: &str) -> Result<Url, FetchError> {
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| FetchError::Config(format!("invalid host '{host}': {e}")))?;
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(default_path);
    }
    Ok(url)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn host_url_adds_scheme_and_path() {
        let url = host_url("127.0.0.1:9100", "/metrics").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9100/metrics");
    }

    #[test]
    fn host_url_keeps_explicit_path() {
        let url = host_url("http://localhost:8080/custom/stats", "/metrics").unwrap();
        assert_eq!(url.path(), "/custom/stats");
    }

    #[test]
    fn host_url_rejects_garbage() {
        let err = host_url("http://[::1", "/metrics").unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn latin1_body_decodes() {
        let body = HttpBody { content_type: None, bytes: vec![b'a', 0xe9, b'b'] };
        assert_eq!(body.text(), "aéb");
    }

    #[test]
    fn get_returns_body_and_content_type() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/metrics");
            then.status(200)
                .header("Content-Type", "text/plain; version=0.0.4")
                .body("up 1\n");
        });

        let url = host_url(&server.base_url(), "/metrics").unwrap();
        let body = client().get(&url).unwrap();

        mock.assert();
        assert_eq!(body.bytes, b"up 1\n");
        assert_eq!(body.content_type.as_deref(), Some("text/plain; version=0.0.4"));
    }

    #[test]
    fn get_non_success_is_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/metrics");
            then.status(503).body("down");
        });

        let url = host_url(&server.base_url(), "/metrics").unwrap();
        let err = client().get(&url).unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 503, .. }));
    }

    #[test]
    fn get_unreachable_is_network_error() {
        // Bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = host_url(&format!("127.0.0.1:{port}"), "/metrics").unwrap();
        let err = client().get(&url).unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
