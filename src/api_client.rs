//! Outbound JSON request plumbing with DNS override support.

use std::collections::HashMap;
use std::io::Read;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use serde_json::Value;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(7);
const WRITE_TIMEOUT: Duration = Duration::from_secs(7);

/// Resolves a `host:port` netloc, substituting the configured address when a
/// DNS override exists for the host. TLS verification and the Host header
/// keep the original hostname.
fn resolve_netloc(
    dns_overrides: &HashMap<String, String>,
    netloc: &str,
) -> std::io::Result<Vec<SocketAddr>> {
    if let Some((host, port)) = netloc.rsplit_once(':') {
        if let Some(address) = dns_overrides.get(host) {
            return format!("{}:{}", address, port)
                .to_socket_addrs()
                .map(Iterator::collect);
        }
    }
    netloc.to_socket_addrs().map(Iterator::collect)
}

/// Blocking JSON API client with a swappable default-header set.
pub struct ApiClient {
    agent: ureq::Agent,
    headers: Vec<(String, String)>,
    verbose_log: bool,
}

impl ApiClient {
    /// Creates a client honoring the resolved DNS overrides. Request/response
    /// bodies are logged at `debug!` only when verbose logging is enabled.
    pub fn new(dns_overrides: &HashMap<String, String>, verbose_log: bool) -> Self {
        let dns_overrides = dns_overrides.clone();
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .resolver(move |netloc: &str| resolve_netloc(&dns_overrides, netloc))
            .build();
        Self {
            agent,
            headers: Vec::new(),
            verbose_log,
        }
    }

    /// Replaces the header set applied to every request, returning the
    /// previous set so a caller can restore it after a provider-specific call.
    pub fn set_headers(&mut self, headers: Vec<(String, String)>) -> Vec<(String, String)> {
        std::mem::replace(&mut self.headers, headers)
    }

    /// Issues a GET request with URL-encoded query parameters and parses the
    /// JSON response body.
    pub fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, String> {
        let mut request = self.agent.get(url);
        for (name, header_value) in &self.headers {
            request = request.set(name, header_value);
        }
        for (name, param_value) in params {
            request = request.query(name, param_value);
        }
        if self.verbose_log {
            debug!("Requesting {} with params {:?}", url, params);
        }
        let response = request.call().map_err(|error| match error {
            ureq::Error::Status(code, _) => {
                format!("Request to {} failed with status {}", url, code)
            }
            ureq::Error::Transport(transport) => {
                format!("Request to {} failed: {}", url, transport)
            }
        })?;
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|error| format!("Failed to read response from {}: {}", url, error))?;
        if self.verbose_log {
            debug!("Response from {}: {}", url, body);
        }
        serde_json::from_str(&body)
            .map_err(|error| format!("Invalid JSON response from {}: {}", url, error))
    }
}
