//! The I/O seam between `Thunder` and the network.
//!
//! # Design
//! A `Transport` executes one `HttpRequest` and reports what came back. Any
//! status code is a successful round trip; only failures to get a response at
//! all (DNS, refused connections, transport-enforced timeouts) are errors.
//! Transports do not retry.

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes a single HTTP round trip.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use ureq::http::{HeaderName, HeaderValue};
    use ureq::typestate::WithBody;
    use ureq::{Agent, RequestBuilder};

    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a `ureq::Agent`.
    ///
    /// The agent is configured so 4xx/5xx responses come back as data; the
    /// client decides what a status means.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Use a caller-configured agent (proxies, timeouts, TLS). The agent
        /// should have `http_status_as_error(false)`.
        pub fn with_agent(agent: Agent) -> Self {
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url.as_str();
            let result = match request.method {
                HttpMethod::Get => prepare(self.agent.get(url), request).call(),
                HttpMethod::Delete => prepare(self.agent.delete(url), request).call(),
                HttpMethod::Post => send_body(prepare(self.agent.post(url), request), request),
                HttpMethod::Put => send_body(prepare(self.agent.put(url), request), request),
            };
            let mut response = result.map_err(|e| Box::new(e) as TransportError)?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| header_pair(name, value))
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| Box::new(e) as TransportError)?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }

    /// Apply query pairs, application auth and per-request headers.
    fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
        for (name, value) in &request.query {
            builder = builder.query(name, value);
        }
        let authorization = request.auth.header_value();
        builder = builder.header("authorization", authorization.as_str());
        if request.json {
            builder = builder.header("accept", "application/json");
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    /// Header values may carry non-ASCII bytes; keep them, lossily.
    fn header_pair(name: &HeaderName, value: &HeaderValue) -> (String, String) {
        (
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        )
    }

    fn send_body(
        builder: RequestBuilder<WithBody>,
        request: &HttpRequest,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        match &request.body {
            Some(body) => builder
                .content_type("application/json")
                .send(body.as_bytes()),
            None => builder.send_empty(),
        }
    }

}
