//! Executing client: `ThunderClient` paired with a `Transport`.
//!
//! Each operation makes exactly one attempt and returns exactly one
//! `Result`. Validation happens before the transport is touched.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ThunderClient;
use crate::config::ClientConfig;
use crate::error::ThunderError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{ResponseType, Verification};

/// Thunder API client that performs its own I/O.
///
/// Holds no mutable state; share it freely across threads when `T` allows.
#[derive(Debug, Clone)]
pub struct Thunder<T> {
    client: ThunderClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl Thunder<crate::transport::UreqTransport> {
    /// Build a client that talks to `base_url` over `ureq`.
    pub fn connect(
        base_url: &str,
        application_key: &str,
        application_secret: &str,
    ) -> Result<Self, ThunderError> {
        let config = ClientConfig::new(base_url, application_key, application_secret)?;
        Ok(Self::new(config, crate::transport::UreqTransport::new()))
    }
}

impl<T: Transport> Thunder<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            client: ThunderClient::new(config),
            transport,
        }
    }

    pub fn client(&self) -> &ThunderClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `user` may be a `User` or any other serializable value, such as a raw
    /// `serde_json::Value`. The server's body comes back untouched.
    pub fn create_user<U: Serialize + ?Sized>(&self, user: &U) -> Result<Value, ThunderError> {
        let req = self.client.build_create_user(user)?;
        let response = self.execute(&req)?;
        self.report(&req, self.client.parse_create_user(response))
    }

    pub fn get_user(&self, email: &str, password: &str) -> Result<Value, ThunderError> {
        let req = self.client.build_get_user(email, password);
        let response = self.execute(&req)?;
        self.report(&req, self.client.parse_get_user(response))
    }

    /// Pass `None` for `email` to update the user the password belongs to.
    pub fn update_user<U: Serialize + ?Sized>(
        &self,
        email: Option<&str>,
        password: &str,
        user: &U,
    ) -> Result<Value, ThunderError> {
        let req = self.client.build_update_user(email, password, user)?;
        let response = self.execute(&req)?;
        self.report(&req, self.client.parse_update_user(response))
    }

    pub fn delete_user(&self, email: &str, password: &str) -> Result<Value, ThunderError> {
        let req = self.client.build_delete_user(email, password);
        let response = self.execute(&req)?;
        self.report(&req, self.client.parse_delete_user(response))
    }

    pub fn send_email(&self, email: &str, password: &str) -> Result<Value, ThunderError> {
        let req = self.client.build_send_email(email, password);
        let response = self.execute(&req)?;
        self.report(&req, self.client.parse_send_email(response))
    }

    /// Verify with the default `json` response type.
    pub fn verify_user(&self, email: &str, token: &str) -> Result<Verification, ThunderError> {
        self.verify_user_as(email, token, ResponseType::default())
    }

    /// Verify with a caller-supplied response type. Anything other than
    /// `"html"` or `"json"` fails without sending a request.
    pub fn verify_user_with(
        &self,
        email: &str,
        token: &str,
        response_type: &str,
    ) -> Result<Verification, ThunderError> {
        let response_type = response_type.parse::<ResponseType>().inspect_err(|e| {
            warn!(error = %e, "rejected verification request");
        })?;
        self.verify_user_as(email, token, response_type)
    }

    pub fn verify_user_as(
        &self,
        email: &str,
        token: &str,
        response_type: ResponseType,
    ) -> Result<Verification, ThunderError> {
        let req = self.client.build_verify_user(email, token, response_type);
        let response = self.execute(&req)?;
        self.report(&req, self.client.parse_verify_user(response, response_type))
    }

    pub fn reset_verification_status(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Value, ThunderError> {
        let req = self.client.build_reset_verification_status(email, password);
        let response = self.execute(&req)?;
        self.report(&req, self.client.parse_reset_verification_status(response))
    }

    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, ThunderError> {
        // Names only; values may carry tokens.
        let query: Vec<&str> = req.query.iter().map(|(name, _)| name.as_str()).collect();
        debug!(method = req.method.as_str(), url = %req.url, ?query, "sending request");
        match self.transport.send(req) {
            Ok(response) => {
                debug!(method = req.method.as_str(), url = %req.url, status = response.status, "received response");
                Ok(response)
            }
            Err(e) => {
                warn!(method = req.method.as_str(), url = %req.url, error = %e, "transport failed");
                Err(ThunderError::Transport(e))
            }
        }
    }

    fn report<R>(&self, req: &HttpRequest, result: Result<R, ThunderError>) -> Result<R, ThunderError> {
        if let Err(e) = &result {
            warn!(method = req.method.as_str(), url = %req.url, error = %e, "request failed");
        }
        result
    }
}
