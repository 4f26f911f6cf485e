//! Stateless request builder and response normalizer for the Thunder API.
//!
//! # Design
//! `ThunderClient` holds only its `ClientConfig`. Every operation is split
//! into a `build_*` method that produces an `HttpRequest` and a `parse_*`
//! method that turns the matching `HttpResponse` into a result. The round
//! trip in between belongs to the caller, or to `Thunder` when a `Transport`
//! is available.
//!
//! Every endpoint promises exactly one success status. Any other status is a
//! `StatusMismatch` carrying the raw body, whatever the code. Success bodies
//! are passed through as `serde_json::Value` without looking at their shape;
//! a JSON endpoint that answers with text yields `Value::String`.

use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ThunderError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{ResponseType, Verification};

pub const USERS_PATH: &str = "/users";
pub const VERIFY_PATH: &str = "/verify";
pub const VERIFY_RESET_PATH: &str = "/verify/reset";

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;

/// Synchronous, stateless client for the Thunder API.
#[derive(Debug, Clone)]
pub struct ThunderClient {
    config: ClientConfig,
}

impl ThunderClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `POST /users` with the user as the JSON body. Any serializable value
    /// is accepted: a `User`, or a raw `serde_json::Value`.
    pub fn build_create_user<U: Serialize + ?Sized>(
        &self,
        user: &U,
    ) -> Result<HttpRequest, ThunderError> {
        let mut req = self.request(HttpMethod::Post, USERS_PATH);
        req.body = Some(to_json(user)?);
        Ok(req)
    }

    /// `GET /users?email=` authenticated as the user through `password`.
    pub fn build_get_user(&self, email: &str, password: &str) -> HttpRequest {
        self.user_request(HttpMethod::Get, USERS_PATH, email, password)
    }

    /// `PUT /users`. With no `email` the query is left empty and the server
    /// applies the update to the user the password authenticates.
    pub fn build_update_user<U: Serialize + ?Sized>(
        &self,
        email: Option<&str>,
        password: &str,
        user: &U,
    ) -> Result<HttpRequest, ThunderError> {
        let mut req = self.request(HttpMethod::Put, USERS_PATH);
        if let Some(email) = email {
            req.query.push(pair("email", email));
        }
        req.headers.push(pair("password", password));
        req.body = Some(to_json(user)?);
        Ok(req)
    }

    pub fn build_delete_user(&self, email: &str, password: &str) -> HttpRequest {
        self.user_request(HttpMethod::Delete, USERS_PATH, email, password)
    }

    /// `POST /verify`: asks the server to send a verification email.
    pub fn build_send_email(&self, email: &str, password: &str) -> HttpRequest {
        self.user_request(HttpMethod::Post, VERIFY_PATH, email, password)
    }

    /// `GET /verify` with the token from the verification email. Carries no
    /// user password; the token is the proof.
    pub fn build_verify_user(
        &self,
        email: &str,
        token: &str,
        response_type: ResponseType,
    ) -> HttpRequest {
        let mut req = self.request(HttpMethod::Get, VERIFY_PATH);
        req.query = vec![
            pair("email", email),
            pair("token", token),
            pair("response_type", response_type.as_str()),
        ];
        req.json = response_type == ResponseType::Json;
        req
    }

    pub fn build_reset_verification_status(&self, email: &str, password: &str) -> HttpRequest {
        self.user_request(HttpMethod::Post, VERIFY_RESET_PATH, email, password)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<Value, ThunderError> {
        parse_json(response, STATUS_CREATED)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<Value, ThunderError> {
        parse_json(response, STATUS_OK)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<Value, ThunderError> {
        parse_json(response, STATUS_OK)
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<Value, ThunderError> {
        parse_json(response, STATUS_OK)
    }

    pub fn parse_send_email(&self, response: HttpResponse) -> Result<Value, ThunderError> {
        parse_json(response, STATUS_OK)
    }

    /// HTML verifications come back as the page text; JSON ones as the body.
    pub fn parse_verify_user(
        &self,
        response: HttpResponse,
        response_type: ResponseType,
    ) -> Result<Verification, ThunderError> {
        match response_type {
            ResponseType::Json => parse_json(response, STATUS_OK).map(Verification::Json),
            ResponseType::Html => {
                check_status(&response, STATUS_OK)?;
                Ok(Verification::Html(response.body))
            }
        }
    }

    pub fn parse_reset_verification_status(
        &self,
        response: HttpResponse,
    ) -> Result<Value, ThunderError> {
        parse_json(response, STATUS_OK)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.config.base_url()),
            query: Vec::new(),
            headers: Vec::new(),
            auth: self.config.credentials().clone(),
            body: None,
            json: true,
        }
    }

    /// Request targeting one user: `?email=` plus the user's `password` header.
    fn user_request(
        &self,
        method: HttpMethod,
        path: &str,
        email: &str,
        password: &str,
    ) -> HttpRequest {
        let mut req = self.request(method, path);
        req.query.push(pair("email", email));
        req.headers.push(pair("password", password));
        req
    }
}

/// Compare the response status against the one the endpoint promises.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ThunderError> {
    if response.status == expected {
        return Ok(());
    }
    Err(ThunderError::StatusMismatch {
        status: response.status,
        expected,
        body: response.body.clone(),
    })
}

/// Status check, then the body as JSON when it parses, as a string otherwise.
fn parse_json(response: HttpResponse, expected: u16) -> Result<Value, ThunderError> {
    check_status(&response, expected)?;
    Ok(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)))
}

fn to_json<U: Serialize + ?Sized>(user: &U) -> Result<String, ThunderError> {
    serde_json::to_string(user).map_err(|e| ThunderError::Serialization(e.to_string()))
}

fn pair(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}
