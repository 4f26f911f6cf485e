//! Domain DTOs for the Thunder API.
//!
//! # Design
//! Operations take any serializable user and return the server's body as a
//! `serde_json::Value`, untouched. `User` is a typed view for callers who
//! want one: only `email.address` is required, unknown fields land in
//! flattened maps, and explicit `null`s fold into `None`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ThunderError;

/// A Thunder user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(address: &str, password: &str) -> Self {
        Self {
            email: Email::new(address),
            password: Some(password.to_string()),
            extra: Map::new(),
        }
    }
}

/// The email block of a user. `verified` and `verification_token` are
/// assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Email {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            verified: None,
            verification_token: None,
            extra: Map::new(),
        }
    }
}

/// Format the server should answer a verification request with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    Html,
    #[default]
    Json,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Html => "html",
            ResponseType::Json => "json",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = ThunderError;

    /// Accepts exactly `"html"` or `"json"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(ResponseType::Html),
            "json" => Ok(ResponseType::Json),
            other => Err(ThunderError::Validation(format!(
                "The response type {other} is not accepted.\nUse either \"html\" or \"json\"."
            ))),
        }
    }
}

/// Result of a verification request, shaped by the requested `ResponseType`.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Json(Value),
    Html(String),
}
