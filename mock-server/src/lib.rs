use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_KEY: &str = "application";
pub const DEFAULT_SECRET: &str = "secret";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub address: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Deserialize)]
pub struct OptionalEmailQuery {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub email: String,
    pub token: String,
    pub response_type: Option<String>,
}

pub struct AppState {
    users: RwLock<HashMap<String, User>>,
    key: String,
    secret: String,
}

pub type Db = Arc<AppState>;

type Reply<T> = Result<T, (StatusCode, String)>;

pub fn app() -> Router {
    app_with_credentials(DEFAULT_KEY, DEFAULT_SECRET)
}

/// Router that only accepts Basic auth with `key:secret`.
pub fn app_with_credentials(key: &str, secret: &str) -> Router {
    let db: Db = Arc::new(AppState {
        users: RwLock::new(HashMap::new()),
        key: key.to_string(),
        secret: secret.to_string(),
    });
    Router::new()
        .route(
            "/users",
            get(get_user).post(create_user).put(update_user).delete(delete_user),
        )
        .route("/verify", get(verify_user).post(send_email))
        .route("/verify/reset", post(reset_verification))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_credentials(
    listener: TcpListener,
    key: &str,
    secret: &str,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_credentials(key, secret)).await
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, String) {
    (status, message.to_string())
}

/// Check the application's Basic credentials.
fn authorize(db: &AppState, headers: &HeaderMap) -> Reply<()> {
    let unauthorized = || reject(StatusCode::UNAUTHORIZED, "Missing or invalid application credentials");
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(unauthorized)?;
    let encoded = value.strip_prefix("Basic ").ok_or_else(unauthorized)?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| unauthorized())?;
    let decoded = String::from_utf8(decoded).map_err(|_| unauthorized())?;
    match decoded.split_once(':') {
        Some((key, secret)) if key == db.key && secret == db.secret => Ok(()),
        _ => Err(unauthorized()),
    }
}

fn password_header(headers: &HeaderMap) -> Reply<&str> {
    headers
        .get("password")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing password header"))
}

/// Look up `email` and check the caller's password against it.
fn authenticate<'a>(
    users: &'a mut HashMap<String, User>,
    email: &str,
    password: &str,
) -> Reply<&'a mut User> {
    let user = users
        .get_mut(email)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found"))?;
    if user.password.as_deref() != Some(password) {
        return Err(reject(StatusCode::UNAUTHORIZED, "Unable to validate user with provided credentials"));
    }
    Ok(user)
}

async fn create_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(mut input): Json<User>,
) -> Reply<(StatusCode, Json<User>)> {
    authorize(&db, &headers)?;
    if input.email.address.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Cannot post a user without an email address"));
    }
    if input.password.is_none() {
        return Err(reject(StatusCode::BAD_REQUEST, "Cannot post a user without a password"));
    }
    let mut users = db.users.write().await;
    if users.contains_key(&input.email.address) {
        return Err(reject(StatusCode::CONFLICT, "A user with this email already exists"));
    }
    input.email.verified = false;
    input.email.verification_token = None;
    info!(email = %input.email.address, "created user");
    users.insert(input.email.address.clone(), input.clone());
    Ok((StatusCode::CREATED, Json(input)))
}

async fn get_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<EmailQuery>,
) -> Reply<Json<User>> {
    authorize(&db, &headers)?;
    let password = password_header(&headers)?;
    let mut users = db.users.write().await;
    let user = authenticate(&mut users, &query.email, password)?;
    Ok(Json(user.clone()))
}

async fn update_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<OptionalEmailQuery>,
    Json(mut input): Json<User>,
) -> Reply<Json<User>> {
    authorize(&db, &headers)?;
    let password = password_header(&headers)?;
    let target = query.email.unwrap_or_else(|| input.email.address.clone());
    let mut users = db.users.write().await;
    let existing = authenticate(&mut users, &target, password)?.clone();

    let moved = input.email.address != existing.email.address;
    if moved && users.contains_key(&input.email.address) {
        return Err(reject(StatusCode::CONFLICT, "A user with the new email address already exists"));
    }
    if moved {
        input.email.verified = false;
        input.email.verification_token = None;
    } else {
        input.email.verified = existing.email.verified;
        input.email.verification_token = existing.email.verification_token.clone();
    }
    if input.password.is_none() {
        input.password = existing.password.clone();
    }

    users.remove(&existing.email.address);
    users.insert(input.email.address.clone(), input.clone());
    info!(from = %existing.email.address, to = %input.email.address, "updated user");
    Ok(Json(input))
}

async fn delete_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<EmailQuery>,
) -> Reply<Json<User>> {
    authorize(&db, &headers)?;
    let password = password_header(&headers)?;
    let mut users = db.users.write().await;
    authenticate(&mut users, &query.email, password)?;
    let removed = users
        .remove(&query.email)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found"))?;
    info!(email = %query.email, "deleted user");
    Ok(Json(removed))
}

/// Issues a fresh verification token. No mail leaves the mock; the token is
/// returned on the user.
async fn send_email(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<EmailQuery>,
) -> Reply<Json<User>> {
    authorize(&db, &headers)?;
    let password = password_header(&headers)?;
    let mut users = db.users.write().await;
    let user = authenticate(&mut users, &query.email, password)?;
    user.email.verification_token = Some(Uuid::new_v4().to_string());
    info!(email = %query.email, "issued verification token");
    Ok(Json(user.clone()))
}

async fn verify_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<VerifyQuery>,
) -> Reply<Response> {
    authorize(&db, &headers)?;
    let response_type = query.response_type.as_deref().unwrap_or("json");
    if response_type != "json" && response_type != "html" {
        return Err(reject(StatusCode::BAD_REQUEST, "Unknown response_type"));
    }
    let mut users = db.users.write().await;
    let user = users
        .get_mut(&query.email)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "User not found"))?;
    if user.email.verification_token.as_deref() != Some(query.token.as_str()) {
        return Err(reject(StatusCode::BAD_REQUEST, "Incorrect verification token"));
    }
    user.email.verified = true;
    info!(email = %query.email, "verified user");

    if response_type == "html" {
        return Ok(Html("<html><body><h1>Your account has been verified!</h1></body></html>").into_response());
    }
    Ok(Json(user.clone()).into_response())
}

async fn reset_verification(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<EmailQuery>,
) -> Reply<Json<User>> {
    authorize(&db, &headers)?;
    let password = password_header(&headers)?;
    let mut users = db.users.write().await;
    let user = authenticate(&mut users, &query.email, password)?;
    user.email.verified = false;
    user.email.verification_token = None;
    info!(email = %query.email, "reset verification status");
    Ok(Json(user.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState {
            users: RwLock::new(HashMap::new()),
            key: "key".to_string(),
            secret: "secret".to_string(),
        }
    }

    fn basic(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        );
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn user_serializes_with_camel_case_email() {
        let raw = r#"{"email":{"address":"a@b.com","verificationToken":"t"},"password":"x"}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert!(!user.email.verified);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"]["verificationToken"], "t");
        assert_eq!(json["email"]["verified"], false);
    }

    #[test]
    fn user_keeps_unknown_fields() {
        let raw = r#"{"email":{"address":"a@b.com"},"properties":{"name":"A"}}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.properties["properties"]["name"], "A");
    }

    #[test]
    fn email_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "email": {"address": "a@b.com", "verified": false, "source": "import"},
            "password": "x"
        });
        let user: User = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(user.email.extra["source"], "import");
        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
    }

    #[test]
    fn authorize_accepts_matching_credentials() {
        assert!(authorize(&state(), &basic("key:secret")).is_ok());
    }

    #[test]
    fn authorize_rejects_wrong_or_missing_credentials() {
        let db = state();
        let (status, _) = authorize(&db, &basic("key:wrong")).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = authorize(&db, &HeaderMap::new()).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn authenticate_checks_password() {
        let mut users = HashMap::new();
        let user: User =
            serde_json::from_str(r#"{"email":{"address":"a@b.com"},"password":"pw"}"#).unwrap();
        users.insert("a@b.com".to_string(), user);

        assert!(authenticate(&mut users, "a@b.com", "pw").is_ok());
        let (status, _) = authenticate(&mut users, "a@b.com", "nope").unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = authenticate(&mut users, "c@d.com", "pw").unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
