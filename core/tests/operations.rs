//! Every operation against a scripted transport.
//!
//! # Design
//! `ScriptedTransport` records the requests it receives and answers with a
//! canned reply, so each case checks both sides of the normalization layer:
//! what went out, and what the caller got back.

use std::sync::Mutex;

use serde_json::{json, Value};
use thunder_core::{
    ClientConfig, HttpMethod, HttpRequest, HttpResponse, Thunder, ThunderError, Transport,
    TransportError, User, Verification,
};

const BASE_URL: &str = "http://localhost:8080";
const EMAIL: &str = "test@sanctionco.com";
const PASSWORD: &str = "secure-password";
const TOKEN: &str = "generated-token";

enum Reply {
    Respond(u16, String),
    Fail(&'static str),
}

struct ScriptedTransport {
    reply: Reply,
    sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn respond(status: u16, body: impl Into<String>) -> Self {
        Self {
            reply: Reply::Respond(status, body.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn fail(message: &'static str) -> Self {
        Self {
            reply: Reply::Fail(message),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    fn only_request(&self) -> HttpRequest {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one request");
        sent.into_iter().next().unwrap()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Respond(status, body) => Ok(HttpResponse::new(*status, body.clone())),
            Reply::Fail(message) => Err((*message).into()),
        }
    }
}

fn thunder(transport: &ScriptedTransport) -> Thunder<&ScriptedTransport> {
    let config = ClientConfig::new(BASE_URL, "apiKey", "apiSecret").unwrap();
    Thunder::new(config, transport)
}

fn user() -> User {
    User::new(EMAIL, PASSWORD)
}

fn user_json() -> String {
    serde_json::to_string(&user()).unwrap()
}

type Operation = fn(&Thunder<&ScriptedTransport>) -> Result<Value, ThunderError>;

fn verification_value(verification: Verification) -> Value {
    match verification {
        Verification::Json(body) => body,
        Verification::Html(page) => Value::String(page),
    }
}

/// (name, expected status, operation)
fn operations() -> [(&'static str, u16, Operation); 7] {
    let ops: [(&'static str, u16, Operation); 7] = [
        ("create_user", 201, |t| t.create_user(&user())),
        ("get_user", 200, |t| t.get_user(EMAIL, PASSWORD)),
        ("update_user", 200, |t| t.update_user(Some(EMAIL), PASSWORD, &user())),
        ("delete_user", 200, |t| t.delete_user(EMAIL, PASSWORD)),
        ("send_email", 200, |t| t.send_email(EMAIL, PASSWORD)),
        ("verify_user", 200, |t| {
            t.verify_user(EMAIL, TOKEN).map(verification_value)
        }),
        ("reset_verification_status", 200, |t| {
            t.reset_verification_status(EMAIL, PASSWORD)
        }),
    ];
    ops
}

/// Echo `body` at each operation's expected status and check the result.
fn assert_body_passes_through(body: &str, expected_result: &Value) {
    for (name, expected, op) in operations() {
        let transport = ScriptedTransport::respond(expected, body);
        let result = op(&thunder(&transport)).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(&result, expected_result, "{name}: result");
        assert_eq!(transport.sent().len(), 1, "{name}: one attempt");
    }
}

// ---------------------------------------------------------------------------
// Outcome normalization, every operation
// ---------------------------------------------------------------------------

#[test]
fn expected_status_returns_the_body() {
    let body = serde_json::to_value(user()).unwrap();
    assert_body_passes_through(&user_json(), &body);
}

#[test]
fn explicit_nulls_survive() {
    let body = json!({
        "email": {"address": EMAIL, "verified": null, "verificationToken": null},
        "password": null
    });
    assert_body_passes_through(&body.to_string(), &body);
}

#[test]
fn extra_fields_survive_at_every_level() {
    let body = json!({
        "email": {"address": EMAIL, "verified": true, "source": "import"},
        "password": "hashed",
        "properties": {"name": {"first": "Test"}, "tags": [1, 2, 3]},
        "creationTime": 1520200000
    });
    assert_body_passes_through(&body.to_string(), &body);
}

#[test]
fn bodies_that_are_not_users_pass_through() {
    let flat = json!({"email": EMAIL, "password": PASSWORD});
    assert_body_passes_through(&flat.to_string(), &flat);

    let list = json!([1, "two", null]);
    assert_body_passes_through(&list.to_string(), &list);
}

#[test]
fn text_body_on_json_endpoint_becomes_a_string() {
    assert_body_passes_through("User deleted", &Value::String("User deleted".to_string()));
}

#[test]
fn transport_error_is_returned_verbatim() {
    for (name, _, op) in operations() {
        let transport = ScriptedTransport::fail("A request error occurred.");
        let err = op(&thunder(&transport)).unwrap_err();
        assert!(matches!(err, ThunderError::Transport(_)), "{name}: variant");
        assert_eq!(err.to_string(), "A request error occurred.", "{name}: message");
        assert_eq!(err.status(), None, "{name}: no status");
        assert_eq!(transport.sent().len(), 1, "{name}: no retry");
    }
}

#[test]
fn status_mismatch_reports_codes_and_keeps_raw_body() {
    for (name, expected, op) in operations() {
        let transport = ScriptedTransport::respond(400, "Bad request");
        let err = op(&thunder(&transport)).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("The status code 400 does not match expected {expected}"),
            "{name}: message"
        );
        assert_eq!(err.status(), Some(400), "{name}: status");
        assert_eq!(err.body(), Some("Bad request"), "{name}: body");
        assert_eq!(transport.sent().len(), 1, "{name}: no retry");
    }
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[test]
fn create_user_scenario() {
    let body = json!({"email": {"address": "a@b.com"}, "password": "x"});
    let transport = ScriptedTransport::respond(201, body.to_string());
    let created = thunder(&transport).create_user(&body).unwrap();
    assert_eq!(created, body);

    let req = transport.only_request();
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, format!("{BASE_URL}/users"));
    assert!(req.json);
    let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
    assert_eq!(sent, body);
}

#[test]
fn get_user_scenario_bad_request() {
    let transport = ScriptedTransport::respond(400, "Bad get request");
    let err = thunder(&transport).get_user("a@b.com", "pw").unwrap_err();
    assert_eq!(err.to_string(), "The status code 400 does not match expected 200");
    assert_eq!(err.body(), Some("Bad get request"));

    let req = transport.only_request();
    assert_eq!(req.method, HttpMethod::Get);
    assert_eq!(req.query_value("email"), Some("a@b.com"));
    assert_eq!(req.header_value("password"), Some("pw"));
}

#[test]
fn update_user_without_email_sends_empty_query() {
    let transport = ScriptedTransport::respond(200, user_json());
    thunder(&transport).update_user(None, PASSWORD, &user()).unwrap();

    let req = transport.only_request();
    assert_eq!(req.method, HttpMethod::Put);
    assert!(req.query.is_empty());
    assert_eq!(req.header_value("password"), Some(PASSWORD));
}

#[test]
fn update_user_with_email_sends_email_query() {
    let transport = ScriptedTransport::respond(200, user_json());
    thunder(&transport)
        .update_user(Some(EMAIL), PASSWORD, &user())
        .unwrap();

    let req = transport.only_request();
    assert_eq!(req.query, vec![("email".to_string(), EMAIL.to_string())]);
}

#[test]
fn application_and_user_credentials_travel_separately() {
    let transport = ScriptedTransport::respond(200, user_json());
    thunder(&transport).delete_user(EMAIL, PASSWORD).unwrap();

    let req = transport.only_request();
    assert_eq!(req.auth.username, "apiKey");
    assert_eq!(req.auth.password, "apiSecret");
    assert_eq!(req.headers, vec![("password".to_string(), PASSWORD.to_string())]);
}

// ---------------------------------------------------------------------------
// Verification response types
// ---------------------------------------------------------------------------

#[test]
fn verify_user_defaults_to_json() {
    let transport = ScriptedTransport::respond(200, user_json());
    thunder(&transport).verify_user(EMAIL, TOKEN).unwrap();

    let req = transport.only_request();
    assert_eq!(req.url, format!("{BASE_URL}/verify"));
    assert_eq!(
        req.query,
        vec![
            ("email".to_string(), EMAIL.to_string()),
            ("token".to_string(), TOKEN.to_string()),
            ("response_type".to_string(), "json".to_string()),
        ]
    );
    assert!(req.headers.is_empty());
}

#[test]
fn verify_user_with_html_returns_page() {
    let page = "<html><body>Your account has been verified!</body></html>";
    let transport = ScriptedTransport::respond(200, page);
    let result = thunder(&transport)
        .verify_user_with(EMAIL, TOKEN, "html")
        .unwrap();
    assert_eq!(result, Verification::Html(page.to_string()));
    assert_eq!(transport.only_request().query_value("response_type"), Some("html"));
}

#[test]
fn verify_user_with_json_matches_default() {
    let transport = ScriptedTransport::respond(200, user_json());
    let result = thunder(&transport)
        .verify_user_with(EMAIL, TOKEN, "json")
        .unwrap();
    assert_eq!(result, Verification::Json(serde_json::to_value(user()).unwrap()));
    assert_eq!(transport.only_request().query_value("response_type"), Some("json"));
}

#[test]
fn verify_user_rejects_unknown_response_type_without_sending() {
    let transport = ScriptedTransport::respond(200, user_json());
    let err = thunder(&transport)
        .verify_user_with(EMAIL, TOKEN, "badType")
        .unwrap_err();

    assert!(matches!(err, ThunderError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "The response type badType is not accepted.\nUse either \"html\" or \"json\"."
    );
    assert!(transport.sent().is_empty());
}

#[test]
fn client_is_shareable_across_threads() {
    let transport = ScriptedTransport::respond(200, user_json());
    let thunder = thunder(&transport);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| thunder.get_user(EMAIL, PASSWORD).unwrap());
        }
    });
    assert_eq!(transport.sent().len(), 4);
}
