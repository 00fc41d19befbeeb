use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_http::normalize_path::NormalizePath;

use crate::api;
use crate::core::{config::Settings, security, state::AppState};
use crate::domain::{Answer, Category, Question, Quiz, User};
use crate::store::{Repositories, Repository};

const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: NormalizePath<Router>,
    _guard: OwnedMutexGuard<()>,
}

/// Serializes tests that touch process environment variables.
pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::remove_var("QUIZDECK_PORT");
    std::env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");
    std::env::remove_var("API_V1_STR");
}

/// Settings loaded under the env lock, for tests that only need config.
pub(crate) async fn test_settings() -> Settings {
    let _guard = env_lock().await;
    set_test_env();
    Settings::load().expect("settings")
}

/// Full application wired to the in-memory store. No external services.
pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let store = Repositories::in_memory();

    let state = AppState::new(settings, store);
    let app = api::router::router(state.clone());

    TestContext { state, app, _guard: guard }
}

pub(crate) async fn insert_user(state: &AppState, email: &str, password: &str) -> User {
    insert_user_with_disabled(state, email, password, false).await
}

pub(crate) async fn insert_user_with_disabled(
    state: &AppState,
    email: &str,
    password: &str,
    disabled: bool,
) -> User {
    let password_hash = security::hash_password(password).expect("hash password");
    state
        .store()
        .users()
        .persist(User {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash,
            disabled,
        })
        .await
        .expect("insert user")
}

pub(crate) async fn insert_category(state: &AppState, title: &str) -> Category {
    state
        .store()
        .categories()
        .persist(Category { identifier: None, title: title.to_string(), description: None })
        .await
        .expect("insert category")
}

pub(crate) async fn insert_quiz(
    state: &AppState,
    owner: &str,
    title: &str,
    categories: Vec<i64>,
) -> Quiz {
    state
        .store()
        .quizzes()
        .persist(Quiz {
            identifier: None,
            title: title.to_string(),
            description: None,
            owner: owner.to_string(),
            questions: vec![Question {
                identifier: None,
                title: "Which answers are correct?".to_string(),
                answers: vec![
                    Answer {
                        identifier: None,
                        answer_text: "right".to_string(),
                        is_correct: true,
                    },
                    Answer {
                        identifier: None,
                        answer_text: "wrong".to_string(),
                        is_correct: false,
                    },
                ],
            }],
            categories,
        })
        .await
        .expect("insert quiz")
}

pub(crate) fn bearer_token(email: &str, settings: &Settings) -> String {
    security::create_access_token(email, settings, None).expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

/// Urlencoded form POST, as the token endpoint expects.
pub(crate) fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencode(value)))
        .collect::<Vec<_>>()
        .join("&");

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request body")
}

fn urlencode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
