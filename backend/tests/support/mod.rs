#![allow(dead_code)]
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, Response},
    Router,
};
use chrono::Duration;
use medtrack_backend::{
    config::{Config, LoginLinkPolicy, SessionConfig, SmtpConfig},
    repositories::InMemoryStorage,
    routes::build_router,
    services::email::{LoginMailer, MailError},
    state::AppState,
    utils::jwt::{TokenCodec, TokenKind},
};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Captures login links instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("lock sent mail").clone()
    }

    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token)
    }
}

#[async_trait]
impl LoginMailer for RecordingMailer {
    async fn send_login_link(&self, to_email: &str, token: &str) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            let err = "not an address"
                .parse::<lettre::Address>()
                .expect_err("invalid address");
            return Err(MailError::Address(err));
        }
        self.sent
            .lock()
            .expect("lock sent mail")
            .push((to_email.to_string(), token.to_string()));
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        listen_addr: "127.0.0.1:0".parse().expect("listen addr"),
        jwt_secret: TEST_SECRET.to_string(),
        public_base_url: "http://127.0.0.1:8080".to_string(),
        session: SessionConfig::default(),
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: String::new(),
            password: String::new(),
            from_address: "noreply@medtrack.local".to_string(),
            skip_send: true,
        },
    }
}

pub fn single_use_config() -> Config {
    let mut config = test_config();
    config.session.login_link_policy = LoginLinkPolicy::SingleUse;
    config
}

pub struct TestApp {
    pub router: Router,
    pub storage: Arc<InMemoryStorage>,
    pub mailer: Arc<RecordingMailer>,
    pub config: Config,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(storage.clone(), mailer.clone(), config.clone());
        Self {
            router: build_router(state),
            storage,
            mailer,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Registers an account and redeems its mailed link. Returns the account
    /// JSON and the session cookie value.
    pub async fn sign_up(&self, name: &str, email: &str) -> (Value, String) {
        let response = self
            .send(json_request(
                Method::POST,
                "/register",
                serde_json::json!({ "name": name, "email": email }),
                None,
            ))
            .await;
        assert_eq!(response.status(), 200, "register {email}");
        let account = body_json(response).await;

        let token = self.mailer.last_token_for(email).expect("mailed token");
        let response = self.send(get_request(&format!("/login/{token}"), None)).await;
        assert_eq!(response.status(), 200, "verify login for {email}");
        let cookie = session_cookie_value(response.headers()).expect("session cookie");
        (account, cookie)
    }

    pub fn codec(&self) -> TokenCodec {
        TokenCodec::new(&self.config.jwt_secret)
    }

    pub fn session_token(&self, subject: &str, ttl: Duration) -> String {
        self.codec()
            .mint(subject, ttl, TokenKind::Session)
            .expect("mint token")
            .0
    }
}

pub fn json_request(method: Method, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = cookie {
        builder = builder.header(header::COOKIE, format!("token={token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn raw_request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = cookie {
        builder = builder.header(header::COOKIE, format!("token={token}"));
    }
    builder.body(Body::empty()).expect("build request")
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    raw_request(Method::GET, uri, cookie)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Every `Set-Cookie` header for the session cookie, in order.
pub fn session_set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|value| value.starts_with("token="))
        .map(str::to_string)
        .collect()
}

/// Value of the session cookie being set, if it is non-empty.
pub fn session_cookie_value(headers: &HeaderMap) -> Option<String> {
    session_set_cookies(headers).into_iter().find_map(|value| {
        let token = value.strip_prefix("token=")?.split(';').next()?.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    })
}
