//! Shared fixtures for the server integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use chrono::{Duration, Utc};
use openidconnect::core::{
    CoreIdToken, CoreIdTokenClaims, CoreJsonWebKeySet, CoreJwsSigningAlgorithm,
    CoreRsaPrivateSigningKey,
};
use openidconnect::{
    Audience, ClientId, EmptyAdditionalClaims, EndUserEmail, IssuerUrl, JsonWebKeyId, Nonce,
    PrivateSigningKey, StandardClaims, SubjectIdentifier,
};
use savannah_platform_access::{AuthenticationError, ProviderUserInfo, VerifiedClaims};
use savannah_server::{
    app,
    auth::{AppState, IdentityProvider, OidcError, ProviderTokens, TokenVerifier},
    config::CookieConfig,
    notify::{AfricasTalkingSms, Notifier, NotifyError},
};
use savannah_store::MemoryStore;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const ISSUER: &str = "https://accounts.test.example";
pub const CLIENT_ID: &str = "savannah-test-client";
pub const BAD_CODE: &str = "bad-code";
/// A code whose exchange runs past the provider timeout.
pub const SLOW_CODE: &str = "slow-code";

const KEY_ID: &str = "test-key";
const TEST_RSA_KEY: &str = include_str!("test_rsa_key.pem");

fn signing_key() -> CoreRsaPrivateSigningKey {
    CoreRsaPrivateSigningKey::from_pem(TEST_RSA_KEY, Some(JsonWebKeyId::new(KEY_ID.to_string())))
        .expect("test key parses")
}

/// A verifier that trusts the test key for [`ISSUER`] and [`CLIENT_ID`].
pub fn token_verifier() -> TokenVerifier {
    TokenVerifier::new(
        ClientId::new(CLIENT_ID.to_string()),
        IssuerUrl::new(ISSUER.to_string()).expect("issuer url"),
        CoreJsonWebKeySet::new(vec![signing_key().as_verification_key()]),
    )
}

/// Claims for a minted test ID token.
#[derive(Debug, Clone)]
pub struct TestToken {
    pub subject: String,
    pub email: String,
    pub audience: String,
    pub nonce: Option<String>,
    pub expires_in: Duration,
}

impl TestToken {
    pub fn for_email(email: &str) -> Self {
        Self {
            subject: format!("sub-{email}"),
            email: email.to_string(),
            audience: CLIENT_ID.to_string(),
            nonce: None,
            expires_in: Duration::hours(1),
        }
    }

    pub fn nonce(mut self, nonce: &str) -> Self {
        self.nonce = Some(nonce.to_string());
        self
    }

    pub fn audience(mut self, audience: &str) -> Self {
        self.audience = audience.to_string();
        self
    }

    pub fn expired(mut self) -> Self {
        self.expires_in = Duration::hours(-1);
        self
    }

    /// Signs the token with the test key.
    pub fn mint(&self) -> String {
        let now = Utc::now();
        let claims = CoreIdTokenClaims::new(
            IssuerUrl::new(ISSUER.to_string()).expect("issuer url"),
            vec![Audience::new(self.audience.clone())],
            now + self.expires_in,
            now,
            StandardClaims::new(SubjectIdentifier::new(self.subject.clone()))
                .set_email(Some(EndUserEmail::new(self.email.clone())))
                .set_email_verified(Some(true)),
            EmptyAdditionalClaims {},
        )
        .set_nonce(self.nonce.clone().map(Nonce::new));

        CoreIdToken::new(
            claims,
            &signing_key(),
            CoreJwsSigningAlgorithm::RsaSsaPkcs1V15Sha256,
            None,
            None,
        )
        .expect("sign test token")
        .to_string()
    }
}

/// An identity provider that never leaves the process.
///
/// Code exchange mints a real signed ID token for the configured user, and
/// every exchange is counted.
pub struct SpyProvider {
    verifier: TokenVerifier,
    email: Option<String>,
    token_nonce: String,
    exchange_calls: AtomicUsize,
}

impl SpyProvider {
    /// A provider whose user has `email` and whose ID tokens carry `nonce`.
    pub fn new(email: Option<&str>, token_nonce: &str) -> Self {
        Self {
            verifier: token_verifier(),
            email: email.map(str::to_string),
            token_nonce: token_nonce.to_string(),
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    fn subject(&self) -> String {
        format!("sub-{}", self.email.as_deref().unwrap_or("anonymous"))
    }
}

#[async_trait]
impl IdentityProvider for SpyProvider {
    fn authorization_url(&self, state: &str, nonce: &str) -> String {
        format!("{ISSUER}/authorize?client_id={CLIENT_ID}&state={state}&nonce={nonce}")
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, OidcError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if code == BAD_CODE {
            return Err(OidcError::TokenExchange("invalid_grant".to_string()));
        }
        if code == SLOW_CODE {
            return Err(OidcError::Timeout("token exchange"));
        }

        let email = self.email.as_deref().unwrap_or("anonymous@test.example");
        let mut token = TestToken::for_email(email).nonce(&self.token_nonce);
        token.subject = self.subject();

        Ok(ProviderTokens {
            access_token: format!("access-{code}"),
            id_token: token.mint(),
        })
    }

    async fn user_info(&self, _access_token: &str) -> Result<ProviderUserInfo, OidcError> {
        Ok(ProviderUserInfo {
            subject: self.subject(),
            email: self.email.clone(),
            email_verified: Some(true),
        })
    }

    fn verify_id_token(
        &self,
        id_token: &str,
        expected_nonce: Option<&str>,
    ) -> Result<VerifiedClaims, AuthenticationError> {
        self.verifier.verify(id_token, expected_nonce)
    }
}

/// Records every message instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier whose gateway rejects every message.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, message: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push((to.to_string(), message.to_string()));
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 401,
                body: "invalid api key".to_string(),
            });
        }
        Ok(())
    }
}

/// A router over in-memory fakes, with handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryStore>,
    pub provider: Arc<SpyProvider>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn new(provider: SpyProvider) -> Self {
        Self::with_notifier(provider, RecordingNotifier::default())
    }

    pub fn with_notifier(provider: SpyProvider, notifier: RecordingNotifier) -> Self {
        let notifier = Arc::new(notifier);
        Self::assemble(provider, notifier.clone(), notifier)
    }

    /// Sends confirmations through a real SMS client; `notifier` stays empty.
    pub fn with_gateway(provider: SpyProvider, gateway: AfricasTalkingSms) -> Self {
        Self::assemble(
            provider,
            Arc::new(gateway),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn assemble(
        provider: SpyProvider,
        sender: Arc<dyn Notifier>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let repo = Arc::new(MemoryStore::new());
        let provider = Arc::new(provider);

        let state = AppState::new(
            repo.clone(),
            provider.clone(),
            sender,
            CookieConfig {
                secure: false,
                max_age_seconds: 3600,
            },
        );

        Self {
            router: app::router(Arc::new(state)),
            repo,
            provider,
            notifier,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body: bytes.to_vec(),
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

/// Starts a gateway that accepts connections and never answers.
///
/// Returns its base URL.
pub async fn stalled_gateway() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// A GET carrying a bearer token.
pub fn authorized_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

/// A JSON POST carrying a bearer token.
pub fn authorized_post(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}
