//! OIDC client implementation using the openidconnect crate.

use async_trait::async_trait;
use openidconnect::core::{
    CoreAuthenticationFlow, CoreClient, CoreIdToken, CoreIdTokenVerifier, CoreJsonWebKeySet,
    CoreProviderMetadata, CoreUserInfoClaims,
};
use openidconnect::{
    AccessToken, AuthorizationCode, ClaimsVerificationError, ClientId, ClientSecret, CsrfToken,
    IssuerUrl, Nonce, OAuth2TokenResponse, RedirectUrl, Scope, TokenResponse,
};
use savannah_platform_access::{
    AuthenticationError, OidcConfig, ProviderUserInfo, VerifiedClaims,
};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::instrument;

/// Tokens returned by a successful code exchange.
#[derive(Debug, Clone)]
pub struct ProviderTokens {
    pub access_token: String,
    /// The raw, still signed ID token.
    pub id_token: String,
}

/// The operations the login flow and bearer gate need from an identity
/// provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the URL the browser is sent to, carrying `state` and `nonce`.
    fn authorization_url(&self, state: &str, nonce: &str) -> String;

    /// Exchanges an authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, OidcError>;

    /// Fetches the user info document for an access token.
    async fn user_info(&self, access_token: &str) -> Result<ProviderUserInfo, OidcError>;

    /// Verifies signature, issuer, audience and expiry of a raw ID token.
    ///
    /// When `expected_nonce` is given the token's `nonce` claim must match it.
    fn verify_id_token(
        &self,
        id_token: &str,
        expected_nonce: Option<&str>,
    ) -> Result<VerifiedClaims, AuthenticationError>;
}

/// Verifies ID tokens against a fixed key set.
///
/// Built once from the provider's discovered JWKS; verification itself makes
/// no network calls.
pub struct TokenVerifier {
    verifier: CoreIdTokenVerifier<'static>,
}

impl TokenVerifier {
    /// Creates a verifier that accepts tokens issued by `issuer` for
    /// `client_id` and signed by a key in `jwks`.
    #[must_use]
    pub fn new(client_id: ClientId, issuer: IssuerUrl, jwks: CoreJsonWebKeySet) -> Self {
        Self {
            verifier: CoreIdTokenVerifier::new_public_client(client_id, issuer, jwks),
        }
    }

    /// Verifies a raw ID token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::TokenExpired`] for an expired token,
    /// [`AuthenticationError::NonceMismatch`] when `expected_nonce` does not
    /// match, and [`AuthenticationError::InvalidToken`] for any other failure.
    pub fn verify(
        &self,
        raw: &str,
        expected_nonce: Option<&str>,
    ) -> Result<VerifiedClaims, AuthenticationError> {
        let id_token = CoreIdToken::from_str(raw).map_err(|e| AuthenticationError::InvalidToken {
            reason: format!("malformed ID token: {e}"),
        })?;

        let claims = match expected_nonce {
            Some(nonce) => id_token.claims(&self.verifier, &Nonce::new(nonce.to_string())),
            None => id_token.claims(&self.verifier, |_: Option<&Nonce>| Ok(())),
        }
        .map_err(|e| match e {
            ClaimsVerificationError::Expired(_) => AuthenticationError::TokenExpired,
            ClaimsVerificationError::InvalidNonce(_) => AuthenticationError::NonceMismatch,
            other => AuthenticationError::InvalidToken {
                reason: other.to_string(),
            },
        })?;

        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .ok_or_else(|| AuthenticationError::MissingClaim {
                claim: "email".to_string(),
            })?;

        Ok(VerifiedClaims::new(
            claims.subject().as_str().to_string(),
            email,
            claims.email_verified().unwrap_or(false),
            claims.expiration(),
        ))
    }
}

/// Runs a provider call, failing with [`OidcError::Timeout`] once `limit`
/// elapses.
async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, OidcError>>,
) -> Result<T, OidcError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| OidcError::Timeout(operation))?
}

/// OIDC client for authenticating users.
pub struct OidcClient {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    scopes: Vec<Scope>,
    verifier: TokenVerifier,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl OidcClient {
    /// Creates a new OIDC client by discovering the provider metadata.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Configuration`] for invalid URLs and
    /// [`OidcError::Discovery`] if the provider cannot be reached.
    pub async fn discover(config: &OidcConfig) -> Result<Self, OidcError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid issuer URL: {}", e)))?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid redirect URI: {}", e)))?;

        let timeout = config.http_timeout();
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| {
                OidcError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| OidcError::Discovery(format!("failed to discover provider: {}", e)))?;

        let client_id = ClientId::new(config.client_id().to_string());
        let client_secret = ClientSecret::new(config.client_secret().to_string());

        let verifier = TokenVerifier::new(
            client_id.clone(),
            provider_metadata.issuer().clone(),
            provider_metadata.jwks().clone(),
        );

        // `openid` is always sent by the authorization request itself.
        let scopes = config
            .scopes()
            .into_iter()
            .filter(|scope| *scope != "openid")
            .map(|scope| Scope::new(scope.to_string()))
            .collect();

        Ok(Self {
            provider_metadata,
            client_id,
            client_secret,
            redirect_url,
            scopes,
            verifier,
            http_client,
            timeout,
        })
    }

}

#[async_trait]
impl IdentityProvider for OidcClient {
    fn authorization_url(&self, state: &str, nonce: &str) -> String {
        let state = CsrfToken::new(state.to_string());
        let nonce = Nonce::new(nonce.to_string());

        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());
        let mut auth_request = client.authorize_url(
            CoreAuthenticationFlow::AuthorizationCode,
            move || state,
            move || nonce,
        );
        for scope in &self.scopes {
            auth_request = auth_request.add_scope(scope.clone());
        }

        let (auth_url, _, _) = auth_request.url();
        auth_url.to_string()
    }

    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, OidcError> {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());
        let token_request = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| OidcError::TokenExchange(format!("token endpoint error: {}", e)))?;

        let token_response = bounded(self.timeout, "token exchange", async {
            token_request
                .request_async(&self.http_client)
                .await
                .map_err(|e| OidcError::TokenExchange(format!("token exchange failed: {}", e)))
        })
        .await?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| OidcError::TokenValidation("no ID token in response".to_string()))?;

        Ok(ProviderTokens {
            access_token: token_response.access_token().secret().clone(),
            id_token: id_token.to_string(),
        })
    }

    #[instrument(skip(self, access_token))]
    async fn user_info(&self, access_token: &str) -> Result<ProviderUserInfo, OidcError> {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());
        let request = client
            .user_info(AccessToken::new(access_token.to_string()), None)
            .map_err(|e| OidcError::UserInfo(format!("user info endpoint error: {}", e)))?;

        let claims: CoreUserInfoClaims = bounded(self.timeout, "user info", async {
            request
                .request_async(&self.http_client)
                .await
                .map_err(|e| OidcError::UserInfo(format!("user info request failed: {}", e)))
        })
        .await?;

        Ok(ProviderUserInfo {
            subject: claims.subject().as_str().to_string(),
            email: claims.email().map(|e| e.as_str().to_string()),
            email_verified: claims.email_verified(),
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

/// OIDC-related errors.
#[derive(Debug)]
pub enum OidcError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
    /// Token exchange failed.
    TokenExchange(String),
    /// The user info request failed.
    UserInfo(String),
    /// The token response could not be used.
    TokenValidation(String),
    /// The named provider call did not finish in time.
    Timeout(&'static str),
}

impl std::fmt::Display for OidcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OIDC configuration error: {}", msg),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {}", msg),
            Self::TokenExchange(msg) => write!(f, "OIDC token exchange error: {}", msg),
            Self::UserInfo(msg) => write!(f, "OIDC user info error: {}", msg),
            Self::TokenValidation(msg) => write!(f, "OIDC token validation error: {}", msg),
            Self::Timeout(operation) => write!(f, "OIDC {} timed out", operation),
        }
    }
}

impl std::error::Error for OidcError {}
