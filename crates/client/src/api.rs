//! Typed HTTP client for the Pitchcraft API.
//!
//! Every request carries the stored bearer token when one exists, and any
//! `X-New-Token` header on a response replaces the stored token.

use async_trait::async_trait;
use pitchcraft_core::auth::{AuthStatus, Credentials, LoginResponse, SignupResponse};
use pitchcraft_core::generators::{ContentKind, GeneratedContent, ProductData};
use pitchcraft_core::project::{ProjectInput, ProjectPatch, ProjectResponse};
use pitchcraft_core::token::BearerToken;
use pitchcraft_core::types::DbId;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backend::AuthBackend;
use crate::error::ClientError;
use crate::token_store::TokenStore;

/// Response header carrying a re-issued token.
pub const NEW_TOKEN_HEADER: &str = "x-new-token";

/// `{ "data": T }` envelope used by project and generate responses.
#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    #[serde(flatten)]
    product: &'a ProductData,
    kinds: &'a [ContentKind],
}

#[derive(Serialize)]
struct VerifyEmailBody<'a> {
    token: &'a str,
}

/// HTTP client bound to one API origin and one token store.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5000`).
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, tokens)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: TokenStore,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // ---- Auth ----

    /// `POST /api/auth/signup`. The returned token is stored.
    pub async fn signup(&self, credentials: &Credentials) -> Result<SignupResponse, ClientError> {
        let req = self.http.post(self.url("/auth/signup")).json(credentials);
        let body: SignupResponse = Self::parse_response(self.send(req).await?).await?;
        self.tokens.set_token(&body.token)?;
        Ok(body)
    }

    /// `POST /api/auth/verify-email`.
    pub async fn verify_email(&self, token: &str) -> Result<(), ClientError> {
        let req = self
            .http
            .post(self.url("/auth/verify-email"))
            .json(&VerifyEmailBody { token });
        Self::check_status(self.send(req).await?).await
    }

    // ---- Projects ----

    pub async fn list_projects(&self) -> Result<Vec<ProjectResponse>, ClientError> {
        let req = self.authorized(self.http.get(self.url("/projects")));
        Self::parse_data(self.send(req).await?).await
    }

    pub async fn get_project(&self, id: DbId) -> Result<ProjectResponse, ClientError> {
        let req = self.authorized(self.http.get(self.url(&format!("/projects/{id}"))));
        Self::parse_data(self.send(req).await?).await
    }

    pub async fn create_project(&self, input: &ProjectInput) -> Result<ProjectResponse, ClientError> {
        let req = self.authorized(self.http.post(self.url("/projects")).json(input));
        Self::parse_data(self.send(req).await?).await
    }

    pub async fn update_project(
        &self,
        id: DbId,
        patch: &ProjectPatch,
    ) -> Result<ProjectResponse, ClientError> {
        let req = self.authorized(
            self.http
                .put(self.url(&format!("/projects/{id}")))
                .json(patch),
        );
        Self::parse_data(self.send(req).await?).await
    }

    pub async fn delete_project(&self, id: DbId) -> Result<(), ClientError> {
        let req = self.authorized(self.http.delete(self.url(&format!("/projects/{id}"))));
        Self::check_status(self.send(req).await?).await
    }

    // ---- Generators ----

    /// `POST /api/generate`. An empty `kinds` slice renders every variant.
    pub async fn generate(
        &self,
        product: &ProductData,
        kinds: &[ContentKind],
    ) -> Result<Vec<GeneratedContent>, ClientError> {
        let req = self
            .http
            .post(self.url("/generate"))
            .json(&GenerateBody { product, kinds });
        Self::parse_data(self.send(req).await?).await
    }

    // ---- Helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    /// Attach the stored token, if any.
    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.tokens.get_token() {
            Some(token) => with_token(req, &token),
            None => req,
        }
    }

    /// Send a request and pick up a re-issued token from the response.
    async fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let response = req.send().await?;
        self.capture_new_token(&response);
        Ok(response)
    }

    fn capture_new_token(&self, response: &Response) {
        let Some(value) = response
            .headers()
            .get(NEW_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
        else {
            return;
        };

        match self.tokens.set_token(value) {
            Ok(_) => tracing::debug!("Stored re-issued token"),
            Err(e) => tracing::warn!(error = %e, "Ignoring invalid re-issued token"),
        }
    }

    /// Map a non-2xx response to [`ClientError::Api`], preferring the
    /// server's `error` field over the raw body.
    async fn ensure_success(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let bytes = Self::ensure_success(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn parse_data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let body: Data<T> = Self::parse_response(response).await?;
        Ok(body.data)
    }

    async fn check_status(response: Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn with_token(req: RequestBuilder, token: &BearerToken) -> RequestBuilder {
    req.header(AUTHORIZATION, token.header_value())
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn status(&self, token: &BearerToken) -> Result<AuthStatus, ClientError> {
        let req = with_token(self.http.get(self.url("/auth/status")), token);
        Self::parse_response(self.send(req).await?).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        let req = self.http.post(self.url("/auth/login")).json(credentials);
        Self::parse_response(self.send(req).await?).await
    }

    async fn logout(&self, token: Option<&BearerToken>) -> Result<(), ClientError> {
        let mut req = self.http.post(self.url("/auth/logout"));
        if let Some(token) = token {
            req = with_token(req, token);
        }
        Self::check_status(self.send(req).await?).await
    }

    async fn refresh(&self, token: &BearerToken) -> Result<Option<String>, ClientError> {
        let req = with_token(self.http.post(self.url("/auth/refresh")), token);
        let response = req.send().await?;
        let header_token = response
            .headers()
            .get(NEW_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: TokenBody = Self::parse_response(response).await?;
        Ok(header_token.or(Some(body.token)))
    }
}
