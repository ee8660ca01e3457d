//! Sign-in, sign-up, OAuth redirects and profile management.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, Result};
use crate::http::{ApiClient, TokenPair};
use crate::schema::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Github,
    Google,
    Naver,
    Local,
}

/// Providers that sign in through an OAuth redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Github,
    Google,
    Naver,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Google => "google",
            Self::Naver => "naver",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(Self::Github),
            "google" => Ok(Self::Google),
            "naver" => Ok(Self::Naver),
            other => Err(format!("unsupported OAuth provider: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    pub name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    pub auth_provider: AuthProvider,
    pub role: Role,
    #[serde(default)]
    pub email_verified: Option<bool>,
    pub created_at: String,
    #[serde(default)]
    pub last_login_at: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Validate for User {}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn current_user(&self) -> Result<User> {
        self.client.get("/api/auth/me", &Vec::new()).await
    }

    /// Create an account and keep the issued tokens for subsequent requests.
    pub async fn signup(&self, request: &SignupRequest) -> Result<TokenPair> {
        let tokens: TokenPair = self.client.post("/api/auth/signup", request).await?;
        self.client.tokens().set(tokens.clone());
        info!("Signed up as {}", request.username);
        Ok(tokens)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<TokenPair> {
        let tokens: TokenPair = self.client.post("/api/auth/login", request).await?;
        self.client.tokens().set(tokens.clone());
        info!("Logged in as {}", request.username);
        Ok(tokens)
    }

    /// Revoke the refresh token server-side, then forget local tokens whatever the outcome.
    pub async fn logout(&self) {
        if let Err(e) = self.client.post_empty("/api/auth/logout").await {
            warn!("Logout request failed: {}", e);
        }
        self.client.tokens().clear();
    }

    /// `true` when the backend accepts the username; any failure reads as taken.
    pub async fn is_username_available(&self, username: &str) -> bool {
        self.client
            .check_status(
                "/api/auth/check-username",
                &vec![("username", username.to_string())],
            )
            .await
            .is_ok()
    }

    pub async fn is_email_available(&self, email: &str) -> bool {
        self.client
            .check_status("/api/auth/check-email", &vec![("email", email.to_string())])
            .await
            .is_ok()
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.client.put("/api/profile", update).await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        self.client
            .post_discard("/api/profile/change-password", change)
            .await
    }

    pub async fn remove_email(&self) -> Result<()> {
        self.client.delete("/api/profile/email").await
    }

    /// Where to send the browser to start an OAuth sign-in. The Turnstile
    /// token travels as a query parameter for the backend to verify.
    pub fn oauth_authorization_url(
        &self,
        provider: OAuthProvider,
        turnstile_token: &str,
    ) -> Result<String> {
        let raw = format!("{}/oauth2/authorization/{}", self.client.base_url(), provider);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::Config {
            details: format!("bad OAuth URL {}: {}", raw, e),
        })?;
        url.query_pairs_mut()
            .append_pair("turnstile_token", turnstile_token);
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::client_for;
    use mockito::{Matcher, Server};

    const TOKENS: &str = r#"{"accessToken":"acc","refreshToken":"ref"}"#;

    #[tokio::test]
    async fn test_login_stores_tokens_and_logout_clears() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_body(TOKENS)
            .create_async()
            .await;
        server
            .mock("POST", "/api/auth/logout")
            .with_status(500)
            .create_async()
            .await;

        let client = client_for(&server);
        let auth = client.auth();
        auth.login(&LoginRequest {
            username: "dev".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(client.tokens().access_token().as_deref(), Some("acc"));

        auth.logout().await;
        assert!(!client.tokens().is_authenticated());
    }

    #[tokio::test]
    async fn test_current_user_sends_stored_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/auth/me")
            .match_header("authorization", "Bearer acc")
            .with_status(200)
            .with_body(
                r#"{"id":1,"email":"a@b.c","name":"Dev","authProvider":"github","role":"ADMIN",
                    "createdAt":"2025-01-01","lastLoginAt":"2025-01-02"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        client.tokens().set(TokenPair {
            access_token: "acc".to_string(),
            refresh_token: "ref".to_string(),
        });
        let user = client.auth().current_user().await.unwrap();
        assert!(user.is_admin());
        assert_eq!(user.auth_provider, AuthProvider::Github);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_availability_checks() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/auth/check-username")
            .match_query(Matcher::UrlEncoded("username".into(), "free".into()))
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", "/api/auth/check-username")
            .match_query(Matcher::UrlEncoded("username".into(), "taken".into()))
            .with_status(409)
            .create_async()
            .await;

        let auth = client_for(&server).auth();
        assert!(auth.is_username_available("free").await);
        assert!(!auth.is_username_available("taken").await);
    }

    #[test]
    fn test_oauth_url_encodes_token() {
        let client = ApiClient::new(&crate::config::ClientConfig::new("https://api.devport.kr")).unwrap();
        let url = client
            .auth()
            .oauth_authorization_url(OAuthProvider::Naver, "a b&c")
            .unwrap();
        assert_eq!(
            url,
            "https://api.devport.kr/oauth2/authorization/naver?turnstile_token=a+b%26c"
        );
    }
}
