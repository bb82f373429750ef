use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::api_client::TokenSource;
use super::config_service::Settings;
use super::error::{ApiError, ApiResult};
use super::file_service::{get_app_data_dir, read_json, remove_file, write_json};

// ============================================================================
// AUTH DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthState {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
}

/// Session returned by the identity provider's token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: ProviderUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Sign-up answers with a session, or with a bare user when email
/// confirmation is pending.
#[derive(Debug, Clone, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<ProviderUser>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(AuthState),
    ConfirmationRequired { email: String },
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn provider_error(body: &str) -> String {
    serde_json::from_str::<ProviderError>(body)
        .ok()
        .and_then(|e| e.error_description.or(e.msg).or(e.message).or(e.error))
        .unwrap_or_else(|| body.to_string())
}

// Refresh this many seconds before the provider-reported expiry.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Stored session against a Supabase-style identity provider.
pub struct AuthService {
    client: Client,
    auth_url: String,
    anon_key: String,
    store_path: PathBuf,
}

impl AuthService {
    pub fn new(auth_url: &str, anon_key: &str, store_path: PathBuf) -> Self {
        Self {
            client: Client::new(),
            auth_url: auth_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            store_path,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        let auth_url = settings
            .auth_url
            .as_deref()
            .ok_or("Identity provider URL not configured")?;
        let anon_key = settings
            .auth_anon_key
            .as_deref()
            .ok_or("Identity provider key not configured")?;

        Ok(Self::new(auth_url, anon_key, get_app_data_dir()?.join("auth.json")))
    }

    // ========================================================================
    // AUTH STATE PERSISTENCE
    // ========================================================================

    pub fn load_state(&self) -> Result<AuthState, String> {
        Ok(read_json(&self.store_path, "auth state")?.unwrap_or_default())
    }

    fn save_state(&self, state: &AuthState) -> Result<(), String> {
        write_json(&self.store_path, state, "auth state")
    }

    fn state_from_tokens(tokens: TokenResponse) -> AuthState {
        AuthState {
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            user_id: Some(tokens.user.id),
            email: tokens.user.email,
            expires_at: Some(chrono::Utc::now().timestamp() + tokens.expires_in),
        }
    }

    // ========================================================================
    // PROVIDER CALLS
    // ========================================================================

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<TokenResponse, String> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.auth_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Failed to reach identity provider: {}", e))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(provider_error(&error_text));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| format!("Failed to parse token response: {}", e))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthState, String> {
        let tokens = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        let state = Self::state_from_tokens(tokens);
        self.save_state(&state)?;
        tracing::info!(user_id = ?state.user_id, "Signed in");
        Ok(state)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, String> {
        let response = self
            .client
            .post(format!("{}/auth/v1/signup", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| format!("Failed to reach identity provider: {}", e))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(provider_error(&error_text));
        }

        let body: SignUpResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse sign-up response: {}", e))?;

        match (body.access_token, body.refresh_token, body.user) {
            (Some(access_token), Some(refresh_token), Some(user)) => {
                let state = Self::state_from_tokens(TokenResponse {
                    access_token,
                    refresh_token,
                    expires_in: body.expires_in.unwrap_or(3600),
                    token_type: None,
                    user,
                });
                self.save_state(&state)?;
                Ok(SignUpOutcome::SignedIn(state))
            }
            (_, _, user) => Ok(SignUpOutcome::ConfirmationRequired {
                email: body
                    .email
                    .or(user.and_then(|u| u.email))
                    .unwrap_or_else(|| email.to_string()),
            }),
        }
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, String> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
        .map_err(|e| format!("Token refresh failed: {}", e))
    }

    pub async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, String> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.auth_url))
            .bearer_auth(access_token)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch user info: {}", e))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Failed to fetch user info: {}", provider_error(&error_text)));
        }

        let user: ProviderUser = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse user info: {}", e))?;

        Ok(UserInfo {
            user_id: user.id,
            email: user.email.unwrap_or_default(),
        })
    }

    // ========================================================================
    // HIGH-LEVEL AUTH OPERATIONS
    // ========================================================================

    /// Get a valid access token, refreshing if necessary.
    /// `Ok(None)` means there is no stored session at all.
    pub async fn get_valid_access_token(&self) -> Result<Option<String>, String> {
        let mut state = self.load_state()?;

        let access_token = match state.access_token.clone() {
            Some(token) => token,
            None => return Ok(None),
        };

        let is_expired = state
            .expires_at
            .map(|exp| chrono::Utc::now().timestamp() >= exp - EXPIRY_BUFFER_SECS)
            .unwrap_or(false);

        if !is_expired {
            return Ok(Some(access_token));
        }

        let refresh_token = state
            .refresh_token
            .clone()
            .ok_or("Token expired and no refresh token available")?;

        tracing::info!("Access token expired or expiring soon, refreshing");
        let tokens = self.refresh_access_token(&refresh_token).await?;

        state.access_token = Some(tokens.access_token.clone());
        state.refresh_token = Some(tokens.refresh_token);
        state.expires_at = Some(chrono::Utc::now().timestamp() + tokens.expires_in);
        state.user_id = Some(tokens.user.id);
        state.email = tokens.user.email;
        self.save_state(&state)?;

        Ok(Some(tokens.access_token))
    }

    /// Sign out - forget the stored session
    pub fn sign_out(&self) -> Result<(), String> {
        remove_file(&self.store_path, "auth state")
    }
}

#[async_trait]
impl TokenSource for AuthService {
    async fn access_token(&self) -> ApiResult<String> {
        match self.get_valid_access_token().await {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(ApiError::NotAuthenticated),
            Err(e) => {
                tracing::warn!(error = %e, "Could not obtain access token");
                Err(ApiError::Auth(e))
            }
        }
    }
}
