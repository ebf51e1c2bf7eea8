// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Auth client (Identity Toolkit REST API).
//!
//! Covers email/password sign-up and sign-in. Credential rejection is the
//! one error class that surfaces to the user; callers re-attempt, nothing
//! is retried automatically.

use crate::error::AppError;
use crate::models::Identity;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Firebase Auth REST client.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Successful Identity Toolkit account response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

/// Identity Toolkit error envelope: `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuthClient {
    /// Create a new client with a Firebase web API key.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a non-default base URL (tests, emulator).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Create a new email/password account.
    pub async fn sign_up_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        self.account_request("accounts:signUp", email, password)
            .await
    }

    /// Sign in with an existing email/password account.
    pub async fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        self.account_request("accounts:signInWithPassword", email, password)
            .await
    }

    async fn account_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Auth request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| status.to_string());
            tracing::debug!(endpoint, %message, "Credential rejected");
            return Err(AppError::Auth(message));
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Invalid auth response: {}", e)))?;

        Ok(Identity {
            uid: account.local_id,
            email: account.email,
            phone: None,
            display_name: account.display_name,
            photo_url: account.photo_url,
        })
    }
}
