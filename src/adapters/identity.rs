//! Firebase Authentication over the Identity Toolkit and Secure Token REST APIs.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::adapters::remote::{error_code, read_failure};
use crate::config::toml_config::IdentitySettings;
use crate::domain::ports::{AdminUser, IdentityProvider, Session};
use crate::utils::error::{KyoError, Result};

const SERVICE: &str = "Identity Toolkit";

pub const LOGIN_FAILED: &str = "Login failed. Check your email and password.";
pub const SESSION_EXPIRED: &str = "Session expired. Please sign in again.";
pub const NOT_AN_ADMIN: &str = "This account is not allowed to manage the catalog.";

const CREDENTIAL_ERRORS: [&str; 6] = [
    "EMAIL_NOT_FOUND",
    "INVALID_PASSWORD",
    "INVALID_LOGIN_CREDENTIALS",
    "INVALID_EMAIL",
    "USER_DISABLED",
    "MISSING_PASSWORD",
];

const TOKEN_ERRORS: [&str; 7] = [
    "INVALID_ID_TOKEN",
    "TOKEN_EXPIRED",
    "USER_NOT_FOUND",
    "USER_DISABLED",
    "INVALID_REFRESH_TOKEN",
    "MISSING_REFRESH_TOKEN",
    "INVALID_GRANT_TYPE",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: String,
    #[serde(deserialize_with = "seconds")]
    expires_in: u64,
    local_id: String,
    email: Option<String>,
}

/// Secure Token answers in snake_case.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(deserialize_with = "seconds")]
    expires_in: u64,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    disabled: bool,
}

/// `expiresIn` is a decimal string on the wire.
fn seconds<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Text(String),
        Number(u64),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub struct FirebaseIdentity {
    client: Client,
    settings: IdentitySettings,
}

impl FirebaseIdentity {
    pub fn new(settings: IdentitySettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    fn accounts_url(&self, method: &str) -> String {
        format!("{}/v1/accounts:{}", self.settings.base_url, method)
    }

    fn ensure_admin(&self, email: Option<&str>) -> Result<()> {
        if self.settings.admin_emails.is_empty() {
            return Ok(());
        }

        let allowed = email
            .map(|email| email.trim().to_lowercase())
            .is_some_and(|email| self.settings.admin_emails.contains(&email));
        if allowed {
            Ok(())
        } else {
            tracing::warn!("🚫 Rejected non-admin account {:?}", email);
            Err(KyoError::unauthorized(NOT_AN_ADMIN))
        }
    }

    /// Maps known rejection codes to `Unauthorized` and everything else to a
    /// remote error.
    async fn rejection(response: Response, known: &[&str], message: &str) -> KyoError {
        let (status, body) = read_failure(response).await;
        let code = error_code(&body);

        if (400..500).contains(&status) && known.contains(&code) {
            tracing::info!("🔒 {} rejected the request: {}", SERVICE, code);
            KyoError::unauthorized(message)
        } else {
            tracing::warn!("❌ {} request failed with {}: {}", SERVICE, status, body);
            KyoError::RemoteError {
                service: SERVICE,
                status,
                message: body,
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(KyoError::unauthorized(LOGIN_FAILED));
        }

        tracing::debug!("🔑 Signing in {}", email);
        let response = self
            .client
            .post(self.accounts_url("signInWithPassword"))
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, &CREDENTIAL_ERRORS, LOGIN_FAILED).await);
        }

        let body: SignInResponse = response.json().await?;
        self.ensure_admin(body.email.as_deref().or(Some(email)))?;
        tracing::info!("🔑 Admin signed in: {}", body.local_id);

        Ok(Session {
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_in_secs: body.expires_in,
            user_id: body.local_id,
            email: body.email.or_else(|| Some(email.to_string())),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        if refresh_token.trim().is_empty() {
            return Err(KyoError::unauthorized(SESSION_EXPIRED));
        }

        let response = self
            .client
            .post(format!("{}/v1/token", self.settings.secure_token_url))
            .query(&[("key", self.settings.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.trim()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, &TOKEN_ERRORS, SESSION_EXPIRED).await);
        }

        let body: RefreshResponse = response.json().await?;
        tracing::debug!("🔑 Refreshed session for {}", body.user_id);

        Ok(Session {
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_in_secs: body.expires_in,
            user_id: body.user_id,
            email: None,
        })
    }

    async fn verify(&self, id_token: &str) -> Result<AdminUser> {
        let response = self
            .client
            .post(self.accounts_url("lookup"))
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&json!({ "idToken": id_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, &TOKEN_ERRORS, SESSION_EXPIRED).await);
        }

        let body: LookupResponse = response.json().await?;
        let user = body
            .users
            .into_iter()
            .next()
            .filter(|user| !user.disabled)
            .ok_or_else(|| KyoError::unauthorized(SESSION_EXPIRED))?;

        self.ensure_admin(user.email.as_deref())?;

        Ok(AdminUser {
            user_id: user.local_id,
            email: user.email.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn identity(admin_emails: Vec<&str>) -> FirebaseIdentity {
        FirebaseIdentity::new(IdentitySettings {
            base_url: "http://127.0.0.1:1".to_string(),
            secure_token_url: "http://127.0.0.1:1".to_string(),
            api_key: "key".to_string(),
            admin_emails: admin_emails.into_iter().map(str::to_string).collect(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_expires_in_accepts_strings_and_numbers() {
        let text: RefreshResponse = serde_json::from_str(
            r#"{"id_token":"a","refresh_token":"b","expires_in":"3600","user_id":"u"}"#,
        )
        .unwrap();
        assert_eq!(text.expires_in, 3600);

        let number: RefreshResponse = serde_json::from_str(
            r#"{"id_token":"a","refresh_token":"b","expires_in":60,"user_id":"u"}"#,
        )
        .unwrap();
        assert_eq!(number.expires_in, 60);
    }

    #[test]
    fn test_empty_allowlist_admits_everyone() {
        assert!(identity(vec![]).ensure_admin(None).is_ok());
        assert!(identity(vec![]).ensure_admin(Some("someone@example.com")).is_ok());
    }

    #[test]
    fn test_allowlist_is_case_insensitive() {
        let identity = identity(vec!["owner@kyowear.id"]);
        assert!(identity.ensure_admin(Some("Owner@KyoWear.id")).is_ok());
        assert!(matches!(
            identity.ensure_admin(Some("guest@kyowear.id")),
            Err(KyoError::Unauthorized { .. })
        ));
        assert!(identity.ensure_admin(None).is_err());
    }

    #[tokio::test]
    async fn test_blank_credentials_never_reach_the_network() {
        let err = identity(vec![]).sign_in("  ", "secret").await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);
    }
}
