use std::time::Duration;

use serde::Deserialize;

use crate::error::TraktError;

const BASE_URL: &str = "https://api.trakt.tv";
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub expires_in: u64,
    pub interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub created_at: Option<u64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

/// Request a device code for the user to enter at the verification URL.
pub async fn device_code(client_id: &str) -> Result<DeviceCodeResponse, TraktError> {
    let http = reqwest::Client::new();
    let resp = http
        .post(format!("{BASE_URL}/oauth/device/code"))
        .json(&serde_json::json!({ "client_id": client_id }))
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(TraktError::Api {
            status,
            message: body,
        });
    }

    resp.json().await.map_err(|e| TraktError::Parse(e.to_string()))
}

/// Poll the token endpoint until the user approves the device code.
///
/// Returns `Auth` when the code is rejected, expired, or denied; the poll
/// interval comes from the device code response (bumped on 429).
pub async fn poll_token(
    client_id: &str,
    client_secret: &str,
    device: &DeviceCodeResponse,
) -> Result<TokenResponse, TraktError> {
    let http = reqwest::Client::new();
    let mut interval = device.interval.max(1);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(device.expires_in);

    loop {
        tokio::time::sleep(Duration::from_secs(interval)).await;
        if tokio::time::Instant::now() >= deadline {
            return Err(TraktError::Auth("device code expired".into()));
        }

        let resp = http
            .post(format!("{BASE_URL}/oauth/device/token"))
            .json(&serde_json::json!({
                "code": device.device_code,
                "client_id": client_id,
                "client_secret": client_secret,
            }))
            .send()
            .await?;

        match resp.status().as_u16() {
            200 => {
                return resp.json().await.map_err(|e| TraktError::Parse(e.to_string()));
            }
            // Pending: the user has not approved yet.
            400 => continue,
            // Slow down.
            429 => {
                interval += 1;
                continue;
            }
            404 => return Err(TraktError::Auth("invalid device code".into())),
            409 => return Err(TraktError::Auth("device code already approved".into())),
            410 => return Err(TraktError::Auth("device code expired".into())),
            418 => return Err(TraktError::Auth("access denied by user".into())),
            status => {
                let body = resp.text().await.unwrap_or_default();
                return Err(TraktError::Api {
                    status,
                    message: body,
                });
            }
        }
    }
}

/// Exchange a refresh token for a new access token.
pub async fn refresh(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenResponse, TraktError> {
    let http = reqwest::Client::new();
    let resp = http
        .post(format!("{BASE_URL}/oauth/token"))
        .json(&serde_json::json!({
            "refresh_token": refresh_token,
            "client_id": client_id,
            "client_secret": client_secret,
            "redirect_uri": REDIRECT_URI,
            "grant_type": "refresh_token",
        }))
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        if status == 401 {
            return Err(TraktError::Auth(body));
        }
        return Err(TraktError::Api {
            status,
            message: body,
        });
    }

    resp.json().await.map_err(|e| TraktError::Parse(e.to_string()))
}
